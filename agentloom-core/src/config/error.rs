use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while reading or validating `agentloom.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("agentloom.toml not found at {path:?}; pass --config to point at another file")]
    NotFound { path: PathBuf },

    #[error("could not read agentloom config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("agentloom config {path:?} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("agentloom config sets no top-level `model` for the agent and workflow to use")]
    MissingModel,

    #[error("agentloom config sets no `default_provider` to send completions to")]
    MissingDefaultProvider,

    #[error("agentloom config declares no [[providers]] to complete prompts with")]
    NoProvidersConfigured,

    #[error("default_provider '{provider}' matches none of the configured providers ({})", available.join(", "))]
    ProviderNotFound {
        provider: String,
        available: Vec<String>,
    },

    #[error("provider '{provider}' has no completion `endpoint`")]
    MissingEndpoint { provider: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
