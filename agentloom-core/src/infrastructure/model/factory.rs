//! Provider factory - creates clients from config

use super::clients::{OllamaClient, OpenAIClient};
use super::traits::ModelProvider;
use super::types::ModelError;
use crate::config::{AppConfig, ModelProviderConfig};
use std::env;
use std::sync::Arc;
use tracing::warn;

/// Resolve API key from environment variable
pub fn resolve_api_key(provider: &str, spec: Option<&str>) -> Option<String> {
    let Some(raw) = spec.map(str::trim) else {
        return None;
    };
    if raw.is_empty() {
        return None;
    }
    match env::var(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                provider,
                env_var = raw,
                %err,
                "API key environment variable is not set"
            );
            None
        }
    }
}

/// Factory for creating model clients from provider config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Creates a completion client based on provider type.
    ///
    /// Supported types:
    /// - `ollama`, `localai` → Ollama `/api/generate`
    /// - Others → OpenAI-compatible `/v1/completions` (default)
    pub fn create(config: &ModelProviderConfig, default_model: &str) -> Arc<dyn ModelProvider> {
        match config.provider_type.to_lowercase().as_str() {
            "ollama" | "localai" => Arc::new(OllamaClient::from_config(config, default_model)),
            _ => Arc::new(OpenAIClient::from_config(config, default_model)),
        }
    }

    /// Creates the client for the application's default provider.
    pub fn from_app_config(config: &AppConfig) -> Result<Arc<dyn ModelProvider>, ModelError> {
        let provider = config
            .providers
            .iter()
            .find(|p| p.id == config.default_provider)
            .ok_or_else(|| ModelError::provider_not_found(&config.default_provider))?;
        Ok(Self::create(provider, &config.model))
    }
}
