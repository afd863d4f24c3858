use super::CONFIG_PATH;
use super::error::ConfigError;
use super::provider::{ModelProviderConfig, RawProviderConfig};
use super::settings::{
    AgentSettings, RawAgentSettings, RawToolsConfig, RawWorkflowConfig, ToolsConfig,
    WorkflowConfig,
};
use crate::model::{ModelParams, PromptFormat};
use dotenvy::from_filename;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<String>,
    pub default_provider: Option<String>,
    pub prompt_format: Option<String>,
    #[serde(default)]
    pub params: ModelParams,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
    #[serde(default)]
    pub agent: RawAgentSettings,
    #[serde(default)]
    pub tools: RawToolsConfig,
    #[serde(default)]
    pub workflow: RawWorkflowConfig,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename("config/.env");
    });
}

/// Load and validate configuration from a file path
pub fn load_config(path: Option<&Path>) -> Result<super::AppConfig, ConfigError> {
    ensure_env_loaded();
    let config_path = path.unwrap_or_else(|| Path::new(CONFIG_PATH));
    read_config(config_path)
}

fn read_config(path: &Path) -> Result<super::AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading agentloom configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

pub(super) fn parse_config(content: &str, path: &Path) -> Result<super::AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<super::AppConfig, ConfigError> {
    let model = parsed.model.ok_or(ConfigError::MissingModel)?;
    let default_provider = parsed
        .default_provider
        .ok_or(ConfigError::MissingDefaultProvider)?;

    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut providers: Vec<ModelProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider.endpoint.is_none() {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        providers.push(ModelProviderConfig::from(raw_provider));
    }
    let Some(provider) = providers.iter().find(|p| p.id == default_provider) else {
        return Err(ConfigError::ProviderNotFound {
            provider: default_provider,
            available: providers.iter().map(|p| p.id.clone()).collect(),
        });
    };
    if !provider.serves(&model) {
        return Err(ConfigError::InvalidValue {
            field: "model".into(),
            reason: format!(
                "provider '{}' does not list model '{model}' (available: {})",
                provider.id,
                provider.models.join(", ")
            ),
        });
    }

    let prompt_format = match parsed.prompt_format.as_deref() {
        None => PromptFormat::default(),
        Some(raw) => PromptFormat::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
            field: "prompt_format".into(),
            reason: format!("unknown format '{raw}', expected 'llama3' or 'chatml'"),
        })?,
    };

    Ok(super::AppConfig {
        default_provider,
        model,
        prompt_format,
        params: parsed.params,
        providers,
        agent: build_agent(parsed.agent)?,
        tools: build_tools(parsed.tools)?,
        workflow: build_workflow(parsed.workflow)?,
    })
}

fn build_agent(raw: RawAgentSettings) -> Result<AgentSettings, ConfigError> {
    let defaults = AgentSettings::default();
    let max_iterations = positive("agent.max_iterations", raw.max_iterations)?
        .unwrap_or(defaults.max_iterations);
    Ok(AgentSettings { max_iterations })
}

fn build_tools(raw: RawToolsConfig) -> Result<ToolsConfig, ConfigError> {
    let defaults = ToolsConfig::default();
    let sandbox_timeout_secs = positive(
        "tools.sandbox_timeout_secs",
        raw.sandbox_timeout_secs.map(|v| v as usize),
    )?
    .map(|v| v as u64)
    .unwrap_or(defaults.sandbox_timeout_secs);
    Ok(ToolsConfig {
        python: raw.python.unwrap_or(defaults.python),
        sandbox_timeout_secs,
        database: raw.database.as_deref().map(expand_path),
    })
}

fn build_workflow(raw: RawWorkflowConfig) -> Result<WorkflowConfig, ConfigError> {
    let defaults = WorkflowConfig::default();
    Ok(WorkflowConfig {
        max_rag_iterations: positive("workflow.max_rag_iterations", raw.max_rag_iterations)?
            .unwrap_or(defaults.max_rag_iterations),
        // zero refactor attempts is allowed: failures go straight to the error message
        max_code_attempts: raw.max_code_attempts.unwrap_or(defaults.max_code_attempts),
        recursion_limit: positive("workflow.recursion_limit", raw.recursion_limit)?
            .unwrap_or(defaults.recursion_limit),
        top_k: positive("workflow.top_k", raw.top_k)?.unwrap_or(defaults.top_k),
        corpus: raw.corpus.as_deref().map(expand_path),
        examples: raw.examples,
    })
}

fn positive(field: &str, value: Option<usize>) -> Result<Option<usize>, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "must be greater than zero".into(),
        }),
        other => Ok(other),
    }
}

fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(err) => {
            debug!(path = raw, %err, "Path expansion failed, using raw value");
            PathBuf::from(raw)
        }
    }
}
