use super::error::ConfigError;
use super::provider::ModelProviderConfig;
use super::settings::{AgentSettings, ToolsConfig, WorkflowConfig};
use crate::model::{ModelParams, PromptFormat};
use std::path::Path;

/// Application configuration loaded from agentloom.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_provider: String,
    pub model: String,
    pub prompt_format: PromptFormat,
    pub params: ModelParams,
    pub providers: Vec<ModelProviderConfig>,
    pub agent: AgentSettings,
    pub tools: ToolsConfig,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        super::loader::parse_config(content, Path::new("<inline>"))
    }

    /// Model parameters with the configured model filled in
    pub fn model_params(&self) -> ModelParams {
        let mut params = self.params.clone();
        if params.model.is_none() {
            params.model = Some(self.model.clone());
        }
        params
    }
}
