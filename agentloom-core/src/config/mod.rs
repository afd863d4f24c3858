pub mod app;
pub mod error;
pub mod loader;
pub mod provider;
pub mod settings;

/// Default config file path - can be overridden via CLI argument
pub const CONFIG_PATH: &str = "config/agentloom.toml";

pub use app::AppConfig;
pub use error::ConfigError;
pub use provider::ModelProviderConfig;
pub use settings::{AgentSettings, ExampleConfig, ToolsConfig, WorkflowConfig};
