//! Agent orchestration core: a function-calling loop over a tool registry,
//! and a state-graph engine running a retrieval + code-generation workflow.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, graph, tooling, workflow};
pub use config::{AppConfig, ConfigError};
pub use domain::types;
pub use infrastructure::{database, model, retrieval, sandbox};
