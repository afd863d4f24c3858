use super::builtin::calculator::CalculatorError;
use crate::infrastructure::database::DatabaseError;
use crate::infrastructure::sandbox::SandboxError;
use crate::model::ModelError;
use thiserror::Error;

/// Failure inside a tool handler. Recoverable: the loop shows it to the model.
#[derive(Debug, Error)]
pub enum ToolExecutionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("generation failed: {0}")]
    Generation(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("failed to execute tool '{tool}': {source}")]
    Execution {
        tool: String,
        #[source]
        source: ToolExecutionError,
    },
}

impl ToolError {
    pub fn user_message(&self) -> String {
        match self {
            ToolError::UnknownTool(name) => format!("Tool \"{name}\" is not registered."),
            ToolError::Execution { tool, source } => {
                format!("Tool \"{tool}\" failed: {source}")
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
    #[error("tool name '{0}' is reserved")]
    Reserved(String),
    #[error("tool name must not be empty")]
    EmptyName,
}
