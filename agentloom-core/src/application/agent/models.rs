use crate::types::ChatMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::config::settings::DEFAULT_MAX_ITERATIONS;

/// One tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool: String,
    #[serde(default)]
    pub tool_input: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentStep {
    pub iteration: usize,
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub response: String,
    pub iterations: usize,
    pub steps: Vec<AgentStep>,
    pub history: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub max_iterations: usize,
    /// Prepended to the generated tool instructions.
    pub system_prompt: Option<String>,
}

impl AgentOptions {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            system_prompt: None,
        }
    }
}
