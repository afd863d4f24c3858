//! Runtime settings sections: `[agent]`, `[tools]`, `[workflow]`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_SANDBOX_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RAG_ITERATIONS: usize = 3;
pub const DEFAULT_MAX_CODE_ATTEMPTS: usize = 3;
pub const DEFAULT_WORKFLOW_RECURSION_LIMIT: usize = 50;
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSettings {
    pub max_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Interpreter used by the code execution tool and the workflow sandbox
    pub python: String,
    pub sandbox_timeout_secs: u64,
    /// SQLite file for the natural-language query tool; the tool is not
    /// registered when absent
    pub database: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            sandbox_timeout_secs: DEFAULT_SANDBOX_TIMEOUT_SECS,
            database: None,
        }
    }
}

/// A worked question/answer pair used to reformulate incoming questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleConfig {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub max_rag_iterations: usize,
    pub max_code_attempts: usize,
    pub recursion_limit: usize,
    pub top_k: usize,
    /// JSON-lines corpus for the keyword retriever
    pub corpus: Option<PathBuf>,
    pub examples: Vec<ExampleConfig>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_rag_iterations: DEFAULT_MAX_RAG_ITERATIONS,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            recursion_limit: DEFAULT_WORKFLOW_RECURSION_LIMIT,
            top_k: DEFAULT_TOP_K,
            corpus: None,
            examples: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawAgentSettings {
    pub(super) max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawToolsConfig {
    pub(super) python: Option<String>,
    pub(super) sandbox_timeout_secs: Option<u64>,
    pub(super) database: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawWorkflowConfig {
    pub(super) max_rag_iterations: Option<usize>,
    pub(super) max_code_attempts: Option<usize>,
    pub(super) recursion_limit: Option<usize>,
    pub(super) top_k: Option<usize>,
    pub(super) corpus: Option<String>,
    #[serde(default)]
    pub(super) examples: Vec<ExampleConfig>,
}
