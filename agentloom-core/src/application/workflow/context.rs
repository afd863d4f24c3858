use super::state::Example;
use crate::config::WorkflowConfig;
use crate::config::settings::{
    DEFAULT_MAX_CODE_ATTEMPTS, DEFAULT_MAX_RAG_ITERATIONS, DEFAULT_WORKFLOW_RECURSION_LIMIT,
};
use crate::infrastructure::retrieval::RetrievalError;
use crate::model::ModelError;
use crate::types::Document;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("unusable output from '{step}': {reason}")]
    InvalidOutput { step: &'static str, reason: String },
}

/// Outcome of grading a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not grounded in the retrieved documents.
    NotSupported,
    /// Grounded, but does not answer the question.
    NotUseful,
    Useful,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::NotSupported => "not supported",
            Verdict::NotUseful => "not useful",
            Verdict::Useful => "useful",
        }
    }
}

/// Result of running generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCheck {
    pub runnable: bool,
    pub output: String,
    pub error: Option<String>,
}

/// Retrieval and answer-generation steps.
#[async_trait]
pub trait RagCapability: Send + Sync {
    async fn reformulate_query(
        &self,
        question: &str,
        examples: &[Example],
    ) -> Result<String, WorkflowError>;

    /// Whether the question should be split into subquestions.
    async fn needs_decomposition(&self, question: &str) -> Result<bool, WorkflowError>;

    async fn generate_subquestions(&self, question: &str) -> Result<Vec<String>, WorkflowError>;

    async fn detect_entities(&self, question: &str) -> Result<Vec<String>, WorkflowError>;

    async fn retrieve(
        &self,
        question: &str,
        entities: &[String],
    ) -> Result<Vec<Document>, WorkflowError>;

    async fn grade_document(
        &self,
        question: &str,
        document: &Document,
    ) -> Result<bool, WorkflowError>;

    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, WorkflowError>;

    async fn assess(
        &self,
        question: &str,
        documents: &[Document],
        generation: &str,
    ) -> Result<Verdict, WorkflowError>;

    async fn failure_message(&self, question: &str) -> Result<String, WorkflowError>;

    async fn aggregate(
        &self,
        question: &str,
        subquestions: &[String],
        answers: &[String],
    ) -> Result<String, WorkflowError>;
}

/// Code generation, execution and repair steps.
#[async_trait]
pub trait CodegenCapability: Send + Sync {
    /// Whether answering the question requires running code.
    async fn needs_code(&self, question: &str, answers: &[String]) -> Result<bool, WorkflowError>;

    async fn generate_code(
        &self,
        question: &str,
        answers: &[String],
        documents: &[Document],
    ) -> Result<String, WorkflowError>;

    /// Execute `code`. Execution failures are reported in the check, not as errors.
    async fn check(&self, code: &str) -> CodeCheck;

    async fn refactor(
        &self,
        question: &str,
        code: &str,
        error: &str,
    ) -> Result<String, WorkflowError>;

    async fn error_message(&self, question: &str, error: &str) -> Result<String, WorkflowError>;

    async fn final_answer(
        &self,
        question: &str,
        code: &str,
        output: &str,
    ) -> Result<String, WorkflowError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub max_rag_iterations: usize,
    /// Refactor attempts allowed before giving up on code.
    pub max_code_attempts: usize,
    pub recursion_limit: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_rag_iterations: DEFAULT_MAX_RAG_ITERATIONS,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            recursion_limit: DEFAULT_WORKFLOW_RECURSION_LIMIT,
        }
    }
}

impl From<&WorkflowConfig> for WorkflowSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            max_rag_iterations: config.max_rag_iterations,
            max_code_attempts: config.max_code_attempts,
            recursion_limit: config.recursion_limit,
        }
    }
}

/// Capabilities and settings shared by every node of a workflow run.
#[derive(Clone)]
pub struct WorkflowContext {
    pub rag: Arc<dyn RagCapability>,
    pub codegen: Arc<dyn CodegenCapability>,
    pub examples: Vec<Example>,
    pub settings: WorkflowSettings,
}

impl WorkflowContext {
    pub fn new(rag: Arc<dyn RagCapability>, codegen: Arc<dyn CodegenCapability>) -> Self {
        Self {
            rag,
            codegen,
            examples: Vec::new(),
            settings: WorkflowSettings::default(),
        }
    }

    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }

    pub fn with_settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }
}
