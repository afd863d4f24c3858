//! Retrieval-augmented answering with optional code generation, run on the
//! graph engine.

mod builder;
mod context;
mod llm;
mod nodes;
pub mod routes;
mod state;

#[cfg(test)]
mod tests;

pub use builder::{CodeRagWorkflow, RagResponse, code_rag_graph};
pub use context::{
    CodeCheck, CodegenCapability, RagCapability, Verdict, WorkflowContext, WorkflowError,
    WorkflowSettings,
};
pub use llm::{LlmCodegen, LlmRag};
pub use state::{CodeRagState, Example, StateUpdate};
