//! Branch predicates of the code-RAG graph.

use super::context::WorkflowContext;
use super::state::CodeRagState;
use crate::application::graph::RouteFuture;

pub const EXAMPLE_SELECTION: &str = "example_selection";
pub const ANSWER_GENERATION: &str = "answer_generation";
pub const SUBQUERY_GENERATION: &str = "subquery_generation";
pub const ITERATE: &str = "iterate";
pub const CONTINUE: &str = "continue";
pub const CODEGEN: &str = "codegen";
pub const LLM: &str = "llm";
pub const EXECUTED: &str = "executed";
pub const EXCEPTION: &str = "exception";
pub const UNSUCCESSFUL: &str = "unsuccessful";

pub fn use_examples(state: &CodeRagState, _ctx: &WorkflowContext) -> &'static str {
    if state.examples.is_empty() {
        ANSWER_GENERATION
    } else {
        EXAMPLE_SELECTION
    }
}

pub fn route_question<'a>(state: &'a CodeRagState, ctx: &'a WorkflowContext) -> RouteFuture<'a> {
    Box::pin(async move {
        let label = if ctx.rag.needs_decomposition(&state.question).await? {
            SUBQUERY_GENERATION
        } else {
            ANSWER_GENERATION
        };
        Ok(label.to_string())
    })
}

pub fn check_hallucinations<'a>(
    state: &'a CodeRagState,
    ctx: &'a WorkflowContext,
) -> RouteFuture<'a> {
    Box::pin(async move {
        let verdict = ctx
            .rag
            .assess(&state.question, &state.documents, &state.generation)
            .await?;
        Ok(verdict.label().to_string())
    })
}

pub fn determine_cont(state: &CodeRagState, ctx: &WorkflowContext) -> &'static str {
    let pending = state.answers.len() < state.subquestions.len();
    if pending && state.rag_counter < ctx.settings.max_rag_iterations {
        ITERATE
    } else {
        CONTINUE
    }
}

pub fn route_question_to_code<'a>(
    state: &'a CodeRagState,
    ctx: &'a WorkflowContext,
) -> RouteFuture<'a> {
    Box::pin(async move {
        let label = if ctx
            .codegen
            .needs_code(&state.original_question, &state.answers)
            .await?
        {
            CODEGEN
        } else {
            LLM
        };
        Ok(label.to_string())
    })
}

pub fn decide_to_refactor(state: &CodeRagState, ctx: &WorkflowContext) -> &'static str {
    if state.runnable {
        EXECUTED
    } else if state.code_counter < ctx.settings.max_code_attempts {
        EXCEPTION
    } else {
        UNSUCCESSFUL
    }
}
