//! Node handlers of the code-RAG graph. Each reads the state and returns the
//! fields it changes.

use super::context::WorkflowContext;
use super::state::{CodeRagState, StateUpdate};
use crate::application::graph::{NodeError, NodeFuture};
use tracing::{debug, info};

type Ctx = WorkflowContext;
type State = CodeRagState;

pub(super) fn initialize_code_rag(state: &State, ctx: &Ctx) -> Result<StateUpdate, NodeError> {
    info!(question = %state.question, "Initializing code-RAG run");
    Ok(StateUpdate {
        original_question: Some(state.question.clone()),
        subquestions: Some(Vec::new()),
        answers: Some(Vec::new()),
        rag_counter: Some(0),
        code_counter: Some(0),
        runnable: Some(false),
        error: Some(None),
        examples: Some(ctx.examples.clone()),
        ..StateUpdate::default()
    })
}

pub(super) fn reformulate_query<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let question = ctx
            .rag
            .reformulate_query(&state.question, &state.examples)
            .await?;
        debug!(%question, "Reformulated query");
        Ok(StateUpdate {
            question: Some(question),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn pass_state(_state: &State, _ctx: &Ctx) -> Result<StateUpdate, NodeError> {
    Ok(StateUpdate::default())
}

pub(super) fn generate_subquestions<'a>(
    state: &'a State,
    ctx: &'a Ctx,
) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let mut subquestions = ctx.rag.generate_subquestions(&state.question).await?;
        subquestions.retain(|question| !question.trim().is_empty());
        if subquestions.is_empty() {
            subquestions.push(state.question.clone());
        }
        info!(count = subquestions.len(), "Generated subquestions");
        Ok(StateUpdate {
            question: subquestions.first().cloned(),
            subquestions: Some(subquestions),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn detect_entities<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let entities = ctx.rag.detect_entities(&state.question).await?;
        debug!(?entities, "Detected entities");
        Ok(StateUpdate {
            entities: Some(entities.into_iter().collect()),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn retrieve<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let entities: Vec<String> = state.entities.iter().cloned().collect();
        let documents = ctx.rag.retrieve(&state.question, &entities).await?;
        debug!(count = documents.len(), "Retrieved documents");
        Ok(StateUpdate {
            documents: Some(documents),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn grade_documents<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let mut relevant = Vec::with_capacity(state.documents.len());
        for document in &state.documents {
            if ctx.rag.grade_document(&state.question, document).await? {
                relevant.push(document.clone());
            }
        }
        debug!(
            kept = relevant.len(),
            total = state.documents.len(),
            "Graded documents"
        );
        Ok(StateUpdate {
            documents: Some(relevant),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn generate<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let generation = ctx.rag.generate(&state.question, &state.documents).await?;
        Ok(StateUpdate {
            generation: Some(generation),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn failure_msg<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let generation = ctx.rag.failure_message(&state.question).await?;
        Ok(StateUpdate {
            generation: Some(generation),
            ..StateUpdate::default()
        })
    })
}

/// Record the current answer and move on to the next subquestion.
pub(super) fn pass_from_qa(state: &State, _ctx: &Ctx) -> Result<StateUpdate, NodeError> {
    let answered = state.answers.len() + 1;
    Ok(StateUpdate {
        push_answer: Some(state.generation.clone()),
        rag_counter: Some(state.rag_counter + 1),
        question: state.subquestions.get(answered).cloned(),
        ..StateUpdate::default()
    })
}

pub(super) fn pass_to_codegen(state: &State, _ctx: &Ctx) -> Result<StateUpdate, NodeError> {
    Ok(StateUpdate {
        question: Some(state.original_question.clone()),
        ..StateUpdate::default()
    })
}

pub(super) fn code_generation<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let code = ctx
            .codegen
            .generate_code(&state.original_question, &state.answers, &state.documents)
            .await?;
        Ok(StateUpdate {
            code: Some(code),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn determine_runnable_code<'a>(
    state: &'a State,
    ctx: &'a Ctx,
) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let check = ctx.codegen.check(&state.code).await;
        info!(
            runnable = check.runnable,
            attempt = state.code_counter,
            "Checked generated code"
        );
        Ok(StateUpdate {
            runnable: Some(check.runnable),
            code_output: Some(check.output),
            error: Some(check.error),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn refactor_code<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let error = state.error.as_deref().unwrap_or_default();
        let code = ctx
            .codegen
            .refactor(&state.original_question, &state.code, error)
            .await?;
        Ok(StateUpdate {
            code: Some(code),
            code_counter: Some(state.code_counter + 1),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn code_error_msg<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let error = state.error.as_deref().unwrap_or_default();
        let generation = ctx
            .codegen
            .error_message(&state.original_question, error)
            .await?;
        Ok(StateUpdate {
            generation: Some(generation),
            ..StateUpdate::default()
        })
    })
}

pub(super) fn aggregate_answers<'a>(state: &'a State, ctx: &'a Ctx) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        let generation = ctx
            .rag
            .aggregate(&state.original_question, &state.subquestions, &state.answers)
            .await?;
        Ok(StateUpdate {
            generation: Some(generation),
            ..StateUpdate::default()
        })
    })
}

/// Code that ran produces the answer from its output; every other path keeps
/// the generation it arrived with.
pub(super) fn return_final_answer<'a>(
    state: &'a State,
    ctx: &'a Ctx,
) -> NodeFuture<'a, StateUpdate> {
    Box::pin(async move {
        if !state.runnable {
            return Ok(StateUpdate::default());
        }
        let generation = ctx
            .codegen
            .final_answer(&state.original_question, &state.code, &state.code_output)
            .await?;
        Ok(StateUpdate {
            generation: Some(generation),
            ..StateUpdate::default()
        })
    })
}
