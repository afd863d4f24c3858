use super::context::WorkflowContext;
use super::nodes;
use super::routes::{self, *};
use super::state::CodeRagState;
use crate::application::graph::{
    CompilationError, CompiledGraph, END, GraphError, MemoryCheckpointer, RunConfig, StateGraph,
    node_fn, route_fn,
};
use crate::types::Document;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const INITIALIZE_CODE_RAG: &str = "initialize_code_rag";
pub const REFORMULATE_QUERY: &str = "reformulate_query";
pub const GET_NEW_QUERY: &str = "get_new_query";
pub const GENERATE_SUBQUESTIONS: &str = "generate_subquestions";
pub const DETECT_ENTITIES: &str = "detect_entities";
pub const RETRIEVE: &str = "retrieve";
pub const GRADE_DOCUMENTS: &str = "grade_documents";
pub const GENERATE: &str = "generate";
pub const FAILURE_MSG: &str = "failure_msg";
pub const PASS_FROM_QA: &str = "pass_from_qa";
pub const PASS_TO_CODEGEN: &str = "pass_to_codegen";
pub const CODE_GENERATION: &str = "code_generation";
pub const DETERMINE_RUNNABLE_CODE: &str = "determine_runnable_code";
pub const REFACTOR_CODE: &str = "refactor_code";
pub const CODE_ERROR_MSG: &str = "code_error_msg";
pub const AGGREGATE_ANSWERS: &str = "aggregate_answers";
pub const RETURN_FINAL_ANSWER: &str = "return_final_answer";

/// Assemble the code-RAG topology.
pub fn code_rag_graph() -> StateGraph<CodeRagState, WorkflowContext> {
    let mut graph = StateGraph::new();

    graph
        .add_node(INITIALIZE_CODE_RAG, node_fn(nodes::initialize_code_rag))
        .add_node(REFORMULATE_QUERY, nodes::reformulate_query)
        .add_node(GET_NEW_QUERY, node_fn(nodes::pass_state))
        .add_node(GENERATE_SUBQUESTIONS, nodes::generate_subquestions)
        .add_node(DETECT_ENTITIES, nodes::detect_entities)
        .add_node(RETRIEVE, nodes::retrieve)
        .add_node(GRADE_DOCUMENTS, nodes::grade_documents)
        .add_node(GENERATE, nodes::generate)
        .add_node(FAILURE_MSG, nodes::failure_msg)
        .add_node(PASS_FROM_QA, node_fn(nodes::pass_from_qa))
        .add_node(PASS_TO_CODEGEN, node_fn(nodes::pass_to_codegen))
        .add_node(CODE_GENERATION, nodes::code_generation)
        .add_node(DETERMINE_RUNNABLE_CODE, nodes::determine_runnable_code)
        .add_node(REFACTOR_CODE, nodes::refactor_code)
        .add_node(CODE_ERROR_MSG, nodes::code_error_msg)
        .add_node(AGGREGATE_ANSWERS, nodes::aggregate_answers)
        .add_node(RETURN_FINAL_ANSWER, nodes::return_final_answer);

    graph
        .set_entry_point(INITIALIZE_CODE_RAG)
        .add_conditional_edges(
            INITIALIZE_CODE_RAG,
            route_fn(routes::use_examples),
            [
                (ANSWER_GENERATION, GET_NEW_QUERY),
                (EXAMPLE_SELECTION, REFORMULATE_QUERY),
            ],
        )
        .add_edge(REFORMULATE_QUERY, GET_NEW_QUERY)
        .add_conditional_edges(
            GET_NEW_QUERY,
            routes::route_question,
            [
                (ANSWER_GENERATION, DETECT_ENTITIES),
                (SUBQUERY_GENERATION, GENERATE_SUBQUESTIONS),
            ],
        )
        .add_edge(GENERATE_SUBQUESTIONS, DETECT_ENTITIES)
        .add_edge(DETECT_ENTITIES, RETRIEVE)
        .add_edge(RETRIEVE, GRADE_DOCUMENTS)
        .add_edge(GRADE_DOCUMENTS, GENERATE)
        .add_conditional_edges(
            GENERATE,
            routes::check_hallucinations,
            [
                ("not supported", FAILURE_MSG),
                ("useful", PASS_FROM_QA),
                ("not useful", FAILURE_MSG),
            ],
        )
        .add_edge(FAILURE_MSG, PASS_FROM_QA)
        .add_conditional_edges(
            PASS_FROM_QA,
            route_fn(routes::determine_cont),
            [(CONTINUE, PASS_TO_CODEGEN), (ITERATE, DETECT_ENTITIES)],
        )
        .add_conditional_edges(
            PASS_TO_CODEGEN,
            routes::route_question_to_code,
            [(LLM, AGGREGATE_ANSWERS), (CODEGEN, CODE_GENERATION)],
        )
        .add_edge(CODE_GENERATION, DETERMINE_RUNNABLE_CODE)
        .add_conditional_edges(
            DETERMINE_RUNNABLE_CODE,
            route_fn(routes::decide_to_refactor),
            [
                (EXECUTED, RETURN_FINAL_ANSWER),
                (EXCEPTION, REFACTOR_CODE),
                (UNSUCCESSFUL, CODE_ERROR_MSG),
            ],
        )
        .add_edge(REFACTOR_CODE, DETERMINE_RUNNABLE_CODE)
        .add_edge(CODE_ERROR_MSG, RETURN_FINAL_ANSWER)
        .add_edge(AGGREGATE_ANSWERS, RETURN_FINAL_ANSWER)
        .add_edge(RETURN_FINAL_ANSWER, END);

    graph
}

/// Final answer of a workflow run with the documents behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagResponse {
    pub answer: String,
    pub source_documents: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl RagResponse {
    fn from_state(state: CodeRagState, thread_id: Option<String>) -> Self {
        Self {
            answer: state.generation,
            source_documents: state.documents,
            thread_id,
        }
    }
}

/// Compiled code-RAG graph bound to its capabilities. Runs given a thread id
/// are checkpointed under it.
pub struct CodeRagWorkflow {
    graph: CompiledGraph<CodeRagState, WorkflowContext>,
    checkpointer: Arc<MemoryCheckpointer<CodeRagState>>,
    context: WorkflowContext,
}

impl CodeRagWorkflow {
    pub fn new(context: WorkflowContext) -> Result<Self, CompilationError> {
        let checkpointer = Arc::new(MemoryCheckpointer::<CodeRagState>::new());
        let graph = code_rag_graph().compile_with_checkpointer(checkpointer.clone())?;
        Ok(Self {
            graph,
            checkpointer,
            context,
        })
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    /// Answer `question`. Without a thread id nothing is stored, and the run
    /// is only traced under a generated run id.
    pub async fn call(
        &self,
        question: impl Into<String>,
        thread_id: Option<String>,
    ) -> Result<RagResponse, GraphError> {
        let question = question.into();
        let config = match &thread_id {
            Some(thread_id) => {
                info!(thread_id = %thread_id, %question, "Workflow call started");
                self.run_config().with_thread_id(thread_id.clone())
            }
            None => {
                info!(run_id = %Uuid::new_v4(), %question, "Workflow call started without a thread");
                self.run_config()
            }
        };

        let state = self
            .graph
            .invoke(CodeRagState::new(question), &self.context, &config)
            .await?;
        Ok(RagResponse::from_state(state, thread_id))
    }

    /// Continue a thread from its last checkpoint.
    pub async fn resume(&self, thread_id: &str) -> Result<RagResponse, GraphError> {
        let config = self.run_config().with_thread_id(thread_id);
        let state = self.graph.resume(&self.context, &config).await?;
        Ok(RagResponse::from_state(state, Some(thread_id.to_string())))
    }

    /// Number of threads with a stored checkpoint.
    pub async fn stored_threads(&self) -> usize {
        self.checkpointer.thread_count().await
    }

    /// Latest state stored for a thread.
    pub async fn state(&self, thread_id: &str) -> Result<Option<CodeRagState>, GraphError> {
        Ok(self
            .graph
            .checkpoint(thread_id)
            .await?
            .map(|checkpoint| checkpoint.state))
    }

    fn run_config(&self) -> RunConfig {
        RunConfig::default().with_recursion_limit(self.context.settings.recursion_limit)
    }
}
