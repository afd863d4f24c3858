use super::*;
use crate::application::graph::GraphError;
use crate::types::Document;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Deterministic stand-in for both capabilities that records each call.
struct Scripted {
    decompose: bool,
    subquestions: Vec<String>,
    verdict: Verdict,
    needs_code: bool,
    /// Number of failed checks before code runs; `None` never runs.
    runs_after: Option<usize>,
    checks: Mutex<usize>,
    calls: Mutex<Vec<String>>,
}

impl Scripted {
    fn new() -> Self {
        Self {
            decompose: false,
            subquestions: Vec::new(),
            verdict: Verdict::Useful,
            needs_code: false,
            runs_after: Some(0),
            checks: Mutex::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    async fn record(&self, call: impl Into<String>) {
        self.calls.lock().await.push(call.into());
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl RagCapability for Scripted {
    async fn reformulate_query(
        &self,
        question: &str,
        examples: &[Example],
    ) -> Result<String, WorkflowError> {
        self.record(format!("reformulate:{}", examples.len())).await;
        Ok(format!("{question} (reformulated)"))
    }

    async fn needs_decomposition(&self, _question: &str) -> Result<bool, WorkflowError> {
        Ok(self.decompose)
    }

    async fn generate_subquestions(&self, _question: &str) -> Result<Vec<String>, WorkflowError> {
        self.record("subquestions").await;
        Ok(self.subquestions.clone())
    }

    async fn detect_entities(&self, question: &str) -> Result<Vec<String>, WorkflowError> {
        self.record(format!("entities:{question}")).await;
        Ok(vec!["Acme".to_string()])
    }

    async fn retrieve(
        &self,
        question: &str,
        entities: &[String],
    ) -> Result<Vec<Document>, WorkflowError> {
        assert_eq!(entities, ["Acme".to_string()]);
        Ok(vec![
            Document::new(format!("relevant to {question}")).with_source("kb.md"),
            Document::new("noise"),
        ])
    }

    async fn grade_document(
        &self,
        _question: &str,
        document: &Document,
    ) -> Result<bool, WorkflowError> {
        Ok(document.content != "noise")
    }

    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, WorkflowError> {
        self.record(format!("generate:{question}")).await;
        Ok(format!("answer to {question} from {} doc(s)", documents.len()))
    }

    async fn assess(
        &self,
        _question: &str,
        _documents: &[Document],
        _generation: &str,
    ) -> Result<Verdict, WorkflowError> {
        Ok(self.verdict)
    }

    async fn failure_message(&self, question: &str) -> Result<String, WorkflowError> {
        self.record("failure").await;
        Ok(format!("no information about {question}"))
    }

    async fn aggregate(
        &self,
        _question: &str,
        _subquestions: &[String],
        answers: &[String],
    ) -> Result<String, WorkflowError> {
        self.record(format!("aggregate:{}", answers.len())).await;
        Ok(answers.join(" | "))
    }
}

#[async_trait]
impl CodegenCapability for Scripted {
    async fn needs_code(&self, _question: &str, _answers: &[String]) -> Result<bool, WorkflowError> {
        Ok(self.needs_code)
    }

    async fn generate_code(
        &self,
        _question: &str,
        _answers: &[String],
        _documents: &[Document],
    ) -> Result<String, WorkflowError> {
        self.record("codegen").await;
        Ok("print(1 / 0)".to_string())
    }

    async fn check(&self, _code: &str) -> CodeCheck {
        let mut checks = self.checks.lock().await;
        let failures = *checks;
        *checks += 1;
        match self.runs_after {
            Some(needed) if failures >= needed => CodeCheck {
                runnable: true,
                output: "42\n".to_string(),
                error: None,
            },
            _ => CodeCheck {
                runnable: false,
                output: String::new(),
                error: Some("ZeroDivisionError".to_string()),
            },
        }
    }

    async fn refactor(
        &self,
        _question: &str,
        code: &str,
        error: &str,
    ) -> Result<String, WorkflowError> {
        self.record(format!("refactor:{error}")).await;
        Ok(format!("{code}  # fixed"))
    }

    async fn error_message(&self, _question: &str, error: &str) -> Result<String, WorkflowError> {
        self.record("code_error").await;
        Ok(format!("could not compute: {error}"))
    }

    async fn final_answer(
        &self,
        _question: &str,
        _code: &str,
        output: &str,
    ) -> Result<String, WorkflowError> {
        self.record("final").await;
        Ok(format!("The result is {}", output.trim()))
    }
}

fn workflow(script: Scripted, settings: WorkflowSettings) -> (CodeRagWorkflow, Arc<Scripted>) {
    workflow_with_examples(script, settings, Vec::new())
}

fn workflow_with_examples(
    script: Scripted,
    settings: WorkflowSettings,
    examples: Vec<Example>,
) -> (CodeRagWorkflow, Arc<Scripted>) {
    let script = Arc::new(script);
    let context = WorkflowContext::new(script.clone(), script.clone())
        .with_settings(settings)
        .with_examples(examples);
    let workflow = CodeRagWorkflow::new(context).expect("topology compiles");
    (workflow, script)
}

#[tokio::test]
async fn answers_directly_without_code() {
    let (workflow, script) = workflow(Scripted::new(), WorkflowSettings::default());

    let response = workflow
        .call("What does Acme sell?", Some("t1".into()))
        .await
        .expect("workflow succeeds");

    assert_eq!(response.answer, "answer to What does Acme sell? from 1 doc(s)");
    assert_eq!(response.source_documents.len(), 1);
    assert_eq!(response.source_documents[0].source.as_deref(), Some("kb.md"));
    assert_eq!(response.thread_id.as_deref(), Some("t1"));
    assert_eq!(workflow.stored_threads().await, 1);
    assert_eq!(
        script.calls().await,
        vec![
            "entities:What does Acme sell?",
            "generate:What does Acme sell?",
            "aggregate:1",
        ]
    );
}

#[tokio::test]
async fn examples_trigger_reformulation() {
    let examples = vec![Example {
        question: "Q?".into(),
        answer: "A.".into(),
    }];
    let (workflow, script) =
        workflow_with_examples(Scripted::new(), WorkflowSettings::default(), examples);

    workflow.call("Why?", None).await.expect("workflow succeeds");

    let calls = script.calls().await;
    assert_eq!(calls[0], "reformulate:1");
    assert_eq!(calls[1], "entities:Why? (reformulated)");
}

#[tokio::test]
async fn iterates_over_subquestions_then_aggregates() {
    let mut script = Scripted::new();
    script.decompose = true;
    script.subquestions = vec!["first?".into(), "second?".into()];
    let (workflow, script) = workflow(script, WorkflowSettings::default());

    let response = workflow
        .call("first and second?", Some("t2".into()))
        .await
        .expect("workflow succeeds");

    assert_eq!(
        response.answer,
        "answer to first? from 1 doc(s) | answer to second? from 1 doc(s)"
    );
    assert_eq!(script.count("generate:").await, 2);
    assert_eq!(script.count("aggregate:2").await, 1);

    let state = workflow
        .state("t2")
        .await
        .expect("store readable")
        .expect("state saved");
    assert_eq!(state.rag_counter, 2);
    assert_eq!(state.answers.len(), 2);
    assert_eq!(state.original_question, "first and second?");
}

#[tokio::test]
async fn rag_iterations_are_bounded() {
    let mut script = Scripted::new();
    script.decompose = true;
    script.subquestions = vec!["a?".into(), "b?".into(), "c?".into()];
    let settings = WorkflowSettings {
        max_rag_iterations: 2,
        ..WorkflowSettings::default()
    };
    let (workflow, script) = workflow(script, settings);

    workflow.call("abc?", None).await.expect("workflow succeeds");

    assert_eq!(script.count("generate:").await, 2);
    assert_eq!(script.count("aggregate:2").await, 1);
}

#[tokio::test]
async fn unsupported_answers_become_failure_messages() {
    let mut script = Scripted::new();
    script.verdict = Verdict::NotSupported;
    let (workflow, script) = workflow(script, WorkflowSettings::default());

    let response = workflow.call("Who?", None).await.expect("workflow succeeds");

    assert_eq!(response.answer, "no information about Who?");
    assert_eq!(script.count("failure").await, 1);
}

#[tokio::test]
async fn runnable_code_produces_final_answer() {
    let mut script = Scripted::new();
    script.needs_code = true;
    let (workflow, script) = workflow(script, WorkflowSettings::default());

    let response = workflow.call("Compute it", None).await.expect("workflow succeeds");

    assert_eq!(response.answer, "The result is 42");
    assert_eq!(script.count("refactor").await, 0);
    assert_eq!(script.count("aggregate").await, 0);
}

#[tokio::test]
async fn refactors_until_code_runs() {
    let mut script = Scripted::new();
    script.needs_code = true;
    script.runs_after = Some(2);
    let (workflow, script) = workflow(script, WorkflowSettings::default());

    let response = workflow.call("Compute it", None).await.expect("workflow succeeds");

    assert_eq!(response.answer, "The result is 42");
    assert_eq!(script.count("refactor:ZeroDivisionError").await, 2);
}

#[tokio::test]
async fn refactor_attempts_never_exceed_the_limit() {
    for max_code_attempts in 0..=4 {
        let mut script = Scripted::new();
        script.needs_code = true;
        script.runs_after = None;
        let settings = WorkflowSettings {
            max_code_attempts,
            ..WorkflowSettings::default()
        };
        let (workflow, script) = workflow(script, settings);

        let response = workflow
            .call("Compute it", Some(format!("n{max_code_attempts}")))
            .await
            .expect("workflow succeeds");

        assert_eq!(response.answer, "could not compute: ZeroDivisionError");
        assert_eq!(script.count("refactor").await, max_code_attempts);
        assert_eq!(*script.checks.lock().await, max_code_attempts + 1);

        let state = workflow
            .state(&format!("n{max_code_attempts}"))
            .await
            .expect("store readable")
            .expect("state saved");
        assert_eq!(state.code_counter, max_code_attempts);
        assert!(!state.runnable);
    }
}

#[tokio::test]
async fn recursion_limit_stops_the_walk() {
    let mut script = Scripted::new();
    script.needs_code = true;
    script.runs_after = None;
    let settings = WorkflowSettings {
        max_code_attempts: 100,
        recursion_limit: 20,
        ..WorkflowSettings::default()
    };
    let (workflow, _script) = workflow(script, settings);

    let err = workflow
        .call("Compute it", None)
        .await
        .expect_err("limit reached");
    assert!(matches!(err, GraphError::RecursionExceeded { limit: 20, .. }));
}

#[tokio::test]
async fn calls_without_a_thread_leave_no_checkpoint() {
    let (workflow, _script) = workflow(Scripted::new(), WorkflowSettings::default());

    for _ in 0..3 {
        let response = workflow
            .call("What does Acme sell?", None)
            .await
            .expect("workflow succeeds");
        assert_eq!(response.thread_id, None);
    }

    assert_eq!(workflow.stored_threads().await, 0);
}

#[tokio::test]
async fn finished_threads_resume_to_the_same_answer() {
    let (workflow, _script) = workflow(Scripted::new(), WorkflowSettings::default());

    let first = workflow
        .call("What does Acme sell?", Some("again".into()))
        .await
        .expect("workflow succeeds");
    let resumed = workflow.resume("again").await.expect("resume succeeds");

    assert_eq!(resumed, first);
}
