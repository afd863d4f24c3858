//! Model-backed capabilities: every step is one completion over a short
//! instruction prompt.

use super::context::{CodeCheck, CodegenCapability, RagCapability, Verdict, WorkflowError};
use super::state::Example;
use crate::application::agent::parser::{self, Extracted};
use crate::infrastructure::retrieval::DocumentRetriever;
use crate::infrastructure::sandbox::CodeSandbox;
use crate::model::{CompletionRequest, ModelParams, ModelProvider, PromptFormat};
use crate::types::Document;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

const GRADER_REPLY: &str =
    "Reply with a JSON object {\"score\": \"yes\"} or {\"score\": \"no\"} and nothing else.";
const LIST_REPLY: &str = "Reply with a JSON array of strings and nothing else.";

/// Completion plumbing shared by both capabilities.
#[derive(Clone)]
struct Completer {
    provider: Arc<dyn ModelProvider>,
    format: PromptFormat,
    params: ModelParams,
}

impl Completer {
    async fn ask(&self, system: &str, user: &str) -> Result<String, WorkflowError> {
        let prompt = self.format.render_single(system, user);
        let response = self
            .provider
            .complete(CompletionRequest::new(prompt, self.params.clone()))
            .await?;
        Ok(response.text.trim().to_string())
    }

    async fn ask_yes_no(
        &self,
        step: &'static str,
        system: &str,
        user: &str,
    ) -> Result<bool, WorkflowError> {
        let reply = self.ask(&format!("{system}\n{GRADER_REPLY}"), user).await?;
        parse_yes_no(&reply).ok_or_else(|| WorkflowError::InvalidOutput {
            step,
            reason: format!("expected a yes/no score, got '{reply}'"),
        })
    }

    async fn ask_list(&self, system: &str, user: &str) -> Result<Vec<String>, WorkflowError> {
        let reply = self.ask(&format!("{system}\n{LIST_REPLY}"), user).await?;
        Ok(parse_list(&reply))
    }
}

/// Reads `{"score": "yes"|"no"}`, falling back to a leading yes/no word.
pub(crate) fn parse_yes_no(text: &str) -> Option<bool> {
    if let Extracted::Parsed(Value::Object(map)) = parser::extract_json(text) {
        if let Some(score) = map.get("score").and_then(Value::as_str) {
            return yes_no_word(score);
        }
    }
    yes_no_word(text)
}

fn yes_no_word(text: &str) -> Option<bool> {
    let word: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    match word.as_str() {
        "yes" | "true" => Some(true),
        "no" | "false" => Some(false),
        _ => None,
    }
}

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]|[-*•])\s+").expect("valid list marker pattern"));

/// Reads a JSON array of strings, or one item per line with list markers
/// stripped.
pub(crate) fn parse_list(text: &str) -> Vec<String> {
    if let Extracted::Parsed(Value::Array(items)) = parser::extract_json(text) {
        return items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(value) => Some(value.trim().to_string()),
                _ => None,
            })
            .filter(|value| !value.is_empty())
            .collect();
    }
    text.lines()
        .map(|line| LIST_MARKER.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Body of the first fenced block, or the whole text when there is none.
pub(crate) fn strip_code_fences(text: &str) -> String {
    let Some(open) = text.find("```") else {
        return text.trim().to_string();
    };
    let after = &text[open + 3..];
    let body = after.split_once('\n').map_or("", |(_, rest)| rest);
    let body = body.split("```").next().unwrap_or_default();
    body.trim().to_string()
}

fn render_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "(no documents)".to_string();
    }
    documents
        .iter()
        .map(|document| match &document.source {
            Some(source) => format!("[{source}]\n{}", document.content),
            None => document.content.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct LlmRag {
    completer: Completer,
    retriever: Arc<dyn DocumentRetriever>,
}

impl LlmRag {
    pub fn new(provider: Arc<dyn ModelProvider>, retriever: Arc<dyn DocumentRetriever>) -> Self {
        Self {
            completer: Completer {
                provider,
                format: PromptFormat::default(),
                params: ModelParams::default(),
            },
            retriever,
        }
    }

    pub fn with_format(mut self, format: PromptFormat) -> Self {
        self.completer.format = format;
        self
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.completer.params = params;
        self
    }
}

#[async_trait]
impl RagCapability for LlmRag {
    async fn reformulate_query(
        &self,
        question: &str,
        examples: &[Example],
    ) -> Result<String, WorkflowError> {
        let shots = examples
            .iter()
            .map(|example| format!("Question: {}\nAnswer: {}", example.question, example.answer))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.completer
            .ask(
                "Rewrite the question so it is self-contained and well suited for document search, following the style of the examples. Reply with the rewritten question only.",
                &format!("Examples:\n{shots}\n\nQuestion: {question}"),
            )
            .await
    }

    async fn needs_decomposition(&self, question: &str) -> Result<bool, WorkflowError> {
        self.completer
            .ask_yes_no(
                "route_question",
                "Decide whether the question combines several independent questions that should be answered separately.",
                question,
            )
            .await
    }

    async fn generate_subquestions(&self, question: &str) -> Result<Vec<String>, WorkflowError> {
        self.completer
            .ask_list(
                "Break the question into the smallest set of standalone subquestions needed to answer it.",
                question,
            )
            .await
    }

    async fn detect_entities(&self, question: &str) -> Result<Vec<String>, WorkflowError> {
        self.completer
            .ask_list(
                "List the named entities (products, people, organisations, identifiers) mentioned in the question.",
                question,
            )
            .await
    }

    async fn retrieve(
        &self,
        question: &str,
        entities: &[String],
    ) -> Result<Vec<Document>, WorkflowError> {
        Ok(self.retriever.retrieve(question, entities).await?)
    }

    async fn grade_document(
        &self,
        question: &str,
        document: &Document,
    ) -> Result<bool, WorkflowError> {
        self.completer
            .ask_yes_no(
                "grade_documents",
                "Grade whether the document contains information relevant to the question.",
                &format!("Document:\n{}\n\nQuestion: {question}", document.content),
            )
            .await
    }

    async fn generate(
        &self,
        question: &str,
        documents: &[Document],
    ) -> Result<String, WorkflowError> {
        self.completer
            .ask(
                "Answer the question using only the provided context. Say so when the context is insufficient.",
                &format!("Context:\n{}\n\nQuestion: {question}", render_documents(documents)),
            )
            .await
    }

    async fn assess(
        &self,
        question: &str,
        documents: &[Document],
        generation: &str,
    ) -> Result<Verdict, WorkflowError> {
        let grounded = self
            .completer
            .ask_yes_no(
                "check_hallucinations",
                "Grade whether the answer is supported by the facts in the context.",
                &format!(
                    "Context:\n{}\n\nAnswer: {generation}",
                    render_documents(documents)
                ),
            )
            .await?;
        if !grounded {
            warn!("Generation not supported by documents");
            return Ok(Verdict::NotSupported);
        }

        let useful = self
            .completer
            .ask_yes_no(
                "check_hallucinations",
                "Grade whether the answer resolves the question.",
                &format!("Question: {question}\n\nAnswer: {generation}"),
            )
            .await?;
        Ok(if useful {
            Verdict::Useful
        } else {
            Verdict::NotUseful
        })
    }

    async fn failure_message(&self, question: &str) -> Result<String, WorkflowError> {
        self.completer
            .ask(
                "Politely explain that the available documents do not contain enough information to answer the question.",
                question,
            )
            .await
    }

    async fn aggregate(
        &self,
        question: &str,
        subquestions: &[String],
        answers: &[String],
    ) -> Result<String, WorkflowError> {
        if let [single] = answers {
            return Ok(single.clone());
        }
        let pairs = subquestions
            .iter()
            .zip(answers)
            .map(|(sub, answer)| format!("Q: {sub}\nA: {answer}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.completer
            .ask(
                "Combine the answers to the subquestions into one answer to the original question.",
                &format!("Original question: {question}\n\n{pairs}"),
            )
            .await
    }
}

pub struct LlmCodegen {
    completer: Completer,
    sandbox: Arc<dyn CodeSandbox>,
}

impl LlmCodegen {
    pub fn new(provider: Arc<dyn ModelProvider>, sandbox: Arc<dyn CodeSandbox>) -> Self {
        Self {
            completer: Completer {
                provider,
                format: PromptFormat::default(),
                params: ModelParams::default(),
            },
            sandbox,
        }
    }

    pub fn with_format(mut self, format: PromptFormat) -> Self {
        self.completer.format = format;
        self
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.completer.params = params;
        self
    }
}

#[async_trait]
impl CodegenCapability for LlmCodegen {
    async fn needs_code(&self, question: &str, answers: &[String]) -> Result<bool, WorkflowError> {
        self.completer
            .ask_yes_no(
                "route_question_to_code",
                "Decide whether answering the question requires computation that should be done by running Python code.",
                &format!("Question: {question}\n\nKnown facts:\n{}", answers.join("\n")),
            )
            .await
    }

    async fn generate_code(
        &self,
        question: &str,
        answers: &[String],
        documents: &[Document],
    ) -> Result<String, WorkflowError> {
        let reply = self
            .completer
            .ask(
                "Write a self-contained Python script that computes the answer and prints it. Reply with a single ```python code block.",
                &format!(
                    "Question: {question}\n\nKnown facts:\n{}\n\nContext:\n{}",
                    answers.join("\n"),
                    render_documents(documents)
                ),
            )
            .await?;
        let code = strip_code_fences(&reply);
        if code.is_empty() {
            return Err(WorkflowError::InvalidOutput {
                step: "code_generation",
                reason: "model returned no code".to_string(),
            });
        }
        Ok(code)
    }

    async fn check(&self, code: &str) -> CodeCheck {
        if code.trim().is_empty() {
            return CodeCheck {
                runnable: false,
                output: String::new(),
                error: Some("no code to run".to_string()),
            };
        }
        match self.sandbox.run(code).await {
            Ok(output) => CodeCheck {
                runnable: true,
                output,
                error: None,
            },
            Err(err) => {
                debug!(error = %err, "Generated code failed");
                CodeCheck {
                    runnable: false,
                    output: String::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn refactor(
        &self,
        question: &str,
        code: &str,
        error: &str,
    ) -> Result<String, WorkflowError> {
        let reply = self
            .completer
            .ask(
                "Fix the Python script so it runs without errors and still answers the question. Reply with a single ```python code block.",
                &format!("Question: {question}\n\nScript:\n```python\n{code}\n```\n\nError:\n{error}"),
            )
            .await?;
        Ok(strip_code_fences(&reply))
    }

    async fn error_message(&self, question: &str, error: &str) -> Result<String, WorkflowError> {
        self.completer
            .ask(
                "Explain briefly that the computation needed to answer the question could not be completed, mentioning the last error.",
                &format!("Question: {question}\n\nLast error: {error}"),
            )
            .await
    }

    async fn final_answer(
        &self,
        question: &str,
        code: &str,
        output: &str,
    ) -> Result<String, WorkflowError> {
        self.completer
            .ask(
                "Answer the question using the output of the script.",
                &format!("Question: {question}\n\nScript:\n```python\n{code}\n```\n\nOutput:\n{output}"),
            )
            .await
    }
}
