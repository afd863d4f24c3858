use crate::application::graph::GraphState;
use crate::config::ExampleConfig;
use crate::types::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Worked question/answer pair used to steer query reformulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    pub answer: String,
}

impl From<&ExampleConfig> for Example {
    fn from(config: &ExampleConfig) -> Self {
        Self {
            question: config.question.clone(),
            answer: config.answer.clone(),
        }
    }
}

/// State threaded through the code-RAG graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeRagState {
    /// Question currently being answered; a subquestion while iterating.
    pub question: String,
    pub original_question: String,
    pub subquestions: Vec<String>,
    pub entities: BTreeSet<String>,
    pub documents: Vec<Document>,
    pub generation: String,
    pub answers: Vec<String>,
    pub code: String,
    pub code_output: String,
    pub runnable: bool,
    pub error: Option<String>,
    pub rag_counter: usize,
    pub code_counter: usize,
    pub examples: Vec<Example>,
}

impl CodeRagState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }
}

/// Partial state returned by a node. Present fields overwrite; `push_answer`
/// appends to `answers` after any overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub question: Option<String>,
    pub original_question: Option<String>,
    pub subquestions: Option<Vec<String>>,
    pub entities: Option<BTreeSet<String>>,
    pub documents: Option<Vec<Document>>,
    pub generation: Option<String>,
    pub answers: Option<Vec<String>>,
    pub push_answer: Option<String>,
    pub code: Option<String>,
    pub code_output: Option<String>,
    pub runnable: Option<bool>,
    pub error: Option<Option<String>>,
    pub rag_counter: Option<usize>,
    pub code_counter: Option<usize>,
    pub examples: Option<Vec<Example>>,
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl GraphState for CodeRagState {
    type Update = StateUpdate;

    fn merge(&mut self, update: StateUpdate) {
        overwrite(&mut self.question, update.question);
        overwrite(&mut self.original_question, update.original_question);
        overwrite(&mut self.subquestions, update.subquestions);
        overwrite(&mut self.entities, update.entities);
        overwrite(&mut self.documents, update.documents);
        overwrite(&mut self.generation, update.generation);
        overwrite(&mut self.answers, update.answers);
        if let Some(answer) = update.push_answer {
            self.answers.push(answer);
        }
        overwrite(&mut self.code, update.code);
        overwrite(&mut self.code_output, update.code_output);
        overwrite(&mut self.runnable, update.runnable);
        overwrite(&mut self.error, update.error);
        overwrite(&mut self.rag_counter, update.rag_counter);
        overwrite(&mut self.code_counter, update.code_counter);
        overwrite(&mut self.examples, update.examples);
    }
}
