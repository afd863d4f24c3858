use crate::model::ModelError;
use crate::types::ChatMessage;
use thiserror::Error;

/// Fatal loop errors. Every variant raised after the first model turn carries
/// the conversation as it stood, including the offending assistant turn.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("could not parse tool calls from model output: {reason}")]
    Parse {
        reason: String,
        raw: String,
        history: Vec<ChatMessage>,
    },
    #[error("model response contained no tool calls")]
    EmptyToolCalls { history: Vec<ChatMessage> },
    #[error("unknown tool requested: {name}")]
    UnknownTool {
        name: String,
        history: Vec<ChatMessage>,
    },
    #[error("final answer was combined with other tool calls in a batch of {total}")]
    MixedBatch {
        total: usize,
        history: Vec<ChatMessage>,
    },
    #[error("no final answer after {iterations} iteration(s)")]
    BudgetExhausted {
        iterations: usize,
        history: Vec<ChatMessage>,
    },
}

impl AgentError {
    pub(crate) fn parse(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        AgentError::Parse {
            reason: reason.into(),
            raw: raw.into(),
            history: Vec::new(),
        }
    }

    /// Replace the recorded conversation on variants that carry one.
    pub(crate) fn with_history(mut self, conversation: Vec<ChatMessage>) -> Self {
        match &mut self {
            AgentError::Parse { history, .. }
            | AgentError::EmptyToolCalls { history }
            | AgentError::UnknownTool { history, .. }
            | AgentError::MixedBatch { history, .. }
            | AgentError::BudgetExhausted { history, .. } => *history = conversation,
            AgentError::Model(_) => {}
        }
        self
    }

    /// Conversation at the point of failure, when the variant records one.
    pub fn history(&self) -> Option<&[ChatMessage]> {
        match self {
            AgentError::Parse { history, .. }
            | AgentError::EmptyToolCalls { history }
            | AgentError::UnknownTool { history, .. }
            | AgentError::MixedBatch { history, .. }
            | AgentError::BudgetExhausted { history, .. } => Some(history),
            AgentError::Model(_) => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AgentError::Model(err) => err.user_message(),
            AgentError::Parse { .. }
            | AgentError::EmptyToolCalls { .. }
            | AgentError::MixedBatch { .. } => {
                "The model produced a response that could not be understood. Try rephrasing the request."
                    .to_string()
            }
            AgentError::UnknownTool { name, .. } => {
                format!("The model asked for a tool named \"{name}\" which is not available.")
            }
            AgentError::BudgetExhausted { iterations, .. } => {
                format!("No final answer was reached within {iterations} step(s).")
            }
        }
    }
}
