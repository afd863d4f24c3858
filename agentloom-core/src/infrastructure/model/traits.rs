//! Model traits

use super::types::{CompletionRequest, CompletionResponse, ModelError};
use async_trait::async_trait;

/// Text-completion backend.
///
/// The prompt is already rendered into the backend's turn format; parameters
/// are passed through untouched.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider identifier used in logs and errors.
    fn id(&self) -> &str;

    /// Complete a rendered prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError>;
}
