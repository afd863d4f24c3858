//! Ollama client implementation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{
    CompletionRequest, CompletionResponse, ModelError,
};

/// Ollama client for local LLM, driven through the raw `/api/generate` endpoint
#[derive(Clone)]
pub struct OllamaClient {
    base: HttpClientBase,
}

impl OllamaClient {
    /// Creates client from provider config.
    pub fn from_config(config: &ModelProviderConfig, default_model: &str) -> Self {
        Self {
            base: HttpClientBase::new(
                config.id.clone(),
                config.endpoint.clone(),
                None,
                default_model.to_string(),
            ),
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let url = self.base.build_url("/api/generate");
        let model = self.base.resolve_model(request.params.model.as_deref())?;

        let payload = OllamaRequest {
            model: model.clone(),
            prompt: request.prompt,
            raw: true,
            stream: false,
            options: OllamaOptions {
                num_predict: request.params.max_tokens,
                temperature: request.params.temperature,
                stop: request.params.stop,
            },
        };

        info!(
            provider = self.base.id.as_str(),
            model = model.as_str(),
            prompt_chars = payload.prompt.len(),
            "Sending completion request to Ollama"
        );

        let response: OllamaResponse = self.base.post_no_auth(&url, &payload).await?;
        debug!("Received response from Ollama");

        response
            .response
            .map(CompletionResponse::new)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing response field"))
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    raw: bool,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}
