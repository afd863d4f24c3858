//! OpenAI-compatible completions client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::base::HttpClientBase;
use crate::config::ModelProviderConfig;
use crate::infrastructure::model::factory::resolve_api_key;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{
    CompletionRequest, CompletionResponse, ModelError,
};

/// OpenAI-compatible client using the legacy text-completion endpoint, which
/// accepts an already-rendered prompt (vLLM, llama.cpp server, TGI, ...).
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAIClient {
    pub fn from_config(config: &ModelProviderConfig, default_model: &str) -> Self {
        let api_key = resolve_api_key(&config.id, config.api_key.as_deref());
        Self {
            base: HttpClientBase::new(
                config.id.clone(),
                config.endpoint.clone(),
                api_key,
                default_model.to_string(),
            ),
            api_path: config
                .api_path
                .clone()
                .unwrap_or_else(|| "/v1/completions".to_string()),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAIClient {
    fn id(&self) -> &str {
        &self.base.id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let model = self.base.resolve_model(request.params.model.as_deref())?;

        let payload = OpenAIRequest {
            model: model.clone(),
            prompt: request.prompt,
            max_tokens: request.params.max_tokens,
            temperature: request.params.temperature,
            stop: request.params.stop,
            stream: false,
        };

        info!(
            provider = self.base.id.as_str(),
            model = model.as_str(),
            prompt_chars = payload.prompt.len(),
            "Sending completion request to OpenAI-compatible provider"
        );

        let response: OpenAIResponse = self.base.post_with_bearer(&url, &payload).await?;
        debug!("Received response from OpenAI-compatible provider");

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| CompletionResponse::new(choice.text))
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "no choices returned"))
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    text: String,
}
