//! # Provider Configuration
//!
//! | Type | Endpoint used | API Key Required |
//! |------|---------------|-----------------|
//! | `ollama` | `/api/generate` (raw prompt) | No |
//! | anything else | OpenAI-compatible `/v1/completions` | Yes |

use serde::{Deserialize, Serialize};

/// Configuration for a completion backend.
///
/// # Example
///
/// ```toml
/// [[providers]]
/// id = "local"
/// type = "ollama"
/// endpoint = "http://127.0.0.1:11434"
/// models = ["llama3"]
/// ```
///
/// When `models` is non-empty the top-level `model` must be one of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelProviderConfig {
    pub id: String,
    /// Determines the wire format: "ollama" or OpenAI-compatible
    #[serde(rename = "type")]
    pub provider_type: String,
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: String,
    #[serde(rename = "type", default)]
    pub(super) provider_type: String,
    pub(super) endpoint: Option<String>,
    pub(super) api_key: Option<String>,
    #[serde(default)]
    pub(super) api_path: Option<String>,
    #[serde(default)]
    pub(super) models: Vec<String>,
}

impl From<RawProviderConfig> for ModelProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        Self {
            id: raw.id,
            provider_type: raw.provider_type,
            endpoint: raw.endpoint.unwrap_or_default(),
            api_key: raw.api_key,
            api_path: raw.api_path,
            models: raw.models,
        }
    }
}

impl ModelProviderConfig {
    /// Whether `model` may be requested from this provider. An empty list
    /// accepts any model.
    pub fn serves(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|name| name == model)
    }
}
