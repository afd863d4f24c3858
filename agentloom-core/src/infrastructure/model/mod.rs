//! Model backend: completion request/response types, the provider trait,
//! prompt rendering, and HTTP clients.

#[cfg(feature = "http-providers")]
pub mod clients;
#[cfg(feature = "http-providers")]
pub mod factory;
pub mod template;
pub mod traits;
pub mod types;

#[cfg(feature = "http-providers")]
pub use clients::{OllamaClient, OpenAIClient};
#[cfg(feature = "http-providers")]
pub use factory::ProviderFactory;
pub use template::PromptFormat;
pub use traits::ModelProvider;
pub use types::{CompletionRequest, CompletionResponse, ModelError, ModelParams};
