// Shared test doubles for the integration suites.
#![allow(dead_code)]

use agentloom_core::model::{CompletionRequest, CompletionResponse, ModelError, ModelProvider};
use agentloom_core::sandbox::{CodeSandbox, SandboxError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Replies with a fixed script, one entry per completion, in order.
#[derive(Clone)]
pub struct ScriptedProvider {
    responses: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().map(String::from).collect(),
            )),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Err(ModelError::invalid_response("scripted", "script exhausted"));
        }
        self.prompts.lock().await.push(request.prompt);
        Ok(CompletionResponse::new(responses.remove(0)))
    }
}

/// Replies by matching instruction fragments found in the prompt; the first
/// matching rule wins.
#[derive(Clone)]
pub struct KeyedProvider {
    rules: Arc<Vec<(String, String)>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl KeyedProvider {
    pub fn new(rules: Vec<(&str, &str)>) -> Self {
        Self {
            rules: Arc::new(
                rules
                    .into_iter()
                    .map(|(needle, reply)| (needle.to_string(), reply.to_string()))
                    .collect(),
            ),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn count(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .await
            .iter()
            .filter(|prompt| prompt.contains(needle))
            .count()
    }
}

#[async_trait]
impl ModelProvider for KeyedProvider {
    fn id(&self) -> &str {
        "keyed"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ModelError> {
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| request.prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| ModelError::invalid_response("keyed", "no rule matches the prompt"))?;
        self.prompts.lock().await.push(request.prompt);
        Ok(CompletionResponse::new(reply))
    }
}

/// Sandbox that fails a fixed number of runs before printing `output`.
pub struct FlakySandbox {
    failures: Mutex<usize>,
    output: String,
    pub runs: Mutex<Vec<String>>,
}

impl FlakySandbox {
    pub fn new(failures: usize, output: &str) -> Self {
        Self {
            failures: Mutex::new(failures),
            output: output.to_string(),
            runs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CodeSandbox for FlakySandbox {
    async fn run(&self, code: &str) -> Result<String, SandboxError> {
        self.runs.lock().await.push(code.to_string());
        let mut failures = self.failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(SandboxError::Runtime {
                status: 1,
                stderr: "ZeroDivisionError: division by zero".into(),
            });
        }
        Ok(self.output.clone())
    }
}
