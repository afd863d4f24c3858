use super::errors::AgentError;
use super::models::{AgentOptions, AgentOutcome, ToolCallRequest};
use super::parser::{self, Extracted};
use super::runtime::ToolRuntime;
use crate::application::tooling::{ToolDescriptor, ToolRegistry};
use crate::model::{CompletionRequest, ModelParams, ModelProvider, PromptFormat};
use crate::types::ChatMessage;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

const REPAIR_SYSTEM_PROMPT: &str =
    "You repair malformed JSON. Reply with the corrected JSON only, without commentary.";

/// What a parsed model turn asks the loop to do.
enum Directive {
    Final(String),
    CallTools(Vec<ToolCallRequest>),
}

pub struct FunctionCallingAgent {
    provider: Arc<dyn ModelProvider>,
    runtime: ToolRuntime,
    format: PromptFormat,
    params: ModelParams,
}

impl FunctionCallingAgent {
    pub fn new(provider: Arc<dyn ModelProvider>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            runtime: ToolRuntime::new(registry),
            format: PromptFormat::default(),
            params: ModelParams::default(),
        }
    }

    pub fn with_format(mut self, format: PromptFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    pub async fn run(
        &self,
        query: impl Into<String>,
        options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        let query = query.into();
        info!(
            provider = self.provider.id(),
            max_iterations = options.max_iterations,
            "Agent run started"
        );

        let system_prompt = self
            .runtime
            .compose_system_prompt(options.system_prompt.as_deref());
        let mut history = vec![ChatMessage::system(system_prompt), ChatMessage::user(query)];
        let mut steps = Vec::new();
        let mut correlation_id: u64 = 0;

        for iteration in 1..=options.max_iterations {
            let prompt = self.format.render(&history);
            debug!(iteration, prompt_len = prompt.len(), "Submitting agent turn");
            let completion = self
                .provider
                .complete(CompletionRequest::new(prompt, self.params.clone()))
                .await?;

            let directive = match self.interpret(&completion.text).await {
                Ok(directive) => directive,
                Err(err) => {
                    warn!(iteration, error = %err, "Agent turn rejected");
                    history.push(ChatMessage::assistant(completion.text));
                    return Err(err.with_history(history));
                }
            };
            history.push(ChatMessage::assistant(completion.text));

            match directive {
                Directive::Final(response) => {
                    info!(iteration, steps = steps.len(), "Agent returned final response");
                    return Ok(AgentOutcome {
                        response,
                        iterations: iteration,
                        steps,
                        history,
                    });
                }
                Directive::CallTools(requests) => {
                    info!(iteration, calls = requests.len(), "Agent requested tool execution");
                    let results = self
                        .runtime
                        .execute_batch(iteration, requests, &mut steps)
                        .await;
                    history.push(ChatMessage::tool_result(results, correlation_id));
                    correlation_id += 1;
                }
            }
        }

        warn!(
            iterations = options.max_iterations,
            "Agent exhausted its iteration budget"
        );
        Err(AgentError::BudgetExhausted {
            iterations: options.max_iterations,
            history,
        })
    }

    async fn interpret(&self, text: &str) -> Result<Directive, AgentError> {
        let value = self.parse_with_repair(text).await?;
        let requests =
            parser::parse_tool_calls(value).map_err(|reason| AgentError::parse(reason, text))?;

        if requests.is_empty() {
            return Err(AgentError::EmptyToolCalls {
                history: Vec::new(),
            });
        }

        let conversational = requests
            .iter()
            .filter(|request| ToolDescriptor::is_conversational(&request.tool))
            .count();
        match (conversational, requests.len()) {
            (0, _) => {
                // the whole batch is rejected before any call runs
                if let Some(unknown) = requests
                    .iter()
                    .find(|request| !self.runtime.has_tool(&request.tool))
                {
                    return Err(AgentError::UnknownTool {
                        name: unknown.tool.clone(),
                        history: Vec::new(),
                    });
                }
                Ok(Directive::CallTools(requests))
            }
            (1, 1) => {
                let response = requests[0]
                    .tool_input
                    .get("response")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AgentError::parse("final answer is missing a string \"response\"", text)
                    })?;
                Ok(Directive::Final(response.to_string()))
            }
            (_, total) => Err(AgentError::MixedBatch {
                total,
                history: Vec::new(),
            }),
        }
    }

    /// Extract JSON from `text`, asking the model once to fix it when the
    /// candidate does not parse.
    async fn parse_with_repair(&self, text: &str) -> Result<Value, AgentError> {
        let (candidate, error) = match parser::extract_json(text) {
            Extracted::Parsed(value) => return Ok(value),
            Extracted::NotFound => {
                return Err(AgentError::parse("no JSON found in model output", text));
            }
            Extracted::Malformed { candidate, error } => (candidate, error),
        };

        warn!(%error, "Tool-call JSON failed to parse, requesting repair");
        let user = format!(
            "The following JSON failed to parse ({error}):\n\n{candidate}\n\nReturn the corrected JSON."
        );
        let prompt = self.format.render_single(REPAIR_SYSTEM_PROMPT, &user);
        let repaired = self
            .provider
            .complete(CompletionRequest::new(prompt, self.params.clone()))
            .await?;

        match parser::extract_json(&repaired.text) {
            Extracted::Parsed(value) => Ok(value),
            Extracted::Malformed { error, .. } => Err(AgentError::parse(
                format!("repaired JSON still invalid: {error}"),
                repaired.text.clone(),
            )),
            Extracted::NotFound => Err(AgentError::parse(
                "repair produced no JSON",
                repaired.text.clone(),
            )),
        }
    }
}
