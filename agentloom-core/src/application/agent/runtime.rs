use super::models::{AgentStep, ToolCallRequest};
use crate::application::tooling::{CONVERSATIONAL_TOOL, ToolError, ToolRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Binds the loop to a tool registry: builds the tool instructions and runs
/// requested batches.
pub(super) struct ToolRuntime {
    registry: Arc<ToolRegistry>,
}

impl ToolRuntime {
    pub(super) fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub(super) fn compose_system_prompt(&self, preamble: Option<&str>) -> String {
        let instructions = format!(
            "You have access to the following tools:\n\n{catalog}\n\n\
             To call tools, respond with a JSON array of objects with the keys \"tool\" \
             (the tool name) and \"tool_input\" (an object matching the tool's properties). \
             You may call several tools at once. When you have the final answer, or no other \
             tool applies, respond with a single \"{CONVERSATIONAL_TOOL}\" call.",
            catalog = self.registry.render_catalog(),
        );
        match preamble {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{}\n\n{instructions}", existing.trim())
            }
            _ => instructions,
        }
    }

    pub(super) fn has_tool(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Run `requests` in order and return the combined tool-result text.
    /// Tool failures become part of the text.
    pub(super) async fn execute_batch(
        &self,
        iteration: usize,
        requests: Vec<ToolCallRequest>,
        steps: &mut Vec<AgentStep>,
    ) -> String {
        let mut lines = Vec::with_capacity(requests.len());

        for request in requests {
            let ToolCallRequest { tool, tool_input } = request;
            let (success, output) = match self.registry.dispatch(&tool, tool_input.clone()).await {
                Ok(output) => (true, output),
                Err(ToolError::UnknownTool(name)) => {
                    warn!(tool = %name, "Model requested an unregistered tool");
                    (false, format!("tool '{name}' is not available"))
                }
                Err(ToolError::Execution { source, .. }) => (false, source.to_string()),
            };

            info!(iteration, tool = %tool, success, "Tool call completed");
            lines.push(format!("Tool '{tool}' response: {output}"));
            steps.push(AgentStep {
                iteration,
                tool,
                input: tool_input,
                success,
                output,
            });
        }

        lines.join("\n")
    }
}
