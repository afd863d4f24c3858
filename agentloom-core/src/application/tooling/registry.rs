use super::descriptor::ToolDescriptor;
use super::error::{RegistryError, ToolError, ToolExecutionError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executable side of a registered tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: Value) -> Result<String, ToolExecutionError>;
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Named tools, looked up case-insensitively, kept in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: ToolDescriptor,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let name = descriptor.name.trim();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if ToolDescriptor::is_conversational(name) {
            return Err(RegistryError::Reserved(name.to_string()));
        }
        let key = name.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        debug!(tool = %descriptor.name, "Registering tool");
        self.index.insert(key, self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.trim().to_ascii_lowercase())
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.lookup(name).map(|tool| &tool.descriptor)
    }

    /// Registered descriptors followed by the conversational one.
    pub fn schemas(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor.clone())
            .chain(std::iter::once(ToolDescriptor::conversational()))
            .collect()
    }

    /// Catalog text for the system prompt: one pretty JSON schema per block.
    pub fn render_catalog(&self) -> String {
        self.schemas()
            .iter()
            .map(|schema| {
                serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.name.clone())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn dispatch(&self, name: &str, input: Value) -> Result<String, ToolError> {
        let Some(tool) = self.lookup(name) else {
            warn!(tool = name, "Unknown tool requested");
            return Err(ToolError::UnknownTool(name.to_string()));
        };

        let tool_name = tool.descriptor.name.clone();
        info!(tool = %tool_name, "Invoking tool");
        let result = tool
            .handler
            .call(input)
            .await
            .map_err(|source| ToolError::Execution {
                tool: tool_name.clone(),
                source,
            });

        match &result {
            Ok(output) => debug!(tool = %tool_name, bytes = output.len(), "Tool finished"),
            Err(error) => warn!(tool = %tool_name, %error, "Tool failed"),
        }
        result
    }

    fn lookup(&self, name: &str) -> Option<&RegisteredTool> {
        self.index
            .get(&name.trim().to_ascii_lowercase())
            .and_then(|position| self.tools.get(*position))
    }
}
