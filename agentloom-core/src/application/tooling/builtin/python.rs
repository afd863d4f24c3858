use crate::application::tooling::{ParamType, ToolDescriptor, ToolExecutionError, ToolHandler};
use crate::infrastructure::sandbox::CodeSandbox;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const NAME: &str = "python_repl";

pub fn descriptor() -> ToolDescriptor {
    ToolDescriptor::new(
        NAME,
        "A Python shell. Use this to execute python commands. Input should be a valid python command. If you want to see the output of a value, you should print it out with `print(...)`.",
    )
    .with_required("command", ParamType::String, "The python code to execute.")
}

/// Runs the `command` argument through a [`CodeSandbox`] and returns stdout.
pub struct PythonReplTool {
    descriptor: ToolDescriptor,
    sandbox: Arc<dyn CodeSandbox>,
}

impl PythonReplTool {
    pub fn new(sandbox: Arc<dyn CodeSandbox>) -> Self {
        Self {
            descriptor: descriptor(),
            sandbox,
        }
    }
}

#[async_trait]
impl ToolHandler for PythonReplTool {
    async fn call(&self, input: Value) -> Result<String, ToolExecutionError> {
        let args = self.descriptor.validate(&input)?;
        let command = args
            .get("command")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(self.sandbox.run(command).await?)
    }
}
