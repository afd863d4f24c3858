//! Tools shipped with the crate.

pub mod calculator;
pub mod python;
pub mod sql;
pub mod time;

pub use calculator::CalculatorTool;
pub use python::PythonReplTool;
pub use sql::SqlQueryTool;
pub use time::TimeTool;

use super::{RegistryError, ToolRegistry};
use crate::infrastructure::sandbox::CodeSandbox;
use std::sync::Arc;

/// Registry with `get_time`, `calculator` and `python_repl`, plus `query_db`
/// when a SQL tool is supplied.
pub fn standard_registry(
    sandbox: Arc<dyn CodeSandbox>,
    sql: Option<SqlQueryTool>,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry
        .register(time::descriptor(), Arc::new(TimeTool::new()))?
        .register(calculator::descriptor(), Arc::new(CalculatorTool::new()))?
        .register(python::descriptor(), Arc::new(PythonReplTool::new(sandbox)))?;
    if let Some(tool) = sql {
        registry.register(sql::descriptor(), Arc::new(tool))?;
    }
    Ok(registry)
}
