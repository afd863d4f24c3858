//! Tool registry: schema-described callables the model may request.

pub mod builtin;
mod descriptor;
mod error;
mod registry;


pub use descriptor::{CONVERSATIONAL_TOOL, ParamType, PropertySchema, ToolDescriptor};
pub use error::{RegistryError, ToolError, ToolExecutionError};
pub use registry::{ToolHandler, ToolRegistry};
