//! Function-calling loop: the model picks tools by emitting JSON, the loop
//! executes them and feeds the results back until a final answer arrives.

mod errors;
mod models;
pub mod parser;
mod runner;
mod runtime;


pub use errors::AgentError;
pub use models::{AgentOptions, AgentOutcome, AgentStep, DEFAULT_MAX_ITERATIONS, ToolCallRequest};
pub use runner::FunctionCallingAgent;
