//! Directed state graph: named async steps, plain and conditional edges,
//! bounded execution and optional per-thread checkpoints.
//!
//! Build a [`StateGraph`], `compile` it once, then `invoke` the resulting
//! [`CompiledGraph`] as many times as needed; the compiled graph is read-only
//! and can be shared behind an `Arc`.

pub mod checkpoint;
mod compiled;
mod error;
mod node;
mod state_graph;

#[cfg(test)]
mod tests;

pub use checkpoint::{Checkpoint, CheckpointError, Checkpointer, MemoryCheckpointer};
pub use compiled::{CompiledGraph, DEFAULT_RECURSION_LIMIT, RunConfig};
pub use error::{CompilationError, GraphError};
pub use node::{
    GraphState, Node, NodeError, NodeFuture, RouteFuture, Router, SyncNode, SyncRouter, node_fn,
    route_fn,
};
pub use state_graph::StateGraph;

/// Destination marking the end of a run.
pub const END: &str = "__end__";
