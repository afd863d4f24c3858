use super::checkpoint::CheckpointError;
use super::node::NodeError;
use thiserror::Error;

/// Topology problems found by `StateGraph::compile`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompilationError {
    #[error("graph has no entry point")]
    NoEntryPoint,
    #[error("node '{0}' is defined more than once")]
    DuplicateNode(String),
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("node '{0}' already has outgoing edges")]
    DuplicateEdge(String),
    #[error("node '{0}' has no outgoing edge")]
    MissingEdge(String),
    #[error("'{0}' is a reserved name")]
    ReservedName(String),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("conditional edge from '{node}' returned '{label}' but no route exists")]
    Routing { node: String, label: String },
    #[error("recursion limit of {limit} steps reached before running '{node}'")]
    RecursionExceeded { limit: usize, node: String },
    #[error("node '{node}' failed: {source}")]
    Node {
        node: String,
        #[source]
        source: NodeError,
    },
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error("unknown node: {0}")]
    UnknownNode(String),
}
