use super::END;
use super::checkpoint::{Checkpoint, CheckpointError, Checkpointer};
use super::error::GraphError;
use super::node::{GraphState, Node, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of node executions in one run.
    pub recursion_limit: usize,
    /// Checkpoint key; checkpoints are only written when set.
    pub thread_id: Option<String>,
}

impl RunConfig {
    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = recursion_limit;
        self
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            thread_id: None,
        }
    }
}

pub(super) enum Edge<S, C> {
    Direct(String),
    Conditional {
        router: Arc<dyn Router<S, C>>,
        routes: HashMap<String, String>,
    },
}

impl<S, C> Edge<S, C> {
    pub(super) fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(to) => vec![to.as_str()],
            Edge::Conditional { routes, .. } => routes.values().map(String::as_str).collect(),
        }
    }
}

/// Validated, immutable graph.
pub struct CompiledGraph<S: GraphState, C> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S, C>>>,
    pub(super) edges: HashMap<String, Edge<S, C>>,
    pub(super) entry: String,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
}

impl<S, C> CompiledGraph<S, C>
where
    S: GraphState,
    C: Send + Sync + 'static,
{
    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// Run from the entry point until a node routes to [`END`].
    pub async fn invoke(&self, state: S, ctx: &C, config: &RunConfig) -> Result<S, GraphError> {
        info!(
            entry = %self.entry,
            thread_id = config.thread_id.as_deref(),
            recursion_limit = config.recursion_limit,
            "Graph run started"
        );
        self.run_from(state, self.entry.clone(), 0, ctx, config).await
    }

    /// Continue the thread's run from its last checkpoint. A finished run
    /// returns its final state unchanged. The recursion limit counts node
    /// executions from the resume point.
    pub async fn resume(&self, ctx: &C, config: &RunConfig) -> Result<S, GraphError> {
        let checkpointer = self
            .checkpointer
            .as_ref()
            .ok_or(CheckpointError::NotConfigured)?;
        let thread_id = config
            .thread_id
            .as_deref()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        let checkpoint = checkpointer
            .get(thread_id)
            .await?
            .ok_or_else(|| CheckpointError::NotFound(thread_id.to_string()))?;

        match checkpoint.next_node {
            None => {
                debug!(thread_id, "Resumed thread had already finished");
                Ok(checkpoint.state)
            }
            Some(next) => {
                info!(thread_id, next = %next, step = checkpoint.step, "Resuming graph run");
                self.run_from(checkpoint.state, next, checkpoint.step, ctx, config)
                    .await
            }
        }
    }

    /// Latest checkpoint of a thread, if the graph has a checkpointer.
    pub async fn checkpoint(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, GraphError> {
        match &self.checkpointer {
            Some(checkpointer) => Ok(checkpointer.get(thread_id).await?),
            None => Ok(None),
        }
    }

    async fn run_from(
        &self,
        mut state: S,
        start: String,
        mut step: usize,
        ctx: &C,
        config: &RunConfig,
    ) -> Result<S, GraphError> {
        let mut current = Some(start);
        let mut executed = 0;

        while let Some(name) = current {
            if executed >= config.recursion_limit {
                warn!(limit = config.recursion_limit, node = %name, "Recursion limit reached");
                return Err(GraphError::RecursionExceeded {
                    limit: config.recursion_limit,
                    node: name,
                });
            }
            let node = self
                .nodes
                .get(&name)
                .ok_or_else(|| GraphError::UnknownNode(name.clone()))?;

            debug!(node = %name, step, "Running node");
            let update = node
                .run(&state, ctx)
                .await
                .map_err(|source| GraphError::Node {
                    node: name.clone(),
                    source,
                })?;
            state.merge(update);
            step += 1;
            executed += 1;

            let next = self.next_node(&name, &state, ctx).await?;
            if let (Some(checkpointer), Some(thread_id)) =
                (&self.checkpointer, config.thread_id.as_deref())
            {
                checkpointer
                    .put(
                        thread_id,
                        Checkpoint {
                            state: state.clone(),
                            next_node: next.clone(),
                            step,
                        },
                    )
                    .await?;
            }
            current = next;
        }

        info!(steps = step, executed, "Graph run finished");
        Ok(state)
    }

    async fn next_node(&self, name: &str, state: &S, ctx: &C) -> Result<Option<String>, GraphError> {
        let edge = self
            .edges
            .get(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))?;

        let target = match edge {
            Edge::Direct(to) => to.clone(),
            Edge::Conditional { router, routes } => {
                let label = router
                    .route(state, ctx)
                    .await
                    .map_err(|source| GraphError::Node {
                        node: name.to_string(),
                        source,
                    })?;
                debug!(node = name, label = %label, "Conditional edge evaluated");
                routes.get(&label).cloned().ok_or_else(|| GraphError::Routing {
                    node: name.to_string(),
                    label,
                })?
            }
        };

        Ok((target != END).then_some(target))
    }
}
