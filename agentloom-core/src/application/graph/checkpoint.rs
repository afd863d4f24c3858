//! Per-thread snapshots of a running graph.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("graph was compiled without a checkpointer")]
    NotConfigured,
    #[error("no checkpoint for thread '{0}'")]
    NotFound(String),
}

/// State after a node ran, plus the node that runs next (`None` once the
/// run reached the end).
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint<S> {
    pub state: S,
    pub next_node: Option<String>,
    pub step: usize,
}

impl<S> Checkpoint<S> {
    pub fn is_finished(&self) -> bool {
        self.next_node.is_none()
    }
}

/// Stores the latest checkpoint of each thread.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(&self, thread_id: &str, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError>;

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError>;
}

/// In-process checkpoint store.
pub struct MemoryCheckpointer<S> {
    threads: RwLock<HashMap<String, Checkpoint<S>>>,
}

impl<S> MemoryCheckpointer<S> {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }

    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

impl<S> Default for MemoryCheckpointer<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemoryCheckpointer<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(&self, thread_id: &str, checkpoint: Checkpoint<S>) -> Result<(), CheckpointError> {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), checkpoint);
        Ok(())
    }

    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }
}
