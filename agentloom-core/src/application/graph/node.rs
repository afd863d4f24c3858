use futures::future::BoxFuture;
use std::error::Error;

/// Error raised by a node or router; kept opaque so any layer can fail a step.
pub type NodeError = Box<dyn Error + Send + Sync + 'static>;

pub type NodeFuture<'a, T> = BoxFuture<'a, Result<T, NodeError>>;
pub type RouteFuture<'a> = BoxFuture<'a, Result<String, NodeError>>;

/// State threaded through a graph. Nodes return partial updates that are
/// merged into the running state.
pub trait GraphState: Clone + Send + Sync + 'static {
    type Update: Send + 'static;

    fn merge(&mut self, update: Self::Update);
}

/// One step of a graph.
///
/// Implemented for any `fn(&S, &C) -> NodeFuture<S::Update>`; wrap
/// synchronous closures with [`node_fn`].
pub trait Node<S: GraphState, C>: Send + Sync {
    fn run<'a>(&'a self, state: &'a S, ctx: &'a C) -> NodeFuture<'a, S::Update>;
}

impl<S, C, F> Node<S, C> for F
where
    S: GraphState,
    F: for<'a> Fn(&'a S, &'a C) -> NodeFuture<'a, S::Update> + Send + Sync,
{
    fn run<'a>(&'a self, state: &'a S, ctx: &'a C) -> NodeFuture<'a, S::Update> {
        self(state, ctx)
    }
}

/// Chooses the label of the next edge after a node ran.
pub trait Router<S, C>: Send + Sync {
    fn route<'a>(&'a self, state: &'a S, ctx: &'a C) -> RouteFuture<'a>;
}

impl<S, C, F> Router<S, C> for F
where
    F: for<'a> Fn(&'a S, &'a C) -> RouteFuture<'a> + Send + Sync,
{
    fn route<'a>(&'a self, state: &'a S, ctx: &'a C) -> RouteFuture<'a> {
        self(state, ctx)
    }
}

pub struct SyncNode<F>(F);

/// Adapt a synchronous, fallible closure into a [`Node`].
pub fn node_fn<S, C, F>(f: F) -> SyncNode<F>
where
    S: GraphState,
    F: Fn(&S, &C) -> Result<S::Update, NodeError> + Send + Sync,
{
    SyncNode(f)
}

impl<S, C, F> Node<S, C> for SyncNode<F>
where
    S: GraphState,
    F: Fn(&S, &C) -> Result<S::Update, NodeError> + Send + Sync,
{
    fn run<'a>(&'a self, state: &'a S, ctx: &'a C) -> NodeFuture<'a, S::Update> {
        let result = (self.0)(state, ctx);
        Box::pin(async move { result })
    }
}

pub struct SyncRouter<F>(F);

/// Adapt a synchronous predicate returning a static label into a [`Router`].
pub fn route_fn<S, C, F>(f: F) -> SyncRouter<F>
where
    F: Fn(&S, &C) -> &'static str + Send + Sync,
{
    SyncRouter(f)
}

impl<S, C, F> Router<S, C> for SyncRouter<F>
where
    F: Fn(&S, &C) -> &'static str + Send + Sync,
{
    fn route<'a>(&'a self, state: &'a S, ctx: &'a C) -> RouteFuture<'a> {
        let label = (self.0)(state, ctx).to_string();
        Box::pin(async move { Ok(label) })
    }
}
