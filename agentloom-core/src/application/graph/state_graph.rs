use super::END;
use super::checkpoint::Checkpointer;
use super::compiled::{CompiledGraph, Edge};
use super::error::CompilationError;
use super::node::{GraphState, Node, Router};
use std::collections::HashMap;
use std::sync::Arc;

/// Graph builder.
///
/// Builder calls never fail on their own; the first problem they detect is
/// reported by [`StateGraph::compile`] together with the topology checks.
pub struct StateGraph<S: GraphState, C> {
    nodes: HashMap<String, Arc<dyn Node<S, C>>>,
    edges: HashMap<String, Edge<S, C>>,
    entry: Option<String>,
    pending: Option<CompilationError>,
}

impl<S, C> Default for StateGraph<S, C>
where
    S: GraphState,
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> StateGraph<S, C>
where
    S: GraphState,
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: None,
            pending: None,
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, node: impl Node<S, C> + 'static) -> &mut Self {
        let name = name.into();
        if name == END || name.trim().is_empty() {
            self.defer(CompilationError::ReservedName(name));
            return self;
        }
        if self.nodes.contains_key(&name) {
            self.defer(CompilationError::DuplicateNode(name));
            return self;
        }
        self.nodes.insert(name, Arc::new(node));
        self
    }

    /// Unconditional edge; `to` may be [`END`].
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.insert_edge(from.into(), Edge::Direct(to.into()))
    }

    /// Branch on the label returned by `router`; `routes` maps each label to
    /// a destination node or [`END`].
    pub fn add_conditional_edges<K, V>(
        &mut self,
        from: impl Into<String>,
        router: impl Router<S, C> + 'static,
        routes: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let routes = routes
            .into_iter()
            .map(|(label, to)| (label.into(), to.into()))
            .collect();
        self.insert_edge(
            from.into(),
            Edge::Conditional {
                router: Arc::new(router),
                routes,
            },
        )
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    pub fn compile(self) -> Result<CompiledGraph<S, C>, CompilationError> {
        self.compile_inner(None)
    }

    /// Compile with a store that receives a checkpoint after every node of
    /// runs invoked with a thread id.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledGraph<S, C>, CompilationError> {
        self.compile_inner(Some(checkpointer))
    }

    fn compile_inner(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledGraph<S, C>, CompilationError> {
        if let Some(error) = self.pending {
            return Err(error);
        }

        let entry = self.entry.ok_or(CompilationError::NoEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(CompilationError::NodeNotFound(entry));
        }

        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();
        for source in sources {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            for target in self.edges[source].targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(CompilationError::NodeNotFound(target.to_string()));
                }
            }
        }

        let mut names: Vec<&String> = self.nodes.keys().collect();
        names.sort();
        if let Some(name) = names.into_iter().find(|name| !self.edges.contains_key(*name)) {
            return Err(CompilationError::MissingEdge(name.clone()));
        }

        Ok(CompiledGraph {
            nodes: self.nodes,
            edges: self.edges,
            entry,
            checkpointer,
        })
    }

    fn insert_edge(&mut self, from: String, edge: Edge<S, C>) -> &mut Self {
        if self.edges.contains_key(&from) {
            self.defer(CompilationError::DuplicateEdge(from));
            return self;
        }
        self.edges.insert(from, edge);
        self
    }

    fn defer(&mut self, error: CompilationError) {
        self.pending.get_or_insert(error);
    }
}
