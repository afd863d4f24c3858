use super::*;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
struct Counter {
    value: i64,
    trail: Vec<String>,
}

struct Bump {
    by: i64,
    mark: &'static str,
}

impl GraphState for Counter {
    type Update = Bump;

    fn merge(&mut self, update: Bump) {
        self.value += update.by;
        self.trail.push(update.mark.to_string());
    }
}

struct Limits {
    target: i64,
}

fn increment<'a>(_state: &'a Counter, _ctx: &'a Limits) -> NodeFuture<'a, Bump> {
    Box::pin(async move { Ok(Bump { by: 1, mark: "inc" }) })
}

fn double<'a>(state: &'a Counter, _ctx: &'a Limits) -> NodeFuture<'a, Bump> {
    Box::pin(async move {
        Ok(Bump {
            by: state.value,
            mark: "double",
        })
    })
}

fn fail<'a>(_state: &'a Counter, _ctx: &'a Limits) -> NodeFuture<'a, Bump> {
    Box::pin(async move { Err("boom".into()) })
}

fn until_target(state: &Counter, ctx: &Limits) -> &'static str {
    if state.value < ctx.target { "again" } else { "done" }
}

fn counting_graph() -> StateGraph<Counter, Limits> {
    let mut graph = StateGraph::new();
    graph
        .add_node("increment", increment)
        .add_node("double", double)
        .add_conditional_edges(
            "increment",
            route_fn(until_target),
            [("again", "increment"), ("done", "double")],
        )
        .add_edge("double", END)
        .set_entry_point("increment");
    graph
}

#[tokio::test]
async fn follows_conditional_edges_to_end() {
    let graph = counting_graph().compile().expect("graph compiles");

    let state = graph
        .invoke(Counter::default(), &Limits { target: 3 }, &RunConfig::default())
        .await
        .expect("run succeeds");

    assert_eq!(state.value, 6);
    assert_eq!(state.trail, vec!["inc", "inc", "inc", "double"]);
}

#[tokio::test]
async fn sync_nodes_and_routers_run() {
    let mut graph: StateGraph<Counter, Limits> = StateGraph::new();
    graph
        .add_node(
            "seed",
            node_fn(|_: &Counter, ctx: &Limits| Ok(Bump { by: ctx.target, mark: "seed" })),
        )
        .add_edge("seed", END)
        .set_entry_point("seed");
    let graph = graph.compile().expect("graph compiles");

    let state = graph
        .invoke(Counter::default(), &Limits { target: 7 }, &RunConfig::default())
        .await
        .expect("run succeeds");
    assert_eq!(state.value, 7);
}

#[tokio::test]
async fn recursion_limit_counts_node_executions() {
    let graph = counting_graph().compile().expect("graph compiles");
    let ctx = Limits { target: 100 };

    let err = graph
        .invoke(Counter::default(), &ctx, &RunConfig::default().with_recursion_limit(5))
        .await
        .expect_err("limit reached");
    assert!(matches!(
        err,
        GraphError::RecursionExceeded { limit: 5, ref node } if node == "increment"
    ));

    // Exactly `limit` executions are allowed.
    let state = graph
        .invoke(
            Counter::default(),
            &Limits { target: 4 },
            &RunConfig::default().with_recursion_limit(5),
        )
        .await
        .expect("five steps fit");
    assert_eq!(state.trail.len(), 5);
}

#[tokio::test]
async fn unmapped_label_is_a_routing_error() {
    let mut graph: StateGraph<Counter, Limits> = StateGraph::new();
    graph
        .add_node("increment", increment)
        .add_conditional_edges("increment", route_fn(until_target), [("again", "increment")])
        .set_entry_point("increment");
    let graph = graph.compile().expect("graph compiles");

    let err = graph
        .invoke(Counter::default(), &Limits { target: 1 }, &RunConfig::default())
        .await
        .expect_err("no route for done");
    assert!(matches!(
        err,
        GraphError::Routing { ref node, ref label } if node == "increment" && label == "done"
    ));
}

#[tokio::test]
async fn node_failures_carry_the_node_name() {
    let mut graph: StateGraph<Counter, Limits> = StateGraph::new();
    graph
        .add_node("fail", fail)
        .add_edge("fail", END)
        .set_entry_point("fail");
    let graph = graph.compile().expect("graph compiles");

    let err = graph
        .invoke(Counter::default(), &Limits { target: 1 }, &RunConfig::default())
        .await
        .expect_err("node fails");
    match err {
        GraphError::Node { node, source } => {
            assert_eq!(node, "fail");
            assert_eq!(source.to_string(), "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn compile_rejects_bad_topologies() {
    let mut missing_entry: StateGraph<Counter, Limits> = StateGraph::new();
    missing_entry.add_node("a", increment).add_edge("a", END);
    assert_eq!(
        missing_entry.compile().err(),
        Some(CompilationError::NoEntryPoint)
    );

    let mut duplicate: StateGraph<Counter, Limits> = StateGraph::new();
    duplicate
        .add_node("a", increment)
        .add_node("a", double)
        .add_edge("a", END)
        .set_entry_point("a");
    assert_eq!(
        duplicate.compile().err(),
        Some(CompilationError::DuplicateNode("a".into()))
    );

    let mut dangling: StateGraph<Counter, Limits> = StateGraph::new();
    dangling
        .add_node("a", increment)
        .add_edge("a", "b")
        .set_entry_point("a");
    assert_eq!(
        dangling.compile().err(),
        Some(CompilationError::NodeNotFound("b".into()))
    );

    let mut two_edges: StateGraph<Counter, Limits> = StateGraph::new();
    two_edges
        .add_node("a", increment)
        .add_edge("a", END)
        .add_edge("a", "a")
        .set_entry_point("a");
    assert_eq!(
        two_edges.compile().err(),
        Some(CompilationError::DuplicateEdge("a".into()))
    );

    let mut no_edge: StateGraph<Counter, Limits> = StateGraph::new();
    no_edge
        .add_node("a", increment)
        .add_node("b", double)
        .add_edge("a", "b")
        .set_entry_point("a");
    assert_eq!(
        no_edge.compile().err(),
        Some(CompilationError::MissingEdge("b".into()))
    );

    let mut reserved: StateGraph<Counter, Limits> = StateGraph::new();
    reserved.add_node(END, increment).set_entry_point(END);
    assert_eq!(
        reserved.compile().err(),
        Some(CompilationError::ReservedName(END.into()))
    );
}

#[tokio::test]
async fn checkpoints_track_every_step() {
    let store = Arc::new(MemoryCheckpointer::<Counter>::new());
    let graph = counting_graph()
        .compile_with_checkpointer(store.clone())
        .expect("graph compiles");
    let config = RunConfig::default().with_thread_id("thread-1");

    let state = graph
        .invoke(Counter::default(), &Limits { target: 2 }, &config)
        .await
        .expect("run succeeds");

    let checkpoint = graph
        .checkpoint("thread-1")
        .await
        .expect("store readable")
        .expect("checkpoint saved");
    assert!(checkpoint.is_finished());
    assert_eq!(checkpoint.step, 3);
    assert_eq!(checkpoint.state, state);

    let resumed = graph
        .resume(&Limits { target: 2 }, &config)
        .await
        .expect("finished thread resumes");
    assert_eq!(resumed, state);
    assert_eq!(store.thread_count().await, 1);
}

#[tokio::test]
async fn resume_continues_an_interrupted_run() {
    let store = Arc::new(MemoryCheckpointer::<Counter>::new());
    let graph = counting_graph()
        .compile_with_checkpointer(store)
        .expect("graph compiles");
    let ctx = Limits { target: 4 };

    let interrupted = RunConfig::default()
        .with_thread_id("t")
        .with_recursion_limit(2);
    graph
        .invoke(Counter::default(), &ctx, &interrupted)
        .await
        .expect_err("interrupted by limit");

    let saved = graph
        .checkpoint("t")
        .await
        .expect("store readable")
        .expect("checkpoint saved");
    assert_eq!(saved.next_node.as_deref(), Some("increment"));
    assert_eq!(saved.state.value, 2);

    let finished = graph
        .resume(&ctx, &RunConfig::default().with_thread_id("t"))
        .await
        .expect("resume completes");
    assert_eq!(finished.value, 8);
    assert_eq!(finished.trail, vec!["inc", "inc", "inc", "inc", "double"]);
}

#[tokio::test]
async fn each_resume_gets_a_fresh_recursion_budget() {
    let store = Arc::new(MemoryCheckpointer::<Counter>::new());
    let graph = counting_graph()
        .compile_with_checkpointer(store)
        .expect("graph compiles");
    let ctx = Limits { target: 4 };
    let limited = RunConfig::default()
        .with_thread_id("t")
        .with_recursion_limit(2);

    graph
        .invoke(Counter::default(), &ctx, &limited)
        .await
        .expect_err("interrupted by limit");

    let err = graph
        .resume(&ctx, &limited)
        .await
        .expect_err("second slice also stops at the limit");
    assert!(matches!(
        err,
        GraphError::RecursionExceeded { limit: 2, ref node } if node == "double"
    ));
    let saved = graph
        .checkpoint("t")
        .await
        .expect("store readable")
        .expect("checkpoint saved");
    assert_eq!(saved.state.value, 4);
    assert_eq!(saved.step, 4);

    let finished = graph
        .resume(&ctx, &limited)
        .await
        .expect("last slice finishes");
    assert_eq!(finished.value, 8);
    assert_eq!(finished.trail.len(), 5);
}

#[tokio::test]
async fn resume_requires_thread_and_checkpointer() {
    let plain = counting_graph().compile().expect("graph compiles");
    let err = plain
        .resume(&Limits { target: 1 }, &RunConfig::default().with_thread_id("x"))
        .await
        .expect_err("no checkpointer");
    assert!(matches!(err, GraphError::Checkpoint(CheckpointError::NotConfigured)));

    let stored = counting_graph()
        .compile_with_checkpointer(Arc::new(MemoryCheckpointer::<Counter>::new()))
        .expect("graph compiles");
    let err = stored
        .resume(&Limits { target: 1 }, &RunConfig::default())
        .await
        .expect_err("thread id required");
    assert!(matches!(err, GraphError::Checkpoint(CheckpointError::ThreadIdRequired)));

    let err = stored
        .resume(&Limits { target: 1 }, &RunConfig::default().with_thread_id("missing"))
        .await
        .expect_err("nothing stored");
    assert!(matches!(err, GraphError::Checkpoint(CheckpointError::NotFound(_))));
}
