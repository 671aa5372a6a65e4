//! Common test utilities for building registries and small graphs.
use lamina::prelude::*;
use std::sync::{Arc, Mutex};

/// Routes the engine's debug events to the test output; call at the top of
/// a test and run with `RUST_LOG=lamina=debug` when chasing a failure.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// The stock catalog wrapped for sharing between graphs.
#[allow(dead_code)]
pub fn stock_catalog() -> Arc<NodeRegistry> {
    Arc::new(builtin_registry())
}

/// A graph with an empty local registry over the stock catalog.
#[allow(dead_code)]
pub fn graph_with_builtins() -> Dataflow {
    Dataflow::with_base_catalog(stock_catalog())
}

/// Admits a `Constant Number` source emitting `value`.
#[allow(dead_code)]
pub fn add_constant(graph: &mut Dataflow, value: f64) -> NodeId {
    let path = NodePath::parse("values/constant-number").expect("stock path");
    let mut overrides = PropertyValues::default();
    overrides.insert("value".to_string(), Value::Number(value));
    let node = graph
        .create_node(&path, 0.0, 0.0, &overrides)
        .expect("constant-number is registered");
    graph.add_node(node)
}

/// Admits a `Constant Boolean` source emitting `value`.
#[allow(dead_code)]
pub fn add_constant_bool(graph: &mut Dataflow, value: bool) -> NodeId {
    let path = NodePath::parse("values/constant-boolean").expect("stock path");
    let mut overrides = PropertyValues::default();
    overrides.insert("value".to_string(), Value::Bool(value));
    let node = graph
        .create_node(&path, 0.0, 0.0, &overrides)
        .expect("constant-boolean is registered");
    graph.add_node(node)
}

/// Admits a stock node with default properties.
#[allow(dead_code)]
pub fn add_stock_node(graph: &mut Dataflow, path: &str) -> NodeId {
    let path = NodePath::parse(path).expect("valid path");
    let node = graph
        .create_node(&path, 0.0, 0.0, &PropertyValues::default())
        .expect("stock path is registered");
    graph.add_node(node)
}

/// Registers a one-input sink type that records every value it receives,
/// and returns its path together with the shared record.
#[allow(dead_code)]
pub fn register_capture(registry: &mut NodeRegistry, title: &str) -> (NodePath, Arc<Mutex<Vec<Value>>>) {
    let record = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&record);
    let path = registry
        .register(
            title,
            "Test",
            vec![SlotLabel::new("value")],
            vec![],
            Worker::from_sync(move |inputs, _| {
                sink.lock().expect("capture lock").push(inputs[0].clone());
                Ok(vec![])
            }),
            [],
        )
        .expect("capture title is unique");
    (path, record)
}

/// Admits a capture sink into the graph and wires it to `from`'s output
/// slot; returns the shared record of received values.
#[allow(dead_code)]
pub fn capture_output(
    graph: &mut Dataflow,
    from: NodeId,
    from_slot: usize,
    title: &str,
) -> Arc<Mutex<Vec<Value>>> {
    let (path, record) = register_capture(graph.registry_mut(), title);
    let node = graph
        .create_node(&path, 0.0, 0.0, &PropertyValues::default())
        .expect("capture just registered");
    let sink = graph.add_node(node);
    assert!(graph.connect(from, from_slot, sink, 0, false));
    record
}

/// The values a capture sink has seen so far.
#[allow(dead_code)]
pub fn captured(record: &Arc<Mutex<Vec<Value>>>) -> Vec<Value> {
    record.lock().expect("capture lock").clone()
}
