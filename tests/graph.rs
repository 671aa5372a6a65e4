//! Tests for graph membership, wiring, and the level scheduler's
//! incremental re-leveling.
mod common;
use common::*;
use lamina::prelude::*;

#[test]
fn test_fresh_node_deepness_is_input_count() {
    let graph = graph_with_builtins();
    let sum = NodePath::parse("math/sum").expect("valid path");
    let node = graph
        .create_node(&sum, 0.0, 0.0, &PropertyValues::default())
        .expect("stock type");
    // Pre-admission placement heuristic: deepness starts at the input count.
    assert_eq!(node.deepness(), 2);
}

#[test]
fn test_zero_input_node_admitted_at_level_zero() {
    let mut graph = graph_with_builtins();
    let constant = add_constant(&mut graph, 1.0);
    let node = graph.node(constant).expect("member");
    assert_eq!(node.deepness(), 0);
    assert!(graph.nodes_at_level(0).contains(&constant));
}

#[test]
fn test_admission_relevels_connected_inputs_to_zero() {
    let mut graph = graph_with_builtins();
    let sum = add_stock_node(&mut graph, "math/sum");
    // No bound inputs yet: the admission re-level pulls it down to level 0.
    assert_eq!(graph.node(sum).expect("member").deepness(), 0);
    assert!(graph.nodes_at_level(0).contains(&sum));
}

#[test]
fn test_connect_raises_destination_level() {
    let mut graph = graph_with_builtins();
    let two = add_constant(&mut graph, 2.0);
    let three = add_constant(&mut graph, 3.0);
    let sum = add_stock_node(&mut graph, "math/sum");

    assert!(graph.connect(two, 0, sum, 0, false));
    assert_eq!(graph.node(sum).expect("member").deepness(), 1);
    assert!(graph.nodes_at_level(1).contains(&sum));

    // The second producer is also at level 0, so the level stays put.
    assert!(graph.connect(three, 0, sum, 1, false));
    assert_eq!(graph.node(sum).expect("member").deepness(), 1);
    assert!(graph.nodes_at_level(1).contains(&sum));
    assert!(!graph.nodes_at_level(0).contains(&sum));
}

#[test]
fn test_chain_levels_are_cumulative() {
    let mut graph = graph_with_builtins();
    let source = add_constant(&mut graph, 1.0);
    let first = add_stock_node(&mut graph, "math/sine");
    let second = add_stock_node(&mut graph, "math/cosine");

    assert!(graph.connect(source, 0, first, 0, false));
    assert!(graph.connect(first, 0, second, 0, false));

    assert_eq!(graph.node(source).expect("member").deepness(), 0);
    assert_eq!(graph.node(first).expect("member").deepness(), 1);
    assert_eq!(graph.node(second).expect("member").deepness(), 2);
}

#[test]
fn test_rebind_replaces_producer_and_cleans_fanout() {
    let mut graph = graph_with_builtins();
    let old_producer = add_constant(&mut graph, 1.0);
    let new_producer = add_constant(&mut graph, 2.0);
    let sine = add_stock_node(&mut graph, "math/sine");

    assert!(graph.connect(old_producer, 0, sine, 0, false));
    assert!(graph.connect(new_producer, 0, sine, 0, false));

    let binding = graph.node(sine).expect("member").binding(0).expect("bound");
    assert_eq!(binding.node, new_producer);

    // The old producer no longer references the destination.
    assert!(graph.node(old_producer).expect("member").consumers(0).is_empty());
    let consumers = graph.node(new_producer).expect("member").consumers(0);
    assert_eq!(consumers.len(), 1);
    assert_eq!(consumers[0].node, sine);
    assert_eq!(consumers[0].slot, 0);
}

#[test]
fn test_reconnecting_same_edge_does_not_duplicate() {
    let mut graph = graph_with_builtins();
    let producer = add_constant(&mut graph, 1.0);
    let sine = add_stock_node(&mut graph, "math/sine");

    assert!(graph.connect(producer, 0, sine, 0, false));
    assert!(graph.connect(producer, 0, sine, 0, false));
    assert_eq!(graph.node(producer).expect("member").consumers(0).len(), 1);
}

#[test]
fn test_connect_rejects_out_of_range_slots_and_foreign_handles() {
    let mut graph = graph_with_builtins();
    let producer = add_constant(&mut graph, 1.0);
    let sum = add_stock_node(&mut graph, "math/sum");

    assert!(!graph.connect(producer, 1, sum, 0, false));
    assert!(!graph.connect(producer, 0, sum, 2, false));
    assert!(!graph.connect(producer, 0, 999, 0, false));
    assert!(!graph.connect(999, 0, sum, 0, false));

    // Nothing was bound by the refused calls.
    assert!(graph.node(sum).expect("member").binding(0).is_none());
}

#[test]
fn test_get_nodes_by_path() {
    let mut graph = graph_with_builtins();
    let first = add_constant(&mut graph, 1.0);
    let second = add_constant(&mut graph, 2.0);
    add_stock_node(&mut graph, "math/sum");

    let constant = NodePath::parse("values/constant-number").expect("valid path");
    let found = graph.get_nodes_by_path(&constant);
    assert_eq!(found.len(), 2);
    assert!(found.contains(&first));
    assert!(found.contains(&second));
}

#[test]
fn test_set_input_is_bounds_checked() {
    let mut graph = graph_with_builtins();
    let sum = add_stock_node(&mut graph, "math/sum");
    let node = graph.node_mut(sum).expect("member");
    assert!(node.set_input(0, Value::Number(1.0)));
    assert!(node.set_input(1, Value::Number(2.0)));
    assert!(!node.set_input(2, Value::Number(3.0)));
    assert!(node.is_ready());
}
