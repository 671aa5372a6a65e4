use super::node::{Activation, InputRef, Node, NodeId, OutputRef};
use crate::error::WorkerError;
use crate::registry::{NodePath, NodeRegistry, PropertyValues};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Outcome of one `activate` call on a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to completion (individual nodes may have declined).
    Completed,
    /// A previous cycle was still in flight; this tick left the graph
    /// untouched. External schedulers are expected to simply try again on
    /// their next tick.
    Skipped,
}

/// Resets the cycle flag when the cycle ends, or when its future is
/// dropped, so an abandoned cycle cannot wedge the graph closed.
struct CycleGuard(Arc<AtomicBool>);

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A dataflow graph: an arena of nodes partitioned into dependency-ordered
/// level buckets (the flow tree), plus the registry the graph instantiates
/// its node types from.
///
/// Every node occupies exactly one bucket, `flow_tree[node.deepness()]`, at
/// all times, and for every bound input the invariant
/// `deepness(consumer) >= deepness(producer) + 1` holds. Levels are derived
/// state: they are recomputed on every structural edit and after bulk loads,
/// and are never read from persisted structures.
#[derive(Debug)]
pub struct Dataflow {
    registry: NodeRegistry,
    nodes: Vec<Node>,
    flow_tree: Vec<Vec<NodeId>>,
    transform: Vec<serde_json::Value>,
    cycle_running: Arc<AtomicBool>,
}

impl Dataflow {
    /// An empty graph drawing node types from the given registry (usually a
    /// fresh local registry chained to a shared base catalog).
    pub fn new(registry: NodeRegistry) -> Dataflow {
        Dataflow {
            registry,
            nodes: Vec::new(),
            flow_tree: Vec::new(),
            transform: identity_transform(),
            cycle_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Convenience: a graph with an empty local registry over a shared base.
    pub fn with_base_catalog(base: Arc<NodeRegistry>) -> Dataflow {
        Dataflow::new(NodeRegistry::with_base(base))
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Mutable access to the graph's local registry, for per-graph entries
    /// such as live sensor readers or experiment sinks.
    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The handles currently occupying one level bucket.
    pub fn nodes_at_level(&self, level: usize) -> &[NodeId] {
        self.flow_tree.get(level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Membership: whether this handle was issued by this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }

    /// The opaque viewport transform carried alongside the graph for the
    /// editor's benefit; the engine passes it through unmodified.
    pub fn transform(&self) -> &[serde_json::Value] {
        &self.transform
    }

    pub(crate) fn set_transform(&mut self, transform: Vec<serde_json::Value>) {
        self.transform = transform;
    }

    /// Node handles in level order (ascending buckets, insertion order
    /// within a bucket), the order serialization and activation both use.
    pub fn iter_level_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.flow_tree.iter().flatten().copied()
    }

    /// All member nodes instantiated from the given type path.
    pub fn get_nodes_by_path(&self, path: &NodePath) -> Vec<NodeId> {
        self.iter_level_order()
            .filter(|&id| self.nodes[id].path() == path)
            .collect()
    }

    /// Instantiates a registered node type. The node is not yet a member of
    /// the graph; admit it with [`add_node`](Dataflow::add_node). Returns
    /// `None` when the path is registered in neither the local registry nor
    /// its base.
    pub fn create_node(
        &self,
        path: &NodePath,
        x: f64,
        y: f64,
        overrides: &PropertyValues,
    ) -> Option<Node> {
        let spec = self.registry.lookup(path)?;
        Some(Node::new(spec, x, y, overrides))
    }

    /// Admits a node into the graph and immediately re-levels it, so an
    /// unconnected node lands at level 0 regardless of its construction
    /// heuristic. Returns the node's stable handle.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        let level = node.deepness();
        self.nodes.push(node);
        self.ensure_tree_level(level);
        self.flow_tree[level].push(id);
        self.evaluate_deepness(id);
        id
    }

    /// Connects an output slot to an input slot.
    ///
    /// Both endpoints must already be members of this graph. The destination
    /// input is rebound: a prior producer is replaced, never duplicated,
    /// and its fan-out entry removed. On success the destination is
    /// re-leveled unless `skip_relevel` is set (bulk load does one full pass
    /// at the end instead, because re-leveling mid-load can run out of
    /// dependency order).
    pub fn connect(
        &mut self,
        from: NodeId,
        from_slot: usize,
        to: NodeId,
        to_slot: usize,
        skip_relevel: bool,
    ) -> bool {
        if !self.contains(from) || !self.contains(to) {
            return false;
        }
        if from_slot >= self.nodes[from].output_count() || to_slot >= self.nodes[to].input_count() {
            return false;
        }

        let producer = OutputRef {
            node: from,
            slot: from_slot,
        };
        let consumer = InputRef {
            node: to,
            slot: to_slot,
        };
        if let Some(previous) = self.nodes[to].bind_input(to_slot, producer) {
            self.nodes[previous.node].remove_consumer(previous.slot, consumer);
        }
        self.nodes[from].add_consumer(from_slot, consumer);

        if !skip_relevel {
            self.evaluate_deepness(to);
        }
        true
    }

    /// Runs one activation cycle: every node is visited in level order, and
    /// each ready node's worker is awaited before its outputs are pushed
    /// into its consumers' input slots. Nodes with unset inputs decline
    /// silently; zero-input sources at level 0 drive the cascade.
    ///
    /// Node executions are strictly sequenced; a worker suspending on I/O
    /// suspends the whole cycle. If a cycle is already in flight the call
    /// returns [`CycleOutcome::Skipped`] without touching the graph. A
    /// worker error aborts the cycle and propagates unchanged.
    pub async fn activate(&mut self) -> Result<CycleOutcome, WorkerError> {
        if self.cycle_running.swap(true, Ordering::Acquire) {
            debug!("activation tick skipped, previous cycle still in flight");
            return Ok(CycleOutcome::Skipped);
        }
        let _guard = CycleGuard(Arc::clone(&self.cycle_running));

        let order: Vec<NodeId> = self.iter_level_order().collect();
        for id in order {
            if !self.nodes[id].is_ready() {
                continue;
            }
            if self.nodes[id].activate().await? == Activation::Declined {
                continue;
            }
            trace!(node = id, path = %self.nodes[id].path(), "node activated");
            self.propagate_outputs(id);
        }
        Ok(CycleOutcome::Completed)
    }

    /// Writes a completed node's outputs into every consumer's bound input
    /// slot. An unset output (a branch's untaken side) clears the consumer
    /// slot, leaving that consumer pending.
    fn propagate_outputs(&mut self, id: NodeId) {
        for slot in 0..self.nodes[id].output_count() {
            let value = self.nodes[id].outputs()[slot].clone();
            let consumers: Vec<InputRef> = self.nodes[id].consumers(slot).to_vec();
            for consumer in consumers {
                match &value {
                    Some(value) => {
                        self.nodes[consumer.node].set_input(consumer.slot, value.clone());
                    }
                    None => self.nodes[consumer.node].clear_input(consumer.slot),
                }
            }
        }
    }

    /// Recomputes a node's level from its bound producers and moves it
    /// between buckets when the level changed. Returns whether it moved.
    pub(crate) fn evaluate_deepness(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let level = self.nodes[id]
            .bindings()
            .iter()
            .flatten()
            .map(|producer| self.nodes[producer.node].deepness() + 1)
            .max()
            .unwrap_or(0);
        if level == self.nodes[id].deepness() {
            return false;
        }
        self.move_in_tree(id, level);
        true
    }

    /// Moves a node between level buckets: linear-scan removal from the old
    /// bucket, lazy growth of the tree, append to the new bucket. O(bucket)
    /// per move, which is fine at tens-to-low-hundreds of nodes.
    fn move_in_tree(&mut self, id: NodeId, level: usize) {
        let current = self.nodes[id].deepness();
        if let Some(position) = self.flow_tree[current].iter().position(|&n| n == id) {
            self.flow_tree[current].remove(position);
            self.ensure_tree_level(level);
            self.nodes[id].set_deepness(level);
            self.flow_tree[level].push(id);
        }
    }

    /// Re-levels every member node in one ascending sweep over the live
    /// buckets. A node that moves down lands in a bucket the sweep has not
    /// reached yet and is visited again there, which is what makes a single
    /// pass converge to levels satisfying the ordering invariant after a
    /// bulk load (the levels are not guaranteed minimal, only ordered).
    pub(crate) fn relevel_all(&mut self) {
        // An acyclic graph's levels never exceed the node count; the cap
        // keeps a cyclic structure from chasing its own tail upward forever.
        let cap = self.nodes.len();
        let mut level = 0;
        while level < self.flow_tree.len() {
            let mut index = 0;
            while index < self.flow_tree[level].len() {
                let id = self.flow_tree[level][index];
                let target = self.nodes[id]
                    .bindings()
                    .iter()
                    .flatten()
                    .map(|producer| self.nodes[producer.node].deepness() + 1)
                    .max()
                    .unwrap_or(0);
                if target == level || target > cap {
                    index += 1;
                } else {
                    self.move_in_tree(id, target);
                }
            }
            level += 1;
        }
    }

    /// Drops every node and bucket; registry and transform stay.
    pub(crate) fn clear(&mut self) {
        self.nodes = Vec::new();
        self.flow_tree = Vec::new();
    }

    fn ensure_tree_level(&mut self, level: usize) {
        if self.flow_tree.len() <= level {
            self.flow_tree.resize_with(level + 1, Vec::new);
        }
    }
}

fn identity_transform() -> Vec<serde_json::Value> {
    [1, 0, 0, 1, 0, 0]
        .iter()
        .map(|n| serde_json::json!(n))
        .collect()
}
