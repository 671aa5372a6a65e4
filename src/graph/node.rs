use crate::error::WorkerError;
use crate::registry::{NodePath, NodeTypeSpec, PropertyValues};
use crate::value::Value;
use std::sync::Arc;

/// Stable handle of a node inside its owning graph's arena. Handles are
/// never reused while the graph lives; a handle is only meaningful to the
/// graph that issued it.
pub type NodeId = usize;

/// Producer side of an edge: an output slot on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRef {
    pub node: NodeId,
    pub slot: usize,
}

/// Consumer side of an edge: an input slot on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRef {
    pub node: NodeId,
    pub slot: usize,
}

/// Outcome of one activation attempt. Declines are benign: unmet readiness
/// and output-arity mismatches both decline without raising an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Completed,
    Declined,
}

/// A graph vertex: one instance of a registered node type.
///
/// A node is either pending (some input slot unset) or ready (all set);
/// there is no persisted running state. Edges are stored as handles: each
/// input slot holds at most one producer reference, each output slot an
/// unlimited fan-out list of consumer references, so the graph's adjacency
/// is plain data with no cyclic ownership.
#[derive(Debug, Clone)]
pub struct Node {
    spec: Arc<NodeTypeSpec>,
    path: NodePath,
    position: (f64, f64),
    properties: PropertyValues,
    inputs: Vec<Option<Value>>,
    bindings: Vec<Option<OutputRef>>,
    fanout: Vec<Vec<InputRef>>,
    outputs: Vec<Option<Value>>,
    deepness: usize,
}

impl Node {
    /// A fresh, unconnected node. Its `deepness` starts at the input-slot
    /// count, a placement heuristic kept from the original engine; the
    /// first re-level after admission resolves the real level.
    pub(crate) fn new(spec: Arc<NodeTypeSpec>, x: f64, y: f64, overrides: &PropertyValues) -> Node {
        let path = NodePath::new(&spec.category, &spec.title);
        let input_count = spec.input_count();
        let output_count = spec.output_count();
        let properties = spec.resolve_properties(overrides);
        Node {
            spec,
            path,
            position: (x, y),
            properties,
            inputs: vec![None; input_count],
            bindings: vec![None; input_count],
            fanout: vec![Vec::new(); output_count],
            outputs: vec![None; output_count],
            deepness: input_count,
        }
    }

    pub fn spec(&self) -> &Arc<NodeTypeSpec> {
        &self.spec
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn properties(&self) -> &PropertyValues {
        &self.properties
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    pub fn deepness(&self) -> usize {
        self.deepness
    }

    pub(crate) fn set_deepness(&mut self, level: usize) {
        self.deepness = level;
    }

    /// The values produced by the most recent completed activation.
    pub fn outputs(&self) -> &[Option<Value>] {
        &self.outputs
    }

    /// The producer bound to an input slot, if any. At most one producer per
    /// input at all times.
    pub fn binding(&self, input: usize) -> Option<OutputRef> {
        self.bindings.get(input).copied().flatten()
    }

    pub(crate) fn bindings(&self) -> &[Option<OutputRef>] {
        &self.bindings
    }

    /// The consumers fed by an output slot.
    pub fn consumers(&self, output: usize) -> &[InputRef] {
        self.fanout.get(output).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Bounds-checked write into the input buffer.
    pub fn set_input(&mut self, index: usize, value: Value) -> bool {
        match self.inputs.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Resets an input slot to unset; the untaken side of a branch
    /// propagates this instead of a value.
    pub(crate) fn clear_input(&mut self, index: usize) {
        if let Some(slot) = self.inputs.get_mut(index) {
            *slot = None;
        }
    }

    /// Ready means every input slot holds a value; a node with no inputs is
    /// vacuously ready every cycle.
    pub fn is_ready(&self) -> bool {
        self.inputs.iter().all(Option::is_some)
    }

    /// Rebinds an input slot to a new producer, returning the one it
    /// replaced. The caller owns the old producer's fan-out cleanup.
    pub(crate) fn bind_input(&mut self, input: usize, producer: OutputRef) -> Option<OutputRef> {
        self.bindings[input].replace(producer)
    }

    pub(crate) fn add_consumer(&mut self, output: usize, consumer: InputRef) {
        self.fanout[output].push(consumer);
    }

    pub(crate) fn remove_consumer(&mut self, output: usize, consumer: InputRef) {
        self.fanout[output].retain(|existing| *existing != consumer);
    }

    /// One evaluation attempt: check readiness, run the worker, gate on
    /// output arity, publish outputs into this node's slots, clear inputs.
    /// Distribution to consumers happens in the graph's activation cycle.
    ///
    /// Declines leave the node untouched (beyond whatever side effects the
    /// worker of an arity-mismatched type already performed). A worker error
    /// is not caught here; it belongs to the caller of the cycle.
    pub async fn activate(&mut self) -> Result<Activation, WorkerError> {
        if !self.is_ready() {
            return Ok(Activation::Declined);
        }
        let input_values: Vec<Value> = self.inputs.iter().flatten().cloned().collect();
        let produced = self
            .spec
            .worker
            .call(input_values, self.properties.clone())
            .await?;
        if produced.len() != self.outputs.len() {
            return Ok(Activation::Declined);
        }
        self.outputs = produced;
        for slot in &mut self.inputs {
            *slot = None;
        }
        Ok(Activation::Completed)
    }
}
