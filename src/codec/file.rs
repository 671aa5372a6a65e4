//! The compact persisted format.
//!
//! A dataflow file is a JSON object of the following shape:
//!
//! ```json
//! {
//!     "nodes": [
//!         ["math/sum", [140, 60], {"name": "Sum"}]
//!     ],
//!     "connections": [
//!         [0, 1, 2, 0]
//!     ],
//!     "transform": [1, 0, 0, 1, 0, 0]
//! }
//! ```
//!
//! Each node entry is `[path, [x, y], {properties}]`; each connection entry
//! is `[fromNode, fromSlot, toNode, toSlot]`, where the node fields index
//! into the *persisted* node list, not runtime identity. The transform is
//! the editor's viewport matrix, passed through unmodified.
//!
//! Validation is two-phase: [`verify_file_structure`] is a cheap structural
//! gate (field presence, array-ness, transform length), and the semantic
//! load is best-effort: a malformed entry is dropped and the rest of the
//! structure still loads. Partial success is normal, not an error.

use crate::error::StructureError;
use crate::graph::{Dataflow, NodeId};
use crate::registry::{NodePath, PropertyValues};
use crate::value::Value;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const NODE_ENTRY_LEN: usize = 3;
const POSITION_LEN: usize = 2;
const CONNECTION_ENTRY_LEN: usize = 4;

/// The compact persisted shape of a dataflow.
///
/// Entries stay as raw JSON values so that one malformed entry cannot
/// poison the whole list; decoding happens entry by entry during the
/// semantic load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileStructure {
    pub nodes: Vec<serde_json::Value>,
    pub connections: Vec<serde_json::Value>,
    pub transform: Vec<serde_json::Value>,
}

impl FileStructure {
    /// Runs the structural gate and, on success, takes the three fields as
    /// they are. Refused structures leave no trace; callers must not fall
    /// through to the semantic load.
    pub fn from_value(value: &serde_json::Value) -> Result<FileStructure, StructureError> {
        check_file_structure(value)?;
        let field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_array)
                .cloned()
                .unwrap_or_default()
        };
        Ok(FileStructure {
            nodes: field("nodes"),
            connections: field("connections"),
            transform: field("transform"),
        })
    }
}

/// Structural validation of a persisted structure: `nodes`, `connections`
/// and `transform` must be present and arrays, and the transform must hold
/// at least 6 values. Node paths and slot bounds are deliberately not
/// checked here; that is the semantic load's job, and it degrades
/// gracefully instead of rejecting.
pub fn verify_file_structure(value: &serde_json::Value) -> bool {
    check_file_structure(value).is_ok()
}

/// Same gate as [`verify_file_structure`], with the refusal reason.
pub fn check_file_structure(value: &serde_json::Value) -> Result<(), StructureError> {
    for field in ["nodes", "connections", "transform"] {
        if !value.get(field).is_some_and(serde_json::Value::is_array) {
            return Err(StructureError::MissingArray(field));
        }
    }
    let transform_len = value["transform"]
        .as_array()
        .map(Vec::len)
        .unwrap_or_default();
    if transform_len < 6 {
        return Err(StructureError::TransformTooShort(transform_len));
    }
    Ok(())
}

/// Counts from one best-effort load. Dropped entries are also logged at
/// `debug` level with the reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub nodes_loaded: usize,
    pub nodes_dropped: usize,
    pub connections_loaded: usize,
    pub connections_dropped: usize,
}

/// A decoded `[path, [x, y], {properties}]` node entry.
pub(crate) struct FileNodeEntry {
    pub path: NodePath,
    pub x: f64,
    pub y: f64,
    pub properties: PropertyValues,
}

impl FileNodeEntry {
    pub(crate) fn decode(entry: &serde_json::Value) -> Option<FileNodeEntry> {
        let entry = entry.as_array()?;
        if entry.len() < NODE_ENTRY_LEN {
            return None;
        }
        let path = NodePath::parse(entry[0].as_str()?)?;
        let position = entry[1].as_array()?;
        if position.len() < POSITION_LEN {
            return None;
        }
        let x = position[0].as_f64()?;
        let y = position[1].as_f64()?;
        let properties = entry[2]
            .as_object()?
            .iter()
            .filter_map(|(name, value)| Value::from_json(value).map(|v| (name.clone(), v)))
            .collect();
        Some(FileNodeEntry {
            path,
            x,
            y,
            properties,
        })
    }
}

/// A decoded `[fromNode, fromSlot, toNode, toSlot]` connection entry. All
/// four fields must be non-negative integers.
pub(crate) struct FileConnectionEntry {
    pub from_node: usize,
    pub from_slot: usize,
    pub to_node: usize,
    pub to_slot: usize,
}

impl FileConnectionEntry {
    pub(crate) fn decode(entry: &serde_json::Value) -> Option<FileConnectionEntry> {
        let entry = entry.as_array()?;
        if entry.len() < CONNECTION_ENTRY_LEN {
            return None;
        }
        let mut fields = [0usize; CONNECTION_ENTRY_LEN];
        for (field, value) in fields.iter_mut().zip(entry) {
            *field = usize::try_from(value.as_u64()?).ok()?;
        }
        let [from_node, from_slot, to_node, to_slot] = fields;
        Some(FileConnectionEntry {
            from_node,
            from_slot,
            to_node,
            to_slot,
        })
    }
}

impl Dataflow {
    /// Serializes the graph into the compact format: nodes in level order,
    /// connections as index quadruples into that order. Levels themselves
    /// are never persisted; they are recomputed on load.
    pub fn file_structure(&self) -> FileStructure {
        let order: Vec<NodeId> = self.iter_level_order().collect();
        let order_index: AHashMap<NodeId, usize> = order
            .iter()
            .enumerate()
            .map(|(index, &id)| (id, index))
            .collect();

        let mut nodes = Vec::with_capacity(order.len());
        let mut connections = Vec::new();
        for (index, &id) in order.iter().enumerate() {
            let Some(node) = self.node(id) else { continue };
            let (x, y) = node.position();
            nodes.push(json!([node.path(), [x, y], node.properties()]));
            for slot in 0..node.output_count() {
                for consumer in node.consumers(slot) {
                    if let Some(&target) = order_index.get(&consumer.node) {
                        connections.push(json!([index, slot, target, consumer.slot]));
                    }
                }
            }
        }
        FileStructure {
            nodes,
            connections,
            transform: self.transform().to_vec(),
        }
    }

    /// Replaces this graph's contents with a persisted structure.
    ///
    /// The node list is replayed first (entries are `[path, [x, y],
    /// {properties}]` triples), then the connection list, whose indices
    /// refer to positions in the *persisted* node list. Malformed entries (wrong
    /// arity, non-integer or negative indices, out-of-range slots,
    /// references to nodes whose construction failed) are dropped and
    /// counted; the load is best-effort by contract.
    ///
    /// Connections are applied without intermediate re-leveling, then one
    /// full pass re-levels every admitted node, because incremental
    /// re-leveling during a bulk load can run out of dependency order.
    pub fn load_file_structure(&mut self, structure: &FileStructure) -> LoadReport {
        self.clear();
        let mut report = LoadReport::default();
        let mut conversion: Vec<Option<NodeId>> = vec![None; structure.nodes.len()];

        for (index, entry) in structure.nodes.iter().enumerate() {
            let Some(decoded) = FileNodeEntry::decode(entry) else {
                report.nodes_dropped += 1;
                debug!(index, "dropping malformed node entry");
                continue;
            };
            let Some(node) = self.create_node(&decoded.path, decoded.x, decoded.y, &decoded.properties)
            else {
                report.nodes_dropped += 1;
                debug!(index, path = %decoded.path, "dropping node entry with unregistered path");
                continue;
            };
            conversion[index] = Some(self.add_node(node));
            report.nodes_loaded += 1;
        }

        for (index, entry) in structure.connections.iter().enumerate() {
            let Some(connection) = FileConnectionEntry::decode(entry) else {
                report.connections_dropped += 1;
                debug!(index, "dropping malformed connection entry");
                continue;
            };
            let (Some(&Some(from)), Some(&Some(to))) = (
                conversion.get(connection.from_node),
                conversion.get(connection.to_node),
            ) else {
                report.connections_dropped += 1;
                debug!(index, "dropping connection entry with dangling node reference");
                continue;
            };
            if self.connect(from, connection.from_slot, to, connection.to_slot, true) {
                report.connections_loaded += 1;
            } else {
                report.connections_dropped += 1;
                debug!(index, "dropping connection entry with out-of-range slot");
            }
        }

        self.relevel_all();
        self.set_transform(structure.transform.clone());
        report
    }
}
