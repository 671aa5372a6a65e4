//! The verbose editor format.
//!
//! Where the compact format is index-addressed arrays for persistence, the
//! editor format spells everything out in named fields and additionally
//! carries the type catalog (`registeredNodes`) so the editor can populate
//! its node palette. Workers are not serializable and are stripped from the
//! catalog entries.
//!
//! Both formats satisfy the same round-trip contract: loading an exported
//! structure reconstructs the same node types, properties and positions and
//! the same connection set. Loading the editor format lowers it to compact
//! entries and reuses the semantic loader.

use super::file::{FileStructure, LoadReport};
use crate::graph::{Dataflow, NodeId};
use crate::registry::{NodePath, NodeTypeSpec, PropertyDefault, PropertyValues, SlotLabel};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WebPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebNode {
    pub path: NodePath,
    pub position: WebPosition,
    #[serde(default)]
    pub properties: PropertyValues,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebConnection {
    pub from_node: usize,
    pub from_slot: usize,
    pub to_node: usize,
    pub to_slot: usize,
}

/// A catalog entry: a node type specification minus its worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebNodeSpec {
    pub title: String,
    pub category: String,
    pub input_labels: Vec<SlotLabel>,
    pub output_labels: Vec<SlotLabel>,
    pub default_properties: AHashMap<String, PropertyDefault>,
}

impl From<&NodeTypeSpec> for WebNodeSpec {
    fn from(spec: &NodeTypeSpec) -> Self {
        WebNodeSpec {
            title: spec.title.clone(),
            category: spec.category.clone(),
            input_labels: spec.input_labels.clone(),
            output_labels: spec.output_labels.clone(),
            default_properties: spec.default_properties.clone(),
        }
    }
}

/// One palette category: the display name plus its specs keyed by
/// normalized title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebCategory {
    pub name: String,
    pub nodes: BTreeMap<String, WebNodeSpec>,
}

/// The editor-facing shape of a dataflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebStructure {
    pub nodes: Vec<WebNode>,
    pub connections: Vec<WebConnection>,
    #[serde(default)]
    pub registered_nodes: BTreeMap<String, WebCategory>,
    #[serde(default)]
    pub transform: Vec<serde_json::Value>,
}

impl WebStructure {
    /// Lowers the editor shape to compact entries so both formats share one
    /// semantic loader.
    pub fn to_file_structure(&self) -> FileStructure {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                json!([
                    node.path,
                    [node.position.x, node.position.y],
                    node.properties
                ])
            })
            .collect();
        let connections = self
            .connections
            .iter()
            .map(|connection| {
                json!([
                    connection.from_node,
                    connection.from_slot,
                    connection.to_node,
                    connection.to_slot
                ])
            })
            .collect();
        FileStructure {
            nodes,
            connections,
            transform: self.transform.clone(),
        }
    }
}

impl Dataflow {
    /// Serializes the graph into the editor format, including the catalog
    /// of every node type visible through this graph's registry chain.
    pub fn web_structure(&self) -> WebStructure {
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
            nodes.push(WebNode {
                path: node.path().clone(),
                position: WebPosition { x, y },
                properties: node.properties().clone(),
            });
            for slot in 0..node.output_count() {
                for consumer in node.consumers(slot) {
                    if let Some(&target) = order_index.get(&consumer.node) {
                        connections.push(WebConnection {
                            from_node: index,
                            from_slot: slot,
                            to_node: target,
                            to_slot: consumer.slot,
                        });
                    }
                }
            }
        }

        let registered_nodes = self
            .registry()
            .visible()
            .into_iter()
            .map(|(category_key, entry)| {
                let specs = entry
                    .nodes
                    .iter()
                    .map(|(title_key, spec)| (title_key.clone(), WebNodeSpec::from(spec.as_ref())))
                    .collect();
                (
                    category_key,
                    WebCategory {
                        name: entry.name,
                        nodes: specs,
                    },
                )
            })
            .collect();

        WebStructure {
            nodes,
            connections,
            registered_nodes,
            transform: self.transform().to_vec(),
        }
    }

    /// Replaces this graph's contents with an editor-format structure; same
    /// best-effort semantics as [`load_file_structure`](Dataflow::load_file_structure).
    pub fn load_web_structure(&mut self, structure: &WebStructure) -> LoadReport {
        self.load_file_structure(&structure.to_file_structure())
    }
}
