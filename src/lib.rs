//! # Lamina - Level-Scheduled Dataflow Engine
//!
//! **Lamina** lets laboratory software compose small computation graphs
//! ("dataflows") from registered node types (value sources, math,
//! conversions, sensor and actuator adapters, control nodes) and execute
//! them on a schedule to drive experiments. Nodes are kept in
//! dependency-ordered level buckets that are maintained incrementally as the
//! graph is edited at runtime, workers may be asynchronous (hardware I/O
//! suspends the cycle, never blocks a thread), and the whole topology
//! round-trips through two persisted representations: a compact file format
//! and a verbose editor format.
//!
//! ## Core Workflow
//!
//! 1.  **Build a catalog**: register node types into a [`NodeRegistry`]
//!     (`registry` module), or start from the stock catalog in
//!     [`builtins`]. Each graph gets its own local registry, optionally
//!     chained to a shared base.
//! 2.  **Assemble a graph**: create nodes from registered paths, admit them
//!     with [`Dataflow::add_node`], wire them with [`Dataflow::connect`],
//!     or load a whole persisted structure in one best-effort pass.
//! 3.  **Activate**: await [`Dataflow::activate`] once per scheduler tick.
//!     Level-0 sources drive the cascade; every ready node runs exactly
//!     once, in dependency order.
//! 4.  **Persist**: export [`Dataflow::file_structure`] for storage or
//!     [`Dataflow::web_structure`] for the editor; both reload through the
//!     same verify-then-load pipeline.
//!
//! [`NodeRegistry`]: registry::NodeRegistry
//! [`Dataflow::add_node`]: graph::Dataflow::add_node
//! [`Dataflow::connect`]: graph::Dataflow::connect
//! [`Dataflow::activate`]: graph::Dataflow::activate
//! [`Dataflow::file_structure`]: graph::Dataflow::file_structure
//! [`Dataflow::web_structure`]: graph::Dataflow::web_structure
//!
//! ## Quick Start
//!
//! ```rust
//! use lamina::prelude::*;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     // The stock catalog, shared by every graph in the process.
//!     let catalog = Arc::new(builtin_registry());
//!     let mut graph = Dataflow::with_base_catalog(catalog);
//!
//!     // Two constant sources feeding a Sum node.
//!     let constant = NodePath::parse("values/constant-number").ok_or("bad path")?;
//!     let sum_path = NodePath::parse("math/sum").ok_or("bad path")?;
//!
//!     let mut overrides = PropertyValues::default();
//!     overrides.insert("value".to_string(), Value::Number(2.0));
//!     let two = graph.add_node(
//!         graph
//!             .create_node(&constant, 0.0, 0.0, &overrides)
//!             .ok_or("unregistered")?,
//!     );
//!     overrides.insert("value".to_string(), Value::Number(3.0));
//!     let three = graph.add_node(
//!         graph
//!             .create_node(&constant, 0.0, 40.0, &overrides)
//!             .ok_or("unregistered")?,
//!     );
//!     let sum = graph.add_node(
//!         graph
//!             .create_node(&sum_path, 120.0, 20.0, &PropertyValues::default())
//!             .ok_or("unregistered")?,
//!     );
//!
//!     graph.connect(two, 0, sum, 0, false);
//!     graph.connect(three, 0, sum, 1, false);
//!
//!     // One activation cycle: sources emit, the sum computes 5.
//!     futures::executor::block_on(graph.activate())?;
//!     let result = graph.node(sum).and_then(|node| node.outputs()[0].clone());
//!     assert_eq!(result, Some(Value::Number(5.0)));
//!     Ok(())
//! }
//! ```

pub mod builtins;
pub mod codec;
pub mod devices;
pub mod error;
pub mod experiment;
pub mod graph;
pub mod prelude;
pub mod registry;
pub mod value;
