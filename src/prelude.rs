//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and functions from the lamina
//! crate, so application code and tests can pull the core surface in with a
//! single `use lamina::prelude::*;`.

// Graph engine
pub use crate::graph::{Activation, CycleOutcome, Dataflow, InputRef, Node, NodeId, OutputRef};

// Node type registry
pub use crate::registry::{
    NodePath, NodeRegistry, NodeTypeSpec, PropertyDefault, PropertyValues, SlotLabel, Worker,
    WorkerFuture,
};

// Stock catalog
pub use crate::builtins::builtin_registry;

// Persisted representations
pub use crate::codec::{
    FileStructure, LoadReport, WebStructure, check_file_structure, verify_file_structure,
};

// Values
pub use crate::value::Value;

// Error types
pub use crate::error::{StructureError, WorkerError};

// Experiment layer
pub use crate::experiment::{DataPoint, DataSeries, Experiment};

// Device bridging
pub use crate::devices::{DeviceGateway, register_actuator_node, register_sensor_node};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
