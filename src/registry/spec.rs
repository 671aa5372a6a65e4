use crate::error::WorkerError;
use crate::value::Value;
use ahash::AHashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The resolved property mapping handed to a worker: defaults overlaid with
/// the node instance's overrides.
pub type PropertyValues = AHashMap<String, Value>;

/// A slot name, optionally tagged with the kind of value the slot handles.
///
/// Serializes as a bare string when untagged and as `{name, type}` when
/// tagged, which is the shape the editor catalog expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SlotLabelRepr", into = "SlotLabelRepr")]
pub struct SlotLabel {
    pub name: String,
    pub value_type: Option<String>,
}

impl SlotLabel {
    pub fn new(name: &str) -> SlotLabel {
        SlotLabel {
            name: name.to_string(),
            value_type: None,
        }
    }

    pub fn typed(name: &str, value_type: &str) -> SlotLabel {
        SlotLabel {
            name: name.to_string(),
            value_type: Some(value_type.to_string()),
        }
    }
}

impl From<&str> for SlotLabel {
    fn from(name: &str) -> Self {
        SlotLabel::new(name)
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(untagged)]
enum SlotLabelRepr {
    Typed {
        name: String,
        #[serde(rename = "type")]
        value_type: String,
    },
    Plain(String),
}

impl From<SlotLabelRepr> for SlotLabel {
    fn from(repr: SlotLabelRepr) -> Self {
        match repr {
            SlotLabelRepr::Plain(name) => SlotLabel {
                name,
                value_type: None,
            },
            SlotLabelRepr::Typed { name, value_type } => SlotLabel {
                name,
                value_type: Some(value_type),
            },
        }
    }
}

impl From<SlotLabel> for SlotLabelRepr {
    fn from(label: SlotLabel) -> Self {
        match label.value_type {
            None => SlotLabelRepr::Plain(label.name),
            Some(value_type) => SlotLabelRepr::Typed {
                name: label.name,
                value_type,
            },
        }
    }
}

/// Default for one node property: the value, plus an optional enumeration of
/// the values an editor should offer.
///
/// Serializes as the bare value when unconstrained and as
/// `{value, possibleValues}` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PropertyDefaultRepr", into = "PropertyDefaultRepr")]
pub struct PropertyDefault {
    pub value: Value,
    pub possible_values: Option<Vec<Value>>,
}

impl PropertyDefault {
    pub fn new(value: impl Into<Value>) -> PropertyDefault {
        PropertyDefault {
            value: value.into(),
            possible_values: None,
        }
    }

    pub fn with_choices(
        value: impl Into<Value>,
        choices: impl IntoIterator<Item = Value>,
    ) -> PropertyDefault {
        PropertyDefault {
            value: value.into(),
            possible_values: Some(choices.into_iter().collect()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(untagged)]
enum PropertyDefaultRepr {
    Detailed {
        value: Value,
        #[serde(
            rename = "possibleValues",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        possible_values: Option<Vec<Value>>,
    },
    Bare(Value),
}

impl From<PropertyDefaultRepr> for PropertyDefault {
    fn from(repr: PropertyDefaultRepr) -> Self {
        match repr {
            PropertyDefaultRepr::Bare(value) => PropertyDefault {
                value,
                possible_values: None,
            },
            PropertyDefaultRepr::Detailed {
                value,
                possible_values,
            } => PropertyDefault {
                value,
                possible_values,
            },
        }
    }
}

impl From<PropertyDefault> for PropertyDefaultRepr {
    fn from(default: PropertyDefault) -> Self {
        match default.possible_values {
            None => PropertyDefaultRepr::Bare(default.value),
            possible_values => PropertyDefaultRepr::Detailed {
                value: default.value,
                possible_values,
            },
        }
    }
}

/// The future a worker resolves to: one `Option<Value>` per declared output
/// slot, where `None` leaves the consumer's input unset.
pub type WorkerFuture = BoxFuture<'static, Result<Vec<Option<Value>>, WorkerError>>;

/// The computation bound to a node type.
///
/// A worker receives the ordered input values (all defined; readiness is
/// checked before invocation) and the node's resolved properties, and yields
/// one value per declared output slot. Workers are shared between every node
/// instance of the type, so they must be `Send + Sync` and own their state.
///
/// `from_sync` wraps an ordinary closure; `from_async` accepts a closure
/// returning a boxed future for workers that suspend on I/O, e.g. a hardware
/// read. The activation cycle awaits either kind the same way.
#[derive(Clone)]
pub struct Worker(Arc<dyn Fn(Vec<Value>, PropertyValues) -> WorkerFuture + Send + Sync>);

impl Worker {
    pub fn from_sync<F>(worker: F) -> Worker
    where
        F: Fn(&[Value], &PropertyValues) -> Result<Vec<Option<Value>>, WorkerError>
            + Send
            + Sync
            + 'static,
    {
        Worker(Arc::new(move |inputs, properties| {
            std::future::ready(worker(&inputs, &properties)).boxed()
        }))
    }

    pub fn from_async<F>(worker: F) -> Worker
    where
        F: Fn(Vec<Value>, PropertyValues) -> WorkerFuture + Send + Sync + 'static,
    {
        Worker(Arc::new(worker))
    }

    pub fn call(&self, inputs: Vec<Value>, properties: PropertyValues) -> WorkerFuture {
        (self.0)(inputs, properties)
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Worker")
    }
}

/// The full specification of a node type: slot layout, worker, and property
/// defaults. Instances are shared out of the registry as `Arc<NodeTypeSpec>`.
#[derive(Debug, Clone)]
pub struct NodeTypeSpec {
    pub title: String,
    pub category: String,
    pub input_labels: Vec<SlotLabel>,
    pub output_labels: Vec<SlotLabel>,
    pub worker: Worker,
    pub default_properties: AHashMap<String, PropertyDefault>,
}

impl NodeTypeSpec {
    pub fn input_count(&self) -> usize {
        self.input_labels.len()
    }

    pub fn output_count(&self) -> usize {
        self.output_labels.len()
    }

    /// Overlays instance overrides on this spec's property defaults.
    pub fn resolve_properties(&self, overrides: &PropertyValues) -> PropertyValues {
        let mut resolved: PropertyValues = self
            .default_properties
            .iter()
            .map(|(name, default)| (name.clone(), default.value.clone()))
            .collect();
        for (name, value) in overrides {
            resolved.insert(name.clone(), value.clone());
        }
        resolved
    }
}
