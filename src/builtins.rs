//! The stock node catalog: the value sources, math, control and conversion
//! node types every graph can draw on. Typically built once per process and
//! shared as the base of each graph's registry chain:
//!
//! ```rust
//! use lamina::builtins::builtin_registry;
//! use lamina::graph::Dataflow;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(builtin_registry());
//! let graph = Dataflow::with_base_catalog(catalog);
//! ```

use crate::error::WorkerError;
use crate::registry::{NodeRegistry, PropertyDefault, PropertyValues, SlotLabel, Worker};
use crate::value::Value;

fn number(value: &Value, operation: &str) -> Result<f64, WorkerError> {
    value
        .as_number()
        .ok_or_else(|| WorkerError::type_mismatch(operation, "Number", value))
}

fn boolean(value: &Value, operation: &str) -> Result<bool, WorkerError> {
    value
        .as_bool()
        .ok_or_else(|| WorkerError::type_mismatch(operation, "Bool", value))
}

/// Numeric property access. Text values parse leniently because enumerated
/// properties arrive as strings from the editor.
fn property_number(
    properties: &PropertyValues,
    name: &str,
    operation: &str,
) -> Result<f64, WorkerError> {
    match properties.get(name) {
        Some(Value::Number(n)) => Ok(*n),
        Some(Value::Text(text)) => text
            .trim()
            .parse()
            .map_err(|_| WorkerError::type_mismatch(operation, "Number", &Value::Text(text.clone()))),
        Some(other) => Err(WorkerError::type_mismatch(operation, "Number", other)),
        None => Err(WorkerError::MissingProperty(name.to_string())),
    }
}

fn property_text<'a>(properties: &'a PropertyValues, name: &str) -> Result<&'a str, WorkerError> {
    properties
        .get(name)
        .and_then(Value::as_text)
        .ok_or_else(|| WorkerError::MissingProperty(name.to_string()))
}

// Registers a batch of pure math node types in one go; mirrors how the
// whole math shelf differs only in labels and the applied function.
macro_rules! register_math_nodes {
    ($registry:expr;
     $( unary($title:expr, $out:expr, $op:expr) ),* $(,)? ;
     $( binary($bi_title:expr, $lhs:expr, $rhs:expr, $bi_out:expr, $bi_op:expr) ),* $(,)?) => {
        $(
            $registry.register(
                $title,
                "Math",
                vec![SlotLabel::new("x")],
                vec![SlotLabel::new($out)],
                Worker::from_sync(|inputs, _| {
                    let x = number(&inputs[0], $title)?;
                    let op: fn(f64) -> f64 = $op;
                    Ok(vec![Some(Value::Number(op(x)))])
                }),
                [],
            );
        )*
        $(
            $registry.register(
                $bi_title,
                "Math",
                vec![SlotLabel::new($lhs), SlotLabel::new($rhs)],
                vec![SlotLabel::new($bi_out)],
                Worker::from_sync(|inputs, _| {
                    let x = number(&inputs[0], $bi_title)?;
                    let y = number(&inputs[1], $bi_title)?;
                    let op: fn(f64, f64) -> f64 = $bi_op;
                    Ok(vec![Some(Value::Number(op(x, y)))])
                }),
                [],
            );
        )*
    };
}

/// Builds the stock catalog.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_value_sources(&mut registry);

    register_math_nodes! { registry;
        unary("Sine", "sin(x)", f64::sin),
        unary("Cosine", "cos(x)", f64::cos),
        unary("Tangent", "tan(x)", f64::tan),
        unary("Natural Log", "ln(x)", f64::ln),
        unary("Log2", "log\u{2082}(x)", f64::log2),
        unary("Log10", "log\u{2081}\u{2080}(x)", f64::log10),
        ;
        binary("Sum", "x", "y", "x+y", |x, y| x + y),
        binary("Subtract", "x", "y", "x-y", |x, y| x - y),
        binary("Multiply", "x", "y", "x*y", |x, y| x * y),
        binary("Divide", "x", "y", "x/y", |x, y| x / y),
        binary("Exponentiate", "x", "n", "x\u{207F}", f64::powf),
    }

    register_control_nodes(&mut registry);
    register_conversion_nodes(&mut registry);
    registry
}

fn register_value_sources(registry: &mut NodeRegistry) {
    registry.register(
        "Constant Number",
        "Values",
        vec![],
        vec![SlotLabel::new("value")],
        Worker::from_sync(|_, properties| {
            let value = property_number(properties, "value", "Constant Number")?;
            Ok(vec![Some(Value::Number(value))])
        }),
        [("value".to_string(), PropertyDefault::new(0.0))],
    );
    registry.register(
        "Constant Boolean",
        "Values",
        vec![],
        vec![SlotLabel::typed("value", "boolean")],
        Worker::from_sync(|_, properties| {
            let value = match properties.get("value") {
                Some(Value::Bool(b)) => *b,
                Some(Value::Text(text)) => text == "true",
                _ => false,
            };
            Ok(vec![Some(Value::Bool(value))])
        }),
        [(
            "value".to_string(),
            PropertyDefault::with_choices("true", [Value::from("true"), Value::from("false")]),
        )],
    );
    registry.register(
        "Random Float",
        "Values",
        vec![],
        vec![SlotLabel::new("value")],
        Worker::from_sync(|_, _| Ok(vec![Some(Value::Number(rand::random::<f64>()))])),
        [],
    );
    registry.register(
        "Random Boolean",
        "Values",
        vec![],
        vec![SlotLabel::typed("value", "boolean")],
        Worker::from_sync(|_, _| Ok(vec![Some(Value::Bool(rand::random::<bool>()))])),
        [],
    );
    registry.register(
        "Pi",
        "Values",
        vec![],
        vec![SlotLabel::new("\u{1D70B}")],
        Worker::from_sync(|_, _| Ok(vec![Some(Value::Number(std::f64::consts::PI))])),
        [],
    );
    registry.register(
        "Euler's Number",
        "Values",
        vec![],
        vec![SlotLabel::new("e")],
        Worker::from_sync(|_, _| Ok(vec![Some(Value::Number(std::f64::consts::E))])),
        [],
    );
}

fn register_control_nodes(registry: &mut NodeRegistry) {
    registry.register(
        "If",
        "Control",
        vec![SlotLabel::new("x"), SlotLabel::new("y")],
        vec![SlotLabel::typed("result", "boolean")],
        Worker::from_sync(|inputs, properties| {
            let comparison = property_text(properties, "comparison")?;
            let result = match comparison {
                "x != y" => inputs[0] != inputs[1],
                "x < y" => number(&inputs[0], "If")? < number(&inputs[1], "If")?,
                "x > y" => number(&inputs[0], "If")? > number(&inputs[1], "If")?,
                "x <= y" => number(&inputs[0], "If")? <= number(&inputs[1], "If")?,
                "x >= y" => number(&inputs[0], "If")? >= number(&inputs[1], "If")?,
                _ => inputs[0] == inputs[1],
            };
            Ok(vec![Some(Value::Bool(result))])
        }),
        [(
            "comparison".to_string(),
            PropertyDefault::with_choices(
                "x == y",
                ["x == y", "x != y", "x < y", "x > y", "x <= y", "x >= y"]
                    .map(Value::from),
            ),
        )],
    );
    registry.register(
        "Branch",
        "Control",
        vec![
            SlotLabel::new("value"),
            SlotLabel::typed("condition", "boolean"),
        ],
        vec![SlotLabel::new("true"), SlotLabel::new("false")],
        Worker::from_sync(|inputs, _| {
            let condition = boolean(&inputs[1], "Branch")?;
            // The untaken side stays unset, which keeps its consumers pending.
            Ok(if condition {
                vec![Some(inputs[0].clone()), None]
            } else {
                vec![None, Some(inputs[0].clone())]
            })
        }),
        [],
    );
}

fn register_conversion_nodes(registry: &mut NodeRegistry) {
    registry.register(
        "Boolean to Number",
        "Conversion",
        vec![SlotLabel::typed("boolean", "boolean")],
        vec![SlotLabel::new("number")],
        Worker::from_sync(|inputs, _| {
            let value = boolean(&inputs[0], "Boolean to Number")?;
            Ok(vec![Some(Value::Number(if value { 1.0 } else { 0.0 }))])
        }),
        [],
    );
    registry.register(
        "Analog Voltage",
        "Conversion",
        vec![SlotLabel::new("analog")],
        vec![SlotLabel::new("voltage")],
        Worker::from_sync(|inputs, properties| {
            let analog = number(&inputs[0], "Analog Voltage")?;
            let resolution = property_number(properties, "adcBitResolution", "Analog Voltage")?;
            let max_voltage = property_number(properties, "maxAnalogVoltage", "Analog Voltage")?;
            let voltage = max_voltage * analog / (2f64.powf(resolution) - 1.0);
            Ok(vec![Some(Value::Number(voltage))])
        }),
        [
            ("adcBitResolution".to_string(), PropertyDefault::new(10.0)),
            ("maxAnalogVoltage".to_string(), PropertyDefault::new(5.0)),
        ],
    );
    registry.register(
        "Float to Integer",
        "Conversion",
        vec![SlotLabel::new("float")],
        vec![SlotLabel::new("integer")],
        Worker::from_sync(|inputs, properties| {
            let value = number(&inputs[0], "Float to Integer")?;
            let rounded = match property_text(properties, "roundingMode")? {
                "Floor" => value.floor(),
                "Ceil" => value.ceil(),
                _ => value.round(),
            };
            Ok(vec![Some(Value::Number(rounded))])
        }),
        [(
            "roundingMode".to_string(),
            PropertyDefault::with_choices("Round", ["Round", "Floor", "Ceil"].map(Value::from)),
        )],
    );
}
