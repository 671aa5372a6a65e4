use crate::value::Value;
use thiserror::Error;

/// Errors raised by the structural gate over a persisted dataflow structure.
///
/// Structural validation refuses a structure outright, before any graph
/// mutation. Everything finer-grained (unknown paths, bad slot indices) is
/// deferred to the semantic load, which drops offending entries instead of
/// failing.
#[derive(Error, Debug, Clone)]
pub enum StructureError {
    #[error("structure field '{0}' is missing or not an array")]
    MissingArray(&'static str),

    #[error("transform must hold at least 6 values, but found {0}")]
    TransformTooShort(usize),
}

/// Errors raised from inside a worker function.
///
/// The engine never produces these on its own and never swallows them: a
/// failing worker aborts the activation cycle and the error reaches the
/// caller untouched. Unmet readiness and output-arity mismatches are benign
/// declines, not errors.
#[derive(Error, Debug, Clone)]
pub enum WorkerError {
    #[error(
        "type mismatch during operation '{operation}': expected {expected}, but found value '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: Value,
    },

    #[error("property '{0}' is missing or holds no usable value")]
    MissingProperty(String),

    #[error("device I/O failed for '{target}': {message}")]
    Device { target: String, message: String },

    #[error("{0}")]
    Custom(String),
}

impl WorkerError {
    /// Shorthand for the mismatch variant, used throughout the stock catalog.
    pub fn type_mismatch(operation: &str, expected: &str, found: &Value) -> Self {
        WorkerError::TypeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            found: found.clone(),
        }
    }
}
