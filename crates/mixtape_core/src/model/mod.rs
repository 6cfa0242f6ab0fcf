//! Typed shapes of the mixtape document and the change request.
//!
//! # Responsibility
//! - Define the structures the change engine reads and mutates.
//! - Validate raw JSON trees once at the boundary (`from_value`).
//!
//! # Invariants
//! - A root that is not a JSON object is rejected with `InvalidArgument`.
//! - Keys the engine does not know about survive a decode/encode cycle.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod change;
pub mod document;

/// Parameter name reported for the source document.
pub const MIXTAPE_PARAMETER: &str = "mixtape";
/// Parameter name reported for the change request.
pub const CHANGES_PARAMETER: &str = "changes";

pub type ModelResult<T> = Result<T, ModelError>;

/// Boundary errors raised while building models from raw JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Input is absent (`null`) or not a JSON object.
    InvalidArgument {
        parameter: &'static str,
        found: &'static str,
    },
    /// Input is an object but required keys are missing or mistyped.
    Malformed {
        parameter: &'static str,
        message: String,
    },
    /// Model could not be rendered back to JSON.
    Encode(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument { parameter, found } => write!(
                f,
                "expected valid {parameter} object, got {found}"
            ),
            Self::Malformed { parameter, message } => {
                write!(f, "malformed {parameter} object: {message}")
            }
            Self::Encode(message) => write!(f, "failed to encode document: {message}"),
        }
    }
}

impl Error for ModelError {}

impl ModelError {
    /// Returns the input parameter this error refers to, if any.
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { parameter, .. } | Self::Malformed { parameter, .. } => {
                Some(parameter)
            }
            Self::Encode(_) => None,
        }
    }
}

/// Rejects any root that is not a JSON object, naming the parameter.
pub fn ensure_object(parameter: &'static str, value: &Value) -> ModelResult<()> {
    if value.is_object() {
        return Ok(());
    }
    Err(ModelError::InvalidArgument {
        parameter,
        found: json_kind(value),
    })
}

pub(crate) fn decode_object<T: DeserializeOwned>(
    parameter: &'static str,
    value: Value,
) -> ModelResult<T> {
    ensure_object(parameter, &value)?;

    serde_json::from_value(value).map_err(|err| ModelError::Malformed {
        parameter,
        message: err.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
