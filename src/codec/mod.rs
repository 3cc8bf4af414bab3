//! Wire codec for submitted records.
//!
//! # Data Flow
//! ```text
//! SubmittedRecord (flat string map)
//!     → encode (JSON object, UTF-8 bytes)
//!     → framing.rs (u32 BE length prefix on the TCP stream)
//!     → framing.rs (read back one self-delimited payload)
//!     → decode (strict: flat string map or DecodeError)
//! ```
//!
//! # Design Decisions
//! - JSON string escaping guarantees round-trip fidelity for arbitrary
//!   content (separators, quotes, unicode)
//! - Decoding never produces a partial record: anything that is not a
//!   flat string-keyed, string-valued object is a `DecodeError`
//! - `BTreeMap` keeps encode output deterministic for a given record

pub mod framing;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

pub use framing::{read_frame, write_frame, FrameError, ACK_FAILED, ACK_STORED};

/// A client-submitted record: unique string keys mapped to string values.
/// No fixed schema; any key/value pair is accepted.
pub type SubmittedRecord = BTreeMap<String, String>;

/// Error produced when a wire payload is not a valid record encoding.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not valid UTF-8 JSON.
    #[error("payload is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    /// Payload parsed, but the top level is not an object.
    #[error("payload is not a JSON object (got {0})")]
    NotAnObject(&'static str),
    /// Payload is an object, but one of its values is not a string.
    #[error("value for key `{key}` is not a string (got {kind})")]
    NonStringValue { key: String, kind: &'static str },
}

/// Serialize a record into its wire payload (without framing).
///
/// Total over any string map: JSON object construction and display
/// cannot fail, and `decode` recovers the exact input.
pub fn encode(record: &SubmittedRecord) -> Vec<u8> {
    let object: serde_json::Map<String, Value> = record
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    Value::Object(object).to_string().into_bytes()
}

/// Deserialize a wire payload back into a record.
///
/// Rejects anything that is not a flat string-to-string object: arrays,
/// scalars, nested structures, and non-string values all fail cleanly
/// rather than yielding a partially populated record.
pub fn decode(payload: &[u8]) -> Result<SubmittedRecord, DecodeError> {
    let value: Value = serde_json::from_slice(payload)?;

    let object = match value {
        Value::Object(object) => object,
        other => return Err(DecodeError::NotAnObject(json_kind(&other))),
    };

    let mut record = SubmittedRecord::new();
    for (key, value) in object {
        match value {
            Value::String(text) => {
                record.insert(key, text);
            }
            other => {
                return Err(DecodeError::NonStringValue {
                    key,
                    kind: json_kind(&other),
                });
            }
        }
    }
    Ok(record)
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
