//! Payload encoding for the bike's control channels.
//!
//! Numeric controls (incline, resistance, fan) take a two-field JSON envelope
//! `{"<key>": value, "timestamp": seconds}`. The workout selector takes the
//! bare selector string. The firmware expects exactly these shapes.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::EncodingError;
use super::validator::Value;
use crate::mqtt::topics::Role;

/// How a channel wants its values framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingPolicy {
    /// JSON object with the value under `value_key` plus a timestamp.
    Envelope { value_key: &'static str },
    /// Raw UTF-8 text, no framing.
    Bare,
}

impl EncodingPolicy {
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::InclineControl => Some(EncodingPolicy::Envelope {
                value_key: "incline",
            }),
            Role::ResistanceControl => Some(EncodingPolicy::Envelope {
                value_key: "resistance",
            }),
            Role::FanControl => Some(EncodingPolicy::Envelope { value_key: "value" }),
            Role::WorkoutSelector => Some(EncodingPolicy::Bare),
            _ => None,
        }
    }
}

enum Number {
    Integer(i64),
    Float(f64),
}

/// Keeps the value key ahead of the timestamp in the serialized object.
struct Envelope<'a> {
    value_key: &'a str,
    value: Number,
    timestamp: f64,
}

impl Serialize for Envelope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self.value {
            Number::Integer(v) => map.serialize_entry(self.value_key, &v)?,
            Number::Float(v) => map.serialize_entry(self.value_key, &v)?,
        }
        map.serialize_entry("timestamp", &self.timestamp)?;
        map.end()
    }
}

/// Current time as floating point seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// Encodes `value` for `role`, stamping numeric envelopes with the current time.
pub fn encode(role: Role, value: &Value) -> Result<Vec<u8>, EncodingError> {
    encode_at(role, value, now_timestamp())
}

/// Encodes `value` for `role` using the given timestamp.
pub fn encode_at(role: Role, value: &Value, timestamp: f64) -> Result<Vec<u8>, EncodingError> {
    let policy = EncodingPolicy::for_role(role).ok_or(EncodingError::NotWritable(role))?;

    match policy {
        EncodingPolicy::Envelope { value_key } => {
            let value = match value {
                Value::Integer(v) => Number::Integer(*v),
                Value::Float(v) if v.is_finite() => Number::Float(*v),
                Value::Float(_) => return Err(EncodingError::NonFinite { role }),
                Value::Text(_) => {
                    return Err(EncodingError::TypeMismatch {
                        role,
                        expected: "a number",
                        got: value.type_name(),
                    })
                }
            };

            let envelope = Envelope {
                value_key,
                value,
                timestamp,
            };
            serde_json::to_vec(&envelope).map_err(|e| EncodingError::Serialization(e.to_string()))
        }
        EncodingPolicy::Bare => match value {
            Value::Text(text) => Ok(text.as_bytes().to_vec()),
            other => Err(EncodingError::TypeMismatch {
                role,
                expected: "text",
                got: other.type_name(),
            }),
        },
    }
}
