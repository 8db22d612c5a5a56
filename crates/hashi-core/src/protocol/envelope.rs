//! Envelope framing.
//!
//! Every channel event carries its body inside a `CurrentPacket` mapping. The
//! frame is merged into the top level before validation; keys from the frame
//! win over same-named top-level keys.

use serde_json::{Map, Value};

use crate::error::ValidationFailure;

/// Framing key wrapped around every inbound envelope.
pub const CURRENT_PACKET: &str = "CurrentPacket";

/// Merge `CurrentPacket` into the envelope and drop the framing key.
pub fn flatten(envelope: Value) -> Result<Map<String, Value>, ValidationFailure> {
    let Value::Object(mut top) = envelope else {
        return Err(ValidationFailure::new("", "envelope must be a mapping"));
    };

    match top.remove(CURRENT_PACKET) {
        Some(Value::Object(packet)) => {
            top.extend(packet);
            Ok(top)
        }
        Some(other) => Err(ValidationFailure::new(
            CURRENT_PACKET,
            format!("expected mapping, found {}", describe(&other)),
        )),
        None => Err(ValidationFailure::new(CURRENT_PACKET, "missing field")),
    }
}

/// Short JSON type name used in failure reasons.
pub(crate) fn describe(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
