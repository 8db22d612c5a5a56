use bytes::Bytes;
use serde_json::Value;

/// Decoded body of an action call.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionReply {
    Json(Value),
    Text(String),
    Binary(Bytes),
}

impl ActionReply {
    /// JSON first, then UTF-8 text, then raw bytes.
    pub fn decode(body: Bytes) -> Self {
        if let Ok(v) = serde_json::from_slice::<Value>(&body) {
            return ActionReply::Json(v);
        }
        match String::from_utf8(body.to_vec()) {
            Ok(s) => ActionReply::Text(s),
            Err(_) => ActionReply::Binary(body),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ActionReply::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ActionReply::Json(v) => Some(v),
            _ => None,
        }
    }
}
