//! Client configuration (strict parsing).
//!
//! Everything is supplied at construction. `from_value` exists for embedding
//! applications that keep the client section inside their own JSON config.

pub mod schema;

use serde_json::Value;

use hashi_core::error::{HashiError, Result};

pub use schema::ClientConfig;

pub fn from_value(v: Value) -> Result<ClientConfig> {
    let cfg: ClientConfig = serde_json::from_value(v)
        .map_err(|e| HashiError::Config(format!("invalid client config: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
