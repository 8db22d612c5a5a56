use serde::Deserialize;

use hashi_core::error::{HashiError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub host: String,

    pub port: u16,

    /// Bot account the gateway is logged in as.
    pub account: i64,

    /// Liveness emit interval in seconds. `None` disables the scheduler.
    #[serde(default)]
    pub heartbeat: Option<u64>,

    /// Outbound action timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, account: i64) -> Self {
        Self {
            host: host.into(),
            port,
            account,
            heartbeat: None,
            timeout: default_timeout(),
        }
    }

    pub fn with_heartbeat(mut self, secs: u64) -> Self {
        self.heartbeat = Some(secs);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = secs;
        self
    }

    /// Base URL shared by the real-time channel and the action endpoint.
    pub fn address(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(HashiError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(HashiError::Config("port must not be 0".into()));
        }
        if self.timeout == 0 {
            return Err(HashiError::Config("timeout must be positive".into()));
        }
        if self.heartbeat == Some(0) {
            return Err(HashiError::Config(
                "heartbeat must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    10
}
