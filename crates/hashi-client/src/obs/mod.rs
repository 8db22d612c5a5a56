//! Process-wide logging setup.
//!
//! Components log through `tracing`; this module only installs the
//! subscriber. `RUST_LOG` wins over the chosen verbosity when set.

use tracing_subscriber::{fmt, EnvFilter};

use hashi_core::error::{HashiError, Result};

/// Default verbosity for the `hashi` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Info,
    Debug,
    /// Includes per-dispatch and per-listener timings.
    Trace,
}

impl Verbosity {
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Info => "info",
            Verbosity::Debug => "info,hashi_client=debug,hashi=debug",
            Verbosity::Trace => "info,hashi_client=trace,hashi=trace",
        }
    }
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init(verbosity: Verbosity) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| HashiError::Internal(format!("logging init failed: {e}")))
}
