//! # Logging façade handed to plugins.
//!
//! [`Logger`] forwards to `tracing` with an optional `module` field so plugin
//! output can be filtered per module. [`init_tracing`] installs the process
//! subscriber; library code never does.
//!
//! ## Level resolution
//! 1. `RUST_LOG`, if set and valid
//! 2. the `level` argument (normally the `log_level` config key)
//! 3. `error`

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Level used when neither `RUST_LOG` nor the config provides a valid one.
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Installs a `tracing-subscriber` fmt subscriber with an env filter.
///
/// Returns `false` if a global subscriber was already installed (the call is
/// then a no-op).
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.trim()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// Module-scoped logger.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    module: Option<Arc<str>>,
}

impl Logger {
    /// Root logger without a module field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Child logger tagged with `module = name`.
    pub fn for_module(&self, name: &str) -> Self {
        Self {
            module: Some(Arc::from(name)),
        }
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn debug(&self, msg: &str) {
        tracing::debug!(module = self.module(), "{msg}");
    }

    pub fn info(&self, msg: &str) {
        tracing::info!(module = self.module(), "{msg}");
    }

    pub fn warn(&self, msg: &str) {
        tracing::warn!(module = self.module(), "{msg}");
    }

    pub fn error(&self, msg: &str) {
        tracing::error!(module = self.module(), "{msg}");
    }
}
