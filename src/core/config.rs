//! # Runtime configuration.
//!
//! Provides [`RuntimeConfig`], the settings of the lifecycle orchestrator.
//! Collaborator settings (storage root, proxy, log level, ...) live in the
//! [`ConfigService`](crate::ConfigService) instead.

use std::time::Duration;

/// Configuration of a [`Runtime`](crate::Runtime).
///
/// ## Field semantics
/// - `shutdown_timeout`: bound on the shutdown handshake (default `10s`)
/// - `trace_deliveries`: attach a [`LogWriter`](crate::LogWriter) to the
///   delivery-completed selector during `initialize` (default `false`)
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Maximum time `shutdown_plugins_and_wait` waits for shutdown listeners.
    ///
    /// If exceeded, returns `RuntimeError::ShutdownTimeout`.
    pub shutdown_timeout: Duration,

    /// Trace every completed delivery round at `debug` level.
    pub trace_deliveries: bool,
}

impl Default for RuntimeConfig {
    /// Default configuration:
    ///
    /// - `shutdown_timeout = 10s`
    /// - `trace_deliveries = false`
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(10),
            trace_deliveries: false,
        }
    }
}
