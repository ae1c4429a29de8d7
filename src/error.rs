//! Error types used by the plughost bus, runtime and collaborators.
//!
//! This module defines the error enums of the crate:
//!
//! - [`BusError`]: the event bus refused or lost a round.
//! - [`ListenerError`]: a listener handler reported a failure (logged, never propagated).
//! - [`PluginError`]: a plugin init function failed.
//! - [`RuntimeError`]: errors raised by the lifecycle orchestrator itself.
//! - [`ConfigError`], [`StorageError`], [`ApiError`]: collaborator failures.
//!
//! All types provide `as_label` for logs; [`RuntimeError`] additionally tells
//! fatal startup errors apart from recoverable ones via [`RuntimeError::is_fatal`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::events::Selector;

/// # Errors produced by the event bus.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The bus is closing or closed; the round was never admitted
    /// (or its completion signal was lost with the dispatcher).
    #[error("event bus closed")]
    Closed,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Closed => "bus_closed",
        }
    }
}

/// # Failure reported by a listener handler.
///
/// Listener failures are isolated at the per-listener boundary: the bus logs
/// them and carries on with the round.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListenerError {
    /// Handler failed while processing an event.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl ListenerError {
    /// Shorthand for [`ListenerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ListenerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::Fail { .. } => "listener_failed",
        }
    }
}

/// # Failure returned by a plugin init function.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PluginError {
    /// Plugin refused to initialize.
    #[error("plugin init failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A collaborator the plugin depends on failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Route registration failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl PluginError {
    /// Shorthand for [`PluginError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        PluginError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::Fail { .. } => "plugin_failed",
            PluginError::Storage(_) => "plugin_storage",
            PluginError::Api(_) => "plugin_api",
        }
    }
}

/// # Errors produced by the plugin runtime.
///
/// Two classes exist:
/// - **fatal** startup errors (storage root, plugin init): the host is expected
///   to terminate; there is no partial-initialization recovery.
/// - **recoverable** errors (shutdown timeout, delivery integrity, misuse of the
///   lifecycle order): returned to the caller, who decides what to do next.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The local storage root could not be created.
    #[error("can't create local storage path {path:?}: {source}")]
    StorageRoot {
        /// Configured storage root.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A plugin init function failed.
    #[error("error initializing plugin {plugin:?}: {source}")]
    PluginInit {
        /// Declared name of the failing plugin.
        plugin: String,
        /// Error returned by the init function.
        #[source]
        source: PluginError,
    },

    /// Shutdown listeners did not respond within the bound.
    #[error("shutdown timeout {timeout:?} exceeded")]
    ShutdownTimeout {
        /// The configured shutdown bound.
        timeout: Duration,
    },

    /// The shutdown round echoed back an event other than the one emitted.
    #[error("wrong event delivered on {selector}")]
    WrongEventDelivered {
        /// Selector the echoed event was delivered on.
        selector: Selector,
    },

    /// Operation requires `initialize` to have completed.
    #[error("runtime not initialized")]
    NotInitialized,

    /// `initialize` was already called.
    #[error("runtime already initialized")]
    AlreadyInitialized,

    /// Plugins were already initialized; the registration list is closed.
    #[error("plugins already initialized")]
    PluginsAlreadyInitialized,

    /// Shutdown was already requested.
    #[error("shutdown already requested")]
    AlreadyShutDown,

    /// OS signal handlers could not be installed.
    #[error("can't listen for shutdown signals: {source}")]
    Signal {
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The event bus refused the round.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use plughost::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::ShutdownTimeout { timeout: Duration::from_secs(10) };
    /// assert_eq!(err.as_label(), "runtime_shutdown_timeout");
    /// assert!(!err.is_fatal());
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::StorageRoot { .. } => "runtime_storage_root",
            RuntimeError::PluginInit { .. } => "runtime_plugin_init",
            RuntimeError::ShutdownTimeout { .. } => "runtime_shutdown_timeout",
            RuntimeError::WrongEventDelivered { .. } => "runtime_wrong_event",
            RuntimeError::NotInitialized => "runtime_not_initialized",
            RuntimeError::AlreadyInitialized => "runtime_already_initialized",
            RuntimeError::PluginsAlreadyInitialized => "runtime_plugins_initialized",
            RuntimeError::AlreadyShutDown => "runtime_already_shut_down",
            RuntimeError::Signal { .. } => "runtime_signal",
            RuntimeError::Bus(_) => "runtime_bus",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::StorageRoot { path, source } => {
                format!("storage root {} unusable: {source}", path.display())
            }
            RuntimeError::PluginInit { plugin, source } => {
                format!("plugin={plugin} error={source}")
            }
            RuntimeError::ShutdownTimeout { timeout } => {
                format!("shutdown listeners still busy after {timeout:?}")
            }
            other => other.to_string(),
        }
    }

    /// True for startup errors after which the host must not continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RuntimeError::StorageRoot { .. } | RuntimeError::PluginInit { .. }
        )
    }
}

/// # Errors produced by the local storage collaborator.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage i/o on {path:?}: {source}")]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Lease was already released or belongs to another storage root.
    #[error("unknown storage lease {id}/{version}")]
    UnknownLease {
        /// Lease owner id.
        id: String,
        /// Lease version.
        version: String,
    },

    /// Id or version would escape the storage root.
    #[error("invalid storage name {name:?}")]
    InvalidName {
        /// Offending component.
        name: String,
    },
}

impl StorageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "storage_io",
            StorageError::UnknownLease { .. } => "storage_unknown_lease",
            StorageError::InvalidName { .. } => "storage_invalid_name",
        }
    }
}

/// # Errors produced while loading configuration layers.
///
/// Never fatal: the config service logs them and keeps its other layers.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("can't read config file {path:?}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not a YAML mapping.
    #[error("invalid config file {path:?}: {reason}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "config_read",
            ConfigError::Parse { .. } => "config_parse",
        }
    }
}

/// # Errors produced by the in-process HTTP router.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A handler is already registered for this method and path.
    #[error("route already registered: {method} {path}")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Route path.
        path: String,
    },

    /// Route path must start with `/`.
    #[error("invalid route path {path:?}")]
    InvalidPath {
        /// Offending path.
        path: String,
    },
}

impl ApiError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ApiError::DuplicateRoute { .. } => "api_duplicate_route",
            ApiError::InvalidPath { .. } => "api_invalid_path",
        }
    }
}
