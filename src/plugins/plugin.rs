//! # Plugin init contract.
//!
//! [`PluginInit`] is called exactly once, synchronously, in registration order.
//! An `Err` aborts startup: the runtime reports it as a fatal
//! [`RuntimeError::PluginInit`](crate::RuntimeError::PluginInit) and no later
//! plugin is initialized.
//!
//! Work that must outlive `init` belongs in listeners or tasks the plugin
//! starts from here, e.g. a listener on [`Selector::SHUTDOWN`](crate::Selector::SHUTDOWN)
//! that releases the plugin's resources.

use std::sync::Arc;

use crate::error::PluginError;
use crate::plugins::PluginData;
use crate::services::Services;

/// Plugin initialization function.
pub trait PluginInit: Send + Sync + 'static {
    /// Wires the plugin into `services` and describes it.
    fn init(&self, services: &Services) -> Result<PluginData, PluginError>;

    /// Human-readable name (for logs and errors).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a plugin.
pub type PluginRef = Arc<dyn PluginInit>;
