//! # Plugins.
//!
//! A plugin is an init function registered with the runtime before startup.
//! When [`Runtime::initialize_plugins`](crate::Runtime::initialize_plugins)
//! runs, each init function receives the [`Services`](crate::Services) bundle,
//! wires its listeners/routes/storage, and returns a [`PluginData`] record.
//!
//! ```text
//! register_plugin(p1, data1) ─┐
//! register_plugin(p2, data2) ─┼─► [registration order] ──► p1.init(&services) ─► p2.init(&services) ─► ...
//!                             │
//!                             └─► plugin_versions()  (declared data, readable at any time)
//! ```

mod data;
mod plugin;
mod plugin_fn;

pub use data::PluginData;
pub use plugin::{PluginInit, PluginRef};
pub use plugin_fn::PluginFn;
