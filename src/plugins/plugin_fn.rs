//! # Function-backed plugin (`PluginFn`)
//!
//! ## Example
//! ```rust
//! use plughost::{PluginData, PluginFn, PluginRef, Selector, Services, ShutdownEvent};
//!
//! let p: PluginRef = PluginFn::arc("audit", |services: &Services| {
//!     services.events().listen_fn(Selector::SHUTDOWN, |ev: plughost::Event| async move {
//!         let _bye = ev.downcast_ref::<ShutdownEvent>();
//!         Ok(())
//!     });
//!     Ok(PluginData::new("audit", "0.1.0"))
//! });
//! assert_eq!(p.name(), "audit");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::PluginError;
use crate::plugins::{PluginData, PluginInit};
use crate::services::Services;

/// Function-backed plugin implementation.
pub struct PluginFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> PluginFn<F>
where
    F: Fn(&Services) -> Result<PluginData, PluginError> + Send + Sync + 'static,
{
    /// Creates a new function-backed plugin.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the plugin and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> PluginInit for PluginFn<F>
where
    F: Fn(&Services) -> Result<PluginData, PluginError> + Send + Sync + 'static,
{
    fn init(&self, services: &Services) -> Result<PluginData, PluginError> {
        (self.f)(services)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for PluginFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginFn").field("name", &self.name).finish()
    }
}
