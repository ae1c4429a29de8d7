//! # Selectors: string keys partitioning the event space.
//!
//! Three selectors are reserved by the runtime:
//! - [`Selector::SYSTEM`] startup and "plugins initialized" events
//! - [`Selector::SHUTDOWN`] the shutdown handshake
//! - [`Selector::DELIVERED`] delivery-completed notifications
//!
//! ```rust
//! use plughost::Selector;
//!
//! let orders = Selector::from("orders");
//! assert_eq!(orders.as_str(), "orders");
//! assert_ne!(orders, Selector::SYSTEM);
//! ```

use std::borrow::Cow;
use std::fmt;

/// Opaque string key naming an independent stream of events.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector(Cow<'static, str>);

impl Selector {
    /// Startup and plugin-initialization events.
    pub const SYSTEM: Selector = Selector(Cow::Borrowed("system event"));
    /// Shutdown handshake.
    pub const SHUTDOWN: Selector = Selector(Cow::Borrowed("shutdown event"));
    /// Delivery-completed notifications synthesized by the bus.
    pub const DELIVERED: Selector = Selector(Cow::Borrowed("event delivered"));

    /// Creates a selector from any string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the selector key.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Selector {
    fn from(s: &'static str) -> Self {
        Self(Cow::Borrowed(s))
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Self(Cow::Owned(s))
    }
}

impl From<&Selector> for Selector {
    fn from(s: &Selector) -> Self {
        s.clone()
    }
}
