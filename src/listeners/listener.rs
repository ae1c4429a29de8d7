//! # Core listener trait
//!
//! `Listener` is the extension point plugins use to react to events on a
//! selector. Each listener registered with [`EventBus::listen`](crate::EventBus::listen)
//! is driven by a dedicated worker task fed by its own queue, so:
//!
//! - a slow listener never blocks the dispatcher nor other listeners;
//! - one listener observes events in Emit order;
//! - a failing or panicking handler is logged and the round goes on.
//!
//! ## Re-entrancy
//! A handler runs one event at a time. Emitting on a selector the listener
//! itself subscribes to is fine, but awaiting that emit's
//! [`Delivery`](crate::Delivery) from inside `handle` never completes: the
//! new event waits in the listener's queue behind the running call. Drop the
//! handle or use [`EventBus::emit_with_callback`](crate::EventBus::emit_with_callback).
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use plughost::{Event, Listener, ListenerError, ShutdownEvent};
//!
//! struct Flush;
//!
//! #[async_trait]
//! impl Listener for Flush {
//!     async fn handle(&self, event: &Event) -> Result<(), ListenerError> {
//!         if event.is::<ShutdownEvent>() {
//!             // flush buffers...
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "flush" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ListenerError;
use crate::events::Event;

/// Contract for event listeners.
///
/// Called from a listener-dedicated worker task. Implementations should avoid
/// blocking the async runtime (prefer async I/O and cooperative waits).
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Handle a single event.
    ///
    /// Returning `Err` or panicking is reported through the log only.
    async fn handle(&self, event: &Event) -> Result<(), ListenerError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a listener.
pub type ListenerRef = Arc<dyn Listener>;
