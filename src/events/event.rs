//! # Type-erased event envelope.
//!
//! The bus never inspects payloads: an [`Event`] wraps any `Send + Sync`
//! value behind an `Arc`, so fanning one event out to N listeners clones a
//! pointer, not the payload. Listeners recover the concrete type with
//! [`Event::downcast_ref`].
//!
//! ## Ordering metadata
//! Each event gets a globally unique sequence number (`seq`) that increases
//! monotonically, plus a wall-clock timestamp for logs.
//!
//! ## Example
//! ```rust
//! use plughost::{Event, ShutdownEvent};
//!
//! let ev = Event::new(ShutdownEvent::new("host is going to shutdown"));
//! let copy = ev.clone();
//!
//! assert!(ev.is::<ShutdownEvent>());
//! assert!(ev.ptr_eq(&copy));
//! assert_eq!(
//!     ev.downcast_ref::<ShutdownEvent>().map(|e| e.description.as_str()),
//!     Some("host is going to shutdown"),
//! );
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Selector-scoped payload of any shape.
#[derive(Clone)]
pub struct Event {
    seq: u64,
    at: SystemTime,
    type_name: &'static str,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Event {
    /// Wraps a payload, stamping it with the next sequence number.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            type_name: std::any::type_name::<T>(),
            payload: Arc::new(payload),
        }
    }

    /// Globally unique, monotonically increasing sequence number.
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Wall-clock creation time.
    #[inline]
    pub fn at(&self) -> SystemTime {
        self.at
    }

    /// Rust type name of the payload (for logs).
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the payload if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    /// True if the payload is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// True if both envelopes share the same payload allocation,
    /// i.e. one is a clone of the other.
    #[inline]
    pub fn ptr_eq(&self, other: &Event) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("seq", &self.seq)
            .field("type", &self.type_name)
            .finish()
    }
}
