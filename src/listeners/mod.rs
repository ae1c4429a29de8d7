//! # Event listeners.
//!
//! This module provides the [`Listener`] trait, the closure adapter
//! [`ListenerFn`], and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! EventBus::listen(selector, listener)
//!        │
//!        └──► [queue L] ──► worker L ──► listener.handle(&Event)
//!                                         ├─ Ok    → ack
//!                                         ├─ Err   → warn!, ack
//!                                         └─ panic → error!, ack
//! ```
//!
//! ## Registration styles
//! - **Reusable**: any `Arc<dyn Listener>` (struct or [`ListenerFn`]), removed
//!   with [`EventBus::stop_listening`](crate::EventBus::stop_listening).
//! - **Listen-once**: [`EventBus::listen_once_fn`](crate::EventBus::listen_once_fn),
//!   removed from the table before its first invocation.

mod listener;
mod listener_fn;
mod log;

pub use listener::{Listener, ListenerRef};
pub use listener_fn::ListenerFn;
pub use log::LogWriter;

pub(crate) use listener_fn::OnceFn;
