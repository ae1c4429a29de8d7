//! Event data model: selectors, the type-erased envelope and runtime payloads.
//!
//! ## Contents
//! - [`Selector`] string key partitioning the event space (+ reserved selectors)
//! - [`Event`] type-erased payload envelope with sequence metadata
//! - [`SystemEvent`], [`ShutdownEvent`], [`PluginsInitializedEvent`],
//!   [`DeliveryEvent`] payloads published by the runtime and the bus
//!
//! The bus that moves events around is [`EventBus`](crate::EventBus).

mod event;
mod payload;
mod selector;

pub use event::Event;
pub use payload::{DeliveryEvent, PluginsInitializedEvent, ShutdownEvent, SystemEvent};
pub use selector::Selector;
