//! # Payloads published by the runtime itself.
//!
//! | Payload                     | Selector                  | Published by                     |
//! |-----------------------------|---------------------------|----------------------------------|
//! | [`SystemEvent`]             | [`Selector::SYSTEM`]      | `Runtime::initialize`            |
//! | [`PluginsInitializedEvent`] | [`Selector::SYSTEM`]      | `Runtime::initialize_plugins`    |
//! | [`ShutdownEvent`]           | [`Selector::SHUTDOWN`]    | `Runtime::shutdown_plugins_and_wait` |
//! | [`DeliveryEvent`]           | [`Selector::DELIVERED`]   | the bus, after every round       |

use serde::{Deserialize, Serialize};

use super::{Event, Selector};
use crate::plugins::PluginData;

/// Runtime-level system notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    /// The service bundle is wired and the runtime is initialized.
    Initialized,
}

impl SystemEvent {
    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            SystemEvent::Initialized => "plughost initialized",
        }
    }
}

/// Published on [`Selector::SHUTDOWN`]; plugins release their resources when they see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownEvent {
    pub description: String,
}

impl ShutdownEvent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Aggregate published once every registered plugin has initialized.
///
/// `plugins` keeps registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginsInitializedEvent {
    pub description: String,
    pub plugins: Vec<PluginData>,
    pub runtime_version: String,
}

/// Synthesized by the bus when a delivery round completes.
///
/// Carries the original selector and event, and how many listeners were in
/// the round's snapshot.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    pub description: String,
    pub selector: Selector,
    pub event: Event,
    pub count: usize,
}

impl DeliveryEvent {
    pub(crate) fn new(selector: Selector, event: Event, count: usize) -> Self {
        Self {
            description: "event delivered".to_string(),
            selector,
            event,
            count,
        }
    }
}
