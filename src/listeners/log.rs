//! # LogWriter: delivery tracer
//!
//! A built-in listener that traces runtime payloads through `tracing` at
//! `debug` level. The runtime attaches it to [`Selector::DELIVERED`](crate::Selector::DELIVERED)
//! when [`RuntimeConfig::trace_deliveries`](crate::RuntimeConfig) is set; it can
//! be attached to any other selector by hand.
//!
//! ## Example output
//! ```text
//! DEBUG plughost::listeners::log: [delivered] selector="orders" seq=12 listeners=3
//! DEBUG plughost::listeners::log: [system] plughost initialized
//! DEBUG plughost::listeners::log: [plugins-initialized] count=2 version="1.4.0"
//! DEBUG plughost::listeners::log: [shutdown] host is going to shutdown
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::error::ListenerError;
use crate::events::{DeliveryEvent, Event, PluginsInitializedEvent, ShutdownEvent, SystemEvent};
use crate::listeners::Listener;

/// Event tracer listener.
#[derive(Default)]
pub struct LogWriter {
    seen: AtomicU64,
}

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events traced so far.
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Listener for LogWriter {
    async fn handle(&self, e: &Event) -> Result<(), ListenerError> {
        self.seen.fetch_add(1, Ordering::Relaxed);

        if let Some(d) = e.downcast_ref::<DeliveryEvent>() {
            debug!(
                selector = %d.selector,
                seq = d.event.seq(),
                listeners = d.count,
                "[delivered]"
            );
        } else if let Some(s) = e.downcast_ref::<SystemEvent>() {
            debug!("[system] {}", s.description());
        } else if let Some(p) = e.downcast_ref::<PluginsInitializedEvent>() {
            debug!(
                count = p.plugins.len(),
                version = %p.runtime_version,
                "[plugins-initialized]"
            );
        } else if let Some(s) = e.downcast_ref::<ShutdownEvent>() {
            debug!("[shutdown] {}", s.description);
        } else {
            debug!(seq = e.seq(), payload = e.type_name(), "[event]");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}
