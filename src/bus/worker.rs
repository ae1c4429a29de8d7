//! # Listener workers and the per-invocation fault boundary.
//!
//! ```text
//! dispatcher ── Invocation ──► [queue L] ──► worker L ──► guarded(listener.handle(&ev)) ──► ack
//! ```
//!
//! Every handler runs under `catch_unwind`:
//! - `Err` from the handler → `warn!`
//! - panic → `error!` with the panic message
//!
//! In both cases the ack fires, so the round still completes.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if a listener panics while holding a lock.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use super::table::Invocation;
use crate::error::ListenerError;
use crate::events::{Event, Selector};
use crate::listeners::{ListenerRef, OnceFn};

/// Spawns the worker owning `listener` and returns its queue.
///
/// The worker exits once every sender (table entry and in-flight snapshots)
/// has been dropped.
pub(crate) fn spawn(rt: &Handle, listener: ListenerRef) -> mpsc::UnboundedSender<Invocation> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Invocation>();

    rt.spawn(async move {
        while let Some(inv) = rx.recv().await {
            guarded(listener.name(), &inv.selector, listener.handle(&inv.event)).await;
            let _ = inv.ack.send(());
        }
    });
    tx
}

/// Runs a listen-once handler on its own task.
pub(crate) fn spawn_once(
    rt: &Handle,
    f: OnceFn,
    selector: Selector,
    event: Event,
    ack: oneshot::Sender<()>,
) {
    rt.spawn(async move {
        let name = f.name.clone();
        guarded(&name, &selector, f.call(event)).await;
        let _ = ack.send(());
    });
}

/// Awaits one handler invocation, logging failures and panics.
pub(crate) async fn guarded<F>(name: &str, selector: &Selector, fut: F)
where
    F: Future<Output = Result<(), ListenerError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(
                listener = name,
                selector = %selector,
                label = err.as_label(),
                error = %err,
                "listener failed"
            );
        }
        Err(panic_err) => {
            error!(
                listener = name,
                selector = %selector,
                panic = %panic_message(&*panic_err),
                "listener panicked"
            );
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
