//! # Dispatcher: the single coordination point of the bus.
//!
//! ```text
//! emit() ── snapshot(selector) ──► [admission queue (FIFO)] ──► Dispatcher::run
//!                                                                  │ for each round, in order:
//!                                                                  ├─ enqueue Invocation per target  (sync, never awaits)
//!                                                                  └─ spawn complete(round, acks)
//!                                                                           │
//!                                                                           ├─ join all acks
//!                                                                           ├─ !is_notice → queue DeliveryEvent round on DELIVERED
//!                                                                           └─ fire Delivery handle / callback
//! ```
//!
//! ## Rules
//! - A round's snapshot is taken by `emit()` under the admission lock, so
//!   snapshots and queue order agree.
//! - Rounds start (enqueue) in admission order.
//! - The dispatcher never awaits a listener; only completion tasks do.
//! - A round's completion fires only after every handler in its snapshot returned.
//! - Notice rounds carry `is_notice = true` and never schedule another notice.
//!   Their snapshot is taken when the parent round completes.
//! - The dispatcher stops when every admission sender is gone: the bus handle
//!   dropped its sender (close) **and** every in-flight round finished. At that
//!   point all admitted work is drained and `drained` is cancelled.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::delivery::Completion;
use super::table::{Invocation, SubscriptionTable, Target};
use super::worker;
use crate::events::{DeliveryEvent, Event, Selector};

/// One admitted publish request.
pub(crate) struct Round {
    pub(crate) selector: Selector,
    pub(crate) event: Event,
    /// Listeners captured when the round was admitted.
    pub(crate) targets: Vec<Target>,
    /// Set on delivery notifications; checked instead of the selector.
    pub(crate) is_notice: bool,
    pub(crate) completion: Option<Completion>,
    /// Admission handle used to queue this round's notice. Held until the
    /// completion fired, so the dispatcher cannot drain before it.
    pub(crate) notices: Option<mpsc::UnboundedSender<Round>>,
}

impl Round {
    fn notice(
        delivered: DeliveryEvent,
        targets: Vec<Target>,
        keeper: mpsc::UnboundedSender<Round>,
    ) -> Self {
        Self {
            selector: Selector::DELIVERED,
            event: Event::new(delivered),
            targets,
            is_notice: true,
            completion: None,
            notices: Some(keeper),
        }
    }
}

pub(crate) struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Round>,
    table: Arc<SubscriptionTable>,
    rt: Handle,
    drained: CancellationToken,
}

impl Dispatcher {
    pub(crate) fn new(
        rx: mpsc::UnboundedReceiver<Round>,
        table: Arc<SubscriptionTable>,
        rt: Handle,
        drained: CancellationToken,
    ) -> Self {
        Self {
            rx,
            table,
            rt,
            drained,
        }
    }

    /// Admits rounds until the queue closes, then signals `drained`.
    pub(crate) async fn run(mut self) {
        while let Some(round) = self.rx.recv().await {
            self.admit(round);
        }
        debug!("event bus dispatcher drained");
        self.drained.cancel();
    }

    fn admit(&self, mut round: Round) {
        let targets = std::mem::take(&mut round.targets);
        let count = targets.len();
        let acks = self.fan_out(&round, targets);
        trace!(selector = %round.selector, seq = round.event.seq(), listeners = count, "round started");
        self.rt.spawn(complete(round, count, acks, Arc::clone(&self.table)));
    }

    fn fan_out(&self, round: &Round, targets: Vec<Target>) -> Vec<oneshot::Receiver<()>> {
        let mut acks = Vec::with_capacity(targets.len());
        for target in targets {
            let (ack, done) = oneshot::channel();
            match target {
                Target::Worker { name, tx } => {
                    let inv = Invocation {
                        selector: round.selector.clone(),
                        event: round.event.clone(),
                        ack,
                    };
                    if tx.send(inv).is_err() {
                        // Worker is gone; nothing will run, the ack drops with `inv`.
                        debug!(listener = %name, selector = %round.selector, "listener worker closed");
                    }
                }
                Target::Once(f) => {
                    worker::spawn_once(
                        &self.rt,
                        f,
                        round.selector.clone(),
                        round.event.clone(),
                        ack,
                    );
                }
            }
            acks.push(done);
        }
        acks
    }
}

/// Joins a round's handlers, queues its notice and fires its completion.
async fn complete(
    round: Round,
    count: usize,
    acks: Vec<oneshot::Receiver<()>>,
    table: Arc<SubscriptionTable>,
) {
    // A dropped ack means the handler can no longer run: counts as returned.
    join_all(acks).await;

    let Round {
        selector,
        event,
        is_notice,
        completion,
        notices,
        ..
    } = round;
    let delivered = DeliveryEvent::new(selector, event, count);

    if let Some(tx) = notices.as_ref().filter(|_| !is_notice) {
        let targets = table.snapshot(&Selector::DELIVERED);
        let _ = tx.send(Round::notice(delivered.clone(), targets, tx.clone()));
    }

    match completion {
        Some(Completion::Handle(tx)) => {
            let _ = tx.send(delivered);
        }
        Some(Completion::Callback(cb)) => {
            let selector = delivered.selector.clone();
            if let Err(panic_err) = std::panic::catch_unwind(AssertUnwindSafe(|| cb(delivered))) {
                error!(
                    selector = %selector,
                    panic = %worker::panic_message(&*panic_err),
                    "delivery callback panicked"
                );
            }
        }
        None => {}
    }
    drop(notices);
}
