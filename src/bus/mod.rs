//! # In-process event bus.
//!
//! [`EventBus`] routes events by [`Selector`] to the listeners subscribed to
//! it and reports when every listener has handled an event.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Dispatcher (one):       Listeners:
//!   plugin A ──┐                                                      ┌─► [queue L1] ─► worker L1
//!   plugin B ──┼── emit ── snapshot ──► [admission FIFO] ──► fan-out ─┼─► [queue L2] ─► worker L2
//!   runtime  ──┘                                              │       └─► once-task  (listen-once)
//!                                                             ▼
//!                                                    complete(round): join acks
//!                                                       ├─► DeliveryEvent on DELIVERED
//!                                                       └─► Delivery handle / callback
//! ```
//!
//! ## Rules
//! - **Non-blocking emit**: `emit()` only queues the round and returns a [`Delivery`].
//! - **Ordered admission**: rounds start in Emit-call order.
//! - **Snapshot at emit**: each round captures its listeners when `emit()` is
//!   called; later `listen`/`stop_listening` calls never affect it.
//! - **Per-listener FIFO**: a listener sees events in Emit order; different
//!   listeners run concurrently with no relative order.
//! - **Join before completion**: a round completes once every handler in its
//!   snapshot has returned (or failed, or panicked).
//! - **Always notified**: a round with zero listeners still completes and
//!   still yields a [`DeliveryEvent`] with `count == 0`.
//! - **Isolation**: a failing or panicking handler is logged and nothing else.
//!
//! ## States
//! ```text
//! Open ──close()──► Closing ──(drained)──► Closed
//! ```
//! Once `close()` has been called, `emit` resolves to `Err(BusError::Closed)`
//! immediately and `emit_with_callback` returns the same error without ever
//! invoking the callback.
//!
//! ## Example
//! ```rust
//! use plughost::{Event, EventBus};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), plughost::BusError> {
//! let bus = EventBus::new();
//! let sub = bus.listen_fn("orders", |ev: Event| async move {
//!     let _order = ev.downcast_ref::<&str>();
//!     Ok(())
//! });
//!
//! let delivered = bus.emit("orders", "A").await?;
//! assert_eq!(delivered.count, 1);
//!
//! bus.stop_listening(&sub);
//! bus.close().await;
//! # Ok(())
//! # }
//! ```

mod delivery;
mod dispatcher;
mod table;
mod worker;

pub use delivery::Delivery;

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{BusError, ListenerError};
use crate::events::{DeliveryEvent, Event, Selector};
use crate::listeners::{ListenerFn, ListenerRef, OnceFn};

use delivery::Completion;
use dispatcher::{Dispatcher, Round};
use table::SubscriptionTable;

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Lifecycle state of an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// Accepting rounds.
    Open,
    /// `close()` called; admitted rounds are draining, new ones are refused.
    Closing,
    /// Drained; the subscription table is empty and sealed. Terminal.
    Closed,
}

/// Opaque token returned by `listen*`, presented back to
/// [`EventBus::stop_listening`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    selector: Selector,
    id: u64,
}

impl Subscription {
    /// Selector this subscription listens on.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// Publish/subscribe engine shared by the runtime and every plugin.
///
/// Cheap to clone: all clones share one dispatcher and one subscription table.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

struct Inner {
    table: Arc<SubscriptionTable>,
    admission: Mutex<Option<mpsc::UnboundedSender<Round>>>,
    state: AtomicU8,
    drained: CancellationToken,
    rt: Handle,
}

impl EventBus {
    /// Creates a bus and spawns its dispatcher on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime.
    pub fn new() -> Self {
        let rt = Handle::current();
        let table = Arc::new(SubscriptionTable::new());
        let drained = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel::<Round>();

        let dispatcher = Dispatcher::new(rx, Arc::clone(&table), rt.clone(), drained.clone());
        rt.spawn(dispatcher.run());

        Self {
            inner: Arc::new(Inner {
                table,
                admission: Mutex::new(Some(tx)),
                state: AtomicU8::new(OPEN),
                drained,
                rt,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BusState {
        match self.inner.state.load(Ordering::Acquire) {
            OPEN => BusState::Open,
            CLOSING => BusState::Closing,
            _ => BusState::Closed,
        }
    }

    /// Publishes `payload` on `selector`.
    ///
    /// Returns immediately; the [`Delivery`] resolves once every listener
    /// subscribed at call time has returned.
    ///
    /// A listener may emit on its own selector, but must not await that
    /// [`Delivery`] from inside its handler: the new event is queued behind
    /// the invocation that is still running, so the wait never ends.
    pub fn emit<T>(&self, selector: impl Into<Selector>, payload: T) -> Delivery
    where
        T: Any + Send + Sync,
    {
        self.emit_event(selector, Event::new(payload))
    }

    /// Publishes an already-built [`Event`], preserving its identity.
    pub fn emit_event(&self, selector: impl Into<Selector>, event: Event) -> Delivery {
        let (tx, rx) = oneshot::channel();
        let selector = selector.into();
        if self
            .admit(selector.clone(), event, Completion::Handle(tx))
            .is_err()
        {
            debug!(selector = %selector, "emit refused: event bus closed");
        }
        Delivery::new(rx)
    }

    /// Publishes `payload` and invokes `callback` exactly once when the round
    /// completes. A panicking callback is caught and logged.
    pub fn emit_with_callback<T, F>(
        &self,
        selector: impl Into<Selector>,
        payload: T,
        callback: F,
    ) -> Result<(), BusError>
    where
        T: Any + Send + Sync,
        F: FnOnce(DeliveryEvent) + Send + 'static,
    {
        self.admit(
            selector.into(),
            Event::new(payload),
            Completion::Callback(Box::new(callback)),
        )
    }

    fn admit(&self, selector: Selector, event: Event, completion: Completion) -> Result<(), BusError> {
        let guard = lock(&self.inner.admission);
        let Some(tx) = guard.as_ref() else {
            return Err(BusError::Closed);
        };
        // Taken while admission is held: queue order matches snapshot order.
        let targets = self.inner.table.snapshot(&selector);
        let round = Round {
            selector,
            event,
            targets,
            is_notice: false,
            completion: Some(completion),
            notices: Some(tx.clone()),
        };
        tx.send(round).map_err(|_| BusError::Closed)
    }

    /// Subscribes `listener` to `selector`.
    ///
    /// On a bus that is no longer open the returned subscription is inert.
    pub fn listen(&self, selector: impl Into<Selector>, listener: ListenerRef) -> Subscription {
        let selector = selector.into();
        let id = self.inner.table.next_id();
        if self.state() != BusState::Open {
            debug!(selector = %selector, listener = listener.name(), "listen ignored: event bus closed");
            return Subscription { selector, id };
        }

        let name: Arc<str> = Arc::from(listener.name());
        let tx = worker::spawn(&self.inner.rt, listener);
        if !self.inner.table.insert_worker(&selector, id, name, tx) {
            debug!(selector = %selector, "listen ignored: subscription table sealed");
        }
        Subscription { selector, id }
    }

    /// Subscribes a closure to `selector`.
    pub fn listen_fn<F, Fut>(&self, selector: impl Into<Selector>, f: F) -> Subscription
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        self.listen(selector, ListenerFn::arc(std::any::type_name::<F>(), f))
    }

    /// Subscribes a closure that runs for at most one event.
    ///
    /// The entry leaves the table with the first emit that snapshots it, so
    /// concurrent emits can never invoke it twice.
    pub fn listen_once_fn<F, Fut>(&self, selector: impl Into<Selector>, f: F) -> Subscription
    where
        F: FnOnce(Event) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        let selector = selector.into();
        let id = self.inner.table.next_id();
        if self.state() != BusState::Open {
            debug!(selector = %selector, "listen_once ignored: event bus closed");
            return Subscription { selector, id };
        }

        let once = OnceFn::new(std::any::type_name::<F>(), f);
        if !self.inner.table.insert_once(&selector, id, once) {
            debug!(selector = %selector, "listen_once ignored: subscription table sealed");
        }
        Subscription { selector, id }
    }

    /// Removes a subscription. Returns `false` if it was not registered
    /// (already removed, already fired once, or inert).
    ///
    /// Rounds whose snapshot already includes the listener still deliver to it.
    pub fn stop_listening(&self, sub: &Subscription) -> bool {
        self.inner.table.remove(&sub.selector, sub.id)
    }

    /// Number of listeners currently subscribed to `selector`.
    pub fn listener_count(&self, selector: impl Into<Selector>) -> usize {
        self.inner.table.len(&selector.into())
    }

    /// Stops accepting rounds, waits for every admitted round (and its
    /// delivery notification) to complete, then drops all subscriptions.
    ///
    /// Idempotent; concurrent callers all return once the bus is closed.
    /// Must not be awaited from inside a listener of this bus: the listener's
    /// own round could then never complete.
    pub async fn close(&self) {
        if self
            .inner
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!("event bus closing");
            lock(&self.inner.admission).take();
        }

        self.inner.drained.cancelled().await;
        self.inner.table.clear();
        if self.inner.state.swap(CLOSED, Ordering::AcqRel) != CLOSED {
            debug!("event bus closed");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::sync::Notify;

    use crate::events::ShutdownEvent;
    use crate::listeners::Listener;

    fn counter(bus: &EventBus, selector: &'static str) -> (Subscription, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = bus.listen_fn(selector, move |_ev: Event| {
            let h = Arc::clone(&h);
            async move {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        (sub, hits)
    }

    #[tokio::test]
    async fn emit_without_listeners_still_completes() {
        let bus = EventBus::new();
        let delivered = tokio::time::timeout(Duration::from_secs(1), bus.emit("nobody", 7u32))
            .await
            .expect("round must complete")
            .expect("bus open");
        assert_eq!(delivered.count, 0);
        assert_eq!(delivered.selector, Selector::from("nobody"));
        assert_eq!(delivered.event.downcast_ref::<u32>(), Some(&7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn listener_sees_events_in_emit_order_with_one_completion_each() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        bus.listen_fn("orders", move |ev: Event| {
            let tx = tx.clone();
            async move {
                if let Some(order) = ev.downcast_ref::<&str>() {
                    let _ = tx.send(order.to_string());
                }
                Ok(())
            }
        });

        let a = bus.emit("orders", "A");
        let b = bus.emit("orders", "B");
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        assert_eq!(a.event.downcast_ref::<&str>(), Some(&"A"));
        assert_eq!(b.event.downcast_ref::<&str>(), Some(&"B"));
        assert!(!a.event.ptr_eq(&b.event));
        assert_eq!((a.count, b.count), (1, 1));
        assert_eq!(rx.recv().await.as_deref(), Some("A"));
        assert_eq!(rx.recv().await.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn emit_event_echoes_the_same_event() {
        let bus = EventBus::new();
        let ev = Event::new(ShutdownEvent::new("bye"));
        let delivered = bus.emit_event(Selector::SHUTDOWN, ev.clone()).await.unwrap();
        assert!(delivered.event.ptr_eq(&ev));
        assert_eq!(delivered.selector, Selector::SHUTDOWN);
    }

    #[tokio::test]
    async fn callback_fires_once_after_round() {
        let bus = EventBus::new();
        let (_sub, hits) = counter(&bus, "selector");
        let (tx, rx) = oneshot::channel();

        bus.emit_with_callback("selector", "test1", move |d: DeliveryEvent| {
            let _ = tx.send(d.count);
        })
        .unwrap();

        assert_eq!(rx.await.unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn listen_once_runs_exactly_once() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = bus.listen_once_fn("selector", move |_ev: Event| async move {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        for i in 0..5u32 {
            bus.emit("selector", i).await.unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("selector"), 0);
        assert!(!bus.stop_listening(&sub));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn listen_once_survives_concurrent_emits() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.listen_once_fn("selector", move |_ev: Event| async move {
            h.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut pending = Vec::new();
        for i in 0..16u32 {
            let bus = bus.clone();
            pending.push(tokio::spawn(async move { bus.emit("selector", i).await }));
        }
        let mut invoked = 0;
        for p in pending {
            invoked += p.await.unwrap().unwrap().count;
        }
        assert_eq!(invoked, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stopped_listener_misses_later_rounds() {
        let bus = EventBus::new();
        let (sub, hits) = counter(&bus, "selector");

        bus.emit("selector", 1u32).await.unwrap();
        assert!(bus.stop_listening(&sub));
        assert!(!bus.stop_listening(&sub));

        let delivered = bus.emit("selector", 2u32).await.unwrap();
        assert_eq!(delivered.count, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn listener_removed_mid_round_still_receives_snapshot() {
        let bus = EventBus::new();
        let gate = Arc::new(Notify::new());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<u32>();

        // Slow listener: blocks on its first event until the gate opens.
        let slow_gate = Arc::clone(&gate);
        let slow_seen = seen_tx.clone();
        let slow = bus.listen_fn("selector", move |ev: Event| {
            let gate = Arc::clone(&slow_gate);
            let seen = slow_seen.clone();
            async move {
                let n = ev.downcast_ref::<u32>().copied().unwrap_or_default();
                if n == 1 {
                    gate.notified().await;
                }
                let _ = seen.send(n);
                Ok(())
            }
        });

        // Observing event 2 here proves both rounds were admitted.
        let (witness_tx, mut witness_rx) = mpsc::unbounded_channel::<u32>();
        bus.listen_fn("selector", move |ev: Event| {
            let witness = witness_tx.clone();
            async move {
                let _ = witness.send(ev.downcast_ref::<u32>().copied().unwrap_or_default());
                Ok(())
            }
        });

        let first = bus.emit("selector", 1u32);
        let second = bus.emit("selector", 2u32);
        assert_eq!(witness_rx.recv().await, Some(1));
        assert_eq!(witness_rx.recv().await, Some(2));

        assert!(bus.stop_listening(&slow));
        gate.notify_one();

        assert_eq!(first.await.unwrap().count, 2);
        assert_eq!(second.await.unwrap().count, 2);
        assert_eq!(seen_rx.recv().await, Some(1));
        assert_eq!(seen_rx.recv().await, Some(2));

        let third = bus.emit("selector", 3u32).await.unwrap();
        assert_eq!(third.count, 1);
    }

    #[tokio::test]
    async fn failing_and_panicking_listeners_do_not_stop_siblings() {
        let bus = EventBus::new();
        bus.listen_fn("selector", |ev: Event| async move {
            if ev.is::<()>() {
                panic!("listener exploded");
            }
            Ok(())
        });
        bus.listen_fn("selector", |_ev: Event| async move {
            Err(ListenerError::fail("nope"))
        });
        let (_sub, hits) = counter(&bus, "selector");

        let delivered = bus.emit("selector", ()).await.unwrap();
        assert_eq!(delivered.count, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The panicking worker is still alive for the next round.
        let delivered = bus.emit("selector", ()).await.unwrap();
        assert_eq!(delivered.count, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn panicking_callback_is_contained() {
        let bus = EventBus::new();
        bus.emit_with_callback("selector", (), |_d| panic!("callback exploded"))
            .unwrap();
        let after = bus.emit("selector", ()).await;
        assert!(after.is_ok());
    }

    #[tokio::test]
    async fn delivery_notice_published_once_per_round() {
        let bus = EventBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<DeliveryEvent>();
        bus.listen_fn(Selector::DELIVERED, move |ev: Event| {
            let tx = tx.clone();
            async move {
                if let Some(d) = ev.downcast_ref::<DeliveryEvent>() {
                    let _ = tx.send(d.clone());
                }
                Ok(())
            }
        });
        let (_sub, _hits) = counter(&bus, "selector");

        let original = Event::new("payload");
        bus.emit_event("selector", original.clone()).await.unwrap();
        bus.close().await;

        let notice = rx.recv().await.expect("one notice");
        assert_eq!(notice.selector, Selector::from("selector"));
        assert!(notice.event.ptr_eq(&original));
        assert_eq!(notice.count, 1);
        // The notice round itself produced no further notice.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn close_drains_in_flight_rounds() {
        let bus = EventBus::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&finished);
        bus.listen_fn("slow", move |_ev: Event| {
            let f = Arc::clone(&f);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                f.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let pending = bus.emit("slow", ());
        bus.close().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(bus.state(), BusState::Closed);
        assert_eq!(pending.await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn closed_bus_rejects_without_hanging() {
        let bus = EventBus::new();
        bus.close().await;
        bus.close().await;

        let res = tokio::time::timeout(Duration::from_secs(1), bus.emit("selector", ()))
            .await
            .expect("must not hang");
        assert_eq!(res.unwrap_err(), BusError::Closed);
        assert_eq!(
            bus.emit_with_callback("selector", (), |_d| unreachable!()),
            Err(BusError::Closed)
        );

        let sub = bus.listen_fn("selector", |_ev: Event| async { Ok(()) });
        assert_eq!(bus.listener_count("selector"), 0);
        assert!(!bus.stop_listening(&sub));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn listener_added_after_emit_misses_that_round() {
        let bus = EventBus::new();
        let pending = bus.emit("selector", 1u32);
        let (_sub, hits) = counter(&bus, "selector");

        assert_eq!(pending.await.unwrap().count, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(bus.emit("selector", 2u32).await.unwrap().count, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn listener_stopped_after_emit_still_gets_that_round() {
        let bus = EventBus::new();
        let (sub, hits) = counter(&bus, "selector");
        let pending = bus.emit("selector", 1u32);
        assert!(bus.stop_listening(&sub));

        assert_eq!(pending.await.unwrap().count, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn listener_emitting_on_own_selector_sees_it_next() {
        let bus = EventBus::new();
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel::<u32>();
        let (inner_tx, mut inner_rx) = mpsc::unbounded_channel::<Delivery>();
        let handle = bus.clone();
        bus.listen_fn("selector", move |ev: Event| {
            let bus = handle.clone();
            let seen = seen_tx.clone();
            let inner = inner_tx.clone();
            async move {
                let n = ev.downcast_ref::<u32>().copied().unwrap_or_default();
                if n == 1 {
                    // Queued behind this call: handed out, not awaited here.
                    let _ = inner.send(bus.emit("selector", 2u32));
                }
                let _ = seen.send(n);
                Ok(())
            }
        });

        let outer = tokio::time::timeout(Duration::from_secs(1), bus.emit("selector", 1u32))
            .await
            .expect("outer round must complete")
            .unwrap();
        assert_eq!(outer.count, 1);

        let inner = inner_rx.recv().await.expect("inner emit");
        let inner = tokio::time::timeout(Duration::from_secs(1), inner)
            .await
            .expect("inner round must complete")
            .unwrap();
        assert_eq!(inner.count, 1);
        assert_eq!(seen_rx.recv().await, Some(1));
        assert_eq!(seen_rx.recv().await, Some(2));
    }

    #[derive(Default)]
    struct Tally {
        seen: Mutex<Vec<u32>>,
    }

    #[async_trait::async_trait]
    impl Listener for Tally {
        async fn handle(&self, event: &Event) -> Result<(), ListenerError> {
            if let Some(n) = event.downcast_ref::<u32>() {
                lock(&self.seen).push(*n);
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "tally"
        }
    }

    #[tokio::test]
    async fn struct_listener_registers_and_unregisters() {
        let bus = EventBus::new();
        let tally = Arc::new(Tally::default());
        let listener: ListenerRef = tally.clone();
        let sub = bus.listen("numbers", listener);

        bus.emit("numbers", 1u32).await.unwrap();
        bus.emit("numbers", 2u32).await.unwrap();
        assert!(bus.stop_listening(&sub));
        assert_eq!(bus.emit("numbers", 3u32).await.unwrap().count, 0);

        assert_eq!(*lock(&tally.seen), [1, 2]);
    }

    #[tokio::test]
    async fn subscriptions_are_distinct_tokens() {
        let bus = EventBus::new();
        let listener: ListenerRef = ListenerFn::arc("same", |_ev: Event| async { Ok(()) });
        let a = bus.listen("selector", Arc::clone(&listener));
        let b = bus.listen("selector", listener);
        assert_ne!(a, b);
        assert_eq!(bus.listener_count("selector"), 2);

        assert!(bus.stop_listening(&a));
        assert_eq!(bus.listener_count("selector"), 1);
        assert_eq!(b.selector(), &Selector::from("selector"));
    }
}
