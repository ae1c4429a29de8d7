//! # Subscription table
//!
//! Maps each [`Selector`] to its listeners in insertion order. The table is
//! the only mutable state shared between `listen`/`stop_listening` callers
//! and the dispatcher; it has its own mutex, separate from round dispatch.
//!
//! ## Rules
//! - `snapshot()` clones the worker senders of a selector: later mutations
//!   never touch a snapshot already taken.
//! - Listen-once entries are **moved out** by the snapshot that includes them,
//!   so at most one round can ever invoke them.
//! - Ids come from a per-table counter and are never reused.
//! - After `clear()` the table is sealed: inserts are refused.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::events::{Event, Selector};
use crate::listeners::OnceFn;

/// One queued handler invocation for a listener worker.
pub(crate) struct Invocation {
    pub(crate) selector: Selector,
    pub(crate) event: Event,
    /// Fired when the handler has returned (or panicked).
    pub(crate) ack: oneshot::Sender<()>,
}

enum Handler {
    Worker(mpsc::UnboundedSender<Invocation>),
    Once(OnceFn),
}

struct Entry {
    id: u64,
    name: Arc<str>,
    handler: Handler,
}

/// A listener captured by a round's snapshot.
pub(crate) enum Target {
    Worker {
        name: Arc<str>,
        tx: mpsc::UnboundedSender<Invocation>,
    },
    Once(OnceFn),
}

#[derive(Default)]
struct TableInner {
    entries: HashMap<Selector, Vec<Entry>>,
    sealed: bool,
}

#[derive(Default)]
pub(crate) struct SubscriptionTable {
    inner: Mutex<TableInner>,
    next_id: AtomicU64,
}

impl SubscriptionTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates a fresh subscription id.
    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Adds a worker-backed listener. Returns `false` if the table is sealed.
    pub(crate) fn insert_worker(
        &self,
        selector: &Selector,
        id: u64,
        name: Arc<str>,
        tx: mpsc::UnboundedSender<Invocation>,
    ) -> bool {
        self.insert(selector, Entry {
            id,
            name,
            handler: Handler::Worker(tx),
        })
    }

    /// Adds a listen-once handler. Returns `false` if the table is sealed.
    pub(crate) fn insert_once(&self, selector: &Selector, id: u64, f: OnceFn) -> bool {
        let name: Arc<str> = Arc::from(f.name.as_ref());
        self.insert(selector, Entry {
            id,
            name,
            handler: Handler::Once(f),
        })
    }

    fn insert(&self, selector: &Selector, entry: Entry) -> bool {
        let mut inner = self.lock();
        if inner.sealed {
            return false;
        }
        inner.entries.entry(selector.clone()).or_default().push(entry);
        true
    }

    /// Removes the entry with `id` under `selector`. No-op if absent.
    pub(crate) fn remove(&self, selector: &Selector, id: u64) -> bool {
        let mut inner = self.lock();
        let Some(list) = inner.entries.get_mut(selector) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            inner.entries.remove(selector);
        }
        removed
    }

    /// Captures the listeners of `selector` for one round.
    pub(crate) fn snapshot(&self, selector: &Selector) -> Vec<Target> {
        let mut inner = self.lock();
        let Some(list) = inner.entries.get_mut(selector) else {
            return Vec::new();
        };

        let mut targets = Vec::with_capacity(list.len());
        let mut kept = Vec::with_capacity(list.len());
        for Entry { id, name, handler } in list.drain(..) {
            match handler {
                Handler::Worker(tx) => {
                    targets.push(Target::Worker {
                        name: Arc::clone(&name),
                        tx: tx.clone(),
                    });
                    kept.push(Entry {
                        id,
                        name,
                        handler: Handler::Worker(tx),
                    });
                }
                Handler::Once(f) => targets.push(Target::Once(f)),
            }
        }
        *list = kept;
        if list.is_empty() {
            inner.entries.remove(selector);
        }
        targets
    }

    /// Number of listeners currently registered under `selector`.
    pub(crate) fn len(&self, selector: &Selector) -> usize {
        self.lock().entries.get(selector).map_or(0, Vec::len)
    }

    /// Drops every entry and seals the table.
    pub(crate) fn clear(&self) {
        let mut inner = self.lock();
        inner.sealed = true;
        inner.entries.clear();
    }
}
