//! # Function-backed listeners
//!
//! [`ListenerFn`] wraps a closure `F: Fn(Event) -> Fut`, producing a fresh
//! future per invocation. State shared between invocations must live in an
//! explicit `Arc<...>` captured by the closure.
//!
//! [`OnceFn`] is the disposable counterpart used by
//! [`EventBus::listen_once_fn`](crate::EventBus::listen_once_fn): a boxed
//! `FnOnce` consumed by its single invocation.
//!
//! ## Example
//! ```rust
//! use plughost::{Event, ListenerFn, ListenerRef};
//!
//! let l: ListenerRef = ListenerFn::arc("audit", |ev: Event| async move {
//!     let _ = ev.seq();
//!     Ok(())
//! });
//! assert_eq!(l.name(), "audit");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::ListenerError;
use crate::events::Event;
use crate::listeners::Listener;

/// Function-backed listener implementation.
#[derive(Debug)]
pub struct ListenerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ListenerFn<F> {
    /// Creates a new function-backed listener.
    ///
    /// Prefer [`ListenerFn::arc`] when you immediately need a [`ListenerRef`](crate::ListenerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the listener and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Listener for ListenerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
{
    async fn handle(&self, event: &Event) -> Result<(), ListenerError> {
        (self.f)(event.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Disposable handler: consumed by its first and only invocation.
pub(crate) struct OnceFn {
    pub(crate) name: Cow<'static, str>,
    f: Box<dyn FnOnce(Event) -> BoxFuture<'static, Result<(), ListenerError>> + Send>,
}

impl OnceFn {
    pub(crate) fn new<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce(Event) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ListenerError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(move |ev| Box::pin(f(ev))),
        }
    }

    /// Builds the invocation future. The closure runs on first poll, so a
    /// panic inside it is caught by the same boundary as the handler body.
    pub(crate) fn call(self, event: Event) -> BoxFuture<'static, Result<(), ListenerError>> {
        let f = self.f;
        Box::pin(async move { f(event).await })
    }
}
