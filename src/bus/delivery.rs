//! # Round completion handles.
//!
//! [`Delivery`] is returned by [`EventBus::emit`](crate::EventBus::emit). It
//! resolves exactly once, with the round's [`DeliveryEvent`], after every
//! listener in the round's snapshot has returned. Awaiting it is how a caller
//! chooses to block; dropping it is fine (fire-and-forget).
//!
//! A listener must not await the [`Delivery`] of a round that includes
//! itself: its own worker is busy with the current event, so that round can
//! only complete after the handler returns.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::BusError;
use crate::events::DeliveryEvent;

/// Completion signal of one round.
pub(crate) enum Completion {
    Handle(oneshot::Sender<DeliveryEvent>),
    Callback(Box<dyn FnOnce(DeliveryEvent) + Send>),
}

/// Handle yielding the delivery-completed notification of one round.
///
/// Resolves to `Err(BusError::Closed)` if the bus refused the round.
#[derive(Debug)]
pub struct Delivery {
    rx: oneshot::Receiver<DeliveryEvent>,
}

impl Delivery {
    pub(crate) fn new(rx: oneshot::Receiver<DeliveryEvent>) -> Self {
        Self { rx }
    }

    /// Blocks the current thread until the round completes.
    ///
    /// # Panics
    /// Panics if called from within an asynchronous execution context; await
    /// the handle there instead.
    pub fn blocking_wait(self) -> Result<DeliveryEvent, BusError> {
        self.rx.blocking_recv().map_err(|_| BusError::Closed)
    }
}

impl Future for Delivery {
    type Output = Result<DeliveryEvent, BusError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| BusError::Closed))
    }
}
