//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes invoice lifecycle events to in-process consumers
//! (the revenue engine today; others later). It is intentionally small:
//!
//! - **Transport-agnostic**: in-memory channels today, a broker later.
//! - **At-least-once**: the same event may be delivered more than once;
//!   consumers dedup by event id.
//! - **No ordering across invoices**: only per-invoice ordering is assumed,
//!   and that comes from the producer, not the bus.
//! - **No persistence**: the bus distributes, it does not store.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Designed for single-threaded consumption;
/// hand the subscription to exactly one worker.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` can fail (e.g. a poisoned lock in the in-memory bus, a broker
/// error elsewhere); failures surface to the caller. Subscribers that have
/// gone away are dropped silently — delivery is best-effort fan-out.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
