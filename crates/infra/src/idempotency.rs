//! Idempotency guarding for at-least-once event delivery.
//!
//! The guard ensures a given event id triggers its side effects at most once
//! per process lifetime. The seen-set is an injected trait so a real
//! deployment can back it with a durable, TTL-bounded store instead of
//! unbounded process memory.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::warn;

use monthwise_core::EventId;

/// Records which event ids have already been processed.
///
/// Implementations must be safe for concurrent use; events arrive
/// interleaved.
pub trait SeenEventStore: Send + Sync {
    /// Record `event_id` as seen. Returns `true` iff it was not seen before.
    ///
    /// Check-and-record must be one atomic step: two near-simultaneous calls
    /// with the same id must not both return `true`.
    fn mark_seen(&self, event_id: &EventId) -> bool;
}

impl<S> SeenEventStore for Arc<S>
where
    S: SeenEventStore + ?Sized,
{
    fn mark_seen(&self, event_id: &EventId) -> bool {
        (**self).mark_seen(event_id)
    }
}

/// In-process seen-set.
///
/// No eviction/TTL: memory grows with the number of distinct events over the
/// process lifetime, and nothing survives a restart. Both are accepted
/// limitations at this scope.
#[derive(Debug, Default)]
pub struct InMemorySeenEventStore {
    seen: Mutex<HashSet<EventId>>,
}

impl InMemorySeenEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeenEventStore for InMemorySeenEventStore {
    fn mark_seen(&self, event_id: &EventId) -> bool {
        match self.seen.lock() {
            Ok(mut seen) => seen.insert(event_id.clone()),
            Err(_) => {
                // A poisoned set cannot distinguish new from seen; treating
                // everything as seen keeps duplicates out at the cost of
                // dropping new events until restart.
                warn!(event_id = %event_id, "seen-event set poisoned; treating event as duplicate");
                false
            }
        }
    }
}

/// Whether the guarded function ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guarded<T> {
    /// The function ran; its output is carried here.
    Executed(T),
    /// The event id was already seen; the function was not invoked.
    Duplicate,
}

impl<T> Guarded<T> {
    pub fn executed(&self) -> bool {
        matches!(self, Guarded::Executed(_))
    }
}

/// Runs side effects at most once per event id.
///
/// The id is marked seen *before* the function runs (optimistic marking), so
/// near-simultaneous duplicate delivery of the same event cannot execute it
/// twice. The cost: if the function fails after marking, the event is never
/// retried — at-most-once semantics. Two ways out of that trade-off, for a
/// future revision to pick deliberately:
///
/// 1. mark seen only after successful completion, which allows safe retries
///    but changes duplicate-delivery semantics for every caller, or
/// 2. keep at-most-once and reconcile aggregates against raw invoice data
///    out of band.
#[derive(Debug)]
pub struct IdempotencyGuard<S> {
    seen: S,
}

impl<S> IdempotencyGuard<S>
where
    S: SeenEventStore,
{
    pub fn new(seen: S) -> Self {
        Self { seen }
    }

    /// Invoke `f` unless `event_id` was already seen.
    pub async fn run<F, Fut, T>(&self, event_id: &EventId, f: F) -> Guarded<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.seen.mark_seen(event_id) {
            return Guarded::Duplicate;
        }
        Guarded::Executed(f().await)
    }
}
