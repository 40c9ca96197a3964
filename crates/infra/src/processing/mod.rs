//! Event-to-mutation orchestration.
//!
//! `RevenueEventProcessor` is the entry point: it applies the idempotency
//! guard, the relevance gate, and period resolution, then hands the
//! classified change to `RevenueMutationDispatcher`, which performs exactly
//! one create/update/delete against the revenue store under the period lock.

pub mod dispatcher;
pub mod period_lock;
pub mod processor;

pub use dispatcher::{DispatchError, MutationOutcome, RevenueMutationDispatcher};
pub use period_lock::PeriodLocks;
pub use processor::{ProcessingError, ProcessingOutcome, RevenueEventProcessor, SkipReason};
