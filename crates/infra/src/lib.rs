//! Infrastructure layer: revenue storage, idempotency, orchestration, workers.

pub mod idempotency;
pub mod processing;
pub mod revenue_store;
pub mod workers;


pub use idempotency::{Guarded, IdempotencyGuard, InMemorySeenEventStore, SeenEventStore};
pub use processing::{
    MutationOutcome, PeriodLocks, ProcessingError, ProcessingOutcome, RevenueEventProcessor,
    RevenueMutationDispatcher, SkipReason,
};
pub use revenue_store::{InMemoryRevenueStore, RevenueStore, RevenueStoreError};
pub use workers::{RevenueWorker, WorkerHandle};
