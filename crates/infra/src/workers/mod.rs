//! Background workers consuming the event bus.

pub mod revenue_worker;

pub use revenue_worker::{RevenueWorker, WorkerHandle};
