//! Persistence seam for revenue aggregate rows.
//!
//! The real deployment backs this with the web application's database; this
//! crate only defines the contract (each call is one atomic operation against
//! the backing store) and ships an in-memory implementation for tests/dev.

pub mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use monthwise_core::RevenueId;
use monthwise_revenue::{Period, RevenueEntity, RevenuePatch};

pub use in_memory::InMemoryRevenueStore;

/// Revenue store operation error.
///
/// These are **infrastructure errors** (storage, connectivity) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum RevenueStoreError {
    /// No row with the given id.
    #[error("revenue row not found")]
    NotFound,

    /// A row for this period already exists (period is a unique key).
    #[error("revenue row already exists for period {0}")]
    DuplicatePeriod(Period),

    /// The backing store failed (connection, query, lock poisoning, ...).
    #[error("revenue store backend failure: {0}")]
    Backend(String),
}

/// Persistence for `RevenueEntity`, keyed by period.
///
/// Each method is assumed to be a single atomic operation against the backing
/// store; read-modify-write cycles built on top of it are serialized by the
/// caller (see `PeriodLocks`).
#[async_trait]
pub trait RevenueStore: Send + Sync {
    async fn find_by_period(
        &self,
        period: Period,
    ) -> Result<Option<RevenueEntity>, RevenueStoreError>;

    /// Persist a freshly built row. Fails on a duplicate period.
    async fn create(&self, entity: RevenueEntity) -> Result<RevenueEntity, RevenueStoreError>;

    /// Apply a patch to an existing row; the store stamps `updated_at`.
    async fn update(
        &self,
        id: RevenueId,
        patch: RevenuePatch,
    ) -> Result<RevenueEntity, RevenueStoreError>;

    async fn delete(&self, id: RevenueId) -> Result<(), RevenueStoreError>;
}

#[async_trait]
impl<S> RevenueStore for Arc<S>
where
    S: RevenueStore + ?Sized,
{
    async fn find_by_period(
        &self,
        period: Period,
    ) -> Result<Option<RevenueEntity>, RevenueStoreError> {
        (**self).find_by_period(period).await
    }

    async fn create(&self, entity: RevenueEntity) -> Result<RevenueEntity, RevenueStoreError> {
        (**self).create(entity).await
    }

    async fn update(
        &self,
        id: RevenueId,
        patch: RevenuePatch,
    ) -> Result<RevenueEntity, RevenueStoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: RevenueId) -> Result<(), RevenueStoreError> {
        (**self).delete(id).await
    }
}
