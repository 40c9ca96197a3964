//! In-memory revenue store for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use monthwise_core::RevenueId;
use monthwise_revenue::{Period, RevenueEntity, RevenuePatch};

use super::{RevenueStore, RevenueStoreError};

/// In-memory `RevenueStore` keyed by period.
///
/// Each call takes the lock once, so calls are atomic the way a single
/// statement against a real backing store would be.
#[derive(Debug, Default)]
pub struct InMemoryRevenueStore {
    rows: RwLock<HashMap<Period, RevenueEntity>>,
}

impl InMemoryRevenueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aggregate rows currently stored (test helper).
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> RevenueStoreError {
    RevenueStoreError::Backend("revenue store lock poisoned".to_string())
}

#[async_trait]
impl RevenueStore for InMemoryRevenueStore {
    async fn find_by_period(
        &self,
        period: Period,
    ) -> Result<Option<RevenueEntity>, RevenueStoreError> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows.get(&period).cloned())
    }

    async fn create(&self, entity: RevenueEntity) -> Result<RevenueEntity, RevenueStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if rows.contains_key(&entity.period) {
            return Err(RevenueStoreError::DuplicatePeriod(entity.period));
        }
        rows.insert(entity.period, entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        id: RevenueId,
        patch: RevenuePatch,
    ) -> Result<RevenueEntity, RevenueStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let row = rows
            .values_mut()
            .find(|row| row.id == id)
            .ok_or(RevenueStoreError::NotFound)?;

        row.invoice_count = patch.invoice_count;
        row.total_amount = patch.total_amount;
        row.total_paid_amount = patch.total_paid_amount;
        row.total_pending_amount = patch.total_pending_amount;
        row.updated_at = Utc::now();

        Ok(row.clone())
    }

    async fn delete(&self, id: RevenueId) -> Result<(), RevenueStoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let period = rows
            .values()
            .find(|row| row.id == id)
            .map(|row| row.period)
            .ok_or(RevenueStoreError::NotFound)?;
        rows.remove(&period);
        Ok(())
    }
}
