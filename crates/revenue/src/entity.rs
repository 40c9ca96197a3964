use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use monthwise_core::{Entity, RevenueId};

use crate::arithmetic::{BucketTotals, Tally};
use crate::period::Period;

/// The revenue aggregate row for one calendar month.
///
/// Lifecycle: created on the first eligible invoice observed for a period,
/// updated on subsequent eligible invoice changes within that period, and
/// deleted when `invoice_count` reaches zero.
///
/// Invariant: `total_paid_amount + total_pending_amount == total_amount`
/// after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueEntity {
    pub id: RevenueId,
    /// Natural key: the calendar month this row aggregates.
    pub period: Period,
    /// Count of invoices currently contributing.
    pub invoice_count: u32,
    /// Sum of contributing invoice amounts, integer cents.
    pub total_amount: i64,
    pub total_paid_amount: i64,
    pub total_pending_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RevenueEntity {
    pub fn tally(&self) -> Tally {
        Tally::new(self.invoice_count, self.total_amount)
    }

    pub fn buckets(&self) -> BucketTotals {
        BucketTotals::new(self.total_paid_amount, self.total_pending_amount)
    }

    /// Whether the bucket split partitions the total exactly.
    pub fn is_consistent(&self) -> bool {
        self.total_paid_amount + self.total_pending_amount == self.total_amount
    }
}

impl Entity for RevenueEntity {
    type Id = RevenueId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Update payload for a revenue row; the store stamps `updated_at`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenuePatch {
    pub invoice_count: u32,
    pub total_amount: i64,
    pub total_paid_amount: i64,
    pub total_pending_amount: i64,
}

impl RevenuePatch {
    pub fn from_parts(tally: Tally, buckets: BucketTotals) -> Self {
        Self {
            invoice_count: tally.invoice_count,
            total_amount: tally.total_amount,
            total_paid_amount: buckets.paid,
            total_pending_amount: buckets.pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use monthwise_core::RevenueId;

    fn entity() -> RevenueEntity {
        RevenueEntity {
            id: RevenueId::new(),
            period: Period::from_ym(2024, 3).unwrap(),
            invoice_count: 2,
            total_amount: 25_000,
            total_paid_amount: 10_000,
            total_pending_amount: 15_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn consistency_checks_the_bucket_split() {
        let mut row = entity();
        assert!(row.is_consistent());

        row.total_pending_amount = 0;
        assert!(!row.is_consistent());
    }

    #[test]
    fn patch_carries_tally_and_buckets() {
        let row = entity();
        let patch = RevenuePatch::from_parts(row.tally(), row.buckets());
        assert_eq!(patch.invoice_count, 2);
        assert_eq!(patch.total_amount, 25_000);
        assert_eq!(patch.total_paid_amount, 10_000);
        assert_eq!(patch.total_pending_amount, 15_000);
    }
}
