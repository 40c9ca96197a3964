//! Aggregate arithmetic: pure recomputation of counts, totals, and the
//! paid/pending bucket split.
//!
//! No I/O and no failures for normal domain inputs. Preconditions (removal
//! from an empty aggregate, a negative resulting total or bucket) are
//! data-integrity bugs and surface as loud `InvariantViolation`s instead of
//! being clamped.

use monthwise_core::{DomainError, DomainResult};
use monthwise_invoicing::InvoiceStatus;

/// Invoice count + total amount of one aggregate row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Tally {
    pub invoice_count: u32,
    /// Sum of contributing invoice amounts, integer cents.
    pub total_amount: i64,
}

/// The paid/pending partition of an aggregate's total amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BucketTotals {
    pub paid: i64,
    pub pending: i64,
}

/// A status move between buckets, with the amounts on each side.
///
/// `from == to` describes an amount-only change within a single bucket.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BucketMove {
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
    pub previous_amount: i64,
    pub current_amount: i64,
}

impl Tally {
    pub fn new(invoice_count: u32, total_amount: i64) -> Self {
        Self {
            invoice_count,
            total_amount,
        }
    }

    /// Tally after one more invoice contributes `added_amount`.
    pub fn after_addition(self, added_amount: i64) -> DomainResult<Tally> {
        let invoice_count = self
            .invoice_count
            .checked_add(1)
            .ok_or_else(|| DomainError::invariant("invoice count overflow"))?;
        let total_amount = self
            .total_amount
            .checked_add(added_amount)
            .ok_or_else(|| DomainError::invariant("total amount overflow"))?;

        ensure_non_negative("total amount", total_amount)?;
        Ok(Tally {
            invoice_count,
            total_amount,
        })
    }

    /// Tally after a contributing invoice of `removed_amount` stops counting.
    ///
    /// Calling this on an empty aggregate is a precondition violation, not a
    /// recoverable case.
    pub fn after_removal(self, removed_amount: i64) -> DomainResult<Tally> {
        let invoice_count = self.invoice_count.checked_sub(1).ok_or_else(|| {
            DomainError::invariant("cannot remove an invoice from an empty aggregate")
        })?;
        let total_amount = self
            .total_amount
            .checked_sub(removed_amount)
            .ok_or_else(|| DomainError::invariant("total amount overflow"))?;

        ensure_non_negative("total amount", total_amount)?;
        Ok(Tally {
            invoice_count,
            total_amount,
        })
    }

    /// Tally after the same invoice changes amount; count is unchanged.
    pub fn after_amount_change(
        self,
        previous_amount: i64,
        current_amount: i64,
    ) -> DomainResult<Tally> {
        let delta = current_amount
            .checked_sub(previous_amount)
            .ok_or_else(|| DomainError::invariant("amount delta overflow"))?;
        let total_amount = self
            .total_amount
            .checked_add(delta)
            .ok_or_else(|| DomainError::invariant("total amount overflow"))?;

        ensure_non_negative("total amount", total_amount)?;
        Ok(Tally {
            invoice_count: self.invoice_count,
            total_amount,
        })
    }
}

impl BucketTotals {
    pub fn new(paid: i64, pending: i64) -> Self {
        Self { paid, pending }
    }

    /// Bucket totals with the whole amount in the bucket matching `status`.
    pub fn for_single(status: InvoiceStatus, amount: i64) -> DomainResult<Self> {
        BucketTotals::default().with_added(status, amount)
    }

    pub fn sum(&self) -> i64 {
        self.paid.saturating_add(self.pending)
    }

    /// Buckets after `amount` is added to the bucket matching `status`.
    pub fn with_added(self, status: InvoiceStatus, amount: i64) -> DomainResult<BucketTotals> {
        let mut next = self;
        let bucket = bucket_mut(&mut next, status)?;
        *bucket = bucket
            .checked_add(amount)
            .ok_or_else(|| DomainError::invariant("bucket amount overflow"))?;
        ensure_non_negative(bucket_name(status), *bucket)?;
        Ok(next)
    }

    /// Buckets after `amount` is removed from the bucket matching `status`.
    pub fn with_removed(self, status: InvoiceStatus, amount: i64) -> DomainResult<BucketTotals> {
        let mut next = self;
        let bucket = bucket_mut(&mut next, status)?;
        *bucket = bucket
            .checked_sub(amount)
            .ok_or_else(|| DomainError::invariant("bucket amount overflow"))?;
        ensure_non_negative(bucket_name(status), *bucket)?;
        Ok(next)
    }
}

/// Buckets after a status move: subtracts the previous amount from the
/// `from` bucket and adds the current amount to the `to` bucket. If
/// `from == to`, the delta lands in that single bucket.
pub fn move_between_buckets(buckets: BucketTotals, mv: BucketMove) -> DomainResult<BucketTotals> {
    // When from == to, remove-then-add nets out to the amount delta within
    // that one bucket.
    buckets
        .with_removed(mv.from, mv.previous_amount)?
        .with_added(mv.to, mv.current_amount)
}

/// The bucket split must always partition the total exactly.
pub fn ensure_buckets_match(tally: Tally, buckets: BucketTotals) -> DomainResult<()> {
    if buckets.sum() != tally.total_amount {
        return Err(DomainError::invariant(format!(
            "bucket split {} + {} does not match total {}",
            buckets.paid, buckets.pending, tally.total_amount
        )));
    }
    Ok(())
}

fn bucket_mut(buckets: &mut BucketTotals, status: InvoiceStatus) -> DomainResult<&mut i64> {
    match status {
        InvoiceStatus::Paid => Ok(&mut buckets.paid),
        InvoiceStatus::Pending => Ok(&mut buckets.pending),
        other => Err(DomainError::invariant(format!(
            "status {other:?} has no revenue bucket"
        ))),
    }
}

fn bucket_name(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Paid => "paid bucket",
        InvoiceStatus::Pending => "pending bucket",
        _ => "bucket",
    }
}

fn ensure_non_negative(what: &str, value: i64) -> DomainResult<()> {
    if value < 0 {
        return Err(DomainError::invariant(format!("{what} went negative: {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn addition_increments_count_and_total() {
        let next = Tally::new(2, 30_000).after_addition(10_000).unwrap();
        assert_eq!(next, Tally::new(3, 40_000));
    }

    #[test]
    fn removal_decrements_count_and_total() {
        let next = Tally::new(3, 40_000).after_removal(10_000).unwrap();
        assert_eq!(next, Tally::new(2, 30_000));
    }

    #[test]
    fn removal_from_empty_aggregate_is_an_invariant_violation() {
        let err = Tally::new(0, 0).after_removal(10_000).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn negative_total_is_an_invariant_violation() {
        let err = Tally::new(1, 5_000).after_removal(10_000).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn amount_change_keeps_count() {
        let next = Tally::new(1, 10_000)
            .after_amount_change(10_000, 15_000)
            .unwrap();
        assert_eq!(next, Tally::new(1, 15_000));

        let shrunk = next.after_amount_change(15_000, 4_000).unwrap();
        assert_eq!(shrunk, Tally::new(1, 4_000));
    }

    #[test]
    fn move_between_buckets_shifts_amounts() {
        let buckets = BucketTotals::new(15_000, 0);
        let moved = move_between_buckets(
            buckets,
            BucketMove {
                from: InvoiceStatus::Paid,
                to: InvoiceStatus::Pending,
                previous_amount: 15_000,
                current_amount: 15_000,
            },
        )
        .unwrap();
        assert_eq!(moved, BucketTotals::new(0, 15_000));
    }

    #[test]
    fn combined_status_and_amount_move_is_one_operation() {
        let buckets = BucketTotals::new(0, 10_000);
        let moved = move_between_buckets(
            buckets,
            BucketMove {
                from: InvoiceStatus::Pending,
                to: InvoiceStatus::Paid,
                previous_amount: 10_000,
                current_amount: 15_000,
            },
        )
        .unwrap();
        assert_eq!(moved, BucketTotals::new(15_000, 0));
    }

    #[test]
    fn same_bucket_move_applies_the_delta() {
        let buckets = BucketTotals::new(10_000, 0);
        let moved = move_between_buckets(
            buckets,
            BucketMove {
                from: InvoiceStatus::Paid,
                to: InvoiceStatus::Paid,
                previous_amount: 10_000,
                current_amount: 15_000,
            },
        )
        .unwrap();
        assert_eq!(moved, BucketTotals::new(15_000, 0));
    }

    #[test]
    fn negative_bucket_is_an_invariant_violation() {
        let buckets = BucketTotals::new(5_000, 0);
        let err = buckets.with_removed(InvoiceStatus::Paid, 10_000).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn draft_status_has_no_bucket() {
        let err = BucketTotals::default()
            .with_added(InvoiceStatus::Draft, 1_000)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn mismatched_bucket_split_is_detected() {
        let err =
            ensure_buckets_match(Tally::new(1, 10_000), BucketTotals::new(5_000, 0)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Add { amount: i64, paid: bool },
        RemoveOldest,
        ChangeAmount { index: usize, amount: i64 },
        ToggleStatus { index: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..1_000_000, any::<bool>()).prop_map(|(amount, paid)| Op::Add { amount, paid }),
            Just(Op::RemoveOldest),
            (0usize..8, 1i64..1_000_000)
                .prop_map(|(index, amount)| Op::ChangeAmount { index, amount }),
            (0usize..8).prop_map(|index| Op::ToggleStatus { index }),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any valid sequence of additions, removals, amount
        /// changes, and status moves, `paid + pending == total` holds after
        /// every step and the invoice count never goes negative.
        #[test]
        fn bucket_split_partitions_total_under_all_mutations(
            ops in prop::collection::vec(op_strategy(), 1..64)
        ) {
            // Model of contributing invoices: (amount, is_paid).
            let mut contributing: Vec<(i64, bool)> = Vec::new();
            let mut tally = Tally::default();
            let mut buckets = BucketTotals::default();

            for op in ops {
                match op {
                    Op::Add { amount, paid } => {
                        let status = if paid { InvoiceStatus::Paid } else { InvoiceStatus::Pending };
                        tally = tally.after_addition(amount).unwrap();
                        buckets = buckets.with_added(status, amount).unwrap();
                        contributing.push((amount, paid));
                    }
                    Op::RemoveOldest => {
                        if contributing.is_empty() {
                            // Driving a removal against an empty aggregate is
                            // the precondition violation, not a valid stream.
                            prop_assert!(tally.after_removal(1).is_err());
                            continue;
                        }
                        let (amount, paid) = contributing.remove(0);
                        let status = if paid { InvoiceStatus::Paid } else { InvoiceStatus::Pending };
                        tally = tally.after_removal(amount).unwrap();
                        buckets = buckets.with_removed(status, amount).unwrap();
                    }
                    Op::ChangeAmount { index, amount } => {
                        if contributing.is_empty() {
                            continue;
                        }
                        let index = index % contributing.len();
                        let (previous, paid) = contributing[index];
                        let status = if paid { InvoiceStatus::Paid } else { InvoiceStatus::Pending };
                        tally = tally.after_amount_change(previous, amount).unwrap();
                        buckets = move_between_buckets(buckets, BucketMove {
                            from: status,
                            to: status,
                            previous_amount: previous,
                            current_amount: amount,
                        }).unwrap();
                        contributing[index].0 = amount;
                    }
                    Op::ToggleStatus { index } => {
                        if contributing.is_empty() {
                            continue;
                        }
                        let index = index % contributing.len();
                        let (amount, paid) = contributing[index];
                        let (from, to) = if paid {
                            (InvoiceStatus::Paid, InvoiceStatus::Pending)
                        } else {
                            (InvoiceStatus::Pending, InvoiceStatus::Paid)
                        };
                        buckets = move_between_buckets(buckets, BucketMove {
                            from,
                            to,
                            previous_amount: amount,
                            current_amount: amount,
                        }).unwrap();
                        contributing[index].1 = !paid;
                    }
                }

                prop_assert_eq!(buckets.sum(), tally.total_amount);
                prop_assert_eq!(tally.invoice_count as usize, contributing.len());
                prop_assert!(ensure_buckets_match(tally, buckets).is_ok());
            }
        }
    }
}
