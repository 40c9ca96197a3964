//! Mutation dispatch: one classified change becomes exactly one
//! create/update/delete against the revenue store.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use monthwise_core::{DomainError, RevenueId};
use monthwise_invoicing::InvoiceSnapshot;
use monthwise_revenue::{
    BucketMove, BucketTotals, ChangeClassification, Period, RevenueEntity, RevenuePatch,
    arithmetic,
};

use crate::revenue_store::{RevenueStore, RevenueStoreError};

/// What the dispatcher did for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(RevenueEntity),
    Updated(RevenueEntity),
    Deleted(Period),
    Noop,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The backing store failed; the mutation may be partially unapplied.
    #[error(transparent)]
    Store(#[from] RevenueStoreError),

    /// Aggregate arithmetic hit a precondition violation — a data-integrity
    /// bug, never an expected skip.
    #[error(transparent)]
    Invariant(#[from] DomainError),
}

/// Selects and invokes exactly one mutation path per classified change.
///
/// Every path is a single read-then-write against the store; callers
/// serialize concurrent mutations for the same period (see `PeriodLocks`).
#[derive(Debug)]
pub struct RevenueMutationDispatcher<S> {
    store: S,
}

impl<S> RevenueMutationDispatcher<S>
where
    S: RevenueStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a classified change to the aggregate row for `period`.
    ///
    /// `current` is the invoice snapshot after the event (for deletions, the
    /// invoice as it was at deletion time); `previous` is the snapshot before
    /// the event, present for every classification that subtracts prior
    /// contributions.
    pub async fn dispatch(
        &self,
        period: Period,
        classification: ChangeClassification,
        previous: Option<&InvoiceSnapshot>,
        current: &InvoiceSnapshot,
    ) -> Result<MutationOutcome, DispatchError> {
        let existing = self.store.find_by_period(period).await?;

        match (existing, classification) {
            (_, ChangeClassification::NoRelevantChange) => {
                debug!(period = %period, "no relevant change; aggregate untouched");
                Ok(MutationOutcome::Noop)
            }

            (None, ChangeClassification::IneligibleToEligible) => {
                self.create_row(period, current).await
            }
            (Some(row), ChangeClassification::IneligibleToEligible) => {
                self.add_contribution(row, current).await
            }

            (None, ChangeClassification::EligibleToIneligible) => {
                // Nothing to adjust: the contribution this event retracts was
                // never recorded.
                debug!(period = %period, "no aggregate row for retraction; nothing to adjust");
                Ok(MutationOutcome::Noop)
            }
            (Some(row), ChangeClassification::EligibleToIneligible) => {
                let previous = require_previous(previous, classification)?;
                self.remove_contribution(row, previous).await
            }

            (None, ChangeClassification::EligibleStatusChange)
            | (None, ChangeClassification::EligibleAmountChange) => {
                // The row should exist for an invoice that was already
                // eligible; recreate it from the current snapshot rather than
                // dropping the event.
                warn!(
                    period = %period,
                    invoice_id = %current.id,
                    classification = %classification,
                    "aggregate row missing for an already-eligible invoice; recreating from current snapshot"
                );
                self.create_row(period, current).await
            }
            (Some(row), ChangeClassification::EligibleStatusChange) => {
                let previous = require_previous(previous, classification)?;
                self.move_contribution(row, previous, current).await
            }
            (Some(row), ChangeClassification::EligibleAmountChange) => {
                let previous = require_previous(previous, classification)?;
                self.change_contribution_amount(row, previous, current).await
            }
        }
    }

    async fn create_row(
        &self,
        period: Period,
        current: &InvoiceSnapshot,
    ) -> Result<MutationOutcome, DispatchError> {
        let tally = arithmetic::Tally::default().after_addition(current.amount)?;
        let buckets = BucketTotals::for_single(current.status, current.amount)?;
        arithmetic::ensure_buckets_match(tally, buckets)?;

        let now = Utc::now();
        let created = self
            .store
            .create(RevenueEntity {
                id: RevenueId::new(),
                period,
                invoice_count: tally.invoice_count,
                total_amount: tally.total_amount,
                total_paid_amount: buckets.paid,
                total_pending_amount: buckets.pending,
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            period = %period,
            invoice_id = %current.id,
            total_amount = created.total_amount,
            "created revenue aggregate"
        );
        Ok(MutationOutcome::Created(created))
    }

    async fn add_contribution(
        &self,
        row: RevenueEntity,
        current: &InvoiceSnapshot,
    ) -> Result<MutationOutcome, DispatchError> {
        let tally = row.tally().after_addition(current.amount)?;
        let buckets = row.buckets().with_added(current.status, current.amount)?;
        arithmetic::ensure_buckets_match(tally, buckets)?;

        let updated = self
            .store
            .update(row.id, RevenuePatch::from_parts(tally, buckets))
            .await?;

        info!(
            period = %row.period,
            invoice_id = %current.id,
            invoice_count = updated.invoice_count,
            total_amount = updated.total_amount,
            "added invoice contribution"
        );
        Ok(MutationOutcome::Updated(updated))
    }

    async fn remove_contribution(
        &self,
        row: RevenueEntity,
        previous: &InvoiceSnapshot,
    ) -> Result<MutationOutcome, DispatchError> {
        let tally = row.tally().after_removal(previous.amount)?;
        let buckets = row.buckets().with_removed(previous.status, previous.amount)?;
        arithmetic::ensure_buckets_match(tally, buckets)?;

        if tally.invoice_count == 0 {
            if tally.total_amount != 0 {
                warn!(
                    period = %row.period,
                    residual = tally.total_amount,
                    "deleting aggregate with a non-zero residual total"
                );
            }
            self.store.delete(row.id).await?;
            info!(
                period = %row.period,
                invoice_id = %previous.id,
                "last contribution removed; deleted revenue aggregate"
            );
            return Ok(MutationOutcome::Deleted(row.period));
        }

        let updated = self
            .store
            .update(row.id, RevenuePatch::from_parts(tally, buckets))
            .await?;

        info!(
            period = %row.period,
            invoice_id = %previous.id,
            invoice_count = updated.invoice_count,
            total_amount = updated.total_amount,
            "removed invoice contribution"
        );
        Ok(MutationOutcome::Updated(updated))
    }

    async fn move_contribution(
        &self,
        row: RevenueEntity,
        previous: &InvoiceSnapshot,
        current: &InvoiceSnapshot,
    ) -> Result<MutationOutcome, DispatchError> {
        // One combined operation: the bucket move carries the amount delta
        // when status and amount changed together.
        let tally = row
            .tally()
            .after_amount_change(previous.amount, current.amount)?;
        let buckets = arithmetic::move_between_buckets(
            row.buckets(),
            BucketMove {
                from: previous.status,
                to: current.status,
                previous_amount: previous.amount,
                current_amount: current.amount,
            },
        )?;
        arithmetic::ensure_buckets_match(tally, buckets)?;

        let updated = self
            .store
            .update(row.id, RevenuePatch::from_parts(tally, buckets))
            .await?;

        info!(
            period = %row.period,
            invoice_id = %current.id,
            from = ?previous.status,
            to = ?current.status,
            "moved invoice contribution between buckets"
        );
        Ok(MutationOutcome::Updated(updated))
    }

    async fn change_contribution_amount(
        &self,
        row: RevenueEntity,
        previous: &InvoiceSnapshot,
        current: &InvoiceSnapshot,
    ) -> Result<MutationOutcome, DispatchError> {
        let tally = row
            .tally()
            .after_amount_change(previous.amount, current.amount)?;
        // Same status on both sides: the delta lands in the unchanged bucket.
        let buckets = arithmetic::move_between_buckets(
            row.buckets(),
            BucketMove {
                from: previous.status,
                to: current.status,
                previous_amount: previous.amount,
                current_amount: current.amount,
            },
        )?;
        arithmetic::ensure_buckets_match(tally, buckets)?;

        let updated = self
            .store
            .update(row.id, RevenuePatch::from_parts(tally, buckets))
            .await?;

        info!(
            period = %row.period,
            invoice_id = %current.id,
            previous_amount = previous.amount,
            current_amount = current.amount,
            "adjusted invoice contribution amount"
        );
        Ok(MutationOutcome::Updated(updated))
    }
}

fn require_previous<'a>(
    previous: Option<&'a InvoiceSnapshot>,
    classification: ChangeClassification,
) -> Result<&'a InvoiceSnapshot, DispatchError> {
    previous.ok_or_else(|| {
        DispatchError::Invariant(DomainError::invariant(format!(
            "classification {classification} requires a previous invoice snapshot"
        )))
    })
}
