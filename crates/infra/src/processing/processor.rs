//! The event-processing use case: one `InvoiceEvent` in, at most one revenue
//! mutation out.

use thiserror::Error;
use tracing::{error, info};

use monthwise_core::DomainError;
use monthwise_invoicing::{InvoiceEvent, InvoiceSnapshot};
use monthwise_revenue::{
    ChangeClassification, Eligibility, EligibilityClassifier, Period, PeriodResolver,
};

use crate::idempotency::{Guarded, IdempotencyGuard, InMemorySeenEventStore, SeenEventStore};
use crate::processing::dispatcher::{DispatchError, MutationOutcome, RevenueMutationDispatcher};
use crate::processing::period_lock::PeriodLocks;
use crate::revenue_store::RevenueStore;

/// Why an event required no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The invoice does not count toward revenue.
    IneligibleInvoice,
    /// The invoice date does not resolve to a valid period.
    UnresolvablePeriod,
    /// An update that changed nothing revenue-relevant.
    NoRelevantChange,
}

/// What happened to one delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Exactly one mutation was applied.
    Applied(MutationOutcome),
    /// The event id was seen before; nothing ran.
    Duplicate,
    /// Expected no-op; logged at info.
    Skipped(SkipReason),
    /// The store failed mid-mutation. The event stays marked as processed and
    /// is not retried, so the aggregate may now lag ground truth until
    /// reconciled out of band.
    Dropped,
}

/// Failure that must stay loud: a violated aggregate invariant.
///
/// Infrastructure failures and expected skips are absorbed into
/// `ProcessingOutcome`; this error is the one thing `process` refuses to
/// swallow, so callers can alert on data-integrity bugs separately.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("revenue invariant violated: {0}")]
    Invariant(#[source] DomainError),
}

/// Top-level entry point wiring guard, classifier, resolver, and dispatcher.
///
/// Period note: every adjustment applies to one period — resolved from the
/// snapshot whose contribution is being adjusted (the previous one for
/// retractions, the current one otherwise). A date edit that moves an invoice
/// across months is outside the event vocabulary and not tracked as a
/// cross-period move.
#[derive(Debug)]
pub struct RevenueEventProcessor<S, E = InMemorySeenEventStore> {
    classifier: EligibilityClassifier,
    resolver: PeriodResolver,
    guard: IdempotencyGuard<E>,
    dispatcher: RevenueMutationDispatcher<S>,
    locks: PeriodLocks,
}

impl<S> RevenueEventProcessor<S>
where
    S: RevenueStore,
{
    /// Processor with an in-process seen-set and default period bounds.
    pub fn new(store: S) -> Self {
        Self::with_seen_store(store, InMemorySeenEventStore::new())
    }
}

impl<S, E> RevenueEventProcessor<S, E>
where
    S: RevenueStore,
    E: SeenEventStore,
{
    pub fn with_seen_store(store: S, seen: E) -> Self {
        let resolver = PeriodResolver::default();
        Self {
            classifier: EligibilityClassifier::new(resolver),
            resolver,
            guard: IdempotencyGuard::new(seen),
            dispatcher: RevenueMutationDispatcher::new(store),
            locks: PeriodLocks::new(),
        }
    }

    /// Process one delivered event.
    ///
    /// Never propagates store failures or expected skips (the event bus must
    /// survive anything an event does); only invariant violations come back
    /// as `Err`.
    pub async fn process(
        &self,
        event: &InvoiceEvent,
    ) -> Result<ProcessingOutcome, ProcessingError> {
        let event_id = event.event_id().clone();

        match self.guard.run(&event_id, || self.apply(event)).await {
            Guarded::Duplicate => {
                info!(event_id = %event_id, "duplicate event delivery; skipped");
                Ok(ProcessingOutcome::Duplicate)
            }
            Guarded::Executed(result) => result,
        }
    }

    async fn apply(&self, event: &InvoiceEvent) -> Result<ProcessingOutcome, ProcessingError> {
        match event {
            InvoiceEvent::Created(e) => {
                // A standalone create is an ineligible→eligible transition
                // against whatever row the period already has.
                if let Some(skip) = self.gate_snapshot(event, &e.invoice) {
                    return Ok(skip);
                }
                let Some(period) = self.resolve_period(event, &e.invoice) else {
                    return Ok(ProcessingOutcome::Skipped(SkipReason::UnresolvablePeriod));
                };
                self.dispatch(
                    event,
                    period,
                    ChangeClassification::IneligibleToEligible,
                    None,
                    &e.invoice,
                )
                .await
            }

            InvoiceEvent::Deleted(e) => {
                // A standalone delete is an eligible→ineligible transition;
                // an ineligible deleted invoice requires no adjustment.
                if let Some(skip) = self.gate_snapshot(event, &e.invoice) {
                    return Ok(skip);
                }
                let Some(period) = self.resolve_period(event, &e.invoice) else {
                    return Ok(ProcessingOutcome::Skipped(SkipReason::UnresolvablePeriod));
                };
                self.dispatch(
                    event,
                    period,
                    ChangeClassification::EligibleToIneligible,
                    Some(&e.invoice),
                    &e.invoice,
                )
                .await
            }

            InvoiceEvent::Updated(e) => {
                let classification = self.classifier.classify_change(&e.previous, &e.current);
                if classification == ChangeClassification::NoRelevantChange {
                    info!(
                        event_id = %e.event_id,
                        invoice_id = %e.current.id,
                        "update changed nothing revenue-relevant; skipped"
                    );
                    return Ok(ProcessingOutcome::Skipped(SkipReason::NoRelevantChange));
                }

                // The adjustment applies to the period of the snapshot whose
                // contribution changes: a retraction unwinds the previous
                // snapshot (its date may be the only parseable one).
                let anchor = match classification {
                    ChangeClassification::EligibleToIneligible => &e.previous,
                    _ => &e.current,
                };
                let Some(period) = self.resolve_period(event, anchor) else {
                    return Ok(ProcessingOutcome::Skipped(SkipReason::UnresolvablePeriod));
                };

                self.dispatch(event, period, classification, Some(&e.previous), &e.current)
                    .await
            }
        }
    }

    /// Eligibility gate for single-snapshot events. Returns the skip outcome
    /// for ineligible invoices (logged at info), `None` when processing
    /// should continue.
    fn gate_snapshot(
        &self,
        event: &InvoiceEvent,
        snapshot: &InvoiceSnapshot,
    ) -> Option<ProcessingOutcome> {
        match self.classifier.eligibility(snapshot) {
            Eligibility::Eligible => None,
            Eligibility::Ineligible(reason) => {
                info!(
                    event_id = %event.event_id(),
                    invoice_id = %snapshot.id,
                    reason = %reason,
                    "invoice not eligible for revenue; skipped"
                );
                Some(ProcessingOutcome::Skipped(SkipReason::IneligibleInvoice))
            }
        }
    }

    fn resolve_period(&self, event: &InvoiceEvent, snapshot: &InvoiceSnapshot) -> Option<Period> {
        let period = self.resolver.resolve(snapshot);
        if period.is_none() {
            info!(
                event_id = %event.event_id(),
                invoice_id = %snapshot.id,
                date = %snapshot.date,
                "invoice date does not resolve to a period; skipped"
            );
        }
        period
    }

    async fn dispatch(
        &self,
        event: &InvoiceEvent,
        period: Period,
        classification: ChangeClassification,
        previous: Option<&InvoiceSnapshot>,
        current: &InvoiceSnapshot,
    ) -> Result<ProcessingOutcome, ProcessingError> {
        let _serialized = self.locks.acquire(period).await;

        match self
            .dispatcher
            .dispatch(period, classification, previous, current)
            .await
        {
            Ok(outcome) => {
                info!(
                    event_id = %event.event_id(),
                    invoice_id = %current.id,
                    period = %period,
                    classification = %classification,
                    "event applied to revenue aggregate"
                );
                Ok(ProcessingOutcome::Applied(outcome))
            }
            Err(DispatchError::Store(err)) => {
                // Absorbed by design: the guard already marked this event as
                // processed, and there is no retry path. The aggregate drifts
                // until reconciled against raw invoice data.
                error!(
                    event_id = %event.event_id(),
                    invoice_id = %current.id,
                    period = %period,
                    classification = %classification,
                    error = %err,
                    "revenue store failure; event dropped without retry"
                );
                Ok(ProcessingOutcome::Dropped)
            }
            Err(DispatchError::Invariant(err)) => {
                error!(
                    event_id = %event.event_id(),
                    invoice_id = %current.id,
                    period = %period,
                    classification = %classification,
                    error = %err,
                    "revenue invariant violated while applying event"
                );
                Err(ProcessingError::Invariant(err))
            }
        }
    }
}
