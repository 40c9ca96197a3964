//! Eligibility classification: does an invoice count toward revenue, and
//! what kind of change does an update represent?

use monthwise_invoicing::{InvoiceSnapshot, InvoiceStatus};

use crate::period::PeriodResolver;

/// Why an invoice does not count toward revenue.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IneligibilityReason {
    /// Status outside {paid, pending} (e.g. draft, cancelled).
    NonCountingStatus(InvoiceStatus),
    /// Amount is zero or negative, regardless of status.
    NonPositiveAmount,
    /// The invoice date does not resolve to a valid accounting period.
    UnresolvablePeriod,
}

impl core::fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IneligibilityReason::NonCountingStatus(status) => {
                write!(f, "status {status:?} does not count toward revenue")
            }
            IneligibilityReason::NonPositiveAmount => write!(f, "amount is not positive"),
            IneligibilityReason::UnresolvablePeriod => write!(f, "period is unresolvable"),
        }
    }
}

/// Outcome of an eligibility check: a classification, never an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(IneligibilityReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Kind of revenue-relevant change between two invoice snapshots.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChangeClassification {
    NoRelevantChange,
    EligibleToIneligible,
    IneligibleToEligible,
    EligibleStatusChange,
    EligibleAmountChange,
}

impl ChangeClassification {
    /// Stable snake_case name, used in structured log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeClassification::NoRelevantChange => "no_relevant_change",
            ChangeClassification::EligibleToIneligible => "eligible_to_ineligible",
            ChangeClassification::IneligibleToEligible => "ineligible_to_eligible",
            ChangeClassification::EligibleStatusChange => "eligible_status_change",
            ChangeClassification::EligibleAmountChange => "eligible_amount_change",
        }
    }
}

impl core::fmt::Display for ChangeClassification {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether an invoice counts toward revenue, and classifies updates.
///
/// Pure and total: every snapshot (and every pair of snapshots) maps to
/// exactly one outcome, without I/O.
#[derive(Debug, Copy, Clone, Default)]
pub struct EligibilityClassifier {
    resolver: PeriodResolver,
}

impl EligibilityClassifier {
    pub fn new(resolver: PeriodResolver) -> Self {
        Self { resolver }
    }

    /// Eligible iff status counts, amount is positive, and the period resolves.
    pub fn eligibility(&self, invoice: &InvoiceSnapshot) -> Eligibility {
        if !invoice.status.counts_toward_revenue() {
            return Eligibility::Ineligible(IneligibilityReason::NonCountingStatus(invoice.status));
        }
        if invoice.amount <= 0 {
            return Eligibility::Ineligible(IneligibilityReason::NonPositiveAmount);
        }
        if self.resolver.resolve(invoice).is_none() {
            return Eligibility::Ineligible(IneligibilityReason::UnresolvablePeriod);
        }
        Eligibility::Eligible
    }

    pub fn is_eligible(&self, invoice: &InvoiceSnapshot) -> bool {
        self.eligibility(invoice).is_eligible()
    }

    /// Classify the revenue-relevant change between two snapshots of the same
    /// invoice.
    ///
    /// When both sides are eligible, a status change takes precedence over an
    /// amount change: a simultaneous status+amount change is handled as one
    /// combined status-move operation, not two.
    pub fn classify_change(
        &self,
        previous: &InvoiceSnapshot,
        current: &InvoiceSnapshot,
    ) -> ChangeClassification {
        match (self.is_eligible(previous), self.is_eligible(current)) {
            (false, false) => ChangeClassification::NoRelevantChange,
            (true, false) => ChangeClassification::EligibleToIneligible,
            (false, true) => ChangeClassification::IneligibleToEligible,
            (true, true) if previous.status != current.status => {
                ChangeClassification::EligibleStatusChange
            }
            (true, true) if previous.amount != current.amount => {
                ChangeClassification::EligibleAmountChange
            }
            (true, true) => ChangeClassification::NoRelevantChange,
        }
    }
}
