use serde::{Deserialize, Serialize};

use monthwise_core::{CustomerId, InvoiceId};

/// Invoice status lifecycle as the web application models it.
///
/// Only `Pending` and `Paid` invoices contribute to revenue; the other
/// states exist so snapshots deserialize faithfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Whether this status makes an invoice count toward revenue.
    pub fn counts_toward_revenue(self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Paid)
    }
}

/// Point-in-time view of an invoice, consumed read-only.
///
/// Snapshots are immutable per event; update events carry two of them
/// (previous and current).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    /// Amount in integer cents. Non-positive amounts never count toward
    /// revenue, whatever the status says.
    pub amount: i64,
    pub status: InvoiceStatus,
    /// Calendar date of the invoice as captured at the web boundary
    /// (normally `YYYY-MM-DD`). Deliberately unparsed: period resolution
    /// owns the parse, and a malformed date is a skip there, not an error
    /// here.
    pub date: String,
}

impl InvoiceSnapshot {
    pub fn new(
        id: InvoiceId,
        customer_id: CustomerId,
        amount: i64,
        status: InvoiceStatus,
        date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            customer_id,
            amount,
            status,
            date: date.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<InvoiceStatus>("\"cancelled\"").unwrap(),
            InvoiceStatus::Cancelled
        );
    }

    #[test]
    fn only_pending_and_paid_count() {
        assert!(InvoiceStatus::Pending.counts_toward_revenue());
        assert!(InvoiceStatus::Paid.counts_toward_revenue());
        assert!(!InvoiceStatus::Draft.counts_toward_revenue());
        assert!(!InvoiceStatus::Cancelled.counts_toward_revenue());
    }
}
