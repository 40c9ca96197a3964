use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use monthwise_core::EventId;
use monthwise_events::Event;

use crate::snapshot::InvoiceSnapshot;

/// Event: an invoice was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCreated {
    pub event_id: EventId,
    pub invoice: InvoiceSnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// Event: an invoice was updated.
///
/// Carries both sides of the change so consumers can classify it without
/// re-reading invoice storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceUpdated {
    pub event_id: EventId,
    pub previous: InvoiceSnapshot,
    pub current: InvoiceSnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// Event: an invoice was deleted.
///
/// The snapshot is the invoice as it was at deletion time; its eligibility
/// decides whether any revenue adjustment is needed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDeleted {
    pub event_id: EventId,
    pub invoice: InvoiceSnapshot,
    pub occurred_at: DateTime<Utc>,
}

/// Invoice lifecycle event vocabulary.
///
/// Delivery is at-least-once with no ordering across invoices; per-invoice
/// ordering is assumed from the producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    Created(InvoiceCreated),
    Updated(InvoiceUpdated),
    Deleted(InvoiceDeleted),
}

impl InvoiceEvent {
    /// Producer-assigned unique id; the idempotency key.
    pub fn event_id(&self) -> &EventId {
        match self {
            InvoiceEvent::Created(e) => &e.event_id,
            InvoiceEvent::Updated(e) => &e.event_id,
            InvoiceEvent::Deleted(e) => &e.event_id,
        }
    }

    /// The invoice snapshot this event is about (the current one for updates).
    pub fn invoice(&self) -> &InvoiceSnapshot {
        match self {
            InvoiceEvent::Created(e) => &e.invoice,
            InvoiceEvent::Updated(e) => &e.current,
            InvoiceEvent::Deleted(e) => &e.invoice,
        }
    }
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::Created(_) => "invoicing.invoice.created",
            InvoiceEvent::Updated(_) => "invoicing.invoice.updated",
            InvoiceEvent::Deleted(_) => "invoicing.invoice.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::Created(e) => e.occurred_at,
            InvoiceEvent::Updated(e) => e.occurred_at,
            InvoiceEvent::Deleted(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InvoiceStatus;
    use monthwise_core::{CustomerId, InvoiceId};

    fn snapshot() -> InvoiceSnapshot {
        InvoiceSnapshot::new(
            InvoiceId::new(),
            CustomerId::new(),
            10_000,
            InvoiceStatus::Paid,
            "2024-03-12",
        )
    }

    #[test]
    fn event_id_is_stable_across_variants() {
        let id = EventId::new("evt-1");
        let created = InvoiceEvent::Created(InvoiceCreated {
            event_id: id.clone(),
            invoice: snapshot(),
            occurred_at: Utc::now(),
        });
        assert_eq!(created.event_id(), &id);
        assert_eq!(created.event_type(), "invoicing.invoice.created");
    }

    #[test]
    fn update_exposes_current_snapshot() {
        let previous = snapshot();
        let mut current = previous.clone();
        current.amount = 15_000;

        let ev = InvoiceEvent::Updated(InvoiceUpdated {
            event_id: EventId::new("evt-2"),
            previous,
            current: current.clone(),
            occurred_at: Utc::now(),
        });
        assert_eq!(ev.invoice(), &current);
    }
}
