//! `monthwise-invoicing` — invoice-side types consumed by the revenue engine.
//!
//! The invoice CRUD surface itself (forms, validation, persistence) lives in
//! the web application and is out of scope here; this crate carries the
//! read-only snapshot shape and the lifecycle event vocabulary that surface
//! emits.

pub mod lifecycle;
pub mod snapshot;

pub use lifecycle::{InvoiceCreated, InvoiceDeleted, InvoiceEvent, InvoiceUpdated};
pub use snapshot::{InvoiceSnapshot, InvoiceStatus};
