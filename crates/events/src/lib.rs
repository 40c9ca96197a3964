//! `monthwise-events` — event mechanics (trait + transport).
//!
//! Domain event *types* live with their domains (see `monthwise-invoicing`);
//! this crate only provides the `Event` contract and the pub/sub transport
//! used to deliver events inside the process.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
