//! Domain layer: pool identity, the capacity registry, and events.
//!
//! This module contains the server-side model: the three pool
//! identifiers, the mutex-protected counters every connection shares, and
//! the event bus used to report request outcomes.

pub mod event_bus;
pub mod pool_id;
pub mod pool_registry;
pub mod tessera_event;

pub use event_bus::EventBus;
pub use pool_id::PoolId;
pub use pool_registry::{Allocation, CAPACITY, PoolRegistry, PoolSnapshot, SlotNumber};
pub use tessera_event::TesseraEvent;
