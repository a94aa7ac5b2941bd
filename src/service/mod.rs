//! Service layer: business logic orchestration.
//!
//! [`TesseraService`] applies requests to the registry and emits events
//! through the [`super::domain::EventBus`]; the [`reporter`] turns those
//! events into operator-facing summaries.

pub mod reporter;
pub mod tessera_service;

pub use reporter::spawn_reporter;
pub use tessera_service::TesseraService;
