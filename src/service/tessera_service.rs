//! Tessera service: applies requests to the registry and emits events.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Allocation, EventBus, PoolRegistry, TesseraEvent};
use crate::protocol::{Request, Status};

/// Orchestration layer for registrations and cancellations.
///
/// Stateless coordinator: owns references to [`PoolRegistry`] for state
/// and [`EventBus`] for event emission. Every method follows the pattern:
/// mutate under the registry lock → release the lock → emit event → return
/// status.
#[derive(Debug, Clone)]
pub struct TesseraService {
    registry: Arc<PoolRegistry>,
    event_bus: EventBus,
}

impl TesseraService {
    /// Creates a new `TesseraService`.
    #[must_use]
    pub fn new(registry: Arc<PoolRegistry>, event_bus: EventBus) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PoolRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Applies `request` on behalf of `peer` and returns the wire status.
    pub async fn handle(&self, request: Request, peer: SocketAddr) -> Status {
        match request {
            Request::Register {
                name,
                surname,
                pool,
            } => {
                let outcome = self.registry.try_allocate(pool).await;
                let status = Status::from(outcome);
                let event = match outcome {
                    Ok(Allocation { slot, allocated }) => {
                        tracing::info!(%pool, %slot, allocated, "slot allocated");
                        TesseraEvent::Registered {
                            pool,
                            slot,
                            allocated,
                            name,
                            surname,
                            peer,
                            timestamp: Utc::now(),
                        }
                    }
                    Err(err) => {
                        tracing::info!(%pool, reason = %err, "registration refused");
                        TesseraEvent::RegistrationRejected {
                            pool,
                            name,
                            surname,
                            peer,
                            timestamp: Utc::now(),
                        }
                    }
                };
                let _ = self.event_bus.publish(event);
                status
            }
            Request::Cancel {
                name,
                surname,
                pool,
            } => {
                let outcome = self.registry.try_release(pool).await;
                let status = Status::from(outcome);
                let event = match outcome {
                    Ok(()) => {
                        tracing::info!(%pool, "slot released");
                        TesseraEvent::Cancelled {
                            pool,
                            name,
                            surname,
                            peer,
                            timestamp: Utc::now(),
                        }
                    }
                    Err(err) => {
                        tracing::info!(%pool, reason = %err, "cancellation refused");
                        TesseraEvent::CancellationRejected {
                            pool: Some(pool),
                            target: pool.code(),
                            name,
                            surname,
                            peer,
                            timestamp: Utc::now(),
                        }
                    }
                };
                let _ = self.event_bus.publish(event);
                status
            }
        }
    }

    /// Answers a cancellation whose target is not a pool.
    ///
    /// Nothing is touched in the registry; the outcome is a plain
    /// [`Status::Failure`].
    pub fn reject_cancel_target(
        &self,
        name: String,
        surname: String,
        target: i32,
        peer: SocketAddr,
    ) -> Status {
        tracing::info!(target_code = target, "cancellation refused: unknown pool");
        let _ = self.event_bus.publish(TesseraEvent::CancellationRejected {
            pool: None,
            target,
            name,
            surname,
            peer,
            timestamp: Utc::now(),
        });
        Status::Failure
    }
}
