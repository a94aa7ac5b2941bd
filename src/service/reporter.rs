//! Server-side summary of handled requests.
//!
//! Subscribes to the [`EventBus`] and writes one human-readable summary per
//! event, so operators can follow registrations and cancellations without
//! parsing structured fields. With JSON logging the full serialized event is
//! attached to the record as the `event` field.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::LogFormat;
use crate::domain::{CAPACITY, EventBus, TesseraEvent};

/// Spawns the reporter on the current runtime.
///
/// The task ends when every sender of the bus has been dropped.
#[must_use]
pub fn spawn_reporter(event_bus: &EventBus, format: LogFormat) -> JoinHandle<()> {
    tokio::spawn(run_reporter(event_bus.subscribe(), format))
}

/// Logs a summary for every event received on `rx` until the bus closes.
pub async fn run_reporter(mut rx: broadcast::Receiver<TesseraEvent>, format: LogFormat) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let summary = summary_line(&event);
                let record = match format {
                    LogFormat::Json => event_json(&event),
                    LogFormat::Pretty => None,
                };
                if event.is_success() {
                    tracing::info!(
                        event_type = event.event_type_str(),
                        peer = %event.peer(),
                        event = record.as_deref(),
                        "{summary}"
                    );
                } else {
                    tracing::warn!(
                        event_type = event.event_type_str(),
                        peer = %event.peer(),
                        event = record.as_deref(),
                        "{summary}"
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "summary reporter lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!("summary reporter stopped");
}

/// Serializes `event` to a JSON object string.
///
/// Returns `None` and logs the error if serialization fails.
#[must_use]
pub fn event_json(event: &TesseraEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize event");
            None
        }
    }
}

/// Formats the human-readable summary of `event`.
///
/// Registrations show the pool occupancy against [`CAPACITY`] followed by
/// the slot number.
#[must_use]
pub fn summary_line(event: &TesseraEvent) -> String {
    match event {
        TesseraEvent::Registered {
            pool,
            slot,
            allocated,
            name,
            surname,
            peer,
            ..
        } => format!(
            "registration from {peer}: {name} {surname}, {pool} ({allocated}/{CAPACITY}), slot {slot}"
        ),
        TesseraEvent::RegistrationRejected {
            pool,
            name,
            surname,
            peer,
            ..
        } => format!("registration refused for {peer}: {name} {surname}, {pool} is sold out"),
        TesseraEvent::Cancelled {
            pool,
            name,
            surname,
            peer,
            ..
        } => format!("cancellation from {peer}: {name} {surname}, {pool}"),
        TesseraEvent::CancellationRejected {
            pool,
            target,
            name,
            surname,
            peer,
            ..
        } => match pool {
            Some(pool) => format!(
                "cancellation refused for {peer}: {name} {surname}, no active {pool}"
            ),
            None => format!(
                "cancellation refused for {peer}: {name} {surname}, unknown card type {target}"
            ),
        },
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::domain::{PoolId, PoolRegistry};
    use crate::protocol::Request;
    use crate::service::TesseraService;

    fn peer() -> SocketAddr {
        SocketAddr::from(([10, 0, 0, 7], 4242))
    }

    #[tokio::test]
    async fn registered_summary_shows_occupancy_and_slot() {
        let service = TesseraService::new(Arc::new(PoolRegistry::new()), EventBus::new(8));
        let mut rx = service.event_bus().subscribe();
        let request = Request::Register {
            name: "Mario".to_string(),
            surname: "Rossi".to_string(),
            pool: PoolId::Type2,
        };
        let _ = service.handle(request, peer()).await;

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(
            summary_line(&event),
            "registration from 10.0.0.7:4242: Mario Rossi, Tessera2 (1/100), slot 1"
        );
    }

    #[tokio::test]
    async fn summary_after_cancellation_never_exceeds_capacity() {
        let service = TesseraService::new(Arc::new(PoolRegistry::new()), EventBus::new(256));
        let register = || Request::Register {
            name: "M".to_string(),
            surname: "R".to_string(),
            pool: PoolId::Type1,
        };
        for _ in 0..CAPACITY {
            let _ = service.handle(register(), peer()).await;
        }
        let cancel = Request::Cancel {
            name: "M".to_string(),
            surname: "R".to_string(),
            pool: PoolId::Type1,
        };
        let _ = service.handle(cancel, peer()).await;

        let mut rx = service.event_bus().subscribe();
        let _ = service.handle(register(), peer()).await;
        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(
            summary_line(&event),
            "registration from 10.0.0.7:4242: M R, Tessera1 (100/100), slot 101"
        );
    }

    #[tokio::test]
    async fn event_json_carries_tag_and_occupancy() {
        let service = TesseraService::new(Arc::new(PoolRegistry::new()), EventBus::new(8));
        let mut rx = service.event_bus().subscribe();
        let request = Request::Register {
            name: "Mario".to_string(),
            surname: "Rossi".to_string(),
            pool: PoolId::Type3,
        };
        let _ = service.handle(request, peer()).await;
        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };

        let Some(json) = event_json(&event) else {
            panic!("serialization failed");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&json) else {
            panic!("not valid json: {json}");
        };
        assert_eq!(
            value.get("event_type").and_then(|v| v.as_str()),
            Some("registered")
        );
        assert_eq!(value.get("pool").and_then(|v| v.as_str()), Some("type3"));
        assert_eq!(value.get("slot").and_then(|v| v.as_u64()), Some(1));
        assert_eq!(value.get("allocated").and_then(|v| v.as_u64()), Some(1));
        assert_eq!(
            value.get("peer").and_then(|v| v.as_str()),
            Some("10.0.0.7:4242")
        );
    }

    #[test]
    fn unknown_target_summary_names_code() {
        let event = TesseraEvent::CancellationRejected {
            pool: None,
            target: 0,
            name: "Anna".to_string(),
            surname: "Neri".to_string(),
            peer: peer(),
            timestamp: Utc::now(),
        };
        assert!(summary_line(&event).ends_with("unknown card type 0"));
    }

    #[tokio::test]
    async fn reporter_stops_when_bus_is_dropped() {
        let bus = EventBus::new(4);
        let handle = spawn_reporter(&bus, LogFormat::Json);
        bus.publish(TesseraEvent::Cancelled {
            pool: PoolId::Type1,
            name: String::new(),
            surname: String::new(),
            peer: peer(),
            timestamp: Utc::now(),
        });
        drop(bus);

        let joined = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        assert!(matches!(joined, Ok(Ok(()))));
    }
}
