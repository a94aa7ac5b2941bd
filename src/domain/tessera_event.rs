//! Domain events emitted after every handled request.
//!
//! Every outcome of a registration or cancellation produces a
//! [`TesseraEvent`] on the [`super::EventBus`], published after the registry
//! lock has been released. The summary reporter turns them into
//! human-readable log lines.

use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PoolId, SlotNumber};

/// Outcome of a single client request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum TesseraEvent {
    /// A slot was allocated.
    Registered {
        /// Pool the slot was taken from.
        pool: PoolId,
        /// Activation sequence number assigned.
        slot: SlotNumber,
        /// Occupancy of the pool after this allocation.
        allocated: u32,
        /// Client-supplied name.
        name: String,
        /// Client-supplied surname.
        surname: String,
        /// Remote address of the client.
        peer: SocketAddr,
        /// When the allocation happened.
        timestamp: DateTime<Utc>,
    },

    /// A registration was refused because the pool is full.
    RegistrationRejected {
        /// Pool that was full.
        pool: PoolId,
        /// Client-supplied name.
        name: String,
        /// Client-supplied surname.
        surname: String,
        /// Remote address of the client.
        peer: SocketAddr,
        /// When the request was refused.
        timestamp: DateTime<Utc>,
    },

    /// A slot was released.
    Cancelled {
        /// Pool the slot was returned to.
        pool: PoolId,
        /// Client-supplied name.
        name: String,
        /// Client-supplied surname.
        surname: String,
        /// Remote address of the client.
        peer: SocketAddr,
        /// When the release happened.
        timestamp: DateTime<Utc>,
    },

    /// A cancellation was refused.
    ///
    /// `pool` is `None` when the requested target was not a valid pool code.
    CancellationRejected {
        /// Pool that had nothing to release, if the target was valid.
        pool: Option<PoolId>,
        /// Raw target code sent by the client.
        target: i32,
        /// Client-supplied name.
        name: String,
        /// Client-supplied surname.
        surname: String,
        /// Remote address of the client.
        peer: SocketAddr,
        /// When the request was refused.
        timestamp: DateTime<Utc>,
    },
}

impl TesseraEvent {
    /// Returns the pool this event concerns, if any.
    #[must_use]
    pub const fn pool(&self) -> Option<PoolId> {
        match self {
            Self::Registered { pool, .. }
            | Self::RegistrationRejected { pool, .. }
            | Self::Cancelled { pool, .. } => Some(*pool),
            Self::CancellationRejected { pool, .. } => *pool,
        }
    }

    /// Returns the remote address of the requesting client.
    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        match self {
            Self::Registered { peer, .. }
            | Self::RegistrationRejected { peer, .. }
            | Self::Cancelled { peer, .. }
            | Self::CancellationRejected { peer, .. } => *peer,
        }
    }

    /// Returns the serde tag of this event as a string.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
            Self::RegistrationRejected { .. } => "registration_rejected",
            Self::Cancelled { .. } => "cancelled",
            Self::CancellationRejected { .. } => "cancellation_rejected",
        }
    }

    /// Returns `true` if the request changed a counter.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Registered { .. } | Self::Cancelled { .. })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40_000))
    }

    #[test]
    fn serializes_with_event_type_tag() {
        let event = TesseraEvent::Cancelled {
            pool: PoolId::Type1,
            name: "Mario".to_string(),
            surname: "Rossi".to_string(),
            peer: peer(),
            timestamp: Utc::now(),
        };
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(
            value.get("event_type").and_then(|v| v.as_str()),
            Some("cancelled")
        );
        assert_eq!(value.get("pool").and_then(|v| v.as_str()), Some("type1"));
        assert_eq!(
            value.get("peer").and_then(|v| v.as_str()),
            Some("127.0.0.1:40000")
        );
        assert_eq!(event.event_type_str(), "cancelled");
    }

    #[test]
    fn invalid_cancel_target_has_no_pool() {
        let event = TesseraEvent::CancellationRejected {
            pool: None,
            target: 9,
            name: String::new(),
            surname: String::new(),
            peer: peer(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.pool(), None);
        assert!(!event.is_success());
        assert_eq!(event.peer(), peer());
    }
}
