//! Error types for the tessera server and client.
//!
//! Capacity outcomes ([`PoolError`]) are not failures of the service: they
//! are mapped to a negative [`Status`](crate::protocol::Status) on the wire.
//! Transport and framing problems ([`ProtocolError`]) end the connection they
//! occurred on and never propagate past the connection handler.

use std::io;
use std::net::SocketAddr;

use crate::domain::PoolId;

/// Outcome of a registry operation that could not change any counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The pool already holds `CAPACITY` allocations.
    #[error("{pool} is exhausted")]
    Exhausted {
        /// Pool that was asked for a slot.
        pool: PoolId,
    },

    /// The pool has no active allocation to release.
    #[error("{pool} has nothing to release")]
    NothingToRelease {
        /// Pool that was asked to release a slot.
        pool: PoolId,
    },
}

impl PoolError {
    /// Returns the pool the failed operation targeted.
    #[must_use]
    pub const fn pool(&self) -> PoolId {
        match self {
            Self::Exhausted { pool } | Self::NothingToRelease { pool } => *pool,
        }
    }
}

/// Framing and transport errors on a single connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Underlying socket read or write failed.
    #[error("transport error: {0}")]
    Io(#[source] io::Error),

    /// The peer closed the stream before the exchange was complete.
    #[error("connection closed by peer mid-message")]
    ConnectionClosed,

    /// A string field exceeded the maximum payload length.
    #[error("field `{field}` exceeds {max} bytes")]
    FieldTooLong {
        /// Field name (`name` or `surname`).
        field: &'static str,
        /// Maximum number of content bytes.
        max: usize,
    },

    /// A string field to encode contains the NUL terminator byte.
    #[error("field `{field}` contains a NUL byte")]
    FieldContainsNul {
        /// Field name (`name` or `surname`).
        field: &'static str,
    },

    /// The request selector was not in `1..=4`.
    #[error("invalid selector {0}")]
    InvalidSelector(i32),

    /// The pool named by a cancellation was not in `1..=3`.
    #[error("invalid cancellation target {0}")]
    InvalidCancelTarget(i32),

    /// The status code received by a client was neither `+1` nor `-1`.
    #[error("invalid status code {0}")]
    InvalidStatus(i32),
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::ConnectionClosed
        } else {
            Self::Io(err)
        }
    }
}

/// Errors surfaced by [`TesseraClient`](crate::client::TesseraClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Could not open a connection to the server.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Server address that was dialed.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The exchange failed after the connection was established.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Server-level errors: configuration, startup and connection handling.
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Socket-level failure outside of a request exchange.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Framing or transport failure during a request exchange.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
