//! Request and response types exchanged over a connection.

use std::fmt;

use crate::domain::PoolId;
use crate::error::ProtocolError;

/// Selector value announcing a cancellation; the target pool follows.
pub const CANCEL_SELECTOR: i32 = 4;

/// A single client request. Exactly one is sent per connection.
///
/// `name` and `surname` are opaque display strings forwarded to server-side
/// reporting; the server never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Allocate one unit from `pool`.
    Register {
        /// Client first name.
        name: String,
        /// Client surname.
        surname: String,
        /// Pool to allocate from.
        pool: PoolId,
    },
    /// Release one unit back to `pool`.
    Cancel {
        /// Client first name.
        name: String,
        /// Client surname.
        surname: String,
        /// Pool to release to.
        pool: PoolId,
    },
}

impl Request {
    /// Returns the target pool.
    #[must_use]
    pub const fn pool(&self) -> PoolId {
        match self {
            Self::Register { pool, .. } | Self::Cancel { pool, .. } => *pool,
        }
    }

    /// Returns the client first name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Register { name, .. } | Self::Cancel { name, .. } => name,
        }
    }

    /// Returns the client surname.
    #[must_use]
    pub fn surname(&self) -> &str {
        match self {
            Self::Register { surname, .. } | Self::Cancel { surname, .. } => surname,
        }
    }

    /// Returns the selector this request is announced with on the wire.
    #[must_use]
    pub const fn selector(&self) -> i32 {
        match self {
            Self::Register { pool, .. } => pool.code(),
            Self::Cancel { .. } => CANCEL_SELECTOR,
        }
    }
}

/// A request as framed on the wire, before the selector is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Client first name.
    pub name: String,
    /// Client surname.
    pub surname: String,
    /// Raw selector (`1..=3` register, [`CANCEL_SELECTOR`] cancel).
    pub selector: i32,
    /// Raw cancellation target, present only when `selector` is
    /// [`CANCEL_SELECTOR`].
    pub target: Option<i32>,
}

impl Frame {
    /// Returns the target code of a cancellation that names no pool.
    ///
    /// This is a normal negative outcome rather than a framing error.
    #[must_use]
    pub fn unknown_cancel_target(&self) -> Option<i32> {
        match self.target {
            Some(target) if self.selector == CANCEL_SELECTOR => {
                PoolId::from_code(target).is_none().then_some(target)
            }
            _ => None,
        }
    }
}

impl TryFrom<Frame> for Request {
    type Error = ProtocolError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        let Frame {
            name,
            surname,
            selector,
            target,
        } = frame;

        if selector == CANCEL_SELECTOR {
            let target = target.ok_or(ProtocolError::ConnectionClosed)?;
            let pool =
                PoolId::from_code(target).ok_or(ProtocolError::InvalidCancelTarget(target))?;
            return Ok(Self::Cancel {
                name,
                surname,
                pool,
            });
        }

        let pool = PoolId::from_code(selector).ok_or(ProtocolError::InvalidSelector(selector))?;
        Ok(Self::Register {
            name,
            surname,
            pool,
        })
    }
}

/// Result of a request as seen by the client.
///
/// The wire does not say why a request failed: an exhausted pool, an empty
/// pool on cancellation and an out-of-range cancellation target all map to
/// [`Status::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The counter was changed (`+1`).
    Success,
    /// Nothing was changed (`-1`).
    Failure,
}

impl Status {
    /// Returns the wire code (`+1` or `-1`).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 1,
            Self::Failure => -1,
        }
    }
}

impl TryFrom<i32> for Status {
    type Error = ProtocolError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Success),
            -1 => Ok(Self::Failure),
            other => Err(ProtocolError::InvalidStatus(other)),
        }
    }
}

impl<T, E> From<Result<T, E>> for Status {
    fn from(result: Result<T, E>) -> Self {
        if result.is_ok() {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
        }
    }
}
