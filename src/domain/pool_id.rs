//! Identifier of the three tessera pools.
//!
//! [`PoolId`] is a closed enum: no pool other than the three listed here can
//! exist, so every registry lookup is total and infallible. The wire code of
//! a pool (`1..=3`) is its selector in the request protocol.

use std::fmt;

use serde::Serialize;

/// One of the three independent tessera pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolId {
    /// Weekday entries, public holidays excluded.
    Type1,
    /// Entries including public holidays.
    Type2,
    /// Every day, previews included.
    Type3,
}

impl PoolId {
    /// All pools in wire-code order.
    pub const ALL: [Self; 3] = [Self::Type1, Self::Type2, Self::Type3];

    /// Maps a wire code (`1..=3`) to a pool.
    ///
    /// Returns `None` for any other value.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Type1),
            2 => Some(Self::Type2),
            3 => Some(Self::Type3),
            _ => None,
        }
    }

    /// Returns the wire code of this pool.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Type1 => 1,
            Self::Type2 => 2,
            Self::Type3 => 3,
        }
    }

    /// Short label used in summaries (`Tessera1`, ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Type1 => "Tessera1",
            Self::Type2 => "Tessera2",
            Self::Type3 => "Tessera3",
        }
    }

    /// Human-readable description of what the card covers.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Type1 => "public holidays excluded",
            Self::Type2 => "public holidays included",
            Self::Type3 => "every day, previews included",
        }
    }

    /// Yearly list price in euros.
    #[must_use]
    pub const fn price_eur(self) -> u32 {
        match self {
            Self::Type1 => 150,
            Self::Type2 => 200,
            Self::Type3 => 250,
        }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
