//! Capacity counters for the three tessera pools.
//!
//! [`PoolRegistry`] keeps all three counters behind a single
//! [`tokio::sync::Mutex`]. Every operation is a check-then-mutate performed
//! entirely inside the critical section, and the guard is never held across
//! an I/O await: callers get a plain value back and do their socket work
//! after the lock is gone.

use std::fmt;

use serde::Serialize;
use tokio::sync::Mutex;

use super::PoolId;
use crate::error::PoolError;

/// Maximum simultaneous allocations per pool.
pub const CAPACITY: u32 = 100;

/// Activation sequence number handed out by a successful allocation.
///
/// Slot numbers start at 1 and increase monotonically per pool. A release
/// frees capacity but never makes a slot number available again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotNumber(u32);

impl SlotNumber {
    /// Returns the raw sequence number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a successful allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Sequence number assigned to this allocation.
    pub slot: SlotNumber,
    /// Occupancy of the pool right after the allocation, in `1..=CAPACITY`.
    pub allocated: u32,
}

/// Point-in-time view of the `allocated` counter of every pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolSnapshot {
    /// Allocations held in [`PoolId::Type1`].
    pub type1: u32,
    /// Allocations held in [`PoolId::Type2`].
    pub type2: u32,
    /// Allocations held in [`PoolId::Type3`].
    pub type3: u32,
}

impl PoolSnapshot {
    /// Returns the allocation count of `pool`.
    #[must_use]
    pub const fn get(&self, pool: PoolId) -> u32 {
        match pool {
            PoolId::Type1 => self.type1,
            PoolId::Type2 => self.type2,
            PoolId::Type3 => self.type3,
        }
    }
}

#[derive(Debug, Default)]
struct PoolCounter {
    /// Current occupancy, always in `0..=CAPACITY`.
    allocated: u32,
    /// Slot numbers issued so far.
    issued: u32,
}

#[derive(Debug, Default)]
struct Counters {
    type1: PoolCounter,
    type2: PoolCounter,
    type3: PoolCounter,
}

impl Counters {
    fn get(&self, pool: PoolId) -> &PoolCounter {
        match pool {
            PoolId::Type1 => &self.type1,
            PoolId::Type2 => &self.type2,
            PoolId::Type3 => &self.type3,
        }
    }

    fn get_mut(&mut self, pool: PoolId) -> &mut PoolCounter {
        match pool {
            PoolId::Type1 => &mut self.type1,
            PoolId::Type2 => &mut self.type2,
            PoolId::Type3 => &mut self.type3,
        }
    }
}

/// Shared, mutex-protected capacity state for all pools.
///
/// Created once at startup with every counter at zero and shared by
/// reference (`Arc`) with every connection handler.
///
/// # Concurrency
///
/// - One lock guards the three pools jointly.
/// - Concurrent calls are linearised in lock-acquisition order; there is no
///   fairness policy.
#[derive(Debug, Default)]
pub struct PoolRegistry {
    counters: Mutex<Counters>,
}

impl PoolRegistry {
    /// Creates a registry with all pools empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes one unit from `pool` if capacity remains.
    ///
    /// The returned [`Allocation`] carries both the slot number and the new
    /// occupancy; they differ once a unit has been released.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] when the pool already holds
    /// [`CAPACITY`] allocations. No counter changes in that case.
    pub async fn try_allocate(&self, pool: PoolId) -> Result<Allocation, PoolError> {
        let mut counters = self.counters.lock().await;
        let counter = counters.get_mut(pool);
        if counter.allocated >= CAPACITY {
            return Err(PoolError::Exhausted { pool });
        }
        counter.allocated = counter.allocated.saturating_add(1);
        counter.issued = counter.issued.saturating_add(1);
        Ok(Allocation {
            slot: SlotNumber(counter.issued),
            allocated: counter.allocated,
        })
    }

    /// Gives one unit back to `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NothingToRelease`] when the pool has no active
    /// allocation. No counter changes in that case.
    pub async fn try_release(&self, pool: PoolId) -> Result<(), PoolError> {
        let mut counters = self.counters.lock().await;
        let counter = counters.get_mut(pool);
        if counter.allocated == 0 {
            return Err(PoolError::NothingToRelease { pool });
        }
        counter.allocated = counter.allocated.saturating_sub(1);
        Ok(())
    }

    /// Returns the current allocation count of `pool`.
    pub async fn allocated(&self, pool: PoolId) -> u32 {
        self.counters.lock().await.get(pool).allocated
    }

    /// Returns the allocation counts of all pools, read atomically.
    pub async fn snapshot(&self) -> PoolSnapshot {
        let counters = self.counters.lock().await;
        PoolSnapshot {
            type1: counters.type1.allocated,
            type2: counters.type2.allocated,
            type3: counters.type3.allocated,
        }
    }
}
