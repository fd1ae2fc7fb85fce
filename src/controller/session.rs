//! Occupancy session handle

use std::time::{Duration, Instant};

use crate::types::{ActorId, Category};

/// Proof of admission returned by `enter`
///
/// The handle is neither `Clone` nor `Copy`, and `leave` consumes it, so a
/// session is released exactly once.
#[derive(Debug)]
#[must_use = "an occupancy session must be passed to `leave`"]
pub struct OccupancySession {
    category: Category,
    actor: ActorId,
    admitted_at: Instant,
}

impl OccupancySession {
    pub(crate) fn new(category: Category, actor: ActorId) -> Self {
        Self { category, actor, admitted_at: Instant::now() }
    }

    /// Category the session was admitted under
    pub fn category(&self) -> Category {
        self.category
    }

    /// Actor holding the session
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Time since admission
    pub fn held_for(&self) -> Duration {
        self.admitted_at.elapsed()
    }
}
