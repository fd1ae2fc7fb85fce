//! Shared occupancy state guarded by the turnstile

use serde::{Deserialize, Serialize};

use crate::simulation::{OccupancyStatistics, PerCategory, SimulationError, SimulationResult};
use crate::types::{Category, FairnessPolicy};

/// Everything the turnstile protects
///
/// Only ever touched while the turnstile mutex is held.
#[derive(Debug, Default)]
pub(crate) struct TurnstileState {
    pub(crate) occupants: PerCategory<usize>,
    pub(crate) current: Option<Category>,
    pub(crate) waiting: PerCategory<usize>,
    /// Category entitled to the next session while it has waiters
    pub(crate) owed: Option<Category>,
    /// Category that had waiters when the resource last emptied
    pub(crate) pending_handoff: Option<Category>,
    pub(crate) shutdown: bool,
    pub(crate) last_sequence: u64,
    pub(crate) statistics: OccupancyStatistics,
}

impl TurnstileState {
    /// Whether an arrival of `category` may join the resource right now
    pub(crate) fn is_eligible(&self, category: Category, policy: FairnessPolicy) -> bool {
        let other = category.other();
        if self.current == Some(other) {
            return false;
        }
        match policy {
            FairnessPolicy::Strict => {
                !(self.owed == Some(other) && *self.waiting.get(other) > 0)
            }
            FairnessPolicy::BestEffort => true,
        }
    }

    /// Record that an arrival of `category` could not be admitted
    ///
    /// Under the strict policy, being kept out by the other category's
    /// occupancy makes `category` owed the next session.
    pub(crate) fn note_blocked(&mut self, category: Category, policy: FairnessPolicy) {
        if policy == FairnessPolicy::Strict && self.current == Some(category.other()) {
            self.owed = Some(category);
        }
    }

    /// Open a new occupancy session for `category`
    pub(crate) fn claim(&mut self, category: Category, policy: FairnessPolicy) -> SimulationResult<()> {
        if let Some(owed) = self.pending_handoff.take() {
            if owed == category {
                self.statistics.owed_handoffs_honored += 1;
            } else if *self.waiting.get(owed) > 0 {
                self.statistics.owed_handoffs_skipped += 1;
                if policy == FairnessPolicy::Strict {
                    return Err(SimulationError::invariant_violation(format!(
                        "category {} opened a session while owed category {} was waiting",
                        category, owed
                    )));
                }
            }
        }

        if self.owed == Some(category) {
            self.owed = None;
        }
        self.current = Some(category);
        self.statistics.record_session(category);
        Ok(())
    }

    /// Check the safety invariants
    pub(crate) fn check_invariants(&self) -> SimulationResult<()> {
        let PerCategory { a, b } = self.occupants;

        if a > 0 && b > 0 {
            return Err(SimulationError::invariant_violation(format!(
                "both categories inside: A={} B={}",
                a, b
            )));
        }

        match self.current {
            None if a + b > 0 => Err(SimulationError::invariant_violation(format!(
                "resource marked empty with A={} B={} inside",
                a, b
            ))),
            Some(holder) if *self.occupants.get(holder) == 0 => {
                Err(SimulationError::invariant_violation(format!(
                    "category {} holds the resource with no occupant",
                    holder
                )))
            }
            _ => Ok(()),
        }
    }

    /// Consistent copy of the externally visible state
    pub(crate) fn snapshot(&self) -> OccupancySnapshot {
        OccupancySnapshot {
            occupants: self.occupants,
            current: self.current,
            waiting: self.waiting,
            owed: self.owed,
            shutdown: self.shutdown,
        }
    }
}

/// Point-in-time view of the turnstile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    /// Actors inside, per category
    pub occupants: PerCategory<usize>,
    /// Category currently holding the resource
    pub current: Option<Category>,
    /// Arrivals blocked in `enter`, per category
    pub waiting: PerCategory<usize>,
    /// Category entitled to the next session
    pub owed: Option<Category>,
    /// Whether shutdown was signalled
    pub shutdown: bool,
}

impl OccupancySnapshot {
    /// Nobody inside
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
