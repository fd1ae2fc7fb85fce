//! Replay of an event log
//!
//! Rebuilds the occupancy counts from a recorded log and checks the safety and
//! fairness properties independently of the turnstile's own bookkeeping.

use serde::{Deserialize, Serialize};

use super::{OccupancyEvent, OccupancyEventKind};
use crate::simulation::PerCategory;
use crate::types::Category;

/// Outcome of replaying an event log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAudit {
    /// Events replayed
    pub events: usize,
    /// Entered events per category
    pub entries: PerCategory<usize>,
    /// Left events per category
    pub exits: PerCategory<usize>,
    /// Sessions opened per category
    pub sessions: PerCategory<usize>,
    /// Occupancy counts after the last event
    pub final_occupants: PerCategory<usize>,
    /// Events after which both categories were inside
    pub overlap_violations: usize,
    /// Events whose reported count disagrees with the replayed one
    pub count_mismatches: usize,
    /// Sequence numbers that were not strictly increasing
    pub ordering_violations: usize,
    /// Reported holder changed from one category to the other without passing through empty
    pub direct_switches: usize,
    /// Session order, one entry per opened session
    pub session_order: Vec<Category>,
    /// Most sessions of one category opened in a row while the other category had waiters
    pub max_consecutive_skips: usize,
}

impl EventAudit {
    /// Replay `events`, which must be in serialization order
    pub fn replay(events: &[OccupancyEvent]) -> Self {
        let mut audit = EventAudit { events: events.len(), ..Default::default() };
        let mut occupants = PerCategory::<usize>::default();
        let mut skips = PerCategory::<usize>::default();
        let mut last_sequence = 0u64;
        let mut last_holder: Option<Category> = None;

        for event in events {
            if event.sequence <= last_sequence {
                audit.ordering_violations += 1;
            }
            last_sequence = event.sequence;

            let category = event.category;
            match event.kind {
                OccupancyEventKind::Entered => {
                    *audit.entries.get_mut(category) += 1;
                    let count = occupants.get_mut(category);
                    *count += 1;
                    if *count == 1 {
                        *audit.sessions.get_mut(category) += 1;
                        audit.session_order.push(category);

                        // The other category is skipped once more if it is still waiting
                        let other = category.other();
                        if event.waiting(other) > 0 {
                            *skips.get_mut(other) += 1;
                            audit.max_consecutive_skips =
                                audit.max_consecutive_skips.max(*skips.get(other));
                        }
                        *skips.get_mut(category) = 0;
                    }
                }
                OccupancyEventKind::Left => {
                    *audit.exits.get_mut(category) += 1;
                    let count = occupants.get_mut(category);
                    match count.checked_sub(1) {
                        Some(next) => *count = next,
                        None => audit.count_mismatches += 1,
                    }
                }
            }

            if *occupants.get(category) != event.occupants {
                audit.count_mismatches += 1;
            }
            if occupants.a > 0 && occupants.b > 0 {
                audit.overlap_violations += 1;
            }
            if let (Some(previous), Some(holder)) = (last_holder, event.current) {
                if previous != holder {
                    audit.direct_switches += 1;
                }
            }
            last_holder = event.current;
        }

        audit.final_occupants = occupants;
        audit
    }

    /// Every entry was matched by an exit
    pub fn is_conserved(&self) -> bool {
        self.entries == self.exits && self.final_occupants.total() == 0
    }

    /// No safety or bookkeeping problem was found
    pub fn is_clean(&self) -> bool {
        self.overlap_violations == 0
            && self.count_mismatches == 0
            && self.ordering_violations == 0
            && self.direct_switches == 0
    }
}
