//! Occupancy event records
//!
//! Events are produced inside the turnstile's critical section, so their sequence
//! numbers reflect the order in which the turnstile serialized the transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ActorId, Category};

/// Kind of occupancy transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OccupancyEventKind {
    /// An actor was admitted
    Entered,
    /// An actor released its session
    Left,
}

impl fmt::Display for OccupancyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyEventKind::Entered => write!(f, "entered"),
            OccupancyEventKind::Left => write!(f, "left"),
        }
    }
}

/// One enter or leave transition as observed by the turnstile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    /// Position in the turnstile's serialization order, starting at 1
    pub sequence: u64,
    /// Wall-clock time of the transition
    pub timestamp: DateTime<Utc>,
    /// Enter or leave
    pub kind: OccupancyEventKind,
    /// Category of the actor
    pub category: Category,
    /// Actor that caused the transition
    pub actor: ActorId,
    /// Occupants of `category` after the transition
    pub occupants: usize,
    /// Category holding the resource after the transition
    pub current: Option<Category>,
    /// Category A arrivals still waiting after the transition
    pub waiting_a: usize,
    /// Category B arrivals still waiting after the transition
    pub waiting_b: usize,
    /// Whether this transition opened a new occupancy session
    pub opened_session: bool,
    /// Whether this transition closed the current occupancy session
    pub closed_session: bool,
}

impl OccupancyEvent {
    /// Waiting arrivals of `category` after the transition
    pub fn waiting(&self, category: Category) -> usize {
        match category {
            Category::A => self.waiting_a,
            Category::B => self.waiting_b,
        }
    }

    /// Human-readable line for console output
    pub fn to_text_line(&self) -> String {
        format!(
            "{} - {} {}, number of {} occupants is {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.actor,
            self.kind,
            self.category,
            self.occupants
        )
    }
}

impl fmt::Display for OccupancyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.sequence, self.to_text_line())
    }
}
