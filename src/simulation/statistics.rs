//! Statistics collection and reporting
//!
//! The turnstile updates these counters inside its critical section, so a copy
//! taken through the controller is always internally consistent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::Category;

/// A value kept separately for each category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCategory<T> {
    /// Value for category A
    pub a: T,
    /// Value for category B
    pub b: T,
}

impl<T> PerCategory<T> {
    /// Build from explicit values
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Value for `category`
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::A => &self.a,
            Category::B => &self.b,
        }
    }

    /// Mutable value for `category`
    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::A => &mut self.a,
            Category::B => &mut self.b,
        }
    }
}

impl PerCategory<usize> {
    /// Sum over both categories
    pub fn total(&self) -> usize {
        self.a + self.b
    }
}

/// Running occupancy statistics of one turnstile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccupancyStatistics {
    /// Admitted arrivals
    pub entries: PerCategory<usize>,
    /// Released sessions
    pub exits: PerCategory<usize>,
    /// Occupancy sessions opened (count rising from 0)
    pub sessions: PerCategory<usize>,
    /// Highest simultaneous occupancy observed
    pub peak_occupancy: PerCategory<usize>,
    /// Longest time an arrival spent inside `enter`
    pub longest_wait: PerCategory<Duration>,
    /// Total time arrivals spent inside `enter`
    pub total_wait: PerCategory<Duration>,
    /// Arrivals that gave up because of shutdown
    pub cancelled_arrivals: PerCategory<usize>,
    /// Hand-offs where the owed category opened the next session
    pub owed_handoffs_honored: usize,
    /// Hand-offs where the other category opened a session although the owed one still waited
    pub owed_handoffs_skipped: usize,
    /// Wall-clock duration of the run (set by the driver)
    pub simulation_duration: Duration,
}

impl OccupancyStatistics {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an admitted arrival
    pub fn record_entry(&mut self, category: Category, occupants: usize, waited: Duration) {
        *self.entries.get_mut(category) += 1;

        let peak = self.peak_occupancy.get_mut(category);
        if occupants > *peak {
            *peak = occupants;
        }

        let longest = self.longest_wait.get_mut(category);
        if waited > *longest {
            *longest = waited;
        }
        *self.total_wait.get_mut(category) += waited;
    }

    /// Record a released session
    pub fn record_exit(&mut self, category: Category) {
        *self.exits.get_mut(category) += 1;
    }

    /// Record a newly opened occupancy session
    pub fn record_session(&mut self, category: Category) {
        *self.sessions.get_mut(category) += 1;
    }

    /// Record an arrival withdrawn by shutdown
    pub fn record_cancelled(&mut self, category: Category) {
        *self.cancelled_arrivals.get_mut(category) += 1;
    }

    /// Set the simulation duration
    pub fn set_simulation_duration(&mut self, duration: Duration) {
        self.simulation_duration = duration;
    }

    /// Every admitted arrival of every category has left again
    pub fn is_conserved(&self) -> bool {
        self.entries == self.exits
    }

    /// Admitted arrivals over both categories
    pub fn total_entries(&self) -> usize {
        self.entries.total()
    }

    /// Mean time spent in `enter` by admitted arrivals of `category`
    pub fn average_wait(&self, category: Category) -> Duration {
        let entries = *self.entries.get(category);
        if entries == 0 {
            return Duration::ZERO;
        }
        let total = self.total_wait.get(category).as_secs_f64();
        Duration::from_secs_f64(total / entries as f64)
    }

    /// Generate the run summary printed at the end of a simulation
    pub fn generate_summary_output(&self) -> String {
        let mut output = String::new();

        output.push_str("Simulation Statistics:\n");
        output.push_str("======================\n");
        output.push_str(&format!(
            "Duration: {:.2} seconds\n",
            self.simulation_duration.as_secs_f64()
        ));
        for category in Category::ALL {
            output.push_str(&format!(
                "Category {}: {} entries, {} exits, {} sessions, peak {} inside, longest wait {} ms, average wait {} ms\n",
                category,
                self.entries.get(category),
                self.exits.get(category),
                self.sessions.get(category),
                self.peak_occupancy.get(category),
                self.longest_wait.get(category).as_millis(),
                self.average_wait(category).as_millis(),
            ));
        }
        output.push_str(&format!(
            "Owed hand-offs: {} honored, {} skipped\n",
            self.owed_handoffs_honored, self.owed_handoffs_skipped
        ));
        let cancelled = self.cancelled_arrivals.total();
        if cancelled > 0 {
            output.push_str(&format!("Arrivals cancelled by shutdown: {}\n", cancelled));
        }
        output.push_str(&format!(
            "Count conservation: {}",
            if self.is_conserved() { "ok" } else { "VIOLATED" }
        ));

        output
    }
}

impl fmt::Display for OccupancyStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries A={} B={}, sessions A={} B={}, skipped hand-offs {}",
            self.entries.a,
            self.entries.b,
            self.sessions.a,
            self.sessions.b,
            self.owed_handoffs_skipped
        )
    }
}
