//! Occupancy and rest durations

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::SimulationConfig;

/// Inclusive millisecond range a delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound in milliseconds
    pub min_ms: u64,
    /// Upper bound in milliseconds
    pub max_ms: u64,
}

impl DelayRange {
    /// Create a range; bounds given in the wrong order are swapped
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms: min_ms.min(max_ms), max_ms: min_ms.max(max_ms) }
    }

    /// A range that always yields `ms`
    pub fn fixed(ms: u64) -> Self {
        Self { min_ms: ms, max_ms: ms }
    }

    /// Whether every sample is the same
    pub fn is_fixed(&self) -> bool {
        self.min_ms >= self.max_ms
    }

    /// Draw a delay
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = if self.is_fixed() { self.min_ms } else { rng.gen_range(self.min_ms..=self.max_ms) };
        Duration::from_millis(ms)
    }
}

/// Delays of one actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorTiming {
    /// How long a session is held
    pub occupy: DelayRange,
    /// Think time between cycles
    pub rest: DelayRange,
}

impl ActorTiming {
    /// Timing from explicit ranges
    pub fn new(occupy: DelayRange, rest: DelayRange) -> Self {
        Self { occupy, rest }
    }

    /// Deterministic timing
    pub fn fixed(occupy_ms: u64, rest_ms: u64) -> Self {
        Self::new(DelayRange::fixed(occupy_ms), DelayRange::fixed(rest_ms))
    }

    /// Timing configured for every actor of a run
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            DelayRange::new(config.occupy_min_ms, config.occupy_max_ms),
            DelayRange::new(config.rest_min_ms, config.rest_max_ms),
        )
    }
}
