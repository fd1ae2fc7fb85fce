//! Enumeration types for the turnstile simulator
//!
//! This module contains all enumeration types used throughout the simulation system,
//! including arrival categories, fairness policies, actor lifecycle states and output formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arrival category of an actor
///
/// Any number of actors of the same category may share the resource, but the two
/// categories never occupy it at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// First arrival category
    A,
    /// Second arrival category
    B,
}

impl Category {
    /// Both categories, in index order
    pub const ALL: [Category; 2] = [Category::A, Category::B];

    /// The opposite category
    pub fn other(self) -> Self {
        match self {
            Category::A => Category::B,
            Category::B => Category::A,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::A => write!(f, "A"),
            Category::B => write!(f, "B"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" => Ok(Category::A),
            "b" => Ok(Category::B),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// How the turnstile arbitrates between the two categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FairnessPolicy {
    /// The owed category always opens the next session
    ///
    /// A category blocked by the other's occupancy becomes owed. While it has
    /// waiters, fresh arrivals of the occupying category are held back so the
    /// session drains, and the owed category goes next.
    #[default]
    Strict,
    /// Broadcast-and-recheck only
    ///
    /// Reproduces the short-lived queue lock of the classic semaphore solution.
    /// A category with very short occupy and rest times can re-claim the gate
    /// before a waiting arrival of the other category is served.
    BestEffort,
}

impl fmt::Display for FairnessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FairnessPolicy::Strict => write!(f, "strict"),
            FairnessPolicy::BestEffort => write!(f, "best-effort"),
        }
    }
}

impl FromStr for FairnessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(FairnessPolicy::Strict),
            "best-effort" | "besteffort" | "best_effort" | "weak" => Ok(FairnessPolicy::BestEffort),
            _ => Err(format!("Unknown fairness policy: {}", s)),
        }
    }
}

/// Lifecycle state of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorState {
    /// Between cycles, not synchronized with anybody
    Resting,
    /// Blocked in (or about to call) `enter`
    Requesting,
    /// Holding an occupancy session
    Occupying,
    /// Calling `leave`
    Releasing,
    /// No further arrivals will be generated
    Terminated,
}

impl ActorState {
    /// Whether an actor in this state may move to `next`
    pub fn can_transition_to(self, next: ActorState) -> bool {
        use ActorState::*;
        matches!(
            (self, next),
            (Resting, Requesting)
                | (Requesting, Occupying)
                | (Occupying, Releasing)
                | (Releasing, Resting)
                | (_, Terminated)
        ) && self != Terminated
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorState::Resting => write!(f, "Resting"),
            ActorState::Requesting => write!(f, "Requesting"),
            ActorState::Occupying => write!(f, "Occupying"),
            ActorState::Releasing => write!(f, "Releasing"),
            ActorState::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Output formats for occupancy event lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text lines
    Text,
    /// One JSON object per line
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_other() {
        assert_eq!(Category::A.other(), Category::B);
        assert_eq!(Category::B.other(), Category::A);
        assert_eq!(Category::ALL, [Category::A, Category::B]);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("a".parse::<Category>().unwrap(), Category::A);
        assert_eq!(" B ".parse::<Category>().unwrap(), Category::B);
        assert!("c".parse::<Category>().is_err());
    }

    #[test]
    fn test_fairness_policy_parsing() {
        assert_eq!("strict".parse::<FairnessPolicy>().unwrap(), FairnessPolicy::Strict);
        assert_eq!("best-effort".parse::<FairnessPolicy>().unwrap(), FairnessPolicy::BestEffort);
        assert_eq!("Best_Effort".parse::<FairnessPolicy>().unwrap(), FairnessPolicy::BestEffort);
        assert!("lottery".parse::<FairnessPolicy>().is_err());
        assert_eq!(FairnessPolicy::default(), FairnessPolicy::Strict);
    }

    #[test]
    fn test_fairness_policy_serde_uses_kebab_case() {
        let json = serde_json::to_string(&FairnessPolicy::BestEffort).unwrap();
        assert_eq!(json, "\"best-effort\"");
        let parsed: FairnessPolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(parsed, FairnessPolicy::Strict);
    }

    #[test]
    fn test_actor_state_transitions() {
        use ActorState::*;
        let cycle = [Resting, Requesting, Occupying, Releasing, Resting];
        for pair in cycle.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(Requesting.can_transition_to(Terminated));
        assert!(!Releasing.can_transition_to(Requesting));

        assert!(!Resting.can_transition_to(Occupying));
        assert!(!Requesting.can_transition_to(Releasing));
        assert!(!Terminated.can_transition_to(Resting));
        assert!(!Terminated.can_transition_to(Terminated));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_display_is_not_empty() {
        let states = [
            ActorState::Resting,
            ActorState::Requesting,
            ActorState::Occupying,
            ActorState::Releasing,
            ActorState::Terminated,
        ];
        for state in &states {
            assert!(!state.to_string().is_empty());
        }
    }
}
