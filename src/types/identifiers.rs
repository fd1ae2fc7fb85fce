//! Identifier types for the turnstile simulator
//!
//! This module contains the opaque actor identity used in occupancy logs and
//! the UUID-based identifier of a simulation run.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use super::Category;

/// Opaque identity of an actor
///
/// Only used for logging; the turnstile never makes decisions based on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId {
    category: Category,
    ordinal: u32,
}

impl ActorId {
    /// Create the identity of the `ordinal`-th actor of `category`
    pub fn new(category: Category, ordinal: u32) -> Self {
        Self { category, ordinal }
    }

    /// Category the actor was created with
    pub fn category(&self) -> Category {
        self.category
    }

    /// Position of the actor within its category
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.category, self.ordinal)
    }
}

impl Serialize for ActorId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let (category, ordinal) = s
            .split_once('-')
            .ok_or_else(|| serde::de::Error::custom(format!("Malformed actor id: {}", s)))?;
        let category = category.parse::<Category>().map_err(serde::de::Error::custom)?;
        let ordinal = ordinal.parse::<u32>().map_err(serde::de::Error::custom)?;
        Ok(ActorId::new(category, ordinal))
    }
}

/// Unique identifier for a simulation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new random run ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RUN_{}", self.0.simple())
    }
}

impl Serialize for RunId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("RUN_{}", self.0.simple()))
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Some(uuid_str) = s.strip_prefix("RUN_") {
            let uuid = Uuid::parse_str(uuid_str).map_err(serde::de::Error::custom)?;
            Ok(RunId(uuid))
        } else {
            // Fallback: accept a bare UUID
            let uuid = Uuid::parse_str(&s).map_err(serde::de::Error::custom)?;
            Ok(RunId(uuid))
        }
    }
}
