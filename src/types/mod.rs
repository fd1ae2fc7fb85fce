//! Core types and identifiers for the turnstile simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: opaque actor identities and UUID-based run identifiers
//! - **Enums**: categories, fairness policies, actor states and output formats
//! - **Configuration**: Simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use group_turnstile::types::*;
//!
//! let actor = ActorId::new(Category::A, 1);
//! assert_eq!(actor.to_string(), "A-01");
//! assert_eq!(Category::A.other(), Category::B);
//!
//! let config = SimulationConfig {
//!     category_a_actors: 2,
//!     category_b_actors: 3,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
