//! Group Turnstile
//!
//! A simulation of group mutual exclusion: actors of two categories share a
//! resource that any number of actors of one category may occupy at once, but
//! never members of both categories together.
//!
//! # Overview
//!
//! Each actor repeatedly rests, requests the resource, occupies it for a while
//! and releases it. Entry is arbitrated by a single turnstile that keeps the
//! categories apart, and under the default strict fairness policy guarantees
//! that a waiting category is passed over by at most one session of the other.
//!
//! ## Key Features
//!
//! - **Safety**: the two categories are never inside together
//! - **Fairness**: owed hand-offs prevent starvation under continuous load
//! - **Event Log**: every entry and exit is serialized in one total order
//! - **Cooperative Shutdown**: blocked arrivals are released without entering
//! - **Reproducible Runs**: seeded delays and fixed-delay configurations
//!
//! ## Quick Start
//!
//! ```rust
//! use group_turnstile::*;
//!
//! let config = SimulationConfig {
//!     category_a_actors: 2,
//!     category_b_actors: 2,
//!     max_cycles: Some(1),
//!     occupy_min_ms: 1,
//!     occupy_max_ms: 1,
//!     rest_min_ms: 1,
//!     rest_max_ms: 1,
//!     quiet: true,
//!     ..Default::default()
//! };
//!
//! let report = SimulationDriver::new(config)?.run()?;
//! assert_eq!(report.statistics.total_entries(), 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Categories, identifiers and configuration
//! - [`controller`]: The turnstile arbitrating entry
//! - [`actor`]: Simulated participants and their timing
//! - [`events`]: Occupancy events, sinks and the log audit
//! - [`simulation`]: Driver, statistics, errors and logging
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Simulation  │    │   Actor     │    │ Controller  │
//! │             │    │             │    │             │
//! │ Driver      ├───►│ Rest        ├───►│ enter       │
//! │ Statistics  │    │ Occupy      │    │ leave       │
//! │ Logging     │    │ Timing      │    │ shutdown    │
//! └─────────────┘    └─────────────┘    └──────┬──────┘
//!                                              │
//!                                       ┌──────▼──────┐
//!                                       │   Events    │
//!                                       │             │
//!                                       │ Sinks       │
//!                                       │ Audit       │
//!                                       └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod actor;
pub mod controller;
pub mod events;
pub mod simulation;
pub mod types;

// Core types and identifiers
pub use types::{
    ActorId, ActorState, Category, ConfigValidationError, FairnessPolicy, OutputFormat, RunId,
    SimulationConfig,
};

pub use actor::{Actor, ActorReport, ActorTiming, DelayRange};
pub use controller::{AccessController, OccupancySession, OccupancySnapshot};
pub use events::{
    ConsoleSink, EventAudit, EventSink, JsonLinesSink, MemorySink, OccupancyEvent,
    OccupancyEventKind,
};
pub use simulation::{
    OccupancyStatistics, PerCategory, ShutdownHandle, SimulationDriver, SimulationError,
    SimulationReport, SimulationResult,
};
