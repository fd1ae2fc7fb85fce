//! Running a simulation
//!
//! This module contains the driver that spawns and joins the actors, the
//! statistics the turnstile collects, the error type shared by the crate and
//! the logging setup.
//!
//! # Usage Example
//!
//! ```no_run
//! use group_turnstile::simulation::SimulationDriver;
//! use group_turnstile::types::SimulationConfig;
//!
//! let config = SimulationConfig {
//!     category_a_actors: 3,
//!     category_b_actors: 2,
//!     max_cycles: Some(2),
//!     ..Default::default()
//! };
//!
//! let report = SimulationDriver::new(config).unwrap().run().unwrap();
//! println!("{}", report.statistics);
//! ```

pub mod driver;
pub mod error;
pub mod logging;
pub mod statistics;

pub use driver::{ShutdownHandle, SimulationDriver, SimulationReport};
pub use error::*;
pub use logging::LoggingConfig;
pub use statistics::{OccupancyStatistics, PerCategory};
