//! Group mutual exclusion for two categories
//!
//! This module contains the turnstile that decides who may occupy the shared
//! resource, the session handle proving admission, and the state snapshot.
//!
//! # Usage Example
//!
//! ```rust
//! use group_turnstile::controller::AccessController;
//! use group_turnstile::types::{ActorId, Category, FairnessPolicy};
//!
//! let controller = AccessController::new(FairnessPolicy::Strict);
//! let session = controller.enter(Category::A, ActorId::new(Category::A, 0))?;
//! assert_eq!(controller.snapshot()?.current, Some(Category::A));
//! controller.leave(session)?;
//! assert!(controller.snapshot()?.is_empty());
//! # Ok::<(), group_turnstile::simulation::SimulationError>(())
//! ```

pub mod access_controller;
pub mod session;
pub mod state;

pub use access_controller::AccessController;
pub use session::OccupancySession;
pub use state::OccupancySnapshot;
