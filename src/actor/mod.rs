//! Actors and their timing
//!
//! This module contains the simulated participants that repeatedly request,
//! occupy, release and rest, together with the delay ranges they draw from.

pub mod actor;
pub mod timing;

pub use actor::{Actor, ActorReport};
pub use timing::{ActorTiming, DelayRange};
