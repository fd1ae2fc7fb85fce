//! Occupancy events and their sinks
//!
//! This module contains the event records produced by the turnstile, the sinks
//! that print, store or persist them, and a replay audit over a recorded log.
//!
//! # Overview
//!
//! - **OccupancyEvent**: one enter or leave transition with the resulting counts
//! - **EventSink**: receiver invoked inside the turnstile's critical section
//! - **EventAudit**: independent re-check of safety and fairness from a log

pub mod audit;
pub mod occupancy_event;
pub mod sink;

pub use audit::EventAudit;
pub use occupancy_event::{OccupancyEvent, OccupancyEventKind};
pub use sink::{ConsoleSink, EventSink, JsonLinesSink, MemorySink};
