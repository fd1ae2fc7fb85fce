//! Simulated participant
//!
//! An actor loops Resting -> Requesting -> Occupying -> Releasing until it has
//! completed its cycles or the turnstile reports shutdown. Shutdown is only
//! observed between cycles or while blocked in `enter`, never mid-occupancy.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, field, instrument, trace};

use super::ActorTiming;
use crate::controller::AccessController;
use crate::sim_event;
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{ActorId, ActorState, Category};

/// Summary of a finished actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorReport {
    /// Identity of the actor
    pub id: ActorId,
    /// Category the actor belonged to
    pub category: Category,
    /// Enter/leave cycles completed
    pub cycles_completed: usize,
    /// Time spent blocked in `enter`
    pub total_wait: Duration,
    /// State the actor ended in
    pub final_state: ActorState,
    /// Whether the actor stopped because of shutdown rather than its cycle limit
    pub cancelled: bool,
}

/// A participant contending for the shared resource
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    state: ActorState,
    timing: ActorTiming,
    max_cycles: Option<usize>,
    cycles_completed: usize,
    total_wait: Duration,
    rng: StdRng,
}

impl Actor {
    /// Create an actor; `seed` makes its delays reproducible
    pub fn new(id: ActorId, timing: ActorTiming, max_cycles: Option<usize>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            id,
            state: ActorState::Resting,
            timing,
            max_cycles,
            cycles_completed: 0,
            total_wait: Duration::ZERO,
            rng,
        }
    }

    /// Identity of the actor
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Category of the actor
    pub fn category(&self) -> Category {
        self.id.category()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ActorState {
        self.state
    }

    /// Cycles completed so far
    pub fn cycles_completed(&self) -> usize {
        self.cycles_completed
    }

    /// Move to `next`, refusing jumps the lifecycle does not allow
    fn transition(&mut self, next: ActorState) -> SimulationResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(SimulationError::invariant_violation(format!(
                "{} cannot go from {} to {}",
                self.id, self.state, next
            )));
        }
        trace!("{}: {} -> {}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    fn reached_cycle_limit(&self) -> bool {
        self.max_cycles.map_or(false, |max| self.cycles_completed >= max)
    }

    /// Run the actor to termination
    #[instrument(skip_all, fields(actor = %self.id))]
    pub fn run(mut self, controller: &AccessController) -> SimulationResult<ActorReport> {
        let mut cancelled = false;

        loop {
            if self.reached_cycle_limit() {
                break;
            }
            if controller.is_shutdown() {
                cancelled = true;
                break;
            }

            match self.run_cycle(controller) {
                Ok(true) => {}
                Ok(false) => {
                    cancelled = true;
                    break;
                }
                Err(e) => {
                    self.transition(ActorState::Terminated)?;
                    return Err(e);
                }
            }
        }

        self.transition(ActorState::Terminated)?;
        sim_event!(
            debug,
            "actor terminated",
            actor = field::display(self.id),
            cycles = self.cycles_completed,
            cancelled = cancelled,
        );

        Ok(ActorReport {
            id: self.id,
            category: self.category(),
            cycles_completed: self.cycles_completed,
            total_wait: self.total_wait,
            final_state: self.state,
            cancelled,
        })
    }

    /// One enter/occupy/leave/rest cycle; `Ok(false)` when cancelled in `enter`
    fn run_cycle(&mut self, controller: &AccessController) -> SimulationResult<bool> {
        self.transition(ActorState::Requesting)?;
        let requested_at = Instant::now();
        let session = match controller.enter(self.category(), self.id) {
            Ok(session) => session,
            Err(SimulationError::ShutdownRequested) => return Ok(false),
            Err(e) => return Err(e),
        };
        self.total_wait += requested_at.elapsed();

        self.transition(ActorState::Occupying)?;
        thread::sleep(self.timing.occupy.sample(&mut self.rng));

        self.transition(ActorState::Releasing)?;
        controller.leave(session)?;
        self.cycles_completed += 1;

        // No think time after the last bounded cycle
        if !self.reached_cycle_limit() {
            self.transition(ActorState::Resting)?;
            let rest = self.timing.rest.sample(&mut self.rng);
            debug!("{} rests for {:?}", self.id, rest);
            thread::sleep(rest);
        }

        Ok(true)
    }
}
