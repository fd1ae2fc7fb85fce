//! The turnstile
//!
//! Every arrival passes through one mutex and, while excluded, sleeps on the
//! condition variable attached to it. The mutex is never held across an
//! occupancy or a rest, only across the eligibility decision and the count
//! update.
//!
//! # Fairness
//!
//! With [`FairnessPolicy::Strict`], an arrival kept out by the other category's
//! occupancy makes its own category owed, and so does each departure that
//! happens while the other category has waiters. Fresh arrivals of
//! the occupying category are then held back, the session drains, and the owed
//! category opens the next session. A waiting category is therefore passed
//! over by at most one session of the other category.
//!
//! With [`FairnessPolicy::BestEffort`] the last departure only wakes every
//! waiter and lets them race for the gate.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, instrument, trace};

use super::state::{OccupancySnapshot, TurnstileState};
use super::OccupancySession;
use crate::events::{EventSink, OccupancyEvent, OccupancyEventKind};
use crate::simulation::{OccupancyStatistics, SimulationError, SimulationResult};
use crate::types::{ActorId, Category, FairnessPolicy};

/// Arbitrates entry so that the two categories never share the resource
#[derive(Debug)]
pub struct AccessController {
    policy: FairnessPolicy,
    state: Mutex<TurnstileState>,
    turnstile: Condvar,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Default for AccessController {
    fn default() -> Self {
        Self::new(FairnessPolicy::default())
    }
}

impl AccessController {
    /// Create an empty turnstile
    pub fn new(policy: FairnessPolicy) -> Self {
        debug!("Creating access controller with {} fairness", policy);
        Self {
            policy,
            state: Mutex::new(TurnstileState::default()),
            turnstile: Condvar::new(),
            sinks: Vec::new(),
        }
    }

    /// Deliver every occupancy event to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Fairness policy in force
    pub fn policy(&self) -> FairnessPolicy {
        self.policy
    }

    fn lock_state(&self) -> SimulationResult<MutexGuard<'_, TurnstileState>> {
        self.state.lock().map_err(|_| {
            error!("Turnstile mutex poisoned");
            SimulationError::lock_poisoned("turnstile mutex")
        })
    }

    /// Block until `actor` may occupy the resource as a member of `category`
    ///
    /// Returns [`SimulationError::ShutdownRequested`] without admitting the
    /// caller if shutdown is signalled before or while it waits.
    #[instrument(level = "trace", skip_all, fields(category = %category, actor = %actor))]
    pub fn enter(&self, category: Category, actor: ActorId) -> SimulationResult<OccupancySession> {
        let arrived_at = Instant::now();
        let mut state = self.lock_state()?;

        if state.shutdown {
            return Err(SimulationError::ShutdownRequested);
        }

        *state.waiting.get_mut(category) += 1;
        loop {
            if state.shutdown {
                *state.waiting.get_mut(category) -= 1;
                state.statistics.record_cancelled(category);
                // Others may have been held back by our place in the queue
                self.turnstile.notify_all();
                debug!("{} gave up waiting: shutdown", actor);
                return Err(SimulationError::ShutdownRequested);
            }

            if state.is_eligible(category, self.policy) {
                break;
            }
            state.note_blocked(category, self.policy);

            trace!(
                "{} waits: holder {:?}, owed {:?}",
                actor,
                state.current,
                state.owed
            );
            state = self.turnstile.wait(state).map_err(|_| {
                error!("Turnstile mutex poisoned while {} was waiting", actor);
                SimulationError::lock_poisoned("turnstile wait")
            })?;
        }
        *state.waiting.get_mut(category) -= 1;

        let opened = state.current.is_none();
        if opened {
            state.claim(category, self.policy)?;
        }

        *state.occupants.get_mut(category) += 1;
        let occupants = *state.occupants.get(category);
        state.statistics.record_entry(category, occupants, arrived_at.elapsed());
        state.check_invariants()?;

        self.emit(&mut state, OccupancyEventKind::Entered, category, actor, opened, false);
        Ok(OccupancySession::new(category, actor))
    }

    /// Release `session`
    ///
    /// Never waits beyond the short critical section. When the last occupant of
    /// a category leaves, every waiter is woken to re-check its eligibility.
    #[instrument(level = "trace", skip_all, fields(actor = %session.actor()))]
    pub fn leave(&self, session: OccupancySession) -> SimulationResult<()> {
        let category = session.category();
        let actor = session.actor();
        let mut state = self.lock_state()?;

        let count = state.occupants.get_mut(category);
        if *count == 0 {
            return Err(SimulationError::invariant_violation(format!(
                "{} left while no {} occupant was counted",
                actor, category
            )));
        }
        *count -= 1;
        let remaining = *count;
        state.statistics.record_exit(category);

        let other = category.other();
        let other_waiting = *state.waiting.get(other) > 0;
        if other_waiting && self.policy == FairnessPolicy::Strict {
            state.owed = Some(other);
        }

        let closed = remaining == 0;
        if closed {
            state.current = None;
            state.pending_handoff = if other_waiting { Some(other) } else { None };
        }
        state.check_invariants()?;

        trace!("{} held the resource for {:?}", actor, session.held_for());
        self.emit(&mut state, OccupancyEventKind::Left, category, actor, false, closed);

        if closed {
            self.turnstile.notify_all();
        }
        Ok(())
    }

    /// Ask every actor to stop and wake everybody blocked in `enter`
    ///
    /// Safe to call more than once, and still effective after a poisoned lock.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.shutdown {
            debug!("Turnstile shutdown requested");
            state.shutdown = true;
        }
        self.turnstile.notify_all();
    }

    /// Whether shutdown was signalled
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).shutdown
    }

    /// Block for at most `timeout` or until shutdown is signalled
    ///
    /// Returns whether shutdown was signalled.
    pub fn wait_for_shutdown(&self, timeout: Duration) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (state, _) = self
            .turnstile
            .wait_timeout_while(state, timeout, |state| !state.shutdown)
            .unwrap_or_else(PoisonError::into_inner);
        state.shutdown
    }

    /// Consistent view of counts, holder, waiters and owed category
    pub fn snapshot(&self) -> SimulationResult<OccupancySnapshot> {
        Ok(self.lock_state()?.snapshot())
    }

    /// Copy of the running statistics
    pub fn statistics(&self) -> SimulationResult<OccupancyStatistics> {
        Ok(self.lock_state()?.statistics.clone())
    }

    /// Flush every sink
    pub fn flush_sinks(&self) -> SimulationResult<()> {
        for sink in &self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn emit(
        &self,
        state: &mut TurnstileState,
        kind: OccupancyEventKind,
        category: Category,
        actor: ActorId,
        opened_session: bool,
        closed_session: bool,
    ) {
        state.last_sequence += 1;
        if self.sinks.is_empty() {
            return;
        }

        let event = OccupancyEvent {
            sequence: state.last_sequence,
            timestamp: Utc::now(),
            kind,
            category,
            actor,
            occupants: *state.occupants.get(category),
            current: state.current,
            waiting_a: state.waiting.a,
            waiting_b: state.waiting.b,
            opened_session,
            closed_session,
        };
        for sink in &self.sinks {
            sink.record(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemorySink;
    use std::thread;

    fn actor(category: Category, ordinal: u32) -> ActorId {
        ActorId::new(category, ordinal)
    }

    #[test]
    fn test_same_category_shares_the_resource() {
        let controller = AccessController::new(FairnessPolicy::Strict);
        let first = controller.enter(Category::A, actor(Category::A, 0)).unwrap();
        let second = controller.enter(Category::A, actor(Category::A, 1)).unwrap();

        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.occupants.a, 2);
        assert_eq!(snapshot.current, Some(Category::A));

        controller.leave(first).unwrap();
        assert_eq!(controller.snapshot().unwrap().current, Some(Category::A));
        controller.leave(second).unwrap();

        let snapshot = controller.snapshot().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.occupants.total(), 0);

        let stats = controller.statistics().unwrap();
        assert_eq!(stats.entries.a, 2);
        assert_eq!(stats.sessions.a, 1);
        assert!(stats.is_conserved());
    }

    #[test]
    fn test_other_category_waits_until_drained() {
        let controller = Arc::new(AccessController::new(FairnessPolicy::Strict));
        let session = controller.enter(Category::A, actor(Category::A, 0)).unwrap();

        let waiter = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let session = controller.enter(Category::B, actor(Category::B, 0)).unwrap();
                let snapshot = controller.snapshot().unwrap();
                controller.leave(session).unwrap();
                snapshot
            })
        };

        // Wait until the B arrival is registered
        while controller.snapshot().unwrap().waiting.b == 0 {
            thread::yield_now();
        }
        assert_eq!(controller.snapshot().unwrap().occupants.b, 0);

        controller.leave(session).unwrap();
        let seen_by_b = waiter.join().unwrap();
        assert_eq!(seen_by_b.current, Some(Category::B));
        assert_eq!(seen_by_b.occupants.a, 0);

        let stats = controller.statistics().unwrap();
        assert_eq!(stats.owed_handoffs_honored, 1);
        assert_eq!(stats.owed_handoffs_skipped, 0);
    }

    #[test]
    fn test_strict_holds_back_fresh_arrivals_of_occupying_category() {
        let controller = Arc::new(AccessController::new(FairnessPolicy::Strict));
        let first = controller.enter(Category::A, actor(Category::A, 0)).unwrap();
        let second = controller.enter(Category::A, actor(Category::A, 1)).unwrap();

        let b_waiter = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let session = controller.enter(Category::B, actor(Category::B, 0)).unwrap();
                controller.leave(session).unwrap();
            })
        };
        while controller.snapshot().unwrap().waiting.b == 0 {
            thread::yield_now();
        }

        // A departure while B waits hands the next turn to B
        controller.leave(first).unwrap();
        assert_eq!(controller.snapshot().unwrap().owed, Some(Category::B));

        let late_a = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let session = controller.enter(Category::A, actor(Category::A, 2)).unwrap();
                controller.leave(session).unwrap();
            })
        };
        while controller.snapshot().unwrap().waiting.a == 0 {
            thread::yield_now();
        }
        // The late A arrival may not join the draining session
        assert_eq!(controller.snapshot().unwrap().occupants.a, 1);

        controller.leave(second).unwrap();
        b_waiter.join().unwrap();
        late_a.join().unwrap();

        let stats = controller.statistics().unwrap();
        assert_eq!(stats.sessions.a, 2);
        assert_eq!(stats.sessions.b, 1);
        assert_eq!(stats.owed_handoffs_skipped, 0);
        assert!(stats.is_conserved());
    }

    #[test]
    fn test_blocked_arrival_stops_the_occupying_category_joining() {
        let controller = Arc::new(AccessController::new(FairnessPolicy::Strict));
        let holder = controller.enter(Category::A, actor(Category::A, 0)).unwrap();

        let b_waiter = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let session = controller.enter(Category::B, actor(Category::B, 0)).unwrap();
                controller.leave(session).unwrap();
            })
        };
        while controller.snapshot().unwrap().waiting.b == 0 {
            thread::yield_now();
        }
        assert_eq!(controller.snapshot().unwrap().owed, Some(Category::B));

        // No A has left yet, but fresh A arrivals already queue behind B
        let late_a: Vec<_> = (1..=5)
            .map(|ordinal| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || {
                    let session = controller.enter(Category::A, actor(Category::A, ordinal)).unwrap();
                    controller.leave(session).unwrap();
                })
            })
            .collect();
        while controller.snapshot().unwrap().waiting.a < 5 {
            thread::yield_now();
        }
        assert_eq!(controller.snapshot().unwrap().occupants.a, 1);

        controller.leave(holder).unwrap();
        b_waiter.join().unwrap();
        for handle in late_a {
            handle.join().unwrap();
        }

        let stats = controller.statistics().unwrap();
        assert_eq!(stats.entries.a, 6);
        assert!(stats.sessions.a >= 2);
        assert_eq!(stats.sessions.b, 1);
        assert_eq!(stats.owed_handoffs_honored, 2);
        assert_eq!(stats.owed_handoffs_skipped, 0);
        assert!(stats.is_conserved());
    }

    #[test]
    fn test_best_effort_lets_occupying_category_keep_joining() {
        let controller = Arc::new(AccessController::new(FairnessPolicy::BestEffort));
        let first = controller.enter(Category::A, actor(Category::A, 0)).unwrap();

        let b_waiter = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let session = controller.enter(Category::B, actor(Category::B, 0)).unwrap();
                controller.leave(session).unwrap();
            })
        };
        while controller.snapshot().unwrap().waiting.b == 0 {
            thread::yield_now();
        }

        // Without the owed rule a fresh A arrival joins immediately
        let second = controller.enter(Category::A, actor(Category::A, 1)).unwrap();
        assert_eq!(controller.snapshot().unwrap().owed, None);

        controller.leave(first).unwrap();
        controller.leave(second).unwrap();
        b_waiter.join().unwrap();
        assert!(controller.statistics().unwrap().is_conserved());
    }

    #[test]
    fn test_shutdown_wakes_blocked_arrivals() {
        let controller = Arc::new(AccessController::new(FairnessPolicy::Strict));
        let session = controller.enter(Category::A, actor(Category::A, 0)).unwrap();

        let waiter = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || controller.enter(Category::B, actor(Category::B, 0)).map(|_| ()))
        };
        while controller.snapshot().unwrap().waiting.b == 0 {
            thread::yield_now();
        }

        controller.shutdown();
        let result = waiter.join().unwrap();
        assert!(matches!(result, Err(SimulationError::ShutdownRequested)));

        // The admitted occupant still leaves normally
        controller.leave(session).unwrap();
        let snapshot = controller.snapshot().unwrap();
        assert!(snapshot.shutdown);
        assert_eq!(snapshot.waiting.total(), 0);

        let stats = controller.statistics().unwrap();
        assert_eq!(stats.cancelled_arrivals.b, 1);
        assert!(stats.is_conserved());

        // Nobody is admitted after shutdown
        let late = controller.enter(Category::A, actor(Category::A, 1));
        assert!(matches!(late, Err(SimulationError::ShutdownRequested)));
    }

    #[test]
    fn test_wait_for_shutdown() {
        let controller = Arc::new(AccessController::default());
        assert!(!controller.wait_for_shutdown(Duration::from_millis(10)));

        let signaller = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                controller.shutdown();
            })
        };
        assert!(controller.wait_for_shutdown(Duration::from_secs(30)));
        signaller.join().unwrap();
        assert!(controller.is_shutdown());
    }

    #[test]
    fn test_events_reach_sinks_in_order() {
        let sink = Arc::new(MemorySink::new());
        let controller = AccessController::new(FairnessPolicy::Strict).with_sink(sink.clone());

        let a = controller.enter(Category::A, actor(Category::A, 0)).unwrap();
        controller.leave(a).unwrap();
        let b = controller.enter(Category::B, actor(Category::B, 0)).unwrap();
        controller.leave(b).unwrap();
        controller.flush_sinks().unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 4);
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);

        assert!(events[0].opened_session);
        assert_eq!(events[0].current, Some(Category::A));
        assert!(events[1].closed_session);
        assert_eq!(events[1].current, None);
        assert_eq!(events[2].category, Category::B);
        assert_eq!(events[3].occupants, 0);
    }
}
