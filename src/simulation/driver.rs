//! Simulation driver
//!
//! Creates one turnstile per run, spawns a named thread per actor, optionally
//! arms a run timer, joins everybody and checks the final counts.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::actor::{Actor, ActorReport, ActorTiming};
use crate::controller::AccessController;
use crate::events::{ConsoleSink, EventAudit, EventSink, JsonLinesSink, MemorySink};
use crate::simulation::{OccupancyStatistics, SimulationError, SimulationResult};
use crate::types::{ActorId, Category, RunId, SimulationConfig};
use crate::{perf_span, sim_event};

type ActorHandle = (ActorId, JoinHandle<SimulationResult<ActorReport>>);

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Identifier of the run
    pub run_id: RunId,
    /// Counters collected by the turnstile
    pub statistics: OccupancyStatistics,
    /// One report per actor, A actors first
    pub actors: Vec<ActorReport>,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Replay of the captured event log, when capture was enabled
    pub audit: Option<EventAudit>,
}

impl SimulationReport {
    /// Cycles completed by every actor together
    pub fn total_cycles(&self) -> usize {
        self.actors.iter().map(|actor| actor.cycles_completed).sum()
    }

    /// Actors that stopped because of shutdown
    pub fn cancelled_actors(&self) -> usize {
        self.actors.iter().filter(|actor| actor.cancelled).count()
    }

    /// Reports of the actors of one category
    pub fn actors_of(&self, category: Category) -> impl Iterator<Item = &ActorReport> {
        self.actors.iter().filter(move |actor| actor.category == category)
    }
}

/// Cancels a run from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    controller: Arc<AccessController>,
}

impl ShutdownHandle {
    /// Ask every actor to stop
    pub fn shutdown(&self) {
        self.controller.shutdown();
    }

    /// Whether shutdown was signalled
    pub fn is_shutdown(&self) -> bool {
        self.controller.is_shutdown()
    }
}

/// Signals shutdown if an actor thread unwinds, so blocked peers are released
struct ShutdownOnPanic(Arc<AccessController>);

impl Drop for ShutdownOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.shutdown();
        }
    }
}

/// Runs one simulation
#[derive(Debug)]
pub struct SimulationDriver {
    config: SimulationConfig,
    run_id: RunId,
    sinks: Vec<Arc<dyn EventSink>>,
    capture: Option<Arc<MemorySink>>,
    controller: Arc<AccessController>,
}

impl SimulationDriver {
    /// Validate `config` and prepare the turnstile and its sinks
    #[instrument(skip(config), fields(a = config.category_a_actors, b = config.category_b_actors))]
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;

        let mut sinks: Vec<Arc<dyn EventSink>> = Vec::new();
        if !config.quiet {
            let format = config.get_output_format().map_err(SimulationError::configuration_error)?;
            sinks.push(Arc::new(ConsoleSink::new(format)));
        }
        if let Some(path) = &config.event_log_output {
            sinks.push(Arc::new(JsonLinesSink::create(path)?));
        }

        let run_id = RunId::new();
        info!("Prepared run {} with {} actors", run_id, config.total_actors());

        let controller = Arc::new(Self::build_controller(&config, &sinks));
        Ok(Self { config, run_id, sinks, capture: None, controller })
    }

    fn build_controller(config: &SimulationConfig, sinks: &[Arc<dyn EventSink>]) -> AccessController {
        sinks
            .iter()
            .cloned()
            .fold(AccessController::new(config.fairness), AccessController::with_sink)
    }

    /// Keep every event in memory and audit the log at the end of the run
    ///
    /// Rebuilds the turnstile, so call it before [`Self::shutdown_handle`].
    pub fn with_event_capture(mut self) -> Self {
        let capture = Arc::new(MemorySink::new());
        self.sinks.push(capture.clone());
        self.capture = Some(capture);
        self.controller = Arc::new(Self::build_controller(&self.config, &self.sinks));
        self
    }

    /// Configuration of the run
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Identifier of the run
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Handle that cancels the run from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle { controller: Arc::clone(&self.controller) }
    }

    fn actor_ids(&self) -> Vec<ActorId> {
        let a = (0..self.config.category_a_actors).map(|i| ActorId::new(Category::A, i as u32));
        let b = (0..self.config.category_b_actors).map(|i| ActorId::new(Category::B, i as u32));
        a.chain(b).collect()
    }

    /// Run every actor to completion
    #[instrument(skip(self), fields(run_id = %self.run_id))]
    pub fn run(self) -> SimulationResult<SimulationReport> {
        let _span = perf_span!("simulation_run", actors = self.config.total_actors()).entered();
        let started = Instant::now();

        if self.config.max_cycles.is_none() && self.config.run_duration_ms.is_none() {
            warn!("Unbounded run without a duration; it ends only on shutdown");
        }

        let handles = self.spawn_actors()?;
        let timer = match self.start_timer() {
            Ok(timer) => timer,
            Err(e) => {
                let _ = self.abort_actors(handles);
                return Err(e);
            }
        };
        let joined = self.join_actors(handles);

        if let Some(timer) = timer {
            // Release the timer if it is still waiting
            self.controller.shutdown();
            if timer.join().is_err() {
                warn!("Run timer thread panicked");
            }
        }

        let actors = joined?;
        self.controller.flush_sinks()?;

        let mut statistics = self.controller.statistics()?;
        statistics.set_simulation_duration(started.elapsed());
        self.verify_final_state(&statistics)?;

        let audit = self.capture.as_ref().map(|sink| EventAudit::replay(&sink.events()));
        if let Some(audit) = &audit {
            if !audit.is_clean() {
                warn!("Event log audit found problems: {:?}", audit);
            }
        }

        sim_event!(
            info,
            "run finished",
            entries = statistics.total_entries(),
            cancelled = statistics.cancelled_arrivals.total(),
        );

        Ok(SimulationReport {
            run_id: self.run_id,
            statistics,
            actors,
            duration: started.elapsed(),
            audit,
        })
    }

    fn spawn_actors(&self) -> SimulationResult<Vec<ActorHandle>> {
        let timing = ActorTiming::from_config(&self.config);
        let ids = self.actor_ids();
        let mut handles = Vec::with_capacity(ids.len());

        for (index, id) in ids.into_iter().enumerate() {
            let seed = self.config.seed.map(|seed| seed.wrapping_add(index as u64));
            let actor = Actor::new(id, timing, self.config.max_cycles, seed);
            let controller = Arc::clone(&self.controller);

            let spawned = thread::Builder::new()
                .name(format!("actor-{}-{}", id.category(), id.ordinal()))
                .spawn(move || {
                    let _guard = ShutdownOnPanic(Arc::clone(&controller));
                    let result = actor.run(&controller);
                    if result.is_err() {
                        controller.shutdown();
                    }
                    result
                });

            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => {
                    error!("Failed to spawn thread for {}: {}", id, e);
                    let _ = self.abort_actors(handles);
                    return Err(SimulationError::SpawnError(format!("{}: {}", id, e)));
                }
            }
        }

        debug!("Spawned {} actor threads", handles.len());
        Ok(handles)
    }

    fn start_timer(&self) -> SimulationResult<Option<JoinHandle<()>>> {
        let Some(limit) = self.config.run_duration_ms.map(Duration::from_millis) else {
            return Ok(None);
        };

        let controller = Arc::clone(&self.controller);
        let timer = thread::Builder::new()
            .name("run-timer".to_string())
            .spawn(move || {
                if !controller.wait_for_shutdown(limit) {
                    info!("Run duration of {:?} elapsed, shutting down", limit);
                    controller.shutdown();
                }
            });

        match timer {
            Ok(handle) => Ok(Some(handle)),
            Err(e) => {
                error!("Failed to spawn the run timer: {}", e);
                Err(SimulationError::SpawnError(format!("run timer: {}", e)))
            }
        }
    }

    /// Stop the run and wait for the actors that already started
    fn abort_actors(&self, handles: Vec<ActorHandle>) -> SimulationResult<Vec<ActorReport>> {
        self.controller.shutdown();
        warn!("Aborting run {}: joining {} started actors", self.run_id, handles.len());
        self.join_actors(handles)
    }

    fn join_actors(&self, handles: Vec<ActorHandle>) -> SimulationResult<Vec<ActorReport>> {
        let mut reports = Vec::with_capacity(handles.len());
        let mut failure = None;

        for (id, handle) in handles {
            match handle.join() {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    error!("Actor {} failed: {}", id, e);
                    failure.get_or_insert(e);
                }
                Err(_) => {
                    error!("Actor {} panicked", id);
                    failure.get_or_insert(SimulationError::ActorPanicked(id.to_string()));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }

    fn verify_final_state(&self, statistics: &OccupancyStatistics) -> SimulationResult<()> {
        let snapshot = self.controller.snapshot()?;
        if !snapshot.is_empty() || snapshot.occupants.total() != 0 || snapshot.waiting.total() != 0 {
            return Err(SimulationError::invariant_violation(format!(
                "run ended with {:?} inside and {:?} waiting",
                snapshot.occupants, snapshot.waiting
            )));
        }
        if !statistics.is_conserved() {
            return Err(SimulationError::invariant_violation(format!(
                "entries {:?} do not match exits {:?}",
                statistics.entries, statistics.exits
            )));
        }
        Ok(())
    }
}
