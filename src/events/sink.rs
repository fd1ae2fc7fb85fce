//! Event sinks
//!
//! Sinks receive every occupancy event while the turnstile is still held, so each
//! sink sees events in serialization order. Sink-internal locks are always taken
//! after the turnstile and never the other way round.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::OccupancyEvent;
use crate::simulation::SimulationResult;
use crate::types::OutputFormat;

/// Receiver of occupancy events
pub trait EventSink: Send + Sync + fmt::Debug {
    /// Record one event; must not block for long and must not fail the caller
    fn record(&self, event: &OccupancyEvent);

    /// Flush buffered output
    fn flush(&self) -> SimulationResult<()> {
        Ok(())
    }
}

/// Prints one line per event on stdout
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    format: OutputFormat,
}

impl ConsoleSink {
    /// Create a console sink writing in `format`
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn render(&self, event: &OccupancyEvent) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(event.to_text_line()),
            OutputFormat::Json => serde_json::to_string(event),
        }
    }
}

impl EventSink for ConsoleSink {
    fn record(&self, event: &OccupancyEvent) {
        let line = match self.render(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to render event #{}: {}", event.sequence, e);
                return;
            }
        };

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = writeln!(handle, "{}", line) {
            debug!("Dropping event #{} on stdout: {}", event.sequence, e);
        }
    }

    fn flush(&self) -> SimulationResult<()> {
        io::stdout().lock().flush()?;
        Ok(())
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<OccupancyEvent>>,
}

impl MemorySink {
    /// Create an empty in-memory log
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<OccupancyEvent>> {
        // A panic while pushing cannot leave the Vec half-written
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of all events recorded so far, in serialization order
    pub fn events(&self) -> Vec<OccupancyEvent> {
        self.guard().clone()
    }

    /// Number of events recorded so far
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Whether no event was recorded yet
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &OccupancyEvent) {
        self.guard().push(event.clone());
    }
}

/// Appends events as JSON lines to a file
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl fmt::Debug for JsonLinesSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesSink").field("path", &self.path).finish()
    }
}

impl JsonLinesSink {
    /// Create (or truncate) the file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> SimulationResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        debug!("Writing event log to {}", path.display());
        Ok(Self { path, writer: Mutex::new(BufWriter::new(file)) })
    }

    /// Destination of the log
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, BufWriter<File>> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for JsonLinesSink {
    fn record(&self, event: &OccupancyEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize event #{}: {}", event.sequence, e);
                return;
            }
        };

        if let Err(e) = writeln!(self.guard(), "{}", line) {
            warn!("Failed to write event #{} to {}: {}", event.sequence, self.path.display(), e);
        }
    }

    fn flush(&self) -> SimulationResult<()> {
        self.guard().flush()?;
        Ok(())
    }
}
