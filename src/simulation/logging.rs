//! Diagnostic logging
//!
//! Diagnostics go to stderr (and optionally a daily rolling file) through
//! `tracing`. They are separate from the occupancy event stream, which is
//! delivered to event sinks and printed on stdout.

use std::io;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;
type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Guards of the file writers; dropping one stops its worker
static WRITER_GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();

fn keep_guard(guard: WorkerGuard) {
    WRITER_GUARDS
        .get_or_init(|| Mutex::new(Vec::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(guard);
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Maximum level emitted by this crate
    pub level: Level,
    /// Emit JSON instead of the pretty format
    pub json_format: bool,
    /// Also write to a daily rolling file
    pub log_to_file: bool,
    /// Directory of the rolling file
    pub log_directory: Option<String>,
    /// File name prefix of the rolling file
    pub log_file_prefix: String,
    /// Log span open/close
    pub enable_span_events: bool,
    /// Colored console output
    pub enable_ansi: bool,
    /// Filter directives overriding `level` and `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
            log_to_file: false,
            log_directory: None,
            log_file_prefix: "group-turnstile".to_string(),
            enable_span_events: false,
            enable_ansi: true,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Default configuration: warnings and errors only
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Switch to JSON output
    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Also log to a rolling file under `directory`
    pub fn with_file_logging(mut self, directory: impl Into<String>) -> Self {
        self.log_to_file = true;
        self.log_directory = Some(directory.into());
        self
    }

    /// Set the rolling file prefix
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_file_prefix = prefix.into();
        self
    }

    /// Log span open/close
    pub fn with_span_events(mut self) -> Self {
        self.enable_span_events = true;
        self
    }

    /// Disable colors
    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    /// Use explicit filter directives
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.enable_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn filter(&self) -> Result<EnvFilter, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(directives) = &self.env_filter {
            return Ok(EnvFilter::try_new(directives)?);
        }
        Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), self.level))
        }))
    }

    fn console_layer(&self) -> BoxedLayer {
        if self.json_format {
            fmt::layer().json().with_writer(io::stderr).with_span_events(self.span_events()).boxed()
        } else {
            fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_ansi(self.enable_ansi)
                .with_span_events(self.span_events())
                .boxed()
        }
    }

    fn file_layer(&self) -> Option<BoxedLayer> {
        if !self.log_to_file {
            return None;
        }
        let directory = self.log_directory.as_deref().unwrap_or("logs");
        let (writer, guard) = non_blocking(rolling::daily(directory, &self.log_file_prefix));
        keep_guard(guard);

        // Files are always JSON
        Some(fmt::layer().json().with_writer(writer).with_span_events(self.span_events()).boxed())
    }

    /// Install the global subscriber
    ///
    /// Fails if a subscriber is already installed.
    pub fn init(self) -> InitResult {
        let filter = self.filter()?;
        let mut layers = vec![self.console_layer()];
        layers.extend(self.file_layer());

        Registry::default().with(layers).with(filter).try_init()?;
        debug!("Logging initialized: {:?}", self);
        Ok(())
    }

    /// INFO with span events
    pub fn init_verbose() -> InitResult {
        Self::new().with_level(Level::INFO).with_span_events().init()
    }

    /// DEBUG with span events
    pub fn init_debug() -> InitResult {
        Self::new().with_level(Level::DEBUG).with_span_events().init()
    }

    /// Warnings only, no colors
    pub fn init_test() -> InitResult {
        Self::new().with_level(Level::WARN).without_ansi().init()
    }
}

/// Structured log event tagged with the simulation component
#[macro_export]
macro_rules! sim_event {
    ($level:ident, $message:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::$level!(
            message = $message,
            component = "simulation",
            $($key = $value,)*
        );
    };
    ($level:ident, $message:expr) => {
        tracing::$level!(message = $message, component = "simulation");
    };
}

/// Span measuring one phase of a run
#[macro_export]
macro_rules! perf_span {
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info_span!($name, component = "performance", $($key = $value,)*)
    };
    ($name:expr) => {
        tracing::info_span!($name, component = "performance")
    };
}
