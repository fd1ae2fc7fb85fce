//! Configuration structures for the turnstile simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the population, timing and fairness of a simulation run.

use super::{FairnessPolicy, OutputFormat};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default timing constants, in milliseconds
///
/// Occupancy lasts 1-4 time units and resting 5-8 time units, one unit being 100 ms.
pub mod timing {
    /// Minimum time an actor holds its session
    pub const OCCUPY_MIN_MS: u64 = 100;

    /// Maximum time an actor holds its session
    pub const OCCUPY_MAX_MS: u64 = 400;

    /// Minimum think time between two cycles
    pub const REST_MIN_MS: u64 = 500;

    /// Maximum think time between two cycles
    pub const REST_MAX_MS: u64 = 800;
}

/// Actors per category when none (or an unusable value) is given
pub const DEFAULT_ACTORS_PER_CATEGORY: usize = 5;

/// Cycles per actor for a default bounded run
pub const DEFAULT_MAX_CYCLES: usize = 5;

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "group-turnstile",
    version = "0.1.0",
    about = "Group Turnstile - two categories share one resource, never at the same time",
    long_about = "Simulates actors of two categories contending for a single shared resource. Any number of actors of one category may be inside together, but the categories never mix. A fair turnstile bounds how long either category can be kept out.

EXAMPLES:
    # Run with default settings (5 actors per category, 5 cycles each)
    group-turnstile

    # 10 actors per category
    group-turnstile 10

    # Asymmetric population where waiters race for the gate
    group-turnstile --category-a-actors 8 --category-b-actors 2 --fairness best-effort

    # Run forever until the run duration elapses
    group-turnstile --unbounded --run-duration-ms 10000

    # Generate configuration template
    group-turnstile --print-config > my-config.json

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    An ACTORS value that is not a positive number falls back to the default."
)]
pub struct CliArgs {
    /// Number of actors per category
    #[arg(
        value_name = "ACTORS",
        help = "Number of actors per category",
        long_help = "Number of actors created for each category. Values that are not a positive number fall back to the default. Default: 5"
    )]
    pub actors: Option<String>,

    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Number of category A actors (overrides ACTORS)
    #[arg(long, help = "Number of category A actors")]
    pub category_a_actors: Option<usize>,

    /// Number of category B actors (overrides ACTORS)
    #[arg(long, help = "Number of category B actors")]
    pub category_b_actors: Option<usize>,

    /// Number of cycles each actor performs
    #[arg(
        long,
        help = "Cycles per actor",
        long_help = "Number of enter/leave cycles each actor performs before terminating. Must be greater than 0. Default: 5"
    )]
    pub cycles: Option<usize>,

    /// Run actors until cancelled instead of for a fixed number of cycles
    #[arg(long, help = "Run actors without a cycle limit", conflicts_with = "cycles")]
    pub unbounded: bool,

    /// Minimum occupancy duration in milliseconds
    #[arg(long, help = "Minimum occupancy duration (ms)")]
    pub occupy_min_ms: Option<u64>,

    /// Maximum occupancy duration in milliseconds
    #[arg(long, help = "Maximum occupancy duration (ms)")]
    pub occupy_max_ms: Option<u64>,

    /// Minimum rest duration in milliseconds
    #[arg(long, help = "Minimum rest duration (ms)")]
    pub rest_min_ms: Option<u64>,

    /// Maximum rest duration in milliseconds
    #[arg(long, help = "Maximum rest duration (ms)")]
    pub rest_max_ms: Option<u64>,

    /// Fairness policy of the turnstile
    #[arg(
        long,
        help = "Fairness policy (strict or best-effort)",
        long_help = "strict: the category kept waiting always opens the next session. best-effort: waiters are woken and race for the gate, as in the classic semaphore solution. Default: strict"
    )]
    pub fairness: Option<FairnessPolicy>,

    /// Random seed for reproducible delays
    #[arg(long, help = "Random seed for reproducible delays")]
    pub seed: Option<u64>,

    /// Cancel all actors after this many milliseconds
    #[arg(long, help = "Cancel the run after this many milliseconds")]
    pub run_duration_ms: Option<u64>,

    /// Output format for occupancy events
    #[arg(
        long,
        help = "Output format (text or json)",
        long_help = "Output format for enter/leave lines written to stdout. Supported formats: text, json. Default: text"
    )]
    pub output_format: Option<String>,

    /// Output path for the JSONL event log
    #[arg(long, help = "Output path for a JSONL event log file")]
    pub event_log_output: Option<String>,

    /// Suppress enter/leave lines on stdout
    #[arg(short, long, help = "Do not print enter/leave lines")]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Number of category A actors
    pub category_a_actors: Option<usize>,

    /// Number of category B actors
    pub category_b_actors: Option<usize>,

    /// Cycles per actor (absent = default, null = unbounded)
    #[serde(default, with = "double_option")]
    pub max_cycles: Option<Option<usize>>,

    /// Minimum occupancy duration in milliseconds
    pub occupy_min_ms: Option<u64>,

    /// Maximum occupancy duration in milliseconds
    pub occupy_max_ms: Option<u64>,

    /// Minimum rest duration in milliseconds
    pub rest_min_ms: Option<u64>,

    /// Maximum rest duration in milliseconds
    pub rest_max_ms: Option<u64>,

    /// Fairness policy of the turnstile
    pub fairness: Option<FairnessPolicy>,

    /// Random seed for reproducible delays
    pub seed: Option<u64>,

    /// Cancel the run after this many milliseconds
    pub run_duration_ms: Option<u64>,

    /// Output format for occupancy events
    pub output_format: Option<String>,

    /// Output path for the JSONL event log
    pub event_log_output: Option<String>,

    /// Suppress enter/leave lines on stdout
    pub quiet: Option<bool>,
}

/// Distinguishes a missing field from an explicit `null`
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S>(value: &Option<Option<usize>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<usize>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<usize>::deserialize(deserializer).map(Some)
    }
}

/// Configuration for a turnstile simulation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Number of category A actors
    pub category_a_actors: usize,

    /// Number of category B actors
    pub category_b_actors: usize,

    /// Cycles per actor (None runs until cancelled)
    pub max_cycles: Option<usize>,

    /// Minimum occupancy duration in milliseconds
    pub occupy_min_ms: u64,

    /// Maximum occupancy duration in milliseconds
    pub occupy_max_ms: u64,

    /// Minimum rest duration in milliseconds
    pub rest_min_ms: u64,

    /// Maximum rest duration in milliseconds
    pub rest_max_ms: u64,

    /// Fairness policy of the turnstile
    pub fairness: FairnessPolicy,

    /// Random seed for reproducible delays
    pub seed: Option<u64>,

    /// Cancel the run after this many milliseconds
    pub run_duration_ms: Option<u64>,

    /// Output format for occupancy events
    pub output_format: String,

    /// Output path for the JSONL event log
    pub event_log_output: Option<String>,

    /// Suppress enter/leave lines on stdout
    pub quiet: bool,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    /// Neither category has any actor
    #[error("At least one actor is required, got {0} in category A and {1} in category B")]
    NoActors(usize, usize),

    /// Cycle count is invalid
    #[error("Cycle count must be greater than 0, got {0}")]
    InvalidCycleCount(usize),

    /// A delay range is inverted
    #[error("Invalid {field} range: min ({min}) must be <= max ({max})")]
    InvalidDelayRange {
        /// Name of the range
        field: String,
        /// Lower bound in milliseconds
        min: u64,
        /// Upper bound in milliseconds
        max: u64,
    },

    /// Run duration is invalid
    #[error("Run duration must be greater than 0 ms")]
    InvalidRunDuration,

    /// Output format is unknown
    #[error("Invalid output format: {0} (supported: text, json)")]
    InvalidOutputFormat(String),
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            category_a_actors: DEFAULT_ACTORS_PER_CATEGORY,
            category_b_actors: DEFAULT_ACTORS_PER_CATEGORY,
            max_cycles: Some(DEFAULT_MAX_CYCLES),
            occupy_min_ms: timing::OCCUPY_MIN_MS,
            occupy_max_ms: timing::OCCUPY_MAX_MS,
            rest_min_ms: timing::REST_MIN_MS,
            rest_max_ms: timing::REST_MAX_MS,
            fairness: FairnessPolicy::Strict,
            seed: None,
            run_duration_ms: None,
            output_format: "text".to_string(),
            event_log_output: None,
            quiet: false,
        }
    }
}

/// Interpret the positional actor count
///
/// Returns `None` for anything that is not a positive integer.
pub fn parse_actor_count(raw: &str) -> Option<usize> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => usize::try_from(value).ok(),
        _ => None,
    }
}

impl SimulationConfig {
    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Start with default configuration
        let mut config = Self::default();

        // Load from config file if specified
        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // Override with command line arguments (CLI takes precedence)
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            category_a_actors: config_file.category_a_actors.unwrap_or(defaults.category_a_actors),
            category_b_actors: config_file.category_b_actors.unwrap_or(defaults.category_b_actors),
            max_cycles: config_file.max_cycles.unwrap_or(defaults.max_cycles),
            occupy_min_ms: config_file.occupy_min_ms.unwrap_or(defaults.occupy_min_ms),
            occupy_max_ms: config_file.occupy_max_ms.unwrap_or(defaults.occupy_max_ms),
            rest_min_ms: config_file.rest_min_ms.unwrap_or(defaults.rest_min_ms),
            rest_max_ms: config_file.rest_max_ms.unwrap_or(defaults.rest_max_ms),
            fairness: config_file.fairness.unwrap_or(defaults.fairness),
            seed: config_file.seed.or(defaults.seed),
            run_duration_ms: config_file.run_duration_ms.or(defaults.run_duration_ms),
            output_format: config_file.output_format.unwrap_or(defaults.output_format),
            event_log_output: config_file.event_log_output.or(defaults.event_log_output),
            quiet: config_file.quiet.unwrap_or(defaults.quiet),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        // The positional count is symmetric and degrades to the default
        if let Some(raw) = &args.actors {
            let count = parse_actor_count(raw).unwrap_or_else(|| {
                warn!(
                    "Ignoring actor count '{}', using default of {}",
                    raw, DEFAULT_ACTORS_PER_CATEGORY
                );
                DEFAULT_ACTORS_PER_CATEGORY
            });
            config.category_a_actors = count;
            config.category_b_actors = count;
        }

        // Explicit per-category counts win over the positional one
        if let Some(value) = args.category_a_actors {
            config.category_a_actors = value;
        }
        if let Some(value) = args.category_b_actors {
            config.category_b_actors = value;
        }

        if args.unbounded {
            config.max_cycles = None;
        } else if let Some(value) = args.cycles {
            config.max_cycles = Some(value);
        }

        if let Some(value) = args.occupy_min_ms {
            config.occupy_min_ms = value;
        }
        if let Some(value) = args.occupy_max_ms {
            config.occupy_max_ms = value;
        }
        if let Some(value) = args.rest_min_ms {
            config.rest_min_ms = value;
        }
        if let Some(value) = args.rest_max_ms {
            config.rest_max_ms = value;
        }
        if let Some(value) = args.fairness {
            config.fairness = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.run_duration_ms {
            config.run_duration_ms = Some(value);
        }
        if let Some(value) = args.output_format {
            config.output_format = value;
        }
        if let Some(value) = args.event_log_output {
            config.event_log_output = Some(value);
        }
        if args.quiet {
            config.quiet = true;
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.total_actors() == 0 {
            return Err(ConfigValidationError::NoActors(
                self.category_a_actors,
                self.category_b_actors,
            ));
        }

        if let Some(0) = self.max_cycles {
            return Err(ConfigValidationError::InvalidCycleCount(0));
        }

        Self::validate_range("occupy", self.occupy_min_ms, self.occupy_max_ms)?;
        Self::validate_range("rest", self.rest_min_ms, self.rest_max_ms)?;

        if let Some(0) = self.run_duration_ms {
            return Err(ConfigValidationError::InvalidRunDuration);
        }

        self.get_output_format()
            .map_err(|_| ConfigValidationError::InvalidOutputFormat(self.output_format.clone()))?;

        Ok(())
    }

    /// Helper method to validate a millisecond range
    fn validate_range(field: &str, min: u64, max: u64) -> Result<(), ConfigValidationError> {
        if min > max {
            return Err(ConfigValidationError::InvalidDelayRange {
                field: field.to_string(),
                min,
                max,
            });
        }
        Ok(())
    }

    /// Total population across both categories
    pub fn total_actors(&self) -> usize {
        self.category_a_actors + self.category_b_actors
    }

    /// Get the occupancy range as a tuple
    pub fn occupy_range_ms(&self) -> (u64, u64) {
        (self.occupy_min_ms, self.occupy_max_ms)
    }

    /// Get the rest range as a tuple
    pub fn rest_range_ms(&self) -> (u64, u64) {
        (self.rest_min_ms, self.rest_max_ms)
    }

    /// Get the output format as an enum value
    pub fn get_output_format(&self) -> Result<OutputFormat, String> {
        self.output_format.parse()
    }

    /// Total enter/leave pairs a bounded run will perform
    pub fn expected_entries(&self) -> Option<usize> {
        self.max_cycles.map(|cycles| cycles * self.total_actors())
    }
}
