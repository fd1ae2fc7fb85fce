// Group Turnstile - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/group-turnstile 4
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/group-turnstile --category-a-actors 8 --category-b-actors 2 --cycles 10 --verbose
// ```

use anyhow::Context;
use clap::Parser;
use group_turnstile::simulation::{LoggingConfig, SimulationDriver, SimulationReport};
use group_turnstile::types::config::CliArgs;
use group_turnstile::types::SimulationConfig;
use std::process;
use tracing::{error, info, warn};

fn main() {
    let args = CliArgs::parse();

    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    let logging_result = if args.debug {
        LoggingConfig::init_debug()
    } else if args.verbose {
        LoggingConfig::init_verbose()
    } else {
        LoggingConfig::new().init()
    };

    if let Err(e) = logging_result {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let dry_run = args.dry_run;
    let config = match SimulationConfig::from_cli_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    if dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    match run_simulation(config) {
        Ok(report) => {
            eprintln!("{}", report.statistics.generate_summary_output());
            info!("Run {} completed", report.run_id);
        }
        Err(e) => {
            error!("Simulation failed: {:#}", e);
            eprintln!("Simulation failed: {:#}", e);
            process::exit(1);
        }
    }
}

fn run_simulation(config: SimulationConfig) -> anyhow::Result<SimulationReport> {
    if config.max_cycles.is_none() && config.run_duration_ms.is_none() {
        warn!("No cycle limit and no run duration: the run ends only when interrupted");
    }

    let driver = SimulationDriver::new(config).context("failed to prepare the simulation")?;
    info!("Starting run {}", driver.run_id());
    let report = driver.run().context("simulation run aborted")?;

    if report.cancelled_actors() > 0 {
        eprintln!("{} actors stopped at the run duration limit", report.cancelled_actors());
    }
    Ok(report)
}

fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Group Turnstile");
    eprintln!("===============");
    eprintln!("Two categories, one resource, never together");
    eprintln!();

    print_configuration_summary(config);
}

fn print_configuration_summary(config: &SimulationConfig) {
    let (occupy_min, occupy_max) = config.occupy_range_ms();
    let (rest_min, rest_max) = config.rest_range_ms();

    eprintln!("Configuration:");
    eprintln!("  Category A Actors: {}", config.category_a_actors);
    eprintln!("  Category B Actors: {}", config.category_b_actors);
    match config.max_cycles {
        Some(cycles) => eprintln!("  Cycles per Actor: {}", cycles),
        None => eprintln!("  Cycles per Actor: unbounded"),
    }
    eprintln!("  Occupancy: {} - {} ms", occupy_min, occupy_max);
    eprintln!("  Rest: {} - {} ms", rest_min, rest_max);
    eprintln!("  Fairness: {}", config.fairness);
    eprintln!("  Output Format: {}", config.output_format);
    if let Some(limit) = config.run_duration_ms {
        eprintln!("  Run Duration: {} ms", limit);
    }
    if let Some(path) = &config.event_log_output {
        eprintln!("  Event Log: {}", path);
    }
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    if let Some(expected) = config.expected_entries() {
        eprintln!("\nExpected Entries: {}", expected);
    }
    eprintln!();
}
