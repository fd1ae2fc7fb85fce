//! End-to-end runs through the simulation driver

use group_turnstile::simulation::{SimulationDriver, SimulationError};
use group_turnstile::types::{ActorState, Category, FairnessPolicy, SimulationConfig};

fn fixed_delay_config(a: usize, b: usize, cycles: usize) -> SimulationConfig {
    SimulationConfig {
        category_a_actors: a,
        category_b_actors: b,
        max_cycles: Some(cycles),
        occupy_min_ms: 2,
        occupy_max_ms: 2,
        rest_min_ms: 2,
        rest_max_ms: 2,
        quiet: true,
        ..SimulationConfig::default()
    }
}

#[test]
fn test_two_by_two_run() {
    let config = fixed_delay_config(2, 2, 3);
    assert_eq!(config.expected_entries(), Some(12));

    let report = SimulationDriver::new(config).unwrap().with_event_capture().run().unwrap();

    assert_eq!(report.statistics.total_entries(), 12);
    assert_eq!(report.statistics.entries.a, 6);
    assert_eq!(report.statistics.entries.b, 6);
    assert!(report.statistics.is_conserved());
    assert_eq!(report.statistics.cancelled_arrivals.total(), 0);
    assert!(report.statistics.sessions.a >= 1);
    assert!(report.statistics.sessions.b >= 1);

    assert_eq!(report.actors.len(), 4);
    for actor in &report.actors {
        assert_eq!(actor.cycles_completed, 3);
        assert_eq!(actor.final_state, ActorState::Terminated);
        assert!(!actor.cancelled);
        assert_eq!(actor.category, actor.id.category());
    }

    let audit = report.audit.expect("capture was enabled");
    assert_eq!(audit.events, 24);
    assert!(audit.is_clean());
    assert!(audit.is_conserved());
    assert_eq!(audit.final_occupants.total(), 0);
    assert!(audit.max_consecutive_skips <= 1);
}

#[test]
fn test_single_category_run() {
    let config = fixed_delay_config(4, 0, 2);
    let report = SimulationDriver::new(config).unwrap().with_event_capture().run().unwrap();

    assert_eq!(report.statistics.entries.a, 8);
    assert_eq!(report.statistics.entries.b, 0);
    assert_eq!(report.actors_of(Category::B).count(), 0);
    assert_eq!(report.statistics.owed_handoffs_skipped, 0);
    assert!(report.audit.unwrap().session_order.iter().all(|c| *c == Category::A));
}

#[test]
fn test_best_effort_run_is_safe() {
    let config = SimulationConfig {
        fairness: FairnessPolicy::BestEffort,
        occupy_min_ms: 1,
        occupy_max_ms: 4,
        rest_min_ms: 1,
        rest_max_ms: 4,
        seed: Some(2024),
        ..fixed_delay_config(3, 3, 4)
    };
    let report = SimulationDriver::new(config).unwrap().with_event_capture().run().unwrap();

    assert_eq!(report.total_cycles(), 24);
    assert!(report.statistics.is_conserved());
    let audit = report.audit.unwrap();
    assert_eq!(audit.overlap_violations, 0);
    assert!(audit.is_clean());
}

#[test]
fn test_random_delays_stay_in_range() {
    let config = SimulationConfig {
        occupy_min_ms: 1,
        occupy_max_ms: 5,
        rest_min_ms: 1,
        rest_max_ms: 5,
        seed: Some(7),
        ..fixed_delay_config(2, 3, 2)
    };
    let report = SimulationDriver::new(config).unwrap().run().unwrap();

    assert_eq!(report.total_cycles(), 10);
    assert_eq!(report.actors_of(Category::B).count(), 3);
    assert!(report.statistics.simulation_duration > std::time::Duration::ZERO);
}

#[test]
fn test_driver_rejects_invalid_configuration() {
    let config = SimulationConfig {
        occupy_min_ms: 10,
        occupy_max_ms: 1,
        ..fixed_delay_config(1, 1, 1)
    };
    let result = SimulationDriver::new(config);
    assert!(matches!(result, Err(SimulationError::ConfigurationError(_))));

    let config = SimulationConfig { max_cycles: Some(0), ..fixed_delay_config(1, 1, 1) };
    assert!(SimulationDriver::new(config).is_err());
}

#[test]
fn test_report_serializes() {
    let report = SimulationDriver::new(fixed_delay_config(1, 1, 1)).unwrap().run().unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert!(json["run_id"].as_str().unwrap().starts_with("RUN_"));
    assert_eq!(json["actors"].as_array().unwrap().len(), 2);
    assert_eq!(json["actors"][0]["id"], "A-00");
    assert!(json["audit"].is_null());

    let summary = report.statistics.generate_summary_output();
    assert!(summary.contains("Category A: 1 entries"));
    assert!(summary.contains("Count conservation: ok"));
}
