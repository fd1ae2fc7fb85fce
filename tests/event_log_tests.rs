//! JSONL event log written during a run

use group_turnstile::events::{EventAudit, OccupancyEvent, OccupancyEventKind};
use group_turnstile::simulation::SimulationDriver;
use group_turnstile::types::{Category, SimulationConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_event_log_file_matches_statistics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");

    let config = SimulationConfig {
        category_a_actors: 2,
        category_b_actors: 1,
        max_cycles: Some(2),
        occupy_min_ms: 1,
        occupy_max_ms: 3,
        rest_min_ms: 1,
        rest_max_ms: 3,
        seed: Some(5),
        quiet: true,
        event_log_output: Some(path.to_string_lossy().into_owned()),
        ..SimulationConfig::default()
    };
    let report = SimulationDriver::new(config).unwrap().run().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let events: Vec<OccupancyEvent> =
        content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();

    assert_eq!(events.len(), 2 * report.statistics.total_entries());
    assert_eq!(events.len(), 12);
    assert_eq!(events[0].kind, OccupancyEventKind::Entered);
    assert!(events[0].opened_session);
    assert!(events.last().unwrap().closed_session);

    let entered_b = events
        .iter()
        .filter(|e| e.kind == OccupancyEventKind::Entered && e.category == Category::B)
        .count();
    assert_eq!(entered_b, 2);

    let audit = EventAudit::replay(&events);
    assert!(audit.is_clean());
    assert!(audit.is_conserved());
    assert_eq!(audit.sessions, report.statistics.sessions);
}

#[test]
fn test_event_log_in_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("events.jsonl");

    let config = SimulationConfig {
        category_a_actors: 1,
        category_b_actors: 1,
        quiet: true,
        event_log_output: Some(path.to_string_lossy().into_owned()),
        ..SimulationConfig::default()
    };
    assert!(SimulationDriver::new(config).is_err());
}

#[test]
fn test_text_lines_follow_the_log_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");
    let config = SimulationConfig {
        category_a_actors: 1,
        category_b_actors: 1,
        max_cycles: Some(1),
        occupy_min_ms: 1,
        occupy_max_ms: 1,
        rest_min_ms: 1,
        rest_max_ms: 1,
        quiet: true,
        event_log_output: Some(path.to_string_lossy().into_owned()),
        ..SimulationConfig::default()
    };
    SimulationDriver::new(config).unwrap().run().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    for line in content.lines() {
        let event: OccupancyEvent = serde_json::from_str(line).unwrap();
        let text = event.to_text_line();
        let expected = format!(
            " - {} {}, number of {} occupants is {}",
            event.actor, event.kind, event.category, event.occupants
        );
        assert!(text.ends_with(&expected), "{}", text);
        // HH:MM:SS.mmm
        assert_eq!(text.find(' '), Some(12));
    }
}
