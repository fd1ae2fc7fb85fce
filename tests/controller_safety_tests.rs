//! Safety of the turnstile under thread contention

use group_turnstile::controller::AccessController;
use group_turnstile::events::{EventAudit, MemorySink};
use group_turnstile::types::{ActorId, Category, FairnessPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const ROUNDS: usize = 25;

fn hammer(policy: FairnessPolicy, per_category: u32) -> (Arc<AccessController>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let controller = Arc::new(AccessController::new(policy).with_sink(sink.clone()));
    let done = Arc::new(AtomicBool::new(false));

    // Watches for both categories inside at once
    let observer = {
        let controller = Arc::clone(&controller);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut observations = 0usize;
            loop {
                let snapshot = controller.snapshot().unwrap();
                assert!(
                    snapshot.occupants.a == 0 || snapshot.occupants.b == 0,
                    "overlap observed: {:?}",
                    snapshot
                );
                observations += 1;
                if done.load(Ordering::Acquire) {
                    return observations;
                }
                thread::yield_now();
            }
        })
    };

    let mut workers = Vec::new();
    for category in Category::ALL {
        for ordinal in 0..per_category {
            let controller = Arc::clone(&controller);
            workers.push(thread::spawn(move || {
                let id = ActorId::new(category, ordinal);
                for _ in 0..ROUNDS {
                    let session = controller.enter(category, id).unwrap();
                    thread::sleep(Duration::from_micros(200));
                    controller.leave(session).unwrap();
                }
            }));
        }
    }

    for worker in workers {
        worker.join().unwrap();
    }
    done.store(true, Ordering::Release);
    assert!(observer.join().unwrap() > 0);

    (controller, sink)
}

fn assert_safe_run(policy: FairnessPolicy) {
    let per_category = 4;
    let (controller, sink) = hammer(policy, per_category);
    let expected = per_category as usize * ROUNDS;

    let snapshot = controller.snapshot().unwrap();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.waiting.total(), 0);

    let stats = controller.statistics().unwrap();
    assert_eq!(stats.entries.a, expected);
    assert_eq!(stats.entries.b, expected);
    assert!(stats.is_conserved());
    assert!(stats.peak_occupancy.a <= per_category as usize);

    let events = sink.events();
    assert_eq!(events.len(), 4 * expected);

    let audit = EventAudit::replay(&events);
    assert_eq!(audit.overlap_violations, 0);
    assert_eq!(audit.count_mismatches, 0);
    assert_eq!(audit.ordering_violations, 0);
    assert_eq!(audit.direct_switches, 0);
    assert!(audit.is_conserved());
    assert_eq!(audit.sessions, stats.sessions);
}

#[test]
fn test_strict_never_mixes_categories() {
    assert_safe_run(FairnessPolicy::Strict);
}

#[test]
fn test_best_effort_never_mixes_categories() {
    assert_safe_run(FairnessPolicy::BestEffort);
}

#[test]
fn test_event_counts_match_reported_occupancy() {
    let (_, sink) = hammer(FairnessPolicy::Strict, 2);
    let events = sink.events();

    // Every event reports the holder consistently with its own kind
    for event in &events {
        if event.occupants > 0 {
            assert_eq!(event.current, Some(event.category));
        } else {
            assert_eq!(event.current, None);
            assert!(event.closed_session);
        }
    }

    let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_single_category_shares_freely() {
    let controller = Arc::new(AccessController::new(FairnessPolicy::Strict));
    let sessions: Vec<_> = (0..6)
        .map(|i| controller.enter(Category::B, ActorId::new(Category::B, i)).unwrap())
        .collect();

    let snapshot = controller.snapshot().unwrap();
    assert_eq!(snapshot.occupants.b, 6);
    assert_eq!(snapshot.current, Some(Category::B));

    for session in sessions {
        controller.leave(session).unwrap();
    }
    let stats = controller.statistics().unwrap();
    assert_eq!(stats.sessions.b, 1);
    assert_eq!(stats.peak_occupancy.b, 6);
}
