//! End-to-end arena runs through the public API.

use guardian_sim::core::commands::ArenaCommand;
use guardian_sim::core::enums::{ArenaPhase, ControllerStatus, Scenario};
use guardian_sim::core::events::{ArenaEvent, EngagementEvent};
use guardian_sim::{ArenaConfig, ArenaEngine};

fn run(seed: u64, scenario: Scenario, ticks: usize) -> Vec<guardian_sim::core::state::ArenaSnapshot> {
    let mut engine = ArenaEngine::new(ArenaConfig {
        seed,
        time_scale: 2.0,
        ..Default::default()
    });
    engine.queue_command(ArenaCommand::StartScenario { scenario });
    (0..ticks).map(|_| engine.tick()).collect()
}

#[test]
fn swarm_defender_launches_and_resolves_missiles() {
    let snaps = run(21, Scenario::Swarm, 900);

    let launched = snaps
        .iter()
        .flat_map(|s| s.agents.iter())
        .flat_map(|a| a.events.iter())
        .filter(|e| matches!(e, EngagementEvent::MunitionLaunched { .. }))
        .count();
    assert!(launched > 0, "defender should commit its missiles");

    let resolved = snaps
        .iter()
        .flat_map(|s| s.events.iter())
        .filter(|e| matches!(e, ArenaEvent::MunitionImpact { .. } | ArenaEvent::MunitionExpired { .. }))
        .count();
    assert!(resolved > 0, "launched munitions eventually resolve");
}

#[test]
fn swarm_never_exceeds_missiles_per_target() {
    for snap in run(8, Scenario::Swarm, 600) {
        let mut per_target = std::collections::BTreeMap::new();
        for m in &snap.munitions {
            *per_target.entry(m.target).or_insert(0usize) += 1;
        }
        // Arena agents allow two munitions per target.
        assert!(per_target.values().all(|n| *n <= 2), "tick {}", snap.time.tick);
    }
}

#[test]
fn duel_produces_hits() {
    let snaps = run(3, Scenario::Duel, 300);
    let hits = snaps
        .iter()
        .flat_map(|s| s.events.iter())
        .filter(|e| matches!(e, ArenaEvent::Hit { .. }))
        .count();
    assert!(hits > 0);
}

#[test]
fn skirmish_statuses_are_consistent() {
    for snap in run(77, Scenario::Skirmish, 120) {
        assert_ne!(snap.phase, ArenaPhase::Setup);
        for agent in &snap.agents {
            assert_eq!(agent.status_label, agent.status.label());
            if agent.status == ControllerStatus::Engaging {
                assert!(agent.mounts.iter().any(|m| !m.targets.is_empty()));
            }
        }
    }
}
