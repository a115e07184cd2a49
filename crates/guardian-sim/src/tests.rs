//! Tests for the arena engine, its systems and controller hosting.

use glam::DVec3;
use hecs::World;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use guardian_core::commands::{ArenaCommand, ControllerCommand};
use guardian_core::components::{AgentState, WeaponMount};
use guardian_core::config::EngagementConfig;
use guardian_core::enums::*;
use guardian_core::events::ArenaEvent;
use guardian_core::state::ControllerSnapshot;
use guardian_core::types::{AgentId, MountId, TargetId};
use guardian_targeting::catalog::TargetCatalog;

use crate::agent::AgentController;
use crate::components::{Body, Hull, Munition, Tag};
use crate::engine::{ArenaConfig, ArenaEngine};
use crate::systems::{attrition, cleanup, movement};
use crate::world_setup::{self, IdAllocator};

fn started(seed: u64, scenario: Scenario) -> ArenaEngine {
    let mut engine = ArenaEngine::new(ArenaConfig {
        seed,
        ..Default::default()
    });
    engine.queue_command(ArenaCommand::StartScenario { scenario });
    engine
}

struct PanickingController;

impl AgentController for PanickingController {
    fn queue_command(&mut self, _command: ControllerCommand) {}

    fn tick(
        &mut self,
        _dt: f64,
        _agent: &AgentState,
        _catalog: &TargetCatalog,
        _config: &EngagementConfig,
    ) -> ControllerSnapshot {
        panic!("controller fault injected by test");
    }
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut a = started(12345, Scenario::Skirmish);
    let mut b = started(12345, Scenario::Skirmish);
    for _ in 0..300 {
        let snap_a = serde_json::to_string(&a.tick()).unwrap();
        let snap_b = serde_json::to_string(&b.tick()).unwrap();
        assert_eq!(snap_a, snap_b, "snapshots diverged with the same seed");
    }
}

#[test]
fn test_determinism_different_seeds() {
    let mut a = started(111, Scenario::Swarm);
    let mut b = started(222, Scenario::Swarm);
    let snap_a = serde_json::to_string(&a.tick()).unwrap();
    let snap_b = serde_json::to_string(&b.tick()).unwrap();
    assert_ne!(snap_a, snap_b, "different seeds should lay out different drones");
}

// ---- Lifecycle ----

#[test]
fn test_setup_phase_until_started() {
    let mut engine = ArenaEngine::new(ArenaConfig::default());
    let snap = engine.tick();
    assert_eq!(snap.phase, ArenaPhase::Setup);
    assert!(snap.hulls.is_empty());
    assert_eq!(engine.time().tick, 0);
}

#[test]
fn test_start_scenario_spawns_and_arms_agents() {
    let mut engine = started(7, Scenario::Duel);
    let snap = engine.tick();
    assert_eq!(snap.phase, ArenaPhase::Active);
    assert_eq!(snap.scenario, Some(Scenario::Duel));
    assert_eq!(snap.hulls.len(), 2);
    assert_eq!(snap.agents.len(), 2);
    assert!(snap.agents.iter().all(|a| a.guard_mode));
    assert!(snap
        .events
        .iter()
        .any(|e| matches!(e, ArenaEvent::ScenarioStarted { scenario: Scenario::Duel, seed: 7 })));
}

#[test]
fn test_pause_freezes_time() {
    let mut engine = started(1, Scenario::Duel);
    engine.tick();
    let before = engine.time();
    engine.queue_command(ArenaCommand::Pause);
    for _ in 0..5 {
        let snap = engine.tick();
        assert_eq!(snap.phase, ArenaPhase::Paused);
    }
    assert_eq!(engine.time(), before);
    engine.queue_command(ArenaCommand::Resume);
    engine.tick();
    assert_eq!(engine.time().tick, before.tick + 1);
}

#[test]
fn test_time_scale_clamped() {
    let mut engine = started(1, Scenario::Duel);
    engine.queue_command(ArenaCommand::SetTimeScale { scale: 50.0 });
    engine.tick();
    assert_eq!(engine.time_scale(), 8.0);
    engine.queue_command(ArenaCommand::SetTimeScale { scale: f64::NAN });
    engine.tick();
    assert_eq!(engine.time_scale(), 8.0);
}

#[test]
fn test_zero_time_scale_holds_clock() {
    let mut engine = started(1, Scenario::Duel);
    engine.queue_command(ArenaCommand::SetTimeScale { scale: 0.0 });
    for _ in 0..3 {
        engine.tick();
    }
    assert_eq!(engine.time().elapsed_secs, 0.0);
    assert_eq!(engine.time().tick, 3);
}

// ---- Controller hosting ----

#[test]
fn test_panicking_controller_is_isolated() {
    let mut engine = started(3, Scenario::Skirmish);
    engine.tick();
    let agents: Vec<AgentId> = engine.agents().collect();
    let faulty = agents[0];
    assert!(engine.replace_controller(faulty, Box::new(PanickingController)));

    let snap = engine.tick();
    assert!(snap
        .events
        .iter()
        .any(|e| matches!(e, ArenaEvent::AgentFault { agent } if *agent == faulty)));
    assert!(snap.agent(faulty).is_none(), "faulty output discarded");
    assert_eq!(snap.agents.len(), agents.len() - 1, "every other agent still updated");
    assert_eq!(engine.slot(faulty).map(|s| s.faults), Some(1));
}

#[test]
fn test_controller_command_forwarded() {
    let mut engine = started(5, Scenario::Duel);
    engine.tick();
    let agent = engine.agents().next().unwrap();
    engine.queue_command(ArenaCommand::Controller {
        agent,
        command: ControllerCommand::SetGuardMode { enabled: false },
    });
    let snap = engine.tick();
    let view = snap.agent(agent).unwrap();
    assert!(!view.guard_mode);
    assert_eq!(view.status, ControllerStatus::GuardOff);
}

#[test]
fn test_agent_config_bumps_version() {
    let mut engine = started(5, Scenario::Duel);
    engine.tick();
    let agent = engine.agents().next().unwrap();
    let current = engine.slot(agent).unwrap().config.version;
    engine.queue_command(ArenaCommand::SetAgentConfig {
        agent,
        config: EngagementConfig {
            scan_interval_secs: 0.1,
            ..Default::default()
        },
    });
    let snap = engine.tick();
    let view = snap.agent(agent).unwrap();
    assert_eq!(view.config_version, current + 1);
    assert_eq!(engine.slot(agent).unwrap().config.scan_interval_secs, 0.1);
}

#[test]
fn test_despawn_removes_agent() {
    let mut engine = started(5, Scenario::Duel);
    engine.tick();
    let agent = engine.agents().next().unwrap();
    engine.queue_command(ArenaCommand::Despawn {
        target: TargetId::new(agent.get()),
    });
    let snap = engine.tick();
    assert!(engine.slot(agent).is_none());
    assert_eq!(snap.hulls.len(), 1);
    assert_eq!(snap.phase, ArenaPhase::Finished);
    assert!(snap
        .events
        .iter()
        .any(|e| matches!(e, ArenaEvent::Finished { winner: Some(_) })));
}

#[test]
fn test_duel_agents_engage_each_other() {
    let mut engine = started(9, Scenario::Duel);
    let mut engaged = false;
    for _ in 0..30 {
        let snap = engine.tick();
        if snap.agents.iter().all(|a| a.status == ControllerStatus::Engaging) {
            engaged = true;
            break;
        }
    }
    assert!(engaged, "duelists should open fire within a second");
}

// ---- Systems ----

#[test]
fn test_movement_integrates_and_turns_back() {
    let mut world = World::new();
    let inside = world.spawn((Body::new(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0), Situation::Airborne),));
    let outside = world.spawn((Body::new(
        DVec3::new(20_000.0, 0.0, 0.0),
        DVec3::new(50.0, 0.0, 0.0),
        Situation::Airborne,
    ),));
    movement::run(&mut world, 0.5);

    let body = *world.get::<&Body>(inside).unwrap();
    assert_eq!(body.kinematics.position, DVec3::new(5.0, 0.0, 0.0));
    let body = *world.get::<&Body>(outside).unwrap();
    assert!(body.kinematics.velocity.x < 0.0, "heading back into the arena");
    assert!(body.forward.x < 0.0);
}

#[test]
fn test_munition_expires_without_target() {
    let mut world = World::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    world.spawn((
        Body::new(DVec3::ZERO, DVec3::Y * 800.0, Situation::Airborne),
        Munition {
            shooter: AgentId::new(1),
            mount: MountId::new(0),
            target: TargetId::new(99),
            speed: 800.0,
            expires_at: 10.0,
        },
    ));
    let mut events = Vec::new();
    let mut buffer = Vec::new();
    let resolved = attrition::resolve_munitions(&mut world, &mut rng, 0.1, 0.1, &mut events, &mut buffer);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].target, TargetId::new(99));
    assert!(matches!(events[0], ArenaEvent::MunitionExpired { .. }));
    assert_eq!(world.len(), 0);
}

#[test]
fn test_munition_impact_resolves() {
    let mut world = World::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    world.spawn((
        Tag(TargetId::new(5)),
        Body::new(DVec3::new(0.0, 10.0, 0.0), DVec3::ZERO, Situation::Airborne),
        Hull::new(1_000.0, 20.0),
    ));
    world.spawn((
        Body::new(DVec3::ZERO, DVec3::Y * 800.0, Situation::Airborne),
        Munition {
            shooter: AgentId::new(1),
            mount: MountId::new(0),
            target: TargetId::new(5),
            speed: 800.0,
            expires_at: 10.0,
        },
    ));
    let mut events = Vec::new();
    let mut buffer = Vec::new();
    let resolved = attrition::resolve_munitions(&mut world, &mut rng, 0.1, 0.1, &mut events, &mut buffer);
    assert_eq!(resolved.len(), 1);
    assert!(events
        .iter()
        .any(|e| matches!(e, ArenaEvent::MunitionImpact { target, .. } if *target == TargetId::new(5))));
    assert_eq!(world.len(), 1, "munition consumed, hull remains");
}

#[test]
fn test_hit_probability_falls_with_range() {
    let close = attrition::hit_probability(20.0, 100.0);
    let far = attrition::hit_probability(20.0, 5_000.0);
    assert!(close > far);
    assert!((0.0..=1.0).contains(&far));
    assert_eq!(attrition::hit_probability(20.0, 0.0), 1.0);
    assert_eq!(attrition::hit_probability(0.0, 0.0), 1.0);
}

#[test]
fn test_cleanup_removes_destroyed_hulls() {
    let mut world = World::new();
    let mut dead = Hull::new(100.0, 5.0);
    assert!(dead.apply_damage(500.0));
    assert!(!dead.apply_damage(1.0), "only the killing blow reports");
    world.spawn((Tag(TargetId::new(1)), dead));
    world.spawn((Tag(TargetId::new(2)), Hull::new(100.0, 5.0)));
    let mut buffer = Vec::new();
    let removed = cleanup::run(&mut world, &mut buffer);
    assert_eq!(removed, vec![TargetId::new(1)]);
    assert_eq!(world.len(), 1);
}

#[test]
fn test_swarm_layout() {
    let mut world = World::new();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut ids = IdAllocator::default();
    let agents = world_setup::setup_scenario(&mut world, &mut rng, &mut ids, Scenario::Swarm);
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].roster.len(), world_setup::defender_loadout().len());
    assert_eq!(world.len(), 13);
    let vip = world.get::<&Hull>(agents[0].entity).unwrap().is_vip;
    assert!(vip);
}

#[test]
fn test_loadouts_have_unique_mount_ids() {
    for roster in [
        world_setup::gunship_loadout(),
        world_setup::lancer_loadout(),
        world_setup::frigate_loadout(),
        world_setup::defender_loadout(),
    ] {
        let mut ids: Vec<MountId> = roster.iter().map(|m: &WeaponMount| m.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), roster.len());
    }
}
