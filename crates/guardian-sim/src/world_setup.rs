//! Entity spawn factories and seeded scenario layouts.
//!
//! Scenarios spawn hulls (with `Pilot` for controller-flown agents) and
//! return the agents so the engine can host a controller for each.

use glam::DVec3;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use guardian_core::components::WeaponMount;
use guardian_core::config::{EngagementConfig, ScoringWeights};
use guardian_core::enums::{Scenario, Situation, WeaponClass};
use guardian_core::types::{AgentId, MountId, TargetId, TeamId};

use crate::components::{Body, Hull, Pilot, Tag, Team};

pub const BLUE: TeamId = TeamId::new(1);
pub const RED: TeamId = TeamId::new(2);

/// An agent hull that needs a controller.
#[derive(Debug, Clone)]
pub struct AgentSpawn {
    pub agent: AgentId,
    pub entity: Entity,
    pub team: TeamId,
    pub roster: Vec<WeaponMount>,
    pub config: EngagementConfig,
}

/// Hands out catalog ids; agents reuse theirs as `AgentId`.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn next(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

/// Spawn a scenario into an empty world.
pub fn setup_scenario(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    ids: &mut IdAllocator,
    scenario: Scenario,
) -> Vec<AgentSpawn> {
    match scenario {
        Scenario::Duel => setup_duel(world, rng, ids),
        Scenario::Skirmish => setup_skirmish(world, rng, ids),
        Scenario::Swarm => setup_swarm(world, rng, ids),
    }
}

fn setup_duel(world: &mut World, rng: &mut ChaCha8Rng, ids: &mut IdAllocator) -> Vec<AgentSpawn> {
    let jitter = |rng: &mut ChaCha8Rng| DVec3::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), 0.0);
    let blue_at = DVec3::new(0.0, -800.0, 600.0) + jitter(rng);
    let red_at = DVec3::new(0.0, 800.0, 600.0) + jitter(rng);
    vec![
        spawn_agent(world, ids, BLUE, blue_at, DVec3::new(40.0, 0.0, 0.0), Situation::Airborne, gunship_loadout()),
        spawn_agent(world, ids, RED, red_at, DVec3::new(-40.0, 0.0, 0.0), Situation::Airborne, gunship_loadout()),
    ]
}

fn setup_skirmish(world: &mut World, rng: &mut ChaCha8Rng, ids: &mut IdAllocator) -> Vec<AgentSpawn> {
    let mut spawns = Vec::new();
    for (team, side) in [(BLUE, -1.0), (RED, 1.0)] {
        let roles: [(Situation, Vec<WeaponMount>); 3] = [
            (Situation::Airborne, gunship_loadout()),
            (Situation::Airborne, lancer_loadout()),
            (Situation::Surface, frigate_loadout()),
        ];
        for (situation, roster) in roles {
            let altitude = match situation {
                Situation::Airborne => rng.gen_range(400.0..1_200.0),
                _ => 0.0,
            };
            let position = DVec3::new(
                rng.gen_range(-1_500.0..1_500.0),
                side * rng.gen_range(1_500.0..2_200.0),
                altitude,
            );
            let speed = match situation {
                Situation::Airborne => rng.gen_range(60.0..120.0),
                _ => rng.gen_range(5.0..12.0),
            };
            // Close on the enemy line at a shallow angle.
            let heading = DVec3::new(rng.gen_range(-0.3..0.3), -side, 0.0).normalize();
            spawns.push(spawn_agent(world, ids, team, position, heading * speed, situation, roster));
        }
    }
    spawns
}

fn setup_swarm(world: &mut World, rng: &mut ChaCha8Rng, ids: &mut IdAllocator) -> Vec<AgentSpawn> {
    let defender = spawn_agent(
        world,
        ids,
        BLUE,
        DVec3::ZERO,
        DVec3::ZERO,
        Situation::Surface,
        defender_loadout(),
    );
    if let Ok(mut hull) = world.get::<&mut Hull>(defender.entity) {
        hull.is_vip = true;
        hull.mass = 40_000.0;
    }

    for _ in 0..12 {
        spawn_drone(world, rng, ids);
    }
    vec![defender]
}

/// Spawn an agent hull and describe it for controller hosting.
pub fn spawn_agent(
    world: &mut World,
    ids: &mut IdAllocator,
    team: TeamId,
    position: DVec3,
    velocity: DVec3,
    situation: Situation,
    roster: Vec<WeaponMount>,
) -> AgentSpawn {
    let raw = ids.next();
    let mut hull = Hull::new(12_000.0, 20.0);
    hull.weapon_count = roster.len() as u32;
    hull.threat_level = 0.5;

    let entity = world.spawn((
        Tag(TargetId::new(raw)),
        Team(team),
        Pilot(AgentId::new(raw)),
        Body::new(position, velocity, situation),
        hull,
    ));
    AgentSpawn {
        agent: AgentId::new(raw),
        entity,
        team,
        roster,
        config: arena_config(),
    }
}

/// Unpiloted hostile drone on a converging course toward the origin.
pub fn spawn_drone(world: &mut World, rng: &mut ChaCha8Rng, ids: &mut IdAllocator) -> Entity {
    let bearing: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let range: f64 = rng.gen_range(5_000.0..8_000.0);
    let altitude: f64 = rng.gen_range(300.0..1_500.0);
    let speed: f64 = rng.gen_range(80.0..150.0);

    let position = DVec3::new(range * bearing.sin(), range * bearing.cos(), altitude);
    let velocity = (-position).normalize_or_zero() * speed;

    let mut hull = Hull::new(200.0, 5.0);
    hull.health = 20.0;
    hull.max_health = 20.0;
    hull.weapon_count = 1;
    hull.threat_level = rng.gen_range(0.3..1.0);

    world.spawn((
        Tag(TargetId::new(ids.next())),
        Team(RED),
        Body::new(position, velocity, Situation::Airborne),
        hull,
    ))
}

/// Configuration every arena agent starts with.
pub fn arena_config() -> EngagementConfig {
    EngagementConfig {
        version: 1,
        scan_interval_secs: 1.0,
        multi_target_num: 2,
        multi_missile_tgt_num: 2,
        max_missiles_on_target: 2,
        weights: ScoringWeights {
            threat: 1.0,
            ..ScoringWeights::default()
        },
        ..EngagementConfig::default()
    }
}

// --- Loadouts ---

pub fn gunship_loadout() -> Vec<WeaponMount> {
    vec![
        WeaponMount::new(MountId::new(0), "chin turret", WeaponClass::Gun)
            .turret()
            .with_barrels(2)
            .with_ammo(1_200),
        WeaponMount::new(MountId::new(1), "missile rail", WeaponClass::Missile)
            .with_ammo(4)
            .with_max_off_boresight(60.0),
    ]
}

pub fn lancer_loadout() -> Vec<WeaponMount> {
    vec![
        WeaponMount::new(MountId::new(0), "beam turret", WeaponClass::Beam).turret(),
        WeaponMount::new(MountId::new(1), "rocket pod", WeaponClass::Rocket)
            .with_barrels(4)
            .with_ammo(32),
    ]
}

pub fn frigate_loadout() -> Vec<WeaponMount> {
    vec![
        WeaponMount::new(MountId::new(0), "deck gun", WeaponClass::Gun)
            .turret()
            .with_max_targets(2),
        WeaponMount::new(MountId::new(1), "torpedo tube", WeaponClass::Torpedo).with_ammo(6),
        WeaponMount::new(MountId::new(2), "missile cell", WeaponClass::Missile).with_ammo(8),
    ]
}

pub fn defender_loadout() -> Vec<WeaponMount> {
    vec![
        WeaponMount::new(MountId::new(0), "gatling", WeaponClass::Gun)
            .turret()
            .with_barrels(4)
            .with_max_targets(2),
        WeaponMount::new(MountId::new(1), "point defense", WeaponClass::Gun).turret(),
        WeaponMount::new(MountId::new(2), "laser", WeaponClass::Beam).turret(),
        WeaponMount::new(MountId::new(3), "vls port", WeaponClass::Missile).with_ammo(8),
        WeaponMount::new(MountId::new(4), "vls starboard", WeaponClass::Missile).with_ammo(8),
    ]
}
