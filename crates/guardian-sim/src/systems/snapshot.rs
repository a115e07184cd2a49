//! Snapshot system: queries the ECS world and builds an `ArenaSnapshot`.
//!
//! This system is read-only; it never modifies the world.

use std::collections::BTreeMap;

use hecs::World;

use guardian_core::enums::{ArenaPhase, Scenario};
use guardian_core::events::ArenaEvent;
use guardian_core::state::{ArenaSnapshot, HullView, MunitionView};
use guardian_core::types::{AgentId, SimTime};

use crate::agent::AgentSlot;
use crate::components::{Body, Hull, Munition, Pilot, Tag, Team};

#[allow(clippy::too_many_arguments)]
pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    phase: ArenaPhase,
    scenario: Option<Scenario>,
    time_scale: f64,
    slots: &BTreeMap<AgentId, AgentSlot>,
    events: Vec<ArenaEvent>,
) -> ArenaSnapshot {
    ArenaSnapshot {
        time: *time,
        phase,
        scenario,
        time_scale,
        hulls: build_hulls(world),
        munitions: build_munitions(world),
        agents: slots.values().filter_map(|s| s.last.clone()).collect(),
        events,
    }
}

fn build_hulls(world: &World) -> Vec<HullView> {
    let mut hulls: Vec<HullView> = world
        .query::<(&Tag, &Body, &Hull, Option<&Team>, Option<&Pilot>)>()
        .iter()
        .map(|(_, (tag, body, hull, team, pilot))| HullView {
            target: tag.0,
            agent: pilot.map(|p| p.0),
            team: team.map(|t| t.0),
            position: body.kinematics.position,
            velocity: body.kinematics.velocity,
            situation: body.situation,
            health: hull.health,
            damage_fraction: hull.damage_fraction(),
            is_vip: hull.is_vip,
        })
        .collect();
    hulls.sort_by_key(|h| h.target);
    hulls
}

fn build_munitions(world: &World) -> Vec<MunitionView> {
    let mut munitions: Vec<MunitionView> = world
        .query::<(&Body, &Munition)>()
        .iter()
        .map(|(_, (body, munition))| MunitionView {
            shooter: munition.shooter,
            mount: munition.mount,
            target: munition.target,
            position: body.kinematics.position,
        })
        .collect();
    munitions.sort_by_key(|m| (m.shooter, m.mount, m.target));
    munitions
}
