//! Builds the shared perception catalog from the world.
//!
//! Who-is-engaging-whom comes from the controllers' previous-tick
//! snapshots, so the catalog an agent sees this tick reflects last tick's
//! decisions of everyone else.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;
use hecs::World;

use guardian_core::components::{AgentState, AimPoints, EngagedBy, TargetSnapshot, Victim};
use guardian_core::types::{AgentId, TargetId, TeamId};
use guardian_targeting::catalog::TargetCatalog;

use crate::agent::AgentSlot;
use crate::components::{Body, Hull, Pilot, Tag, Team};

/// Snapshot every hull into a catalog.
pub fn build_catalog(world: &World, slots: &BTreeMap<AgentId, AgentSlot>) -> TargetCatalog {
    let victims = victims(world);

    let mut engaged_by: HashMap<TargetId, Vec<EngagedBy>> = HashMap::new();
    let mut attacking: HashMap<AgentId, Victim> = HashMap::new();
    for slot in slots.values() {
        let Some(last) = &slot.last else { continue };
        for target in last.engaged_targets() {
            engaged_by.entry(target).or_default().push(EngagedBy {
                agent: slot.agent,
                team: slot.team,
            });
        }
        if let Some(victim) = last.primary_target.and_then(|p| victims.get(&p.target)) {
            attacking.insert(slot.agent, *victim);
        }
    }

    let mut query = world.query::<(&Tag, &Body, &Hull, Option<&Team>, Option<&Pilot>)>();
    let snapshots = query.iter().map(|(_, (tag, body, hull, team, pilot))| {
        let mut t = TargetSnapshot::new(tag.0, team.map(|t| t.0), body.kinematics);
        t.situation = body.situation;
        t.mass = hull.mass;
        t.damage_fraction = hull.damage_fraction();
        t.weapon_count = hull.weapon_count;
        t.is_vip = hull.is_vip;
        t.threat_level = hull.threat_level;
        t.radius = hull.radius;
        t.aim_points = aim_points(body.forward, hull.radius);
        t.attacking = pilot.and_then(|p| attacking.get(&p.0).copied());
        t.engaged_by = engaged_by.remove(&tag.0).unwrap_or_default();
        t
    });
    TargetCatalog::from_snapshots(snapshots)
}

/// Piloted hulls, keyed by their catalog id.
fn victims(world: &World) -> HashMap<TargetId, Victim> {
    world
        .query::<(&Tag, &Pilot, &Team, &Hull)>()
        .iter()
        .map(|(_, (tag, pilot, team, hull))| {
            (
                tag.0,
                Victim {
                    agent: pilot.0,
                    team: team.0,
                    is_vip: hull.is_vip,
                },
            )
        })
        .collect()
}

/// Part offsets along the hull's heading.
fn aim_points(forward: DVec3, radius: f64) -> AimPoints {
    let forward = forward.try_normalize().unwrap_or(DVec3::Y);
    AimPoints {
        command: Some(forward * radius * 0.4),
        engine: Some(-forward * radius * 0.7),
        weapon: Some(DVec3::Z * radius * 0.2),
        mass: Some(-forward * radius * 0.2),
    }
}

/// Controller input for one agent. `None` if its hull is gone.
pub fn agent_state(world: &World, slot: &AgentSlot, teammates: u32) -> Option<AgentState> {
    let body = world.get::<&Body>(slot.entity).ok()?;
    let hull = world.get::<&Hull>(slot.entity).ok()?;
    let mut state = AgentState::new(slot.agent, slot.team, body.kinematics);
    state.forward = body.forward;
    state.mass = hull.mass;
    state.weapon_count = slot.roster.len() as u32;
    state.teammate_count = teammates;
    Some(state)
}

/// Live agents per team.
pub fn team_sizes(slots: &BTreeMap<AgentId, AgentSlot>) -> HashMap<TeamId, u32> {
    let mut sizes = HashMap::new();
    for slot in slots.values() {
        *sizes.entry(slot.team).or_insert(0) += 1;
    }
    sizes
}
