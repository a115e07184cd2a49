//! Kinematic integration and munition homing.

use std::collections::HashMap;

use glam::DVec3;
use hecs::World;

use guardian_core::constants::ARENA_RADIUS_M;
use guardian_core::types::TargetId;

use crate::components::{Body, Munition, Tag};

/// Integrate every body over `dt`. Hulls that leave the arena radius are
/// turned back toward the middle; munitions are not.
pub fn run(world: &mut World, dt: f64) {
    if dt <= 0.0 {
        return;
    }
    for (_entity, (body, munition)) in world.query_mut::<(&mut Body, Option<&Munition>)>() {
        let k = &mut body.kinematics;
        k.velocity += k.acceleration * dt;
        k.position += k.velocity * dt;

        if munition.is_none() {
            turn_back(body);
        }
        if let Some(heading) = body.kinematics.velocity.try_normalize() {
            body.forward = heading;
        }
    }
}

/// Reflect the outward component of velocity once past the arena edge.
fn turn_back(body: &mut Body) {
    let position = body.kinematics.position;
    if position.length() <= ARENA_RADIUS_M {
        return;
    }
    let Some(normal) = position.try_normalize() else {
        return;
    };
    let velocity = body.kinematics.velocity;
    let outward = velocity.dot(normal);
    if outward > 0.0 {
        body.kinematics.velocity = velocity - 2.0 * outward * normal;
    }
}

/// Point every munition at its target's current position (pure pursuit).
pub fn steer_munitions(world: &mut World) {
    let positions: HashMap<TargetId, DVec3> = world
        .query::<(&Tag, &Body)>()
        .iter()
        .map(|(_, (tag, body))| (tag.0, body.position()))
        .collect();

    for (_entity, (body, munition)) in world.query_mut::<(&mut Body, &Munition)>() {
        let Some(target) = positions.get(&munition.target) else {
            continue;
        };
        if let Some(direction) = (*target - body.position()).try_normalize() {
            body.kinematics.velocity = direction * munition.speed;
            body.forward = direction;
        }
    }
}
