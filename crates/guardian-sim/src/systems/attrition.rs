//! Resolves what the controllers fired.
//!
//! Direct-fire rounds roll to hit immediately against the target's radius
//! and range. Guided launches become munition entities that home on their
//! target and roll on impact; the shooter is told when each one resolves so
//! its in-flight slot frees up.

use std::collections::{BTreeMap, HashMap};

use glam::DVec3;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use guardian_core::constants::*;
use guardian_core::enums::WeaponClass;
use guardian_core::events::ArenaEvent;
use guardian_core::types::{AgentId, TargetId};
use guardian_fire_control::aiming;

use crate::agent::AgentSlot;
use crate::components::{Body, Hull, Munition, Tag};

/// A munition that hit, missed or expired; its shooter must be told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub shooter: AgentId,
    pub target: TargetId,
}

fn hull_index(world: &World) -> HashMap<TargetId, (Entity, DVec3, f64)> {
    world
        .query::<(&Tag, &Body, &Hull)>()
        .iter()
        .map(|(entity, (tag, body, hull))| (tag.0, (entity, body.position(), hull.radius)))
        .collect()
}

/// Hit probability of one round: the target's radius against the spread
/// of the round at that distance.
pub fn hit_probability(radius: f64, distance: f64) -> f64 {
    let radius = radius.max(0.0);
    let spread = distance.max(0.0) * SHOT_DISPERSION_RAD;
    if radius + spread <= 0.0 {
        return 1.0;
    }
    (radius / (radius + spread)).clamp(0.0, 1.0)
}

fn round_damage(class: WeaponClass, dt: f64) -> f64 {
    match class {
        WeaponClass::Gun => GUN_ROUND_DAMAGE,
        WeaponClass::Rocket => ROCKET_DAMAGE,
        WeaponClass::Beam => BEAM_DAMAGE_PER_SEC * dt,
        WeaponClass::Missile | WeaponClass::Torpedo => MUNITION_DAMAGE,
    }
}

/// Damage a hull, recording the hit and a kill if it was the last blow.
fn damage(world: &mut World, entity: Entity, target: TargetId, amount: f64, events: &mut Vec<ArenaEvent>) {
    if let Ok(mut hull) = world.get::<&mut Hull>(entity) {
        if hull.apply_damage(amount) {
            debug!(%target, "hull destroyed");
            events.push(ArenaEvent::Destroyed { target });
        }
    }
}

/// Roll every direct-fire shot of this tick and launch guided munitions.
pub fn resolve_shots(
    world: &mut World,
    slots: &BTreeMap<AgentId, AgentSlot>,
    rng: &mut ChaCha8Rng,
    dt: f64,
    events: &mut Vec<ArenaEvent>,
) {
    let index = hull_index(world);
    let mut launches: Vec<(Body, Munition)> = Vec::new();

    for slot in slots.values() {
        let Some(last) = &slot.last else { continue };
        let Ok(origin) = world.get::<&Body>(slot.entity).map(|b| *b) else {
            continue;
        };

        for (mount_id, shot) in last.shots() {
            let Some(mount) = slot.mount(mount_id) else { continue };
            let Some(&(entity, position, radius)) = index.get(&shot.target) else {
                continue;
            };

            if mount.class.is_indirect() {
                let distance = origin.position().distance(position);
                let direction = (shot.aim_point - origin.position())
                    .try_normalize()
                    .unwrap_or(origin.forward);
                let body = Body::new(origin.position(), direction * mount.projectile_speed, origin.situation);
                launches.push((
                    body,
                    Munition {
                        shooter: slot.agent,
                        mount: mount_id,
                        target: shot.target,
                        speed: mount.projectile_speed,
                        expires_at: shot.time_secs
                            + aiming::munition_lifetime(distance, mount.projectile_speed),
                    },
                ));
                continue;
            }

            let distance = origin.position().distance(position);
            if !rng.gen_bool(hit_probability(radius, distance)) {
                continue;
            }
            let amount = round_damage(mount.class, dt);
            events.push(ArenaEvent::Hit {
                shooter: slot.agent,
                target: shot.target,
                class: mount.class,
                damage: amount,
            });
            damage(world, entity, shot.target, amount, events);
        }
    }

    for (body, munition) in launches {
        world.spawn((body, munition));
    }
}

/// Detonate munitions that reached their target and retire expired ones.
/// `now` is the end of the current tick.
pub fn resolve_munitions(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    now: f64,
    dt: f64,
    events: &mut Vec<ArenaEvent>,
    despawn_buffer: &mut Vec<Entity>,
) -> Vec<Resolution> {
    despawn_buffer.clear();
    let index = hull_index(world);
    let mut impacts: Vec<(Entity, TargetId)> = Vec::new();
    let mut resolved = Vec::new();

    for (entity, (body, munition)) in world.query::<(&Body, &Munition)>().iter() {
        let resolution = Resolution {
            shooter: munition.shooter,
            target: munition.target,
        };
        let Some(&(target_entity, position, radius)) = index.get(&munition.target) else {
            events.push(ArenaEvent::MunitionExpired {
                shooter: munition.shooter,
                target: munition.target,
            });
            despawn_buffer.push(entity);
            resolved.push(resolution);
            continue;
        };

        let reach = radius.max(munition.speed * dt);
        if body.position().distance(position) <= reach {
            let hit = rng.gen_bool(MUNITION_HIT_PROBABILITY);
            events.push(ArenaEvent::MunitionImpact {
                shooter: munition.shooter,
                target: munition.target,
                hit,
            });
            if hit {
                impacts.push((target_entity, munition.target));
            }
            despawn_buffer.push(entity);
            resolved.push(resolution);
        } else if now >= munition.expires_at {
            events.push(ArenaEvent::MunitionExpired {
                shooter: munition.shooter,
                target: munition.target,
            });
            despawn_buffer.push(entity);
            resolved.push(resolution);
        }
    }

    for (entity, target) in impacts {
        damage(world, entity, target, MUNITION_DAMAGE, events);
    }
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    resolved
}
