//! Cleanup system: removes destroyed hulls.

use hecs::{Entity, World};

use guardian_core::types::TargetId;

use crate::components::{Hull, Tag};

/// Despawn every destroyed hull. Returns their catalog ids.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) -> Vec<TargetId> {
    despawn_buffer.clear();
    let mut removed = Vec::new();

    for (entity, (tag, hull)) in world.query_mut::<(&Tag, &Hull)>() {
        if hull.is_destroyed() {
            despawn_buffer.push(entity);
            removed.push(tag.0);
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    removed.sort();
    removed
}

/// Despawn the hull with catalog id `target`. Returns whether one existed.
pub fn despawn_target(world: &mut World, target: TargetId) -> bool {
    let found = world
        .query::<&Tag>()
        .iter()
        .find(|(_, tag)| tag.0 == target)
        .map(|(entity, _)| entity);
    match found {
        Some(entity) => world.despawn(entity).is_ok(),
        None => false,
    }
}
