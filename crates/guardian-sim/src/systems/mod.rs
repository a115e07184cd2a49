//! ECS systems that operate on the arena world each tick.
//!
//! Systems are plain functions over `&mut World` (or `&World` for read-only
//! passes) plus whatever engine state they need passed in explicitly.

pub mod attrition;
pub mod cleanup;
pub mod fire_control;
pub mod movement;
pub mod perception;
pub mod snapshot;
