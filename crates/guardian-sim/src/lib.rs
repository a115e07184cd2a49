//! Arena simulation for GUARDIAN.
//!
//! Owns a hecs ECS world of hulls and guided munitions, feeds a shared
//! perception catalog to one engagement controller per agent, resolves the
//! shots they fire, and produces `ArenaSnapshot`s. Headless and seeded, so
//! two runs with the same seed produce identical output.

pub mod agent;
pub mod components;
pub mod engine;
pub mod systems;
pub mod world_setup;

pub use engine::{ArenaConfig, ArenaEngine};
pub use guardian_core as core;

#[cfg(test)]
mod tests;
