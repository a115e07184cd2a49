//! Fire control for GUARDIAN.
//!
//! Allocates weapon mounts to ranked targets, gates and sequences fire, and
//! composes everything into the per-agent [`EngagementController`].

pub mod aiming;
pub mod allocator;
pub mod controller;
pub mod engagement;
pub mod scheduler;

pub use controller::EngagementController;
pub use guardian_core as core;
