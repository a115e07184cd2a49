//! Target evaluation for GUARDIAN.
//!
//! Turns perceived targets into normalized feature vectors, scores them with
//! operator weights, and ranks them. Pure functions over plain data; no ECS
//! or scheduling state.

pub mod catalog;
pub mod features;
pub mod scoring;

pub use guardian_core as core;
