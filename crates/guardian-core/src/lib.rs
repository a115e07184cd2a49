//! Core types and definitions for the GUARDIAN engagement controller.
//!
//! This crate defines the vocabulary shared by the scoring, fire-control and
//! arena crates: identifiers, kinematics, weapon and target descriptions,
//! configuration snapshots, commands, events, and outbound controller state.
//! It carries no scheduling logic of its own.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;
