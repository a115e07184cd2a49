//! Events emitted by the controller and the arena during a tick.

use serde::{Deserialize, Serialize};

use crate::enums::{ReleaseReason, Scenario, WeaponClass};
use crate::types::{AgentId, MountId, TargetId, TeamId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngagementEvent {
    GuardModeChanged {
        enabled: bool,
    },
    /// A new configuration version was sanitized and applied.
    ConfigApplied {
        version: u64,
    },
    ScanCompleted {
        candidates: usize,
        top: Option<TargetId>,
    },
    TargetAssigned {
        mount: MountId,
        target: TargetId,
        score: f64,
    },
    TargetReleased {
        mount: MountId,
        target: TargetId,
        reason: ReleaseReason,
    },
    BurstStarted {
        mount: MountId,
        target: TargetId,
    },
    BurstEnded {
        mount: MountId,
    },
    MunitionLaunched {
        mount: MountId,
        target: TargetId,
        /// Simulation time after which the in-flight slot is freed.
        expires_at_secs: f64,
    },
    MountDepleted {
        mount: MountId,
    },
}

/// Arena-level outcomes of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArenaEvent {
    ScenarioStarted {
        scenario: Scenario,
        seed: u64,
    },
    /// A direct-fire round or beam pulse connected.
    Hit {
        shooter: AgentId,
        target: TargetId,
        class: WeaponClass,
        damage: f64,
    },
    /// A guided munition reached its target.
    MunitionImpact {
        shooter: AgentId,
        target: TargetId,
        hit: bool,
    },
    /// A guided munition ran out of flight time or lost its target.
    MunitionExpired {
        shooter: AgentId,
        target: TargetId,
    },
    Destroyed {
        target: TargetId,
    },
    /// An agent's controller panicked; its outputs were discarded this tick.
    AgentFault {
        agent: AgentId,
    },
    Finished {
        winner: Option<TeamId>,
    },
}
