//! Read-only controller state published once per tick.
//!
//! Everything a UI or the arena needs to render or resolve the tick lives
//! here. Produced by the controller, never mutated by consumers.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::{
    ArenaPhase, ControllerStatus, FireMode, MountPhase, Scenario, Situation, TargetingMode,
    WeaponClass,
};
use crate::events::{ArenaEvent, EngagementEvent};
use crate::types::{AgentId, MountId, SimTime, TargetId, TeamId};

/// One ranked candidate from the last scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedScore {
    pub target: TargetId,
    pub score: f64,
}

/// One round (or beam pulse) released this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub target: TargetId,
    pub barrel: u32,
    /// Exact scheduled simulation time of release.
    pub time_secs: f64,
    /// World-space point the round was aimed at.
    pub aim_point: DVec3,
}

/// Per-mount view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountView {
    pub mount: MountId,
    pub name: String,
    pub class: WeaponClass,
    pub phase: MountPhase,
    /// Targets currently assigned, highest score first.
    pub targets: Vec<TargetId>,
    /// Trigger held this tick.
    pub firing: bool,
    /// Target the trigger is held on.
    pub fire_at: Option<TargetId>,
    pub aim_point: Option<DVec3>,
    /// Seconds left in the current burst, `None` when not in a timed burst.
    pub burst_remaining_secs: Option<f64>,
    /// Next barrel in the ripple cycle.
    pub ripple_barrel: u32,
    pub shots: Vec<Shot>,
    pub ammo: Option<u32>,
}

/// Full controller state after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub agent: AgentId,
    pub time_secs: f64,
    pub guard_mode: bool,
    pub status: ControllerStatus,
    pub status_label: String,
    pub targeting_mode: TargetingMode,
    pub fire_mode: FireMode,
    pub primary_target: Option<RankedScore>,
    /// Best few candidates from the last scan.
    pub ranked: Vec<RankedScore>,
    pub mounts: Vec<MountView>,
    pub munitions_in_flight: usize,
    pub next_scan_in_secs: f64,
    pub config_version: u64,
    pub events: Vec<EngagementEvent>,
}

impl ControllerSnapshot {
    /// All shots fired this tick, across mounts.
    pub fn shots(&self) -> impl Iterator<Item = (MountId, &Shot)> + '_ {
        self.mounts
            .iter()
            .flat_map(|m| m.shots.iter().map(move |s| (m.mount, s)))
    }

    /// Every target currently held by any mount, deduplicated and sorted.
    pub fn engaged_targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<TargetId> = self
            .mounts
            .iter()
            .flat_map(|m| m.targets.iter().copied())
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }
}

// --- Arena ---

/// One hull in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullView {
    pub target: TargetId,
    /// Set when the hull is flown by a controller.
    pub agent: Option<AgentId>,
    pub team: Option<TeamId>,
    pub position: DVec3,
    pub velocity: DVec3,
    pub situation: Situation,
    pub health: f64,
    pub damage_fraction: f64,
    pub is_vip: bool,
}

/// One guided munition in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MunitionView {
    pub shooter: AgentId,
    pub mount: MountId,
    pub target: TargetId,
    pub position: DVec3,
}

/// Complete arena state after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub time: SimTime,
    pub phase: ArenaPhase,
    pub scenario: Option<Scenario>,
    pub time_scale: f64,
    pub hulls: Vec<HullView>,
    pub munitions: Vec<MunitionView>,
    /// Controller state of every live agent, by agent id.
    pub agents: Vec<ControllerSnapshot>,
    pub events: Vec<ArenaEvent>,
}

impl ArenaSnapshot {
    /// Teams that still have at least one hull.
    pub fn live_teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = self.hulls.iter().filter_map(|h| h.team).collect();
        teams.sort();
        teams.dedup();
        teams
    }

    pub fn agent(&self, id: AgentId) -> Option<&ControllerSnapshot> {
        self.agents.iter().find(|a| a.agent == id)
    }
}
