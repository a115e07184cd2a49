//! Operator commands accepted by the controller and the arena.
//!
//! Commands are queued and applied at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::config::EngagementConfig;
use crate::enums::{FireMode, Scenario, TargetingMode};
use crate::types::{AgentId, MountId, TargetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControllerCommand {
    /// Enable or disable autonomous engagement.
    SetGuardMode { enabled: bool },
    /// Tick or untick one targeting checkbox.
    SetTargetingFlag { mode: TargetingMode, enabled: bool },
    /// Select a targeting sub-mode outright.
    SetTargetingMode { mode: TargetingMode },
    SetFireMode { mode: FireMode },
    /// Swap between salvo and ripple.
    ToggleFireMode,
    /// Rescan at the next tick instead of waiting for the scan timer.
    ForceScan,
    /// Report a mount's remaining rounds (`None` = unlimited).
    SetAmmo { mount: MountId, rounds: Option<u32> },
    /// An indirect munition aimed at `target` hit or missed; free its slot.
    ResolveMunition { target: TargetId },
}

/// Commands accepted by the arena host, one JSON object per line on stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ArenaCommand {
    /// Clear the world and spawn a seeded scenario.
    StartScenario { scenario: Scenario },
    Pause,
    Resume,
    SetTimeScale { scale: f64 },
    /// Forward an operator command to one agent's controller.
    Controller {
        agent: AgentId,
        command: ControllerCommand,
    },
    /// Replace an agent's engagement configuration. The version is bumped
    /// past the current one so the controller re-applies it.
    SetAgentConfig {
        agent: AgentId,
        config: EngagementConfig,
    },
    /// Remove a hull from the world.
    Despawn { target: TargetId },
}
