//! The seam between the arena and the controllers it hosts.

use hecs::Entity;

use guardian_core::commands::ControllerCommand;
use guardian_core::components::{AgentState, WeaponMount};
use guardian_core::config::EngagementConfig;
use guardian_core::state::ControllerSnapshot;
use guardian_core::types::{AgentId, MountId, TeamId};
use guardian_fire_control::EngagementController;
use guardian_targeting::catalog::TargetCatalog;

/// Anything that can fly an agent. The arena only talks to controllers
/// through this trait, which lets tests plug in faulty ones.
pub trait AgentController: Send {
    fn queue_command(&mut self, command: ControllerCommand);

    fn tick(
        &mut self,
        dt: f64,
        agent: &AgentState,
        catalog: &TargetCatalog,
        config: &EngagementConfig,
    ) -> ControllerSnapshot;
}

impl AgentController for EngagementController {
    fn queue_command(&mut self, command: ControllerCommand) {
        EngagementController::queue_command(self, command);
    }

    fn tick(
        &mut self,
        dt: f64,
        agent: &AgentState,
        catalog: &TargetCatalog,
        config: &EngagementConfig,
    ) -> ControllerSnapshot {
        EngagementController::tick(self, dt, agent, catalog, config)
    }
}

/// One hosted agent: its hull, its weapons, the config the host publishes
/// to it, and its controller.
pub struct AgentSlot {
    pub agent: AgentId,
    pub entity: Entity,
    pub team: TeamId,
    pub roster: Vec<WeaponMount>,
    pub config: EngagementConfig,
    pub controller: Box<dyn AgentController>,
    /// Output of the last successful tick.
    pub last: Option<ControllerSnapshot>,
    pub faults: u32,
}

impl AgentSlot {
    /// Slot driven by a fresh `EngagementController`.
    pub fn new(
        agent: AgentId,
        entity: Entity,
        team: TeamId,
        roster: Vec<WeaponMount>,
        config: EngagementConfig,
        seed: u64,
    ) -> Self {
        let controller = EngagementController::new(agent, roster.clone(), &config, seed);
        Self {
            agent,
            entity,
            team,
            roster,
            config,
            controller: Box::new(controller),
            last: None,
            faults: 0,
        }
    }

    pub fn mount(&self, id: MountId) -> Option<&WeaponMount> {
        self.roster.iter().find(|m| m.id == id)
    }

    /// Publish a new configuration, bumping the version past the current
    /// one so the controller re-applies it.
    pub fn publish_config(&mut self, mut config: EngagementConfig) {
        config.version = config.version.max(self.config.version + 1);
        self.config = config;
    }
}
