//! Arena engine: the host side of the engagement controllers.
//!
//! `ArenaEngine` owns the hecs world and one `AgentSlot` per piloted hull,
//! processes arena commands, runs all systems, and produces
//! `ArenaSnapshot`s. Completely headless, enabling deterministic testing.

use std::collections::{BTreeMap, VecDeque};

use hecs::{Entity, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use guardian_core::commands::{ArenaCommand, ControllerCommand};
use guardian_core::config::EngagementConfig;
use guardian_core::constants::{TICK_RATE, TICK_RATE_RANGE, TIME_SCALE_RANGE};
use guardian_core::enums::{ArenaPhase, Scenario};
use guardian_core::events::ArenaEvent;
use guardian_core::state::ArenaSnapshot;
use guardian_core::types::{AgentId, SimTime, TeamId};

use crate::agent::{AgentController, AgentSlot};
use crate::components::{Hull, Team};
use crate::systems;
use crate::world_setup::{self, IdAllocator};

/// Configuration for starting a new arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaConfig {
    /// RNG seed for determinism. Same seed = same run.
    pub seed: u64,
    /// Ticks per simulated second at 1x.
    pub tick_rate: u32,
    /// Initial time scale (1.0 = real time).
    pub time_scale: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate: TICK_RATE,
            time_scale: 1.0,
        }
    }
}

/// The arena engine. Owns the ECS world and all hosted controllers.
pub struct ArenaEngine {
    world: World,
    time: SimTime,
    phase: ArenaPhase,
    scenario: Option<Scenario>,
    seed: u64,
    tick_rate: u32,
    time_scale: f64,
    rng: ChaCha8Rng,
    ids: IdAllocator,
    slots: BTreeMap<AgentId, AgentSlot>,
    /// Replaces the scenario's default agent configuration when set.
    agent_config: Option<EngagementConfig>,
    command_queue: VecDeque<ArenaCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<ArenaEvent>,
}

impl ArenaEngine {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            world: World::new(),
            time: SimTime::default(),
            phase: ArenaPhase::default(),
            scenario: None,
            seed: config.seed,
            tick_rate: config.tick_rate.clamp(TICK_RATE_RANGE.0, TICK_RATE_RANGE.1),
            time_scale: clamp_time_scale(config.time_scale, 1.0),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            ids: IdAllocator::default(),
            slots: BTreeMap::new(),
            agent_config: None,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Give every agent of subsequently started scenarios this configuration.
    pub fn with_agent_config(mut self, config: EngagementConfig) -> Self {
        self.agent_config = Some(config);
        self
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: ArenaCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = ArenaCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the arena by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> ArenaSnapshot {
        self.process_commands();

        if self.phase == ArenaPhase::Active {
            let dt = self.dt();
            self.run_systems(dt);
            self.time.advance(dt);
            self.check_finished();
        }

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.phase,
            self.scenario,
            self.time_scale,
            &self.slots,
            events,
        )
    }

    pub fn phase(&self) -> ArenaPhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn scenario(&self) -> Option<Scenario> {
        self.scenario
    }

    /// Simulation seconds covered by the next tick.
    pub fn dt(&self) -> f64 {
        self.time_scale / self.tick_rate as f64
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Hosted agents, in update order.
    pub fn agents(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.slots.keys().copied()
    }

    pub fn slot(&self, agent: AgentId) -> Option<&AgentSlot> {
        self.slots.get(&agent)
    }

    /// Swap the controller flying `agent`. Returns false if no such agent.
    pub fn replace_controller(&mut self, agent: AgentId, controller: Box<dyn AgentController>) -> bool {
        match self.slots.get_mut(&agent) {
            Some(slot) => {
                slot.controller = controller;
                slot.last = None;
                true
            }
            None => false,
        }
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: ArenaCommand) {
        match command {
            ArenaCommand::StartScenario { scenario } => self.start_scenario(scenario),
            ArenaCommand::Pause => {
                if self.phase == ArenaPhase::Active {
                    self.phase = ArenaPhase::Paused;
                }
            }
            ArenaCommand::Resume => {
                if self.phase == ArenaPhase::Paused {
                    self.phase = ArenaPhase::Active;
                }
            }
            ArenaCommand::SetTimeScale { scale } => {
                self.time_scale = clamp_time_scale(scale, self.time_scale);
            }
            ArenaCommand::Controller { agent, command } => match self.slots.get_mut(&agent) {
                Some(slot) => slot.controller.queue_command(command),
                None => warn!(%agent, ?command, "command for unknown agent dropped"),
            },
            ArenaCommand::SetAgentConfig { agent, config } => match self.slots.get_mut(&agent) {
                Some(slot) => slot.publish_config(config),
                None => warn!(%agent, "config for unknown agent dropped"),
            },
            ArenaCommand::Despawn { target } => {
                if systems::cleanup::despawn_target(&mut self.world, target) {
                    self.prune_slots();
                } else {
                    warn!(%target, "despawn of unknown hull ignored");
                }
            }
        }
    }

    /// Clear the world and spawn `scenario`. The RNG is re-seeded so a seed
    /// always produces the same layout.
    fn start_scenario(&mut self, scenario: Scenario) {
        self.world.clear();
        self.slots.clear();
        self.ids = IdAllocator::default();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.time = SimTime::default();

        let spawns = world_setup::setup_scenario(&mut self.world, &mut self.rng, &mut self.ids, scenario);
        for spawn in spawns {
            let seed: u64 = self.rng.gen();
            let config = self.agent_config.clone().unwrap_or(spawn.config);
            let mut slot = AgentSlot::new(spawn.agent, spawn.entity, spawn.team, spawn.roster, config, seed);
            slot.controller
                .queue_command(ControllerCommand::SetGuardMode { enabled: true });
            self.slots.insert(spawn.agent, slot);
        }

        self.scenario = Some(scenario);
        self.phase = ArenaPhase::Active;
        info!(scenario = scenario.label(), seed = self.seed, agents = self.slots.len(), "scenario started");
        self.events.push(ArenaEvent::ScenarioStarted {
            scenario,
            seed: self.seed,
        });
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        let end = self.time.elapsed_secs + dt;

        // 1. Munition homing + movement integration
        systems::movement::steer_munitions(&mut self.world);
        systems::movement::run(&mut self.world, dt);
        // 2. Perception catalog (engagement picture from last tick)
        let catalog = systems::perception::build_catalog(&self.world, &self.slots);
        // 3. Controllers
        systems::fire_control::run(&self.world, &mut self.slots, &catalog, dt, &mut self.events);
        // 4. Direct-fire hits and munition launches
        systems::attrition::resolve_shots(&mut self.world, &self.slots, &mut self.rng, dt, &mut self.events);
        // 5. Munition impacts and expiry
        let resolved = systems::attrition::resolve_munitions(
            &mut self.world,
            &mut self.rng,
            end,
            dt,
            &mut self.events,
            &mut self.despawn_buffer,
        );
        for r in resolved {
            if let Some(slot) = self.slots.get_mut(&r.shooter) {
                slot.controller
                    .queue_command(ControllerCommand::ResolveMunition { target: r.target });
            }
        }
        // 6. Cleanup of destroyed hulls
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer);
        self.prune_slots();
    }

    /// Drop agents whose hull no longer exists.
    fn prune_slots(&mut self) {
        let world = &self.world;
        self.slots.retain(|agent, slot| {
            let alive = world.contains(slot.entity);
            if !alive {
                info!(%agent, "agent lost");
            }
            alive
        });
    }

    fn check_finished(&mut self) {
        let mut teams: Vec<TeamId> = self
            .world
            .query::<(&Team, &Hull)>()
            .iter()
            .map(|(_, (team, _))| team.0)
            .collect();
        teams.sort();
        teams.dedup();
        if teams.len() <= 1 {
            let winner = teams.first().copied();
            self.phase = ArenaPhase::Finished;
            info!(?winner, tick = self.time.tick, "arena finished");
            self.events.push(ArenaEvent::Finished { winner });
        }
    }
}

fn clamp_time_scale(scale: f64, fallback: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(TIME_SCALE_RANGE.0, TIME_SCALE_RANGE.1)
    } else {
        fallback
    }
}
