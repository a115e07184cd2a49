//! The engagement controller: one per agent.
//!
//! `EngagementController` owns the weapon roster, the active configuration,
//! the engagement table, the munition ledger and the per-mount schedulers.
//! Each `tick` runs, in order:
//!
//! 1. configuration (re-sanitized when the host bumps its version)
//! 2. queued operator commands
//! 3. guard check (guard off tears everything down this tick)
//! 4. visibility filter over the shared catalog
//! 5. teardown of engagements whose target vanished or became invalid
//! 6. full scan when due, otherwise reallocation of freed mounts
//! 7. aim gates and fire scheduling
//! 8. snapshot
//!
//! Everything is synchronous and single-threaded; simulation time comes
//! only from the host's `dt`.

use std::collections::{BTreeSet, VecDeque};

use glam::DVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use guardian_core::commands::ControllerCommand;
use guardian_core::components::{AgentState, TargetSnapshot, WeaponMount};
use guardian_core::config::{EngagementConfig, TargetingFlags};
use guardian_core::constants::*;
use guardian_core::enums::{ControllerStatus, MountPhase, ReleaseReason, TargetingMode};
use guardian_core::events::EngagementEvent;
use guardian_core::state::{ControllerSnapshot, MountView, RankedScore, Shot};
use guardian_core::types::{sanitize_dt, AgentId, MountId, SimTime, TargetId};
use guardian_targeting::catalog::{TargetCatalog, TargetCatalogView, VisibilityFilter};
use guardian_targeting::features::FeatureExtractor;
use guardian_targeting::scoring::{RankedTarget, ScoringEngine};

use crate::aiming;
use crate::allocator::{AllocationLimits, AllocationPass, EngagementAllocator, MountSlot};
use crate::engagement::{Engagement, EngagementTable, InFlight, MunitionLedger};
use crate::scheduler::{FireParams, FireScheduler, GatedTarget, MountInputs, TickWindow};

/// Autonomous engagement controller for one agent.
pub struct EngagementController {
    agent: AgentId,
    /// Sorted by mount id.
    roster: Vec<WeaponMount>,
    config: EngagementConfig,
    applied_version: Option<u64>,
    guard_mode: bool,
    scoring: ScoringEngine,
    allocator: EngagementAllocator,
    scheduler: FireScheduler,
    engagements: EngagementTable,
    ledger: MunitionLedger,
    /// Ranking from the last full scan.
    ranking: Vec<RankedTarget>,
    time: SimTime,
    last_scan_at: Option<f64>,
    scan_requested: bool,
    aim_dirty: bool,
    /// Mounts whose target set changed this tick.
    changed_mounts: BTreeSet<MountId>,
    rng: ChaCha8Rng,
    command_queue: VecDeque<ControllerCommand>,
    events: Vec<EngagementEvent>,
}

impl EngagementController {
    /// Create a controller with guard mode off. `seed` drives the random
    /// targeting sub-mode.
    pub fn new(
        agent: AgentId,
        mut roster: Vec<WeaponMount>,
        config: &EngagementConfig,
        seed: u64,
    ) -> Self {
        roster.sort_by_key(|m| m.id);
        roster.dedup_by_key(|m| m.id);
        let mut controller = Self {
            agent,
            roster,
            config: EngagementConfig::default(),
            applied_version: None,
            guard_mode: false,
            scoring: ScoringEngine::new(Default::default(), FeatureExtractor::new(DEFAULT_GUARD_RANGE_M)),
            allocator: EngagementAllocator::new(),
            scheduler: FireScheduler::new(),
            engagements: EngagementTable::new(),
            ledger: MunitionLedger::new(),
            ranking: Vec::new(),
            time: SimTime::default(),
            last_scan_at: None,
            scan_requested: false,
            aim_dirty: false,
            changed_mounts: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            command_queue: VecDeque::new(),
            events: Vec::new(),
        };
        controller.apply_config(config);
        controller
    }

    /// Queue an operator command for the next tick boundary.
    pub fn queue_command(&mut self, command: ControllerCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = ControllerCommand>) {
        self.command_queue.extend(commands);
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn guard_mode(&self) -> bool {
        self.guard_mode
    }

    /// Active (sanitized) configuration.
    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub fn roster(&self) -> &[WeaponMount] {
        &self.roster
    }

    pub fn engagements(&self) -> &EngagementTable {
        &self.engagements
    }

    pub fn ledger(&self) -> &MunitionLedger {
        &self.ledger
    }

    pub fn ranking(&self) -> &[RankedTarget] {
        &self.ranking
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn mount_phase(&self, mount: MountId) -> MountPhase {
        self.scheduler.phase(mount)
    }

    /// Run one controller tick. `dt` is simulation seconds already scaled by
    /// the host; zero (paused) advances no timer.
    pub fn tick(
        &mut self,
        dt: f64,
        agent: &AgentState,
        catalog: &TargetCatalog,
        config: &EngagementConfig,
    ) -> ControllerSnapshot {
        let window = TickWindow {
            start: self.time.elapsed_secs,
            dt: sanitize_dt(dt),
        };
        self.changed_mounts.clear();

        if self.applied_version != Some(config.version) {
            self.apply_config(config);
        }
        self.process_commands();

        if !self.guard_mode {
            self.stand_down(ReleaseReason::GuardDisabled);
            self.time.advance(window.dt);
            return self.build_snapshot(Vec::new());
        }

        let filter = VisibilityFilter {
            guard_range_m: self.config.guard_range_m,
            guard_fov_deg: self.config.guard_fov_deg,
        };
        let view = TargetCatalogView::for_agent(catalog, agent, &filter);

        self.ledger.retire_expired(window.start);
        self.ledger.purge_missing(|id| catalog.contains(id));

        if self.aim_dirty {
            self.refresh_aim_offsets(&view);
        }

        let freed = self.teardown_invalid(agent, catalog, &view);

        let scan_due = self.scan_requested
            || self.last_scan_at.map_or(true, |at| {
                window.start - at + SCAN_TIME_EPSILON >= self.config.scan_interval_secs
            });
        if scan_due {
            self.scan(window.start, agent, &view);
        } else if freed {
            self.reallocate(window.start, agent, &view, AllocationPass::Immediate);
        }

        let shots = self.run_scheduler(window, agent, &view, scan_due);
        self.time.advance(window.dt);
        self.build_snapshot(shots)
    }

    // --- Configuration and commands ---

    fn apply_config(&mut self, config: &EngagementConfig) {
        self.config = config.sanitized(max_gun_range(&self.roster));
        self.applied_version = Some(config.version);
        self.scoring.set_weights(self.config.weights);
        self.scoring
            .set_extractor(FeatureExtractor::new(reference_range(&self.roster, &self.config)));
        self.aim_dirty = true;
        info!(agent = %self.agent, version = config.version, "engagement config applied");
        self.events.push(EngagementEvent::ConfigApplied {
            version: config.version,
        });
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: ControllerCommand) {
        match command {
            ControllerCommand::SetGuardMode { enabled } => {
                if enabled != self.guard_mode {
                    self.guard_mode = enabled;
                    self.scan_requested = enabled;
                    info!(agent = %self.agent, enabled, "guard mode changed");
                    self.events.push(EngagementEvent::GuardModeChanged { enabled });
                }
            }
            ControllerCommand::SetTargetingFlag { mode, enabled } => {
                let before = self.config.targeting_mode();
                self.config.targeting.set(mode, enabled);
                self.aim_dirty |= before != self.config.targeting_mode();
            }
            ControllerCommand::SetTargetingMode { mode } => {
                self.aim_dirty |= mode != self.config.targeting_mode();
                self.config.targeting = TargetingFlags::only(mode);
            }
            ControllerCommand::SetFireMode { mode } => self.config.fire_mode = mode,
            ControllerCommand::ToggleFireMode => {
                self.config.fire_mode = self.config.fire_mode.toggled();
            }
            ControllerCommand::ForceScan => self.scan_requested = true,
            ControllerCommand::SetAmmo { mount, rounds } => {
                if let Some(m) = self.roster.iter_mut().find(|m| m.id == mount) {
                    let was_available = m.is_available();
                    m.ammo = rounds;
                    if was_available && !m.is_available() {
                        self.events.push(EngagementEvent::MountDepleted { mount });
                    }
                }
            }
            ControllerCommand::ResolveMunition { target } => {
                self.ledger.resolve(target);
            }
        }
    }

    // --- Teardown ---

    /// Release everything: guard mode off.
    fn stand_down(&mut self, reason: ReleaseReason) {
        for e in self.engagements.drain() {
            self.events.push(EngagementEvent::TargetReleased {
                mount: e.mount,
                target: e.target,
                reason,
            });
        }
        for mount in self.scheduler.reset_all() {
            self.events.push(EngagementEvent::BurstEnded { mount });
        }
        self.ledger.clear();
        self.ranking.clear();
        self.last_scan_at = None;
    }

    /// Drop engagements whose target is gone, out of reach, or whose mount
    /// is dry. Returns whether anything was dropped.
    fn teardown_invalid(
        &mut self,
        agent: &AgentState,
        catalog: &TargetCatalog,
        view: &TargetCatalogView<'_>,
    ) -> bool {
        let roster = &self.roster;
        let gun_range = self.config.gun_range_m;
        let valid = |e: &Engagement| -> Result<(), ReleaseReason> {
            let mount = roster
                .iter()
                .find(|m| m.id == e.mount)
                .ok_or(ReleaseReason::CapacityReduced)?;
            if !mount.is_available() {
                return Err(ReleaseReason::Depleted);
            }
            if !catalog.contains(e.target) {
                return Err(ReleaseReason::TargetLost);
            }
            match view.get(e.target) {
                Some(t) if reachable(mount, agent, t, gun_range) => Ok(()),
                _ => Err(ReleaseReason::OutOfEnvelope),
            }
        };

        let removed = self.engagements.extract_if(|e| valid(e).is_ok());
        for e in &removed {
            let reason = valid(e).err().unwrap_or(ReleaseReason::OutOfEnvelope);
            debug!(agent = %self.agent, mount = %e.mount, target = %e.target, ?reason, "engagement torn down");
            self.changed_mounts.insert(e.mount);
            self.events.push(EngagementEvent::TargetReleased {
                mount: e.mount,
                target: e.target,
                reason,
            });
        }
        !removed.is_empty()
    }

    // --- Scan and allocation ---

    fn scan(&mut self, now: f64, agent: &AgentState, view: &TargetCatalogView<'_>) {
        self.ranking = self.scoring.rank(agent, view.iter());
        self.last_scan_at = Some(now);
        self.scan_requested = false;
        let top = self.ranking.first().map(|r| r.target);
        debug!(agent = %self.agent, candidates = self.ranking.len(), ?top, "scan completed");
        self.events.push(EngagementEvent::ScanCompleted {
            candidates: self.ranking.len(),
            top,
        });
        self.reallocate(now, agent, view, AllocationPass::Scan);
    }

    fn reallocate(
        &mut self,
        now: f64,
        agent: &AgentState,
        view: &TargetCatalogView<'_>,
        pass: AllocationPass,
    ) {
        let ranked: Vec<RankedTarget> = self
            .ranking
            .iter()
            .filter(|r| view.contains(r.target))
            .copied()
            .collect();

        let slots: Vec<MountSlot> = self
            .roster
            .iter()
            .map(|m| MountSlot {
                mount: m.id,
                indirect: m.class.is_indirect(),
                capacity: mount_capacity(m, &self.config),
                // Launchers still cycling take no new target.
                available: m.is_available()
                    && (!m.class.is_indirect() || self.scheduler.is_ready(m.id, now)),
                locked: self.scheduler.is_locked(m.id),
            })
            .collect();
        let limits = AllocationLimits {
            max_indirect_targets: self.config.multi_missile_tgt_num as usize,
            max_munitions_per_target: self.config.max_missiles_on_target as usize,
            score_hysteresis: self.config.score_hysteresis,
        };

        let roster = &self.roster;
        let gun_range = self.config.gun_range_m;
        let eligible = |mount: MountId, target: TargetId| {
            let Some(m) = roster.iter().find(|m| m.id == mount) else {
                return false;
            };
            view.get(target)
                .is_some_and(|t| reachable(m, agent, t, gun_range))
        };
        let assignments = self.allocator.allocate(
            &ranked,
            &slots,
            &self.engagements,
            &self.ledger,
            &limits,
            pass,
            eligible,
        );

        // Release pairings the allocation dropped.
        let keep: BTreeSet<(MountId, TargetId)> =
            assignments.iter().map(|a| (a.mount, a.target)).collect();
        let gaining: BTreeSet<MountId> = assignments
            .iter()
            .filter(|a| !self.engagements.holds(a.mount, a.target))
            .map(|a| a.mount)
            .collect();
        let released = self
            .engagements
            .extract_if(|e| keep.contains(&(e.mount, e.target)));
        for e in released {
            let reason = if gaining.contains(&e.mount) {
                ReleaseReason::Outscored
            } else {
                ReleaseReason::CapacityReduced
            };
            self.changed_mounts.insert(e.mount);
            self.events.push(EngagementEvent::TargetReleased {
                mount: e.mount,
                target: e.target,
                reason,
            });
        }

        let mode = self.config.targeting_mode();
        for a in assignments {
            if let Some(existing) = self.engagements.get_mut(a.mount, a.target) {
                existing.score = a.score;
                continue;
            }
            let aim_offset = match view.get(a.target) {
                Some(t) => aim_offset(&mut self.rng, mode, t),
                None => DVec3::ZERO,
            };
            self.engagements.insert(Engagement {
                mount: a.mount,
                target: a.target,
                assigned_at: now,
                score: a.score,
                aim_offset,
            });
            self.changed_mounts.insert(a.mount);
            debug!(agent = %self.agent, mount = %a.mount, target = %a.target, score = a.score, "target assigned");
            self.events.push(EngagementEvent::TargetAssigned {
                mount: a.mount,
                target: a.target,
                score: a.score,
            });
        }
    }

    fn refresh_aim_offsets(&mut self, view: &TargetCatalogView<'_>) {
        let mode = self.config.targeting_mode();
        let pairs: Vec<(MountId, TargetId)> =
            self.engagements.iter().map(|e| (e.mount, e.target)).collect();
        for (mount, target) in pairs {
            let Some(t) = view.get(target) else { continue };
            let offset = aim_offset(&mut self.rng, mode, t);
            if let Some(e) = self.engagements.get_mut(mount, target) {
                e.aim_offset = offset;
            }
        }
        self.aim_dirty = false;
    }

    // --- Fire scheduling ---

    fn run_scheduler(
        &mut self,
        window: TickWindow,
        agent: &AgentState,
        view: &TargetCatalogView<'_>,
        scan: bool,
    ) -> Vec<(MountId, Vec<Shot>)> {
        let params = FireParams {
            burst_length_secs: self.config.fire_burst_length_secs,
            fire_mode: self.config.fire_mode,
            ripple_rpm: self.config.ripple_rpm,
            barrage_stagger: self.config.barrage_stagger,
        };
        let mut fired = Vec::with_capacity(self.roster.len());

        for idx in 0..self.roster.len() {
            let mount_id = self.roster[idx].id;
            let mut engs: Vec<Engagement> = self.engagements.of_mount(mount_id).to_vec();
            engs.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.target.cmp(&b.target)));

            let (aim_point, gated) = self.gate(&self.roster[idx], agent, view, &engs);
            let inputs = MountInputs {
                mount: &self.roster[idx],
                has_targets: !engs.is_empty(),
                retargeted: self.changed_mounts.contains(&mount_id),
                scan,
                aim_point,
                gated,
            };
            let ammo = self.roster[idx].ammo;
            let outcome = self.scheduler.step(window, &params, inputs, ammo);

            if let Some(target) = outcome.burst_started {
                self.events.push(EngagementEvent::BurstStarted {
                    mount: mount_id,
                    target,
                });
            }
            if outcome.burst_ended {
                self.events.push(EngagementEvent::BurstEnded { mount: mount_id });
            }

            let used = outcome.shots.len() as u32;
            if let Some(rounds) = self.roster[idx].ammo.as_mut() {
                *rounds = rounds.saturating_sub(used);
            }

            if self.roster[idx].class.is_indirect() && !outcome.shots.is_empty() {
                self.record_launches(idx, agent, view, &outcome.shots);
            }

            if !self.roster[idx].is_available() {
                self.deplete(mount_id);
            }

            fired.push((mount_id, outcome.shots));
        }
        fired
    }

    /// Aim point of the best target and the first target whose gate passes.
    fn gate(
        &self,
        mount: &WeaponMount,
        agent: &AgentState,
        view: &TargetCatalogView<'_>,
        engs: &[Engagement],
    ) -> (Option<DVec3>, Option<GatedTarget>) {
        let mut first_aim = None;
        for e in engs {
            let Some(t) = view.get(e.target) else { continue };
            let aim_point = aiming::intercept_point(
                &agent.kinematics,
                &t.kinematics,
                e.aim_offset,
                mount.projectile_speed,
                mount.class.is_hitscan(),
            );
            if first_aim.is_none() {
                first_aim = Some(aim_point);
            }
            let passes = if mount.class.is_indirect() {
                aiming::indirect_gate(agent, mount, t.kinematics.position)
            } else {
                aiming::direct_gate(
                    agent,
                    mount,
                    aim_point,
                    self.config.firing_tolerance,
                    t.effective_radius(),
                )
                .on_target()
            };
            if passes {
                return (
                    first_aim,
                    Some(GatedTarget {
                        target: e.target,
                        aim_point,
                    }),
                );
            }
        }
        (first_aim, None)
    }

    /// Launched munitions turn their reservation into an in-flight entry.
    fn record_launches(
        &mut self,
        idx: usize,
        agent: &AgentState,
        view: &TargetCatalogView<'_>,
        shots: &[Shot],
    ) {
        let mount_id = self.roster[idx].id;
        let speed = self.roster[idx].projectile_speed;
        for shot in shots {
            let distance = view
                .get(shot.target)
                .map_or(f64::INFINITY, |t| agent.kinematics.range_to(&t.kinematics));
            let expires_at = shot.time_secs + aiming::munition_lifetime(distance, speed);
            self.ledger.record(InFlight {
                mount: mount_id,
                target: shot.target,
                launched_at: shot.time_secs,
                expires_at,
            });
            if self.engagements.remove(mount_id, shot.target).is_some() {
                self.events.push(EngagementEvent::TargetReleased {
                    mount: mount_id,
                    target: shot.target,
                    reason: ReleaseReason::Launched,
                });
            }
            self.events.push(EngagementEvent::MunitionLaunched {
                mount: mount_id,
                target: shot.target,
                expires_at_secs: expires_at,
            });
        }
        if self.engagements.of_mount(mount_id).is_empty() && self.scheduler.hold(mount_id) {
            self.events.push(EngagementEvent::BurstEnded { mount: mount_id });
        }
    }

    fn deplete(&mut self, mount: MountId) {
        let released = self.engagements.clear_mount(mount);
        if released.is_empty() && self.scheduler.phase(mount) == MountPhase::Idle {
            return;
        }
        info!(agent = %self.agent, %mount, "mount out of ammunition");
        for e in released {
            self.events.push(EngagementEvent::TargetReleased {
                mount,
                target: e.target,
                reason: ReleaseReason::Depleted,
            });
        }
        if self.scheduler.reset(mount) {
            self.events.push(EngagementEvent::BurstEnded { mount });
        }
        self.events.push(EngagementEvent::MountDepleted { mount });
    }

    // --- Snapshot ---

    fn build_snapshot(&mut self, mut fired: Vec<(MountId, Vec<Shot>)>) -> ControllerSnapshot {
        let now = self.time.elapsed_secs;
        let mounts: Vec<MountView> = self
            .roster
            .iter()
            .map(|m| {
                let mut engs: Vec<&Engagement> = self.engagements.of_mount(m.id).iter().collect();
                engs.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.target.cmp(&b.target)));
                let state = self.scheduler.state(m.id).cloned().unwrap_or_default();
                let shots = fired
                    .iter_mut()
                    .find(|(id, _)| *id == m.id)
                    .map(|(_, s)| std::mem::take(s))
                    .unwrap_or_default();
                MountView {
                    mount: m.id,
                    name: m.name.clone(),
                    class: m.class,
                    phase: state.phase,
                    targets: engs.iter().map(|e| e.target).collect(),
                    firing: state.firing,
                    fire_at: state.fire_at,
                    aim_point: state.aim_point,
                    burst_remaining_secs: state.burst_remaining(now),
                    ripple_barrel: state.ripple_barrel,
                    shots,
                    ammo: m.ammo,
                }
            })
            .collect();

        let status = if !self.guard_mode {
            ControllerStatus::GuardOff
        } else if self.engagements.is_empty() {
            ControllerStatus::NoTarget
        } else if mounts.iter().any(|m| m.phase == MountPhase::Burst) {
            ControllerStatus::Engaging
        } else {
            ControllerStatus::Scanning
        };

        let primary_target = self
            .ranking
            .iter()
            .find(|r| self.engagements.iter().any(|e| e.target == r.target))
            .map(|r| RankedScore::from(*r));

        let next_scan_in_secs = match (self.guard_mode, self.last_scan_at) {
            (true, Some(at)) => (at + self.config.scan_interval_secs - now).max(0.0),
            _ => 0.0,
        };

        ControllerSnapshot {
            agent: self.agent,
            time_secs: now,
            guard_mode: self.guard_mode,
            status,
            status_label: status.label().to_string(),
            targeting_mode: self.config.targeting_mode(),
            fire_mode: self.config.fire_mode,
            primary_target,
            ranked: self
                .ranking
                .iter()
                .take(RANKED_SNAPSHOT_LEN)
                .map(|r| RankedScore::from(*r))
                .collect(),
            mounts,
            munitions_in_flight: self.ledger.len(),
            next_scan_in_secs,
            config_version: self.config.version,
            events: std::mem::take(&mut self.events),
        }
    }
}

// --- Helpers ---

/// Longest direct-fire reach on the roster; caps the configured gun range.
fn max_gun_range(roster: &[WeaponMount]) -> f64 {
    roster
        .iter()
        .filter(|m| m.class.uses_gun_range())
        .map(|m| m.max_range)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))))
        .unwrap_or(MAX_GUN_RANGE_M)
}

/// Normalizing distance of the range feature.
fn reference_range(roster: &[WeaponMount], config: &EngagementConfig) -> f64 {
    roster
        .iter()
        .map(|m| m.effective_max_range(config.gun_range_m))
        .filter(|r| r.is_finite() && *r > 0.0)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))))
        .unwrap_or(config.guard_range_m)
}

fn mount_capacity(mount: &WeaponMount, config: &EngagementConfig) -> usize {
    let limit = if mount.class.is_indirect() {
        config.multi_missile_tgt_num
    } else {
        config.multi_target_num
    };
    mount.max_targets.min(limit).max(1) as usize
}

fn reachable(mount: &WeaponMount, agent: &AgentState, target: &TargetSnapshot, gun_range: f64) -> bool {
    let distance = agent.kinematics.range_to(&target.kinematics);
    mount.can_reach(target.situation, distance, gun_range)
}

fn aim_offset(rng: &mut ChaCha8Rng, mode: TargetingMode, target: &TargetSnapshot) -> DVec3 {
    match mode {
        TargetingMode::Random => {
            let spread = target.effective_radius() * RANDOM_AIM_DISPERSION;
            DVec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ) * spread
        }
        fixed => target.aim_points.offset_for(fixed),
    }
}
