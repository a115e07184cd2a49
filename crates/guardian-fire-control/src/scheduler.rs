//! Per-mount fire scheduling.
//!
//! Each mount runs `Idle → Scanning → Burst → Cooldown`. A mount that gains
//! a target starts aiming; the first tick its gate passes opens a burst of
//! the configured length (zero = until the target is lost or reassigned).
//! An expired burst holds in cooldown until the next scan. Within a burst
//! the barrel sequencer stamps every round with its exact scheduled time, so
//! one tick may release several rounds. The cycle clock outlives bursts and
//! retargets: a new burst never releases before the previous release plus
//! one interval.

use std::collections::BTreeMap;

use glam::DVec3;

use guardian_core::components::WeaponMount;
use guardian_core::constants::SCAN_TIME_EPSILON;
use guardian_core::enums::{FireMode, MountPhase};
use guardian_core::state::Shot;
use guardian_core::types::{MountId, TargetId};

/// Guard against pathological rates flooding a single tick.
const MAX_EVENTS_PER_TICK: usize = 1024;

/// Fire parameters taken from the active configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireParams {
    pub burst_length_secs: f64,
    pub fire_mode: FireMode,
    pub ripple_rpm: f64,
    pub barrage_stagger: f64,
}

/// Simulation-time window covered by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickWindow {
    pub start: f64,
    pub dt: f64,
}

impl TickWindow {
    pub fn end(&self) -> f64 {
        self.start + self.dt
    }
}

/// A target whose aim gate passed this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatedTarget {
    pub target: TargetId,
    pub aim_point: DVec3,
}

/// What the controller tells the scheduler about one mount this tick.
#[derive(Debug, Clone, Copy)]
pub struct MountInputs<'a> {
    pub mount: &'a WeaponMount,
    pub has_targets: bool,
    /// The mount's target set changed this tick.
    pub retargeted: bool,
    /// A full scan ran this tick.
    pub scan: bool,
    /// Aim point of the mount's best target, gated or not.
    pub aim_point: Option<DVec3>,
    pub gated: Option<GatedTarget>,
}

/// Result of stepping one mount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountOutcome {
    pub shots: Vec<Shot>,
    pub burst_started: Option<TargetId>,
    pub burst_ended: bool,
}

/// Scheduler state of one mount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountSchedule {
    pub phase: MountPhase,
    /// End of the current burst; `None` while bursting means indefinite.
    pub burst_ends_at: Option<f64>,
    pub next_event_at: f64,
    /// Earliest time the next release may happen. Survives target loss.
    pub ready_at: f64,
    pub ripple_barrel: u32,
    pub firing: bool,
    pub fire_at: Option<TargetId>,
    pub aim_point: Option<DVec3>,
}

impl MountSchedule {
    /// In a timed burst: pairings may not be displaced until it expires.
    pub fn is_locked(&self) -> bool {
        self.phase == MountPhase::Burst && self.burst_ends_at.is_some()
    }

    /// Cycled and able to release at `now`.
    pub fn is_ready(&self, now: f64) -> bool {
        self.ready_at <= now + SCAN_TIME_EPSILON
    }

    pub fn burst_remaining(&self, now: f64) -> Option<f64> {
        match self.phase {
            MountPhase::Burst => self.burst_ends_at.map(|end| (end - now).max(0.0)),
            _ => None,
        }
    }
}

/// How rounds are released within a burst.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cadence {
    /// One event per tick at the tick start.
    Continuous,
    /// One event every `interval`, releasing `barrels` rounds (salvo) or a
    /// single barrel in rotation (ripple).
    Periodic { interval: f64, salvo: bool },
}

fn cadence(mount: &WeaponMount, params: &FireParams) -> Cadence {
    if mount.class.is_continuous() {
        return Cadence::Continuous;
    }
    let ripple = params.fire_mode == FireMode::Ripple
        && mount.class.supports_ripple()
        && mount.barrels > 1;
    let rpm = if ripple { params.ripple_rpm } else { mount.rate_of_fire_rpm };
    if !(rpm.is_finite() && rpm > 0.0) {
        return Cadence::Continuous;
    }
    let cycle = 60.0 / rpm;
    if ripple {
        let stagger = 1.0 + params.barrage_stagger.max(0.0);
        Cadence::Periodic {
            interval: cycle / mount.barrels as f64 * stagger,
            salvo: false,
        }
    } else {
        Cadence::Periodic {
            interval: cycle,
            salvo: !mount.class.is_indirect(),
        }
    }
}

/// Owns the per-mount state machines.
#[derive(Debug, Clone, Default)]
pub struct FireScheduler {
    mounts: BTreeMap<MountId, MountSchedule>,
}

impl FireScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, mount: MountId) -> Option<&MountSchedule> {
        self.mounts.get(&mount)
    }

    pub fn phase(&self, mount: MountId) -> MountPhase {
        self.mounts.get(&mount).map(|s| s.phase).unwrap_or_default()
    }

    pub fn is_locked(&self, mount: MountId) -> bool {
        self.mounts.get(&mount).is_some_and(MountSchedule::is_locked)
    }

    pub fn is_ready(&self, mount: MountId, now: f64) -> bool {
        self.mounts.get(&mount).map_or(true, |s| s.is_ready(now))
    }

    /// Return a mount to idle. Reports whether a burst was cut short.
    pub fn reset(&mut self, mount: MountId) -> bool {
        let was_bursting = self.phase(mount) == MountPhase::Burst;
        self.mounts.remove(&mount);
        was_bursting
    }

    /// Return every mount to idle. Returns the mounts whose burst was cut short.
    pub fn reset_all(&mut self) -> Vec<MountId> {
        let bursting = self
            .mounts
            .iter()
            .filter(|(_, s)| s.phase == MountPhase::Burst)
            .map(|(id, _)| *id)
            .collect();
        self.mounts.clear();
        bursting
    }

    /// End any burst and hold until the next scan. Reports whether a burst ended.
    pub fn hold(&mut self, mount: MountId) -> bool {
        let state = self.mounts.entry(mount).or_default();
        let was_bursting = state.phase == MountPhase::Burst;
        state.phase = MountPhase::Cooldown;
        state.burst_ends_at = None;
        state.firing = false;
        was_bursting
    }

    /// Advance one mount through `window`. `ammo` limits rounds released.
    pub fn step(
        &mut self,
        window: TickWindow,
        params: &FireParams,
        inputs: MountInputs<'_>,
        ammo: Option<u32>,
    ) -> MountOutcome {
        let state = self.mounts.entry(inputs.mount.id).or_default();
        let mut out = MountOutcome::default();
        state.firing = false;
        state.fire_at = None;
        state.aim_point = inputs.aim_point;

        if !inputs.has_targets {
            out.burst_ended = state.phase == MountPhase::Burst;
            *state = MountSchedule {
                ripple_barrel: state.ripple_barrel,
                ready_at: state.ready_at,
                ..Default::default()
            };
            return out;
        }

        match state.phase {
            MountPhase::Idle => state.phase = MountPhase::Scanning,
            MountPhase::Cooldown if inputs.scan || inputs.retargeted => {
                state.phase = MountPhase::Scanning;
            }
            MountPhase::Burst if inputs.retargeted => {
                out.burst_ended = true;
                state.phase = MountPhase::Scanning;
                state.burst_ends_at = None;
            }
            _ => {}
        }

        if state.phase == MountPhase::Scanning {
            if let Some(gated) = inputs.gated {
                state.phase = MountPhase::Burst;
                state.burst_ends_at = (params.burst_length_secs > 0.0)
                    .then(|| window.start + params.burst_length_secs);
                state.next_event_at = window.start.max(state.ready_at);
                out.burst_started = Some(gated.target);
            }
        }

        if state.phase != MountPhase::Burst {
            return out;
        }

        match inputs.gated {
            Some(gated) => {
                state.firing = true;
                state.fire_at = Some(gated.target);
                if window.dt > 0.0 {
                    out.shots = release(state, window, params, inputs.mount, gated, ammo);
                }
            }
            // Trigger released while off target; no catch-up afterwards.
            None => state.next_event_at = state.next_event_at.max(window.end()),
        }

        if let Some(end) = state.burst_ends_at {
            if end <= window.end() {
                state.phase = MountPhase::Cooldown;
                state.burst_ends_at = None;
                out.burst_ended = true;
            }
        }
        out
    }
}

fn release(
    state: &mut MountSchedule,
    window: TickWindow,
    params: &FireParams,
    mount: &WeaponMount,
    gated: GatedTarget,
    ammo: Option<u32>,
) -> Vec<Shot> {
    let mut shots = Vec::new();
    let mut rounds_left = ammo.map(|a| a as usize).unwrap_or(usize::MAX);
    let limit = state
        .burst_ends_at
        .map_or(window.end(), |end| end.min(window.end()));
    let barrels = mount.barrels.max(1);

    let mut fire = |shots: &mut Vec<Shot>, barrel: u32, time_secs: f64| -> bool {
        if rounds_left == 0 {
            return false;
        }
        rounds_left -= 1;
        shots.push(Shot {
            target: gated.target,
            barrel,
            time_secs,
            aim_point: gated.aim_point,
        });
        true
    };

    match cadence(mount, params) {
        Cadence::Continuous => {
            fire(&mut shots, 0, window.start);
            state.next_event_at = window.end();
            state.ready_at = window.end();
        }
        Cadence::Periodic { interval, salvo } => {
            state.next_event_at = state.next_event_at.max(window.start);
            let mut events = 0;
            while state.next_event_at < limit && events < MAX_EVENTS_PER_TICK {
                let at = state.next_event_at;
                let released = if salvo {
                    (0..barrels).all(|b| fire(&mut shots, b, at))
                } else {
                    let ok = fire(&mut shots, state.ripple_barrel, at);
                    if ok {
                        state.ripple_barrel = (state.ripple_barrel + 1) % barrels;
                    }
                    ok
                };
                state.next_event_at += interval;
                if released {
                    state.ready_at = state.next_event_at;
                }
                events += 1;
                // Guided munitions leave one per target per tick.
                if !released || mount.class.is_indirect() {
                    break;
                }
            }
        }
    }
    shots
}
