//! Feature extraction: one normalized vector per (agent, target) pair.
//!
//! Every feature is dimensionless and bounded. Extraction never fails;
//! non-finite inputs degrade to zero and masses are floored so ratios stay
//! defined.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use guardian_core::components::{AgentState, TargetSnapshot};
use guardian_core::config::ScoringWeights;
use guardian_core::constants::*;
use guardian_core::types::{angle_between, finite_or_zero};

/// Normalized features of one target relative to one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// 1 at point blank, 0 at or beyond the reference range.
    pub range: f64,
    /// +1 airborne, 0 surface, -1 submerged.
    pub air: f64,
    /// 1 dead ahead, 0 directly astern.
    pub angle_to_target: f64,
    pub angle_over_distance: f64,
    pub acceleration: f64,
    /// 1 for imminent closure, 0 when opening or beyond the horizon.
    pub closure_time: f64,
    /// Fraction by which the target outguns the agent.
    pub weapons: f64,
    /// Log mass ratio, -1..1.
    pub mass: f64,
    pub damage: f64,
    /// Share of teammates already engaging the target.
    pub friendlies_engaging: f64,
    pub threat: f64,
    pub protect_teammate: f64,
    pub protect_vip: f64,
    pub attack_vip: f64,
}

impl FeatureVector {
    /// Weighted sum plus bias. Not clamped.
    pub fn weighted_sum(&self, w: &ScoringWeights) -> f64 {
        w.bias
            + w.range * self.range
            + w.air * self.air
            + w.angle_to_target * self.angle_to_target
            + w.angle_over_distance * self.angle_over_distance
            + w.acceleration * self.acceleration
            + w.closure_time * self.closure_time
            + w.weapons * self.weapons
            + w.mass * self.mass
            + w.damage * self.damage
            + w.friendlies_engaging * self.friendlies_engaging
            + w.threat * self.threat
            + w.protect_teammate * self.protect_teammate
            + w.protect_vip * self.protect_vip
            + w.attack_vip * self.attack_vip
    }

    pub fn as_array(&self) -> [f64; 14] {
        [
            self.range,
            self.air,
            self.angle_to_target,
            self.angle_over_distance,
            self.acceleration,
            self.closure_time,
            self.weapons,
            self.mass,
            self.damage,
            self.friendlies_engaging,
            self.threat,
            self.protect_teammate,
            self.protect_vip,
            self.attack_vip,
        ]
    }
}

/// Computes [`FeatureVector`]s. `reference_range` normalizes the range
/// feature: the longest effective reach of the agent's roster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureExtractor {
    pub reference_range: f64,
}

impl FeatureExtractor {
    pub fn new(reference_range: f64) -> Self {
        let reference_range = if reference_range.is_finite() && reference_range > 0.0 {
            reference_range
        } else {
            DEFAULT_GUARD_RANGE_M
        };
        Self { reference_range }
    }

    pub fn extract(&self, agent: &AgentState, target: &TargetSnapshot) -> FeatureVector {
        let own = agent.kinematics.sanitized();
        let other = target.kinematics.sanitized();
        let offset = other.position - own.position;
        let distance = offset.length();

        let theta = angle_between(agent.heading(), offset);
        let half_cos = (theta / 2.0).cos();

        FeatureVector {
            range: 1.0 - (distance / self.reference_range).clamp(0.0, 1.0),
            air: target.situation.air_preference(),
            angle_to_target: ((theta.cos() + 1.0) / 2.0).powi(2),
            angle_over_distance: (((half_cos * half_cos + 1.0) * AOD_REFERENCE_M
                / distance.max(AOD_MIN_DISTANCE_M))
                / 2.0)
                .clamp(0.0, 1.0),
            acceleration: ACCEL_FEATURE_SCALE
                * (other.acceleration.length() / GRAVITY).clamp(0.0, ACCEL_SATURATION_G),
            closure_time: closure_time(offset, other.velocity - own.velocity),
            weapons: weapon_advantage(target.weapon_count, agent.weapon_count),
            mass: mass_ratio(target.mass, agent.mass),
            damage: finite_or_zero(target.damage_fraction).clamp(0.0, 1.0),
            friendlies_engaging: friendlies_engaging(agent, target),
            threat: threat(agent, target),
            protect_teammate: indicator(target.attacking.is_some_and(|v| {
                v.team == agent.team && v.agent != agent.id
            })),
            protect_vip: indicator(target.attacking.is_some_and(|v| v.team == agent.team && v.is_vip)),
            attack_vip: indicator(target.is_vip),
        }
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// `1 - clamp(d / closing_speed, 0, horizon) / horizon`, zero when opening.
fn closure_time(offset: DVec3, relative_velocity: DVec3) -> f64 {
    let Some(los) = offset.try_normalize() else {
        return 1.0;
    };
    let closing_speed = -relative_velocity.dot(los);
    if closing_speed <= 0.0 {
        return 0.0;
    }
    let time = offset.length() / closing_speed;
    1.0 - time.clamp(0.0, CLOSURE_HORIZON_SECS) / CLOSURE_HORIZON_SECS
}

fn weapon_advantage(target_weapons: u32, own_weapons: u32) -> f64 {
    if target_weapons == 0 {
        return 0.0;
    }
    let tw = target_weapons as f64;
    ((tw - own_weapons as f64) / tw).max(0.0)
}

fn mass_ratio(target_mass: f64, own_mass: f64) -> f64 {
    let floor = |m: f64| finite_or_zero(m).max(MIN_MASS_KG);
    ((floor(target_mass) / floor(own_mass)).log10() / MASS_RATIO_DECADES).clamp(-1.0, 1.0)
}

fn friendlies_engaging(agent: &AgentState, target: &TargetSnapshot) -> f64 {
    if agent.teammate_count == 0 {
        return 0.0;
    }
    let others = target
        .engaged_by
        .iter()
        .filter(|e| e.team == agent.team && e.agent != agent.id)
        .count();
    (others as f64 / agent.teammate_count as f64).clamp(0.0, 1.0)
}

fn threat(agent: &AgentState, target: &TargetSnapshot) -> f64 {
    if target.attacking.is_some_and(|v| v.agent == agent.id) {
        return 1.0;
    }
    finite_or_zero(target.threat_level).clamp(0.0, 1.0)
}
