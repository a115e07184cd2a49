//! Operator-tunable engagement configuration.
//!
//! The host hands the controller an [`EngagementConfig`] every tick. The
//! controller re-sanitizes it only when `version` changes, so edits made by
//! an options screen take effect at the next tick boundary. Out-of-range
//! values are clamped, never rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::*;
use crate::enums::{FireMode, TargetingMode};
use crate::error::ConfigError;

/// Coefficients of the target scoring function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Constant added to every score.
    pub bias: f64,
    pub range: f64,
    pub air: f64,
    pub angle_to_target: f64,
    pub angle_over_distance: f64,
    pub acceleration: f64,
    pub closure_time: f64,
    pub weapons: f64,
    pub mass: f64,
    pub damage: f64,
    pub friendlies_engaging: f64,
    pub threat: f64,
    pub protect_teammate: f64,
    pub protect_vip: f64,
    pub attack_vip: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            bias: DEFAULT_TARGET_BIAS,
            range: 0.0,
            air: 0.0,
            angle_to_target: 0.0,
            angle_over_distance: DEFAULT_AOD_WEIGHT,
            acceleration: 0.0,
            closure_time: 0.0,
            weapons: 0.0,
            mass: 0.0,
            damage: 0.0,
            friendlies_engaging: DEFAULT_FRIENDLIES_WEIGHT,
            threat: 0.0,
            protect_teammate: 0.0,
            protect_vip: 0.0,
            attack_vip: 0.0,
        }
    }
}

impl ScoringWeights {
    /// All weights zero, no bias.
    pub fn zero() -> Self {
        Self {
            bias: 0.0,
            range: 0.0,
            air: 0.0,
            angle_to_target: 0.0,
            angle_over_distance: 0.0,
            acceleration: 0.0,
            closure_time: 0.0,
            weapons: 0.0,
            mass: 0.0,
            damage: 0.0,
            friendlies_engaging: 0.0,
            threat: 0.0,
            protect_teammate: 0.0,
            protect_vip: 0.0,
            attack_vip: 0.0,
        }
    }

    fn fields_mut(&mut self) -> [(&'static str, &mut f64); 15] {
        [
            ("bias", &mut self.bias),
            ("range", &mut self.range),
            ("air", &mut self.air),
            ("angle_to_target", &mut self.angle_to_target),
            ("angle_over_distance", &mut self.angle_over_distance),
            ("acceleration", &mut self.acceleration),
            ("closure_time", &mut self.closure_time),
            ("weapons", &mut self.weapons),
            ("mass", &mut self.mass),
            ("damage", &mut self.damage),
            ("friendlies_engaging", &mut self.friendlies_engaging),
            ("threat", &mut self.threat),
            ("protect_teammate", &mut self.protect_teammate),
            ("protect_vip", &mut self.protect_vip),
            ("attack_vip", &mut self.attack_vip),
        ]
    }
}

/// Checkbox view of the targeting sub-mode. At most one flag is set; all
/// clear means center of mass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingFlags {
    pub center_of_mass: bool,
    pub command: bool,
    pub engine: bool,
    pub weapon: bool,
    pub mass: bool,
    pub random: bool,
}

impl TargetingFlags {
    pub fn only(mode: TargetingMode) -> Self {
        let mut flags = Self::default();
        flags.set(mode, true);
        flags
    }

    fn flag_mut(&mut self, mode: TargetingMode) -> &mut bool {
        match mode {
            TargetingMode::CenterOfMass => &mut self.center_of_mass,
            TargetingMode::Command => &mut self.command,
            TargetingMode::Engine => &mut self.engine,
            TargetingMode::Weapon => &mut self.weapon,
            TargetingMode::Mass => &mut self.mass,
            TargetingMode::Random => &mut self.random,
        }
    }

    pub fn is_set(&self, mode: TargetingMode) -> bool {
        match mode {
            TargetingMode::CenterOfMass => self.center_of_mass,
            TargetingMode::Command => self.command,
            TargetingMode::Engine => self.engine,
            TargetingMode::Weapon => self.weapon,
            TargetingMode::Mass => self.mass,
            TargetingMode::Random => self.random,
        }
    }

    /// Set or clear one flag. Setting a flag clears every other flag.
    pub fn set(&mut self, mode: TargetingMode, enabled: bool) {
        if enabled {
            *self = Self::default();
        }
        *self.flag_mut(mode) = enabled;
    }

    /// Effective sub-mode: the first set flag in priority order, else center of mass.
    pub fn resolve(&self) -> TargetingMode {
        TargetingMode::ALL
            .into_iter()
            .find(|m| self.is_set(*m))
            .unwrap_or_default()
    }

    fn set_count(&self) -> usize {
        TargetingMode::ALL.iter().filter(|m| self.is_set(**m)).count()
    }
}

/// Versioned configuration snapshot for one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// Bumped by the host whenever any field changes.
    pub version: u64,
    /// Seconds between full rescans.
    pub scan_interval_secs: f64,
    /// Burst duration in seconds, 0 = fire until the target is lost or reassigned.
    pub fire_burst_length_secs: f64,
    /// Multiplier on the target-size term of the fire cone.
    pub firing_tolerance: f64,
    /// Full field of view around the heading (degrees).
    pub guard_fov_deg: f64,
    /// Targets beyond this range are ignored (meters).
    pub guard_range_m: f64,
    /// Cap on direct-fire engagement range (meters).
    pub gun_range_m: f64,
    /// Simultaneous targets per direct-fire mount.
    pub multi_target_num: u32,
    /// Distinct targets the indirect-fire subsystem may engage at once.
    pub multi_missile_tgt_num: u32,
    /// Indirect munitions allowed on a single target.
    pub max_missiles_on_target: u32,
    /// Score margin a challenger must exceed to displace a current target.
    pub score_hysteresis: f64,
    pub weights: ScoringWeights,
    pub targeting: TargetingFlags,
    pub fire_mode: FireMode,
    /// Ripple rate of a whole mount (rounds per minute).
    pub ripple_rpm: f64,
    /// Fractional extra spacing between ripple shots.
    pub barrage_stagger: f64,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            version: 0,
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            fire_burst_length_secs: DEFAULT_FIRE_BURST_SECS,
            firing_tolerance: DEFAULT_FIRING_TOLERANCE,
            guard_fov_deg: DEFAULT_GUARD_FOV_DEG,
            guard_range_m: DEFAULT_GUARD_RANGE_M,
            gun_range_m: DEFAULT_GUN_RANGE_M,
            multi_target_num: 1,
            multi_missile_tgt_num: 1,
            max_missiles_on_target: 1,
            score_hysteresis: DEFAULT_SCORE_HYSTERESIS,
            weights: ScoringWeights::default(),
            targeting: TargetingFlags::default(),
            fire_mode: FireMode::default(),
            ripple_rpm: DEFAULT_RIPPLE_RPM,
            barrage_stagger: 0.0,
        }
    }
}

impl EngagementConfig {
    /// Parse a (possibly partial) JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Effective targeting sub-mode.
    pub fn targeting_mode(&self) -> TargetingMode {
        self.targeting.resolve()
    }

    /// Copy with every field clamped into its valid range. `max_gun_range`
    /// is the longest direct-fire range on the roster. Non-finite values
    /// fall back to the default.
    pub fn sanitized(&self, max_gun_range: f64) -> Self {
        let defaults = Self::default();
        let mut out = self.clone();

        out.scan_interval_secs = clamp_f64(
            "scan_interval_secs",
            out.scan_interval_secs,
            SCAN_INTERVAL_RANGE,
            defaults.scan_interval_secs,
        );
        out.fire_burst_length_secs = clamp_f64(
            "fire_burst_length_secs",
            out.fire_burst_length_secs,
            FIRE_BURST_RANGE,
            defaults.fire_burst_length_secs,
        );
        out.firing_tolerance = clamp_f64(
            "firing_tolerance",
            out.firing_tolerance,
            FIRING_TOLERANCE_RANGE,
            defaults.firing_tolerance,
        );
        out.guard_fov_deg = clamp_f64(
            "guard_fov_deg",
            out.guard_fov_deg,
            GUARD_FOV_RANGE_DEG,
            defaults.guard_fov_deg,
        );
        out.guard_range_m = clamp_f64(
            "guard_range_m",
            out.guard_range_m,
            GUARD_RANGE_M,
            defaults.guard_range_m,
        );
        let gun_ceiling = if max_gun_range.is_finite() && max_gun_range > 0.0 {
            max_gun_range
        } else {
            MAX_GUN_RANGE_M
        };
        out.gun_range_m = clamp_f64(
            "gun_range_m",
            out.gun_range_m,
            (0.0, gun_ceiling),
            defaults.gun_range_m.min(gun_ceiling),
        );
        out.multi_target_num = clamp_u32("multi_target_num", out.multi_target_num, MULTI_TARGET_RANGE);
        out.multi_missile_tgt_num = clamp_u32(
            "multi_missile_tgt_num",
            out.multi_missile_tgt_num,
            MULTI_TARGET_RANGE,
        );
        out.max_missiles_on_target = clamp_u32(
            "max_missiles_on_target",
            out.max_missiles_on_target,
            MISSILES_ON_TARGET_RANGE,
        );
        out.score_hysteresis = clamp_f64(
            "score_hysteresis",
            out.score_hysteresis,
            HYSTERESIS_RANGE,
            defaults.score_hysteresis,
        );
        out.ripple_rpm = clamp_f64("ripple_rpm", out.ripple_rpm, RIPPLE_RPM_RANGE, defaults.ripple_rpm);
        out.barrage_stagger = clamp_f64(
            "barrage_stagger",
            out.barrage_stagger,
            BARRAGE_STAGGER_RANGE,
            defaults.barrage_stagger,
        );

        for (name, value) in out.weights.fields_mut() {
            *value = clamp_f64(name, *value, WEIGHT_RANGE, 0.0);
        }

        if out.targeting.set_count() > 1 {
            let mode = out.targeting.resolve();
            warn!(?mode, "multiple targeting flags set, keeping the first");
            out.targeting = TargetingFlags::only(mode);
        }

        out
    }
}

fn clamp_f64(field: &str, value: f64, (lo, hi): (f64, f64), fallback: f64) -> f64 {
    if !value.is_finite() {
        warn!(field, value, fallback, "non-finite config value replaced");
        return fallback;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        warn!(field, value, clamped, "config value clamped");
    }
    clamped
}

fn clamp_u32(field: &str, value: u32, (lo, hi): (u32, u32)) -> u32 {
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        warn!(field, value, clamped, "config value clamped");
    }
    clamped
}
