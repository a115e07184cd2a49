//! Controller constants, configuration ranges and defaults.

// --- Physics ---

/// Standard gravity (m/s²).
pub const GRAVITY: f64 = 9.81;

// --- Feature normalization ---

/// Closure times at or beyond this horizon score zero (seconds).
pub const CLOSURE_HORIZON_SECS: f64 = 60.0;

/// Acceleration saturates at this many g.
pub const ACCEL_SATURATION_G: f64 = 10.0;

/// Scale applied to the saturated acceleration ratio.
pub const ACCEL_FEATURE_SCALE: f64 = 0.1;

/// Reference distance of the angle-over-distance feature (meters).
pub const AOD_REFERENCE_M: f64 = 100.0;

/// Distances below this count as this for angle-over-distance (meters).
pub const AOD_MIN_DISTANCE_M: f64 = 10.0;

/// Mass ratio decades mapped onto [-1, 1].
pub const MASS_RATIO_DECADES: f64 = 2.0;

/// Lower bound for any mass entering a ratio (kg).
pub const MIN_MASS_KG: f64 = 1.0;

// --- Aiming ---

/// Baseline half-angle of the fire cone (radians, 2°).
pub const BASE_FIRE_CONE_RAD: f64 = 2.0 * std::f64::consts::PI / 180.0;

/// Target radius used when the feed reports none (meters).
pub const DEFAULT_TARGET_RADIUS_M: f64 = 35.0;

/// Fixed-point iterations when solving for the intercept point.
pub const LEAD_ITERATIONS: usize = 4;

/// Default launch cone of an indirect mount: any direction (degrees).
pub const UNRESTRICTED_BORESIGHT_DEG: f64 = 360.0;

/// Extra lifetime added to an in-flight munition's estimated flight time (seconds).
pub const MUNITION_FLIGHT_MARGIN_SECS: f64 = 2.0;

/// Upper bound on an in-flight munition's lifetime (seconds).
pub const MAX_MUNITION_FLIGHT_SECS: f64 = 120.0;

// --- Configuration ranges ---

pub const SCAN_INTERVAL_RANGE: (f64, f64) = (0.5, 60.0);
pub const FIRE_BURST_RANGE: (f64, f64) = (0.0, 10.0);
pub const FIRING_TOLERANCE_RANGE: (f64, f64) = (0.0, 4.0);
pub const GUARD_FOV_RANGE_DEG: (f64, f64) = (10.0, 360.0);
pub const GUARD_RANGE_M: (f64, f64) = (100.0, 200_000.0);
pub const MULTI_TARGET_RANGE: (u32, u32) = (1, 10);
pub const MISSILES_ON_TARGET_RANGE: (u32, u32) = (1, 18);
pub const HYSTERESIS_RANGE: (f64, f64) = (0.0, 10.0);
pub const WEIGHT_RANGE: (f64, f64) = (-10.0, 10.0);
pub const RIPPLE_RPM_RANGE: (f64, f64) = (1.0, 3000.0);
pub const BARRAGE_STAGGER_RANGE: (f64, f64) = (0.0, 0.1);

/// Gun range ceiling when the roster carries no direct-fire mount (meters).
pub const MAX_GUN_RANGE_M: f64 = 10_000.0;

// --- Configuration defaults ---

pub const DEFAULT_SCAN_INTERVAL_SECS: f64 = 3.0;
pub const DEFAULT_FIRE_BURST_SECS: f64 = 0.0;
pub const DEFAULT_FIRING_TOLERANCE: f64 = 1.0;
pub const DEFAULT_GUARD_FOV_DEG: f64 = 360.0;
pub const DEFAULT_GUARD_RANGE_M: f64 = 20_000.0;
pub const DEFAULT_GUN_RANGE_M: f64 = 2_500.0;
pub const DEFAULT_SCORE_HYSTERESIS: f64 = 0.1;
pub const DEFAULT_RIPPLE_RPM: f64 = 650.0;
pub const DEFAULT_TARGET_BIAS: f64 = 1.3;
pub const DEFAULT_AOD_WEIGHT: f64 = 2.0;
pub const DEFAULT_FRIENDLIES_WEIGHT: f64 = -1.0;

// --- Weapon class defaults ---

pub const GUN_RANGE_M: f64 = 2_500.0;
pub const GUN_MUZZLE_SPEED: f64 = 1_000.0;
pub const GUN_RPM: f64 = 600.0;
pub const ROCKET_RANGE_M: f64 = 3_000.0;
pub const ROCKET_SPEED: f64 = 600.0;
pub const ROCKET_RPM: f64 = 120.0;
pub const BEAM_RANGE_M: f64 = 2_000.0;
pub const MISSILE_MIN_RANGE_M: f64 = 500.0;
pub const MISSILE_RANGE_M: f64 = 15_000.0;
pub const MISSILE_SPEED: f64 = 800.0;
pub const MISSILE_RPM: f64 = 30.0;
pub const TORPEDO_RANGE_M: f64 = 8_000.0;
pub const TORPEDO_SPEED: f64 = 40.0;
pub const TORPEDO_RPM: f64 = 10.0;

// --- Arena ---

/// Arena tick rate (Hz).
pub const TICK_RATE: u32 = 30;

/// Seconds per arena tick at 1x time scale.
pub const TICK_DT: f64 = 1.0 / TICK_RATE as f64;

/// Accepted arena time scales.
pub const TIME_SCALE_RANGE: (f64, f64) = (0.0, 8.0);

/// Accepted arena tick rates (Hz).
pub const TICK_RATE_RANGE: (u32, u32) = (1, 240);

/// Hulls beyond this distance from the origin turn back (meters).
pub const ARENA_RADIUS_M: f64 = 12_000.0;

/// Starting health of every hull.
pub const HULL_HEALTH: f64 = 100.0;

/// Angular spread of direct-fire rounds used by the hit roll (radians).
pub const SHOT_DISPERSION_RAD: f64 = 0.01;

/// Damage per connecting round.
pub const GUN_ROUND_DAMAGE: f64 = 2.0;
pub const ROCKET_DAMAGE: f64 = 12.0;

/// Beam damage per second on target.
pub const BEAM_DAMAGE_PER_SEC: f64 = 20.0;

/// Guided munition kill probability and damage on impact.
pub const MUNITION_HIT_PROBABILITY: f64 = 0.75;
pub const MUNITION_DAMAGE: f64 = 60.0;

// --- Controller ---

/// Random-mode aim offsets fall within this fraction of the target radius.
pub const RANDOM_AIM_DISPERSION: f64 = 0.5;

/// Ranked candidates published in each snapshot.
pub const RANKED_SNAPSHOT_LEN: usize = 5;

/// Slack when comparing accumulated simulation time against the scan interval.
pub const SCAN_TIME_EPSILON: f64 = 1e-9;
