//! Plain-data descriptions of the agent, its weapons and the targets it sees.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{Situation, TargetingMode, WeaponClass};
use crate::types::{AgentId, Kinematics, MountId, TargetId, TeamId};

// --- Agent ---

/// The controlled agent as reported by the host each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub team: TeamId,
    pub kinematics: Kinematics,
    /// Unit heading vector. Fixed mounts aim along it.
    pub forward: DVec3,
    /// Total mass (kg).
    pub mass: f64,
    /// Number of weapons carried, compared against a target's count.
    pub weapon_count: u32,
    /// Live teammates, excluding the agent itself.
    pub teammate_count: u32,
    /// Current aim directions reported by turret drives, indexed by mount id.
    #[serde(default)]
    pub mount_aims: Vec<Option<DVec3>>,
}

impl AgentState {
    pub fn new(id: AgentId, team: TeamId, kinematics: Kinematics) -> Self {
        Self {
            id,
            team,
            kinematics,
            forward: DVec3::Y,
            mass: 10_000.0,
            weapon_count: 0,
            teammate_count: 0,
            mount_aims: Vec::new(),
        }
    }

    /// Reported aim direction of `mount`, if its drive publishes one.
    pub fn mount_aim(&self, mount: MountId) -> Option<DVec3> {
        self.mount_aims
            .get(mount.get() as usize)
            .copied()
            .flatten()
            .and_then(DVec3::try_normalize)
    }

    /// Unit forward vector, falling back to +Y for a degenerate heading.
    pub fn heading(&self) -> DVec3 {
        self.forward.try_normalize().unwrap_or(DVec3::Y)
    }
}

// --- Targets ---

/// Whatever a target is currently attacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victim {
    pub agent: AgentId,
    pub team: TeamId,
    pub is_vip: bool,
}

/// One agent currently engaging a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagedBy {
    pub agent: AgentId,
    pub team: TeamId,
}

/// Aim-point offsets from the center of mass, in world space (meters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AimPoints {
    pub command: Option<DVec3>,
    pub engine: Option<DVec3>,
    pub weapon: Option<DVec3>,
    pub mass: Option<DVec3>,
}

impl AimPoints {
    /// Offset for a fixed sub-mode. Missing parts fall back to the center of mass.
    /// `Random` is resolved by the caller, which owns the RNG.
    pub fn offset_for(&self, mode: TargetingMode) -> DVec3 {
        let part = match mode {
            TargetingMode::CenterOfMass | TargetingMode::Random => None,
            TargetingMode::Command => self.command,
            TargetingMode::Engine => self.engine,
            TargetingMode::Weapon => self.weapon,
            TargetingMode::Mass => self.mass,
        };
        part.filter(|v| v.is_finite()).unwrap_or(DVec3::ZERO)
    }
}

/// One perceived entity, as published in the shared catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub id: TargetId,
    /// `None` for neutrals, which are never engaged.
    pub team: Option<TeamId>,
    pub kinematics: Kinematics,
    #[serde(default)]
    pub situation: Situation,
    /// Total mass (kg).
    pub mass: f64,
    /// Accumulated damage, 0 = pristine, 1 = destroyed.
    #[serde(default)]
    pub damage_fraction: f64,
    #[serde(default)]
    pub weapon_count: u32,
    #[serde(default)]
    pub is_vip: bool,
    /// Externally assessed threat level in [0, 1].
    #[serde(default)]
    pub threat_level: f64,
    #[serde(default)]
    pub attacking: Option<Victim>,
    #[serde(default)]
    pub engaged_by: Vec<EngagedBy>,
    /// Physical radius (meters).
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default)]
    pub aim_points: AimPoints,
}

fn default_radius() -> f64 {
    DEFAULT_TARGET_RADIUS_M
}

impl TargetSnapshot {
    pub fn new(id: TargetId, team: Option<TeamId>, kinematics: Kinematics) -> Self {
        Self {
            id,
            team,
            kinematics,
            situation: Situation::default(),
            mass: 10_000.0,
            damage_fraction: 0.0,
            weapon_count: 0,
            is_vip: false,
            threat_level: 0.0,
            attacking: None,
            engaged_by: Vec::new(),
            radius: DEFAULT_TARGET_RADIUS_M,
            aim_points: AimPoints::default(),
        }
    }

    /// Belongs to a team other than `team`. Neutrals are never hostile.
    pub fn is_hostile_to(&self, team: TeamId) -> bool {
        matches!(self.team, Some(t) if t != team)
    }

    /// Radius usable in geometry, falling back to the default.
    pub fn effective_radius(&self) -> f64 {
        if self.radius.is_finite() && self.radius > 0.0 {
            self.radius
        } else {
            DEFAULT_TARGET_RADIUS_M
        }
    }
}

// --- Weapons ---

/// Target situations a mount can engage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEnvelope {
    pub air: bool,
    pub surface: bool,
    pub submerged: bool,
}

impl EngagementEnvelope {
    pub fn for_class(class: WeaponClass) -> Self {
        match class {
            WeaponClass::Torpedo => Self {
                air: false,
                surface: true,
                submerged: true,
            },
            _ => Self {
                air: true,
                surface: true,
                submerged: false,
            },
        }
    }

    pub fn allows(&self, situation: Situation) -> bool {
        match situation {
            Situation::Airborne => self.air,
            Situation::Surface => self.surface,
            Situation::Submerged => self.submerged,
        }
    }
}

/// One weapon mount on the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponMount {
    pub id: MountId,
    pub name: String,
    pub class: WeaponClass,
    /// Slewable turret; fixed mounts aim along the agent's heading.
    pub turret: bool,
    /// Simultaneous targets the mount can hold.
    pub max_targets: u32,
    pub barrels: u32,
    /// Cycle rate per barrel for salvo fire, launches per minute for
    /// indirect mounts.
    pub rate_of_fire_rpm: f64,
    pub min_range: f64,
    pub max_range: f64,
    /// Projectile speed (m/s). Ignored by hitscan classes.
    pub projectile_speed: f64,
    /// Remaining rounds, `None` = unlimited.
    pub ammo: Option<u32>,
    pub envelope: EngagementEnvelope,
    /// Launch cone half-angle around the mount's boresight, degrees.
    /// 180 or more launches in any direction.
    #[serde(default = "unrestricted_boresight")]
    pub max_off_boresight_deg: f64,
}

fn unrestricted_boresight() -> f64 {
    UNRESTRICTED_BORESIGHT_DEG
}

impl WeaponMount {
    /// Mount with the class defaults.
    pub fn new(id: MountId, name: impl Into<String>, class: WeaponClass) -> Self {
        let (min_range, max_range, projectile_speed, rpm) = match class {
            WeaponClass::Gun => (0.0, GUN_RANGE_M, GUN_MUZZLE_SPEED, GUN_RPM),
            WeaponClass::Rocket => (0.0, ROCKET_RANGE_M, ROCKET_SPEED, ROCKET_RPM),
            WeaponClass::Beam => (0.0, BEAM_RANGE_M, 0.0, 0.0),
            WeaponClass::Missile => (MISSILE_MIN_RANGE_M, MISSILE_RANGE_M, MISSILE_SPEED, MISSILE_RPM),
            WeaponClass::Torpedo => (0.0, TORPEDO_RANGE_M, TORPEDO_SPEED, TORPEDO_RPM),
        };
        Self {
            id,
            name: name.into(),
            class,
            turret: false,
            max_targets: 1,
            barrels: 1,
            rate_of_fire_rpm: rpm,
            min_range,
            max_range,
            projectile_speed,
            ammo: None,
            envelope: EngagementEnvelope::for_class(class),
            max_off_boresight_deg: UNRESTRICTED_BORESIGHT_DEG,
        }
    }

    pub fn turret(mut self) -> Self {
        self.turret = true;
        self
    }

    pub fn with_max_targets(mut self, max_targets: u32) -> Self {
        self.max_targets = max_targets.max(1);
        self
    }

    pub fn with_barrels(mut self, barrels: u32) -> Self {
        self.barrels = barrels.max(1);
        self
    }

    pub fn with_rate_of_fire(mut self, rpm: f64) -> Self {
        self.rate_of_fire_rpm = rpm;
        self
    }

    pub fn with_range(mut self, min_range: f64, max_range: f64) -> Self {
        self.min_range = min_range;
        self.max_range = max_range;
        self
    }

    pub fn with_projectile_speed(mut self, speed: f64) -> Self {
        self.projectile_speed = speed;
        self
    }

    pub fn with_ammo(mut self, rounds: u32) -> Self {
        self.ammo = Some(rounds);
        self
    }

    pub fn with_max_off_boresight(mut self, degrees: f64) -> Self {
        self.max_off_boresight_deg = degrees;
        self
    }

    pub fn with_envelope(mut self, envelope: EngagementEnvelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// Has rounds left (or unlimited ammunition).
    pub fn is_available(&self) -> bool {
        self.ammo != Some(0)
    }

    /// Maximum range after applying the gun-range cap to direct-fire classes.
    pub fn effective_max_range(&self, gun_range: f64) -> f64 {
        if self.class.uses_gun_range() {
            self.max_range.min(gun_range)
        } else {
            self.max_range
        }
    }

    /// Whether a target at `distance` in `situation` lies inside this mount's reach.
    pub fn can_reach(&self, situation: Situation, distance: f64, gun_range: f64) -> bool {
        self.envelope.allows(situation)
            && distance >= self.min_range
            && distance <= self.effective_max_range(gun_range)
    }
}
