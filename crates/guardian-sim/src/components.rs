//! ECS components of the arena world.
//!
//! Every hull carries `Tag`, `Body` and `Hull`. Agents add `Pilot`; aligned
//! hulls add `Team`. Guided munitions carry `Body` and `Munition` only, so
//! they never appear in the perception feed.

use glam::DVec3;

use guardian_core::constants::HULL_HEALTH;
use guardian_core::enums::Situation;
use guardian_core::types::{AgentId, Kinematics, MountId, TargetId, TeamId};

/// Identity of a hull in the perception feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag(pub TargetId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team(pub TeamId);

/// Hull flown by an engagement controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pilot(pub AgentId);

/// Motion state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub kinematics: Kinematics,
    /// Unit heading; follows the velocity while moving.
    pub forward: DVec3,
    pub situation: Situation,
}

impl Body {
    pub fn new(position: DVec3, velocity: DVec3, situation: Situation) -> Self {
        Self {
            kinematics: Kinematics::at(position).with_velocity(velocity),
            forward: velocity.try_normalize().unwrap_or(DVec3::Y),
            situation,
        }
    }

    pub fn position(&self) -> DVec3 {
        self.kinematics.position
    }
}

/// Structural state of a hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hull {
    pub mass: f64,
    pub radius: f64,
    pub health: f64,
    pub max_health: f64,
    pub weapon_count: u32,
    /// Threat level published to the perception feed, in [0, 1].
    pub threat_level: f64,
    pub is_vip: bool,
}

impl Hull {
    pub fn new(mass: f64, radius: f64) -> Self {
        Self {
            mass,
            radius,
            health: HULL_HEALTH,
            max_health: HULL_HEALTH,
            weapon_count: 0,
            threat_level: 0.0,
            is_vip: false,
        }
    }

    pub fn damage_fraction(&self) -> f64 {
        if self.max_health <= 0.0 {
            return 1.0;
        }
        (1.0 - self.health / self.max_health).clamp(0.0, 1.0)
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Subtract `damage`. Returns true if this blow destroyed the hull.
    pub fn apply_damage(&mut self, damage: f64) -> bool {
        let was_alive = !self.is_destroyed();
        self.health -= damage.max(0.0);
        was_alive && self.is_destroyed()
    }
}

/// Guided munition homing on a hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Munition {
    pub shooter: AgentId,
    pub mount: MountId,
    pub target: TargetId,
    pub speed: f64,
    /// Simulation time at which the munition self-destructs.
    pub expires_at: f64,
}
