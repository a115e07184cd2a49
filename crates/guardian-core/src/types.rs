//! Fundamental identifiers, kinematic state and time keeping.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $repr:ty, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> $repr {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Stable identifier of a perceived target. Lower ids win score ties.
    TargetId,
    u32,
    "T"
);
id_type!(
    /// Identifier of a combat agent.
    AgentId,
    u32,
    "A"
);
id_type!(
    /// Index of a weapon mount within an agent's roster.
    MountId,
    u16,
    "M"
);
id_type!(
    /// Team membership. Entities on the same team never engage each other.
    TeamId,
    u16,
    "team-"
);

/// Position, velocity and acceleration in world space (meters, m/s, m/s²).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: DVec3,
    pub velocity: DVec3,
    #[serde(default)]
    pub acceleration: DVec3,
}

impl Kinematics {
    /// Stationary body at `position`.
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: DVec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    /// Copy with every non-finite component replaced by zero.
    pub fn sanitized(&self) -> Self {
        Self {
            position: finite_vec(self.position),
            velocity: finite_vec(self.velocity),
            acceleration: finite_vec(self.acceleration),
        }
    }

    /// Range to another body in meters.
    pub fn range_to(&self, other: &Kinematics) -> f64 {
        self.position.distance(other.position)
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Number of ticks processed.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds. A paused host passes `dt = 0`,
    /// which still counts the tick but leaves the clock where it was.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += sanitize_dt(dt);
    }
}

/// Clamp a host-supplied tick duration to a usable value.
pub fn sanitize_dt(dt: f64) -> f64 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// `value` if finite, otherwise zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Vector with non-finite components zeroed.
pub fn finite_vec(v: DVec3) -> DVec3 {
    DVec3::new(finite_or_zero(v.x), finite_or_zero(v.y), finite_or_zero(v.z))
}

/// Angle between two directions in radians, `[0, π]`.
/// Degenerate (zero-length) inputs yield zero.
pub fn angle_between(a: DVec3, b: DVec3) -> f64 {
    let (Some(a), Some(b)) = (a.try_normalize(), b.try_normalize()) else {
        return 0.0;
    };
    a.dot(b).clamp(-1.0, 1.0).acos()
}
