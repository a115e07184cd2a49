//! Enumeration types used throughout the controller.

use serde::{Deserialize, Serialize};

/// Weapon family. Each variant carries its own rules for gating,
/// munition accounting and barrel sequencing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    /// Ballistic projectile weapon.
    #[default]
    Gun,
    /// Unguided rocket pod.
    Rocket,
    /// Continuous directed-energy weapon.
    Beam,
    /// Guided missile (indirect fire).
    Missile,
    /// Guided torpedo (indirect fire).
    Torpedo,
}

impl WeaponClass {
    pub const ALL: [WeaponClass; 5] = [
        WeaponClass::Gun,
        WeaponClass::Rocket,
        WeaponClass::Beam,
        WeaponClass::Missile,
        WeaponClass::Torpedo,
    ];

    /// Guided munitions: launched once per engagement and tracked in flight.
    pub fn is_indirect(self) -> bool {
        matches!(self, WeaponClass::Missile | WeaponClass::Torpedo)
    }

    /// Multi-barrel sequencing applies (beams fire continuously).
    pub fn supports_ripple(self) -> bool {
        matches!(self, WeaponClass::Gun | WeaponClass::Rocket)
    }

    /// Effective range is capped by the configured gun range.
    pub fn uses_gun_range(self) -> bool {
        !self.is_indirect()
    }

    /// Fires for the whole tick instead of discrete events.
    pub fn is_continuous(self) -> bool {
        matches!(self, WeaponClass::Beam)
    }

    /// Projectiles arrive instantly; no lead is computed.
    pub fn is_hitscan(self) -> bool {
        matches!(self, WeaponClass::Beam)
    }
}

/// Which part of a target the controller aims at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingMode {
    /// Center of mass.
    #[default]
    CenterOfMass,
    /// Command module / cockpit.
    Command,
    /// Propulsion.
    Engine,
    /// Weapon hardpoints.
    Weapon,
    /// Heaviest part.
    Mass,
    /// Random point within the target's radius, re-rolled per engagement.
    Random,
}

impl TargetingMode {
    /// Priority order used when several flags are set at once.
    pub const ALL: [TargetingMode; 6] = [
        TargetingMode::CenterOfMass,
        TargetingMode::Command,
        TargetingMode::Engine,
        TargetingMode::Weapon,
        TargetingMode::Mass,
        TargetingMode::Random,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TargetingMode::CenterOfMass => "CoM",
            TargetingMode::Command => "Command",
            TargetingMode::Engine => "Engine",
            TargetingMode::Weapon => "Weapon",
            TargetingMode::Mass => "Mass",
            TargetingMode::Random => "Random",
        }
    }
}

/// Barrel sequencing for multi-barrel mounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireMode {
    /// All barrels together.
    Salvo,
    /// One barrel at a time at the ripple rate.
    #[default]
    Ripple,
}

impl FireMode {
    pub fn toggled(self) -> Self {
        match self {
            FireMode::Salvo => FireMode::Ripple,
            FireMode::Ripple => FireMode::Salvo,
        }
    }
}

/// Per-mount fire scheduling state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MountPhase {
    /// No target assigned.
    #[default]
    Idle,
    /// Target assigned, waiting for the aim gate.
    Scanning,
    /// Trigger held.
    Burst,
    /// Burst finished, holding until the next scan.
    Cooldown,
}

/// Medium a target currently occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Situation {
    Airborne,
    #[default]
    Surface,
    Submerged,
}

impl Situation {
    /// Value of the air-preference feature.
    pub fn air_preference(self) -> f64 {
        match self {
            Situation::Airborne => 1.0,
            Situation::Surface => 0.0,
            Situation::Submerged => -1.0,
        }
    }
}

/// Summary status shown to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerStatus {
    #[default]
    GuardOff,
    NoTarget,
    Scanning,
    Engaging,
}

impl ControllerStatus {
    pub fn label(self) -> &'static str {
        match self {
            ControllerStatus::GuardOff => "Guard off",
            ControllerStatus::NoTarget => "No target",
            ControllerStatus::Scanning => "Scanning",
            ControllerStatus::Engaging => "Engaging",
        }
    }
}

/// Why an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseReason {
    /// Target no longer in the perception feed.
    TargetLost,
    /// Target present but outside guard range, field of view, the mount's
    /// envelope, or no longer hostile.
    OutOfEnvelope,
    /// A better target won the scan by more than the hysteresis margin.
    Outscored,
    /// Capacity limits shrank below the current assignment count.
    CapacityReduced,
    /// Mount ran out of ammunition.
    Depleted,
    /// Indirect munition left the rail; the reservation became an in-flight entry.
    Launched,
    /// Guard mode switched off.
    GuardDisabled,
}

// --- Arena ---

/// Arena lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArenaPhase {
    /// No scenario loaded.
    #[default]
    Setup,
    Active,
    Paused,
    /// At most one team has hulls left.
    Finished,
}

/// Seeded arena layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// One armed agent per side at gun range.
    #[default]
    Duel,
    /// Three mixed-loadout agents per side.
    Skirmish,
    /// A single defender against a drone swarm.
    Swarm,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Duel, Scenario::Skirmish, Scenario::Swarm];

    pub fn label(self) -> &'static str {
        match self {
            Scenario::Duel => "duel",
            Scenario::Skirmish => "skirmish",
            Scenario::Swarm => "swarm",
        }
    }

    /// Parse a lowercase label as printed by [`Scenario::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }
}
