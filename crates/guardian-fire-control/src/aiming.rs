//! Aim solutions and fire gates.

use glam::DVec3;

use guardian_core::components::{AgentState, WeaponMount};
use guardian_core::constants::*;
use guardian_core::types::{angle_between, Kinematics};

/// Where a direct-fire mount should point, and how far off it currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimSolution {
    pub aim_point: DVec3,
    /// Angle between the mount's aim and the line to `aim_point` (radians).
    pub error_rad: f64,
    /// Half-angle within which the trigger may be pulled (radians).
    pub cone_rad: f64,
}

impl AimSolution {
    pub fn on_target(&self) -> bool {
        self.error_rad <= self.cone_rad
    }
}

/// Predicted point of impact for a projectile of `speed` fired from
/// `shooter` at `target` (plus `aim_offset`). Beams and zero-speed
/// projectiles get no lead.
pub fn intercept_point(
    shooter: &Kinematics,
    target: &Kinematics,
    aim_offset: DVec3,
    speed: f64,
    hitscan: bool,
) -> DVec3 {
    let base = target.position + aim_offset;
    if hitscan || !(speed.is_finite() && speed > 0.0) {
        return base;
    }
    let relative_velocity = target.velocity - shooter.velocity;
    let mut time = 0.0;
    let mut point = base;
    for _ in 0..LEAD_ITERATIONS {
        point = base + relative_velocity * time + 0.5 * target.acceleration * time * time;
        time = (point - shooter.position).length() / speed;
    }
    point
}

/// Fire-cone half-angle: the baseline plus `tolerance` times the angle the
/// target subtends.
pub fn fire_cone(tolerance: f64, target_radius: f64, distance: f64) -> f64 {
    BASE_FIRE_CONE_RAD + tolerance * (target_radius / distance.max(1.0)).atan()
}

/// Current pointing direction of a mount. Turrets without a reported aim
/// are assumed slewed onto `aim_point`; fixed mounts look along the heading.
pub fn mount_direction(agent: &AgentState, mount: &WeaponMount, aim_point: DVec3) -> DVec3 {
    if let Some(dir) = agent.mount_aim(mount.id) {
        return dir;
    }
    if mount.turret {
        if let Some(dir) = (aim_point - agent.kinematics.position).try_normalize() {
            return dir;
        }
    }
    agent.heading()
}

/// Aim check for guns, rockets and beams.
pub fn direct_gate(
    agent: &AgentState,
    mount: &WeaponMount,
    aim_point: DVec3,
    tolerance: f64,
    target_radius: f64,
) -> AimSolution {
    let line = aim_point - agent.kinematics.position;
    let direction = mount_direction(agent, mount, aim_point);
    AimSolution {
        aim_point,
        error_rad: angle_between(direction, line),
        cone_rad: fire_cone(tolerance, target_radius, line.length()),
    }
}

/// Launch check for indirect fire: the target must lie within the mount's
/// off-boresight limit. Fixed launchers look along the heading, trainable
/// ones along their reported aim (anywhere when none is reported).
pub fn indirect_gate(agent: &AgentState, mount: &WeaponMount, target_position: DVec3) -> bool {
    let limit = mount.max_off_boresight_deg;
    if limit.is_nan() || limit >= 180.0 {
        return true;
    }
    let boresight = match agent.mount_aim(mount.id) {
        Some(dir) => dir,
        None if mount.turret => return true,
        None => agent.heading(),
    };
    angle_between(boresight, target_position - agent.kinematics.position) <= limit.to_radians()
}

/// Lifetime of an in-flight munition launched at a target `distance` away.
pub fn munition_lifetime(distance: f64, speed: f64) -> f64 {
    if !(speed.is_finite() && speed > 0.0 && distance.is_finite()) {
        return MAX_MUNITION_FLIGHT_SECS;
    }
    (distance / speed + MUNITION_FLIGHT_MARGIN_SECS).min(MAX_MUNITION_FLIGHT_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_core::enums::WeaponClass;
    use guardian_core::types::{AgentId, MountId, TeamId};

    fn agent() -> AgentState {
        AgentState::new(AgentId::new(1), TeamId::new(1), Kinematics::default())
    }

    #[test]
    fn test_intercept_leads_crossing_target() {
        let shooter = Kinematics::default();
        let target = Kinematics::at(DVec3::new(0.0, 1_000.0, 0.0)).with_velocity(DVec3::new(100.0, 0.0, 0.0));
        let point = intercept_point(&shooter, &target, DVec3::ZERO, 1_000.0, false);
        assert!(point.x > 90.0 && point.x < 110.0, "lead ~100 m, got {}", point.x);

        let beam = intercept_point(&shooter, &target, DVec3::ZERO, 1_000.0, true);
        assert_eq!(beam, target.position, "beams need no lead");
    }

    #[test]
    fn test_fire_cone_grows_with_tolerance() {
        let tight = fire_cone(0.0, 35.0, 1_000.0);
        let loose = fire_cone(4.0, 35.0, 1_000.0);
        assert_eq!(tight, BASE_FIRE_CONE_RAD);
        assert!(loose > tight);
        assert!((loose - tight - 4.0 * (0.035f64).atan()).abs() < 1e-12);
    }

    #[test]
    fn test_fixed_mount_gate_follows_heading() {
        let mount = WeaponMount::new(MountId::new(0), "gun", WeaponClass::Gun);
        let a = agent();
        let ahead = direct_gate(&a, &mount, DVec3::new(0.0, 1_000.0, 0.0), 1.0, 35.0);
        assert!(ahead.on_target());
        let abeam = direct_gate(&a, &mount, DVec3::new(1_000.0, 0.0, 0.0), 1.0, 35.0);
        assert!(!abeam.on_target());
    }

    #[test]
    fn test_turret_gate() {
        let mount = WeaponMount::new(MountId::new(0), "turret", WeaponClass::Gun).turret();
        let mut a = agent();
        let abeam = DVec3::new(1_000.0, 0.0, 0.0);
        assert!(direct_gate(&a, &mount, abeam, 1.0, 35.0).on_target(), "unreported turret converges");

        a.mount_aims = vec![Some(DVec3::Y)];
        assert!(!direct_gate(&a, &mount, abeam, 1.0, 35.0).on_target(), "reported aim is respected");
    }

    #[test]
    fn test_indirect_gate_respects_boresight() {
        let a = agent();
        let abeam = DVec3::new(1_000.0, 0.0, 0.0);
        let rail = WeaponMount::new(MountId::new(0), "rail", WeaponClass::Missile);
        assert!(indirect_gate(&a, &rail, abeam), "unrestricted by default");

        let rail = rail.with_max_off_boresight(60.0);
        assert!(!indirect_gate(&a, &rail, abeam));
        assert!(indirect_gate(&a, &rail, DVec3::new(500.0, 1_000.0, 0.0)));

        let launcher = WeaponMount::new(MountId::new(0), "launcher", WeaponClass::Missile)
            .turret()
            .with_max_off_boresight(30.0);
        assert!(indirect_gate(&a, &launcher, abeam), "trainable launcher slews");
    }

    #[test]
    fn test_munition_lifetime() {
        assert!((munition_lifetime(8_000.0, 800.0) - 12.0).abs() < 1e-9);
        assert_eq!(munition_lifetime(1e9, 1.0), MAX_MUNITION_FLIGHT_SECS);
        assert_eq!(munition_lifetime(1_000.0, 0.0), MAX_MUNITION_FLIGHT_SECS);
    }
}
