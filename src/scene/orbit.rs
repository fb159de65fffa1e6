//! Parametric circular orbits.
//!
//! Orbits are not integrated. Every body's position is a pure function of
//! one shared, ever-growing scene angle ([`OrbitClock`]) multiplied by the
//! body's own orbit speed, so speeds are relative multipliers rather than
//! angular velocities:
//!
//! ```text
//! φ        = radians(base_angle * orbit.speed)
//! position = center + orbit.radius * (cos φ, 0, sin φ)
//! ```
//!
//! A body with radius 0 therefore never leaves its center.

use glam::Vec3;

use super::body::{Body, Orbit};

/// Default growth rate of the shared orbit angle, in degrees per second.
pub const DEFAULT_ORBIT_RATE: f32 = 20.0;

/// The shared scene angle every orbit derives its phase from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitClock {
    angle: f32,
    rate: f32,
}

impl OrbitClock {
    /// A clock at angle 0 growing `rate` degrees per second.
    pub fn new(rate: f32) -> Self {
        Self { angle: 0.0, rate }
    }

    /// Grow the angle by `rate * dt`.
    pub fn advance(&mut self, dt: f32) {
        self.angle += self.rate * dt;
    }

    /// Current angle in degrees.
    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl Default for OrbitClock {
    fn default() -> Self {
        Self::new(DEFAULT_ORBIT_RATE)
    }
}

/// Position on `orbit` around `center` for the shared angle `base_angle` (degrees).
pub fn orbital_position(center: Vec3, orbit: Orbit, base_angle: f32) -> Vec3 {
    let phase = (base_angle * orbit.speed()).to_radians();
    center + orbit.radius() * Vec3::new(phase.cos(), 0.0, phase.sin())
}

/// Spin `body` by `dt` seconds and move it to its orbital position.
pub fn advance(body: &mut Body, center: Vec3, base_angle: f32, dt: f32) {
    body.rotation_angle += body.rotation_speed * dt;
    body.position = orbital_position(center, body.orbit(), base_angle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::body::{test_handles, BodyId};
    use rand::Rng;

    fn body(radius: f32, speed: f32) -> Body {
        Body::new(BodyId::new(0), "test", 1.0, Orbit::new(radius, speed), test_handles()).with_rotation_speed(20.0)
    }

    #[test]
    fn test_zero_radius_stays_on_center() {
        let center = Vec3::new(0.0, 0.0, -20.0);
        let mut sun = body(0.0, 0.0);
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let angle = rng.gen_range(-10_000.0..10_000.0);
            let dt = rng.gen_range(0.0..5.0);
            advance(&mut sun, center, angle, dt);
            assert_eq!(sun.position, center);
        }
    }

    #[test]
    fn test_position_on_circle() {
        let center = Vec3::new(1.0, 2.0, 3.0);
        let mut planet = body(12.0, 1.0);

        advance(&mut planet, center, 0.0, 0.0);
        assert!(planet.position.abs_diff_eq(center + Vec3::new(12.0, 0.0, 0.0), 1e-4));

        advance(&mut planet, center, 90.0, 0.0);
        assert!(planet.position.abs_diff_eq(center + Vec3::new(0.0, 0.0, 12.0), 1e-4));

        advance(&mut planet, center, 123.0, 0.0);
        assert!((planet.position.distance(center) - 12.0).abs() < 1e-4);
        assert_eq!(planet.position.y, center.y);
    }

    #[test]
    fn test_speed_multiplies_shared_angle() {
        let mut fast = body(5.0, 2.0);
        let mut slow = body(5.0, 1.0);
        advance(&mut fast, Vec3::ZERO, 45.0, 0.0);
        advance(&mut slow, Vec3::ZERO, 90.0, 0.0);
        assert!(fast.position.abs_diff_eq(slow.position, 1e-4));
    }

    #[test]
    fn test_rotation_uses_dt() {
        let mut planet = body(5.0, 1.0);
        advance(&mut planet, Vec3::ZERO, 0.0, 0.5);
        assert!((planet.rotation_angle - 10.0).abs() < 1e-5);
        advance(&mut planet, Vec3::ZERO, 0.0, 0.0);
        assert!((planet.rotation_angle - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_orbit_clock() {
        let mut clock = OrbitClock::default();
        clock.advance(0.5);
        assert!((clock.angle() - 10.0).abs() < 1e-5);
        clock.advance(0.0);
        assert!((clock.angle() - 10.0).abs() < 1e-5);
    }
}
