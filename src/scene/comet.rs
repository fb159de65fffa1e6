//! Comets on focus-centered elliptical orbits, with fading trails.
//!
//! The head follows the polar form of a conic with the orbit center at one
//! focus:
//!
//! ```text
//! r(θ) = a (1 - e²) / (1 + e cos θ)
//! ```
//!
//! so a comet sweeps close past the center at `θ = 0` and far out at
//! `θ = π`. The trail samples the head at a fixed simulated-time interval
//! and keeps the newest point at the front.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::body::Body;
use crate::render::{TrailHandle, TrailVertex};

/// Default trail length.
pub const MAX_TRAIL_POINTS: usize = 150;
/// Default simulated seconds between trail samples.
pub const TRAIL_SAMPLE_INTERVAL: f32 = 0.1;
/// Default orbit angle growth in radians per second.
pub const COMET_ANGULAR_SPEED: f32 = 0.5;
/// Age increment of [`TrailAging::FixedStep`]: one frame at 60 Hz.
pub const FIXED_AGING_STEP: f32 = 0.016;
/// Age at which a trail point has faded out completely.
pub const TRAIL_FADE_AGE: f32 = 10.0;

/// How much trail points age on each update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrailAging {
    /// Add `step` per update, whatever the frame time. Fade speed then
    /// depends on frame rate.
    FixedStep {
        /// Seconds added per update.
        step: f32,
    },
    /// Add the update's dt, so fading follows simulated time.
    Elapsed,
}

impl TrailAging {
    /// Age added by an update covering `dt` seconds.
    pub fn increment(&self, dt: f32) -> f32 {
        match *self {
            TrailAging::FixedStep { step } => step,
            TrailAging::Elapsed => dt,
        }
    }
}

impl Default for TrailAging {
    fn default() -> Self {
        TrailAging::FixedStep {
            step: FIXED_AGING_STEP,
        }
    }
}

/// One sampled head position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    /// Where the head was.
    pub position: Vec3,
    /// Seconds since sampled, as counted by the aging policy.
    pub age: f32,
    /// `1 / (1 + 0.1 d)` for distance `d` to the sun at sampling time.
    pub brightness: f32,
}

impl TrailPoint {
    /// Premultiplied RGBA: bluish white, whiter when bright, fading with age.
    pub fn color(&self) -> Vec4 {
        let fade = (1.0 - self.age / TRAIL_FADE_AGE).max(0.0);
        let b = self.brightness;
        let rgb = Vec3::new(0.7 + 0.3 * b, 0.8 + 0.2 * b, 1.0) * fade;
        rgb.extend(fade)
    }
}

/// Brightness of a trail point `distance` away from the sun.
pub fn brightness_at(distance: f32) -> f32 {
    1.0 / (1.0 + 0.1 * distance)
}

/// Bounded history of head positions, newest first.
#[derive(Debug, Clone)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
    max_len: usize,
    sample_interval: f32,
    since_sample: f32,
    aging: TrailAging,
}

impl Trail {
    /// An empty trail. The first update always samples.
    pub fn new(max_len: usize, sample_interval: f32, aging: TrailAging) -> Self {
        Self {
            points: VecDeque::with_capacity(max_len + 1),
            max_len,
            sample_interval,
            since_sample: sample_interval,
            aging,
        }
    }

    /// Sample `head` if the interval has passed, age every point, then trim.
    ///
    /// Returns whether a point was added.
    pub fn update(&mut self, head: Vec3, sun: Vec3, dt: f32) -> bool {
        self.since_sample += dt;
        let sampled = self.since_sample >= self.sample_interval;
        if sampled {
            self.since_sample = 0.0;
            self.points.push_front(TrailPoint {
                position: head,
                age: 0.0,
                brightness: brightness_at(head.distance(sun)),
            });
        }

        let step = self.aging.increment(dt);
        for point in &mut self.points {
            point.age += step;
        }

        self.points.truncate(self.max_len);
        sampled
    }

    /// Points, newest first.
    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    /// Newest point.
    pub fn newest(&self) -> Option<&TrailPoint> {
        self.points.front()
    }

    /// Oldest point.
    pub fn oldest(&self) -> Option<&TrailPoint> {
        self.points.back()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum number of points.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// The aging policy in use.
    pub fn aging(&self) -> TrailAging {
        self.aging
    }

    /// Line strip vertices, newest first.
    pub fn vertices(&self) -> Vec<TrailVertex> {
        self.points
            .iter()
            .map(|p| TrailVertex {
                position: p.position.to_array(),
                color: p.color().to_array(),
            })
            .collect()
    }
}

/// A focus-centered ellipse in the XZ plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalOrbit {
    /// The focus.
    pub center: Vec3,
    /// `a`.
    pub semi_major_axis: f32,
    /// `e`, in `[0, 1)`. Not checked here.
    pub eccentricity: f32,
}

impl EllipticalOrbit {
    /// Distance from the focus at orbit angle `theta` (radians).
    pub fn radius_at(&self, theta: f32) -> f32 {
        let e = self.eccentricity;
        self.semi_major_axis * (1.0 - e * e) / (1.0 + e * theta.cos())
    }

    /// World position at orbit angle `theta` (radians).
    pub fn position_at(&self, theta: f32) -> Vec3 {
        let r = self.radius_at(theta);
        self.center + Vec3::new(r * theta.cos(), 0.0, r * theta.sin())
    }
}

/// A comet head, its orbit and its trail.
#[derive(Debug, Clone)]
pub struct Comet {
    /// The head, drawn like any other body.
    pub head: Body,
    /// Orbit geometry.
    pub orbit: EllipticalOrbit,
    /// Current orbit angle in radians.
    pub angle: f32,
    /// Orbit angle growth in radians per second.
    pub angular_speed: f32,
    /// Fading history.
    pub trail: Trail,
    /// Backend buffer the trail is uploaded to.
    pub trail_handle: TrailHandle,
}

impl Comet {
    /// Place the head at `angle` on `orbit`.
    pub fn new(head: Body, orbit: EllipticalOrbit, angle: f32, trail: Trail, trail_handle: TrailHandle) -> Self {
        let mut comet = Self {
            head,
            orbit,
            angle,
            angular_speed: COMET_ANGULAR_SPEED,
            trail,
            trail_handle,
        };
        comet.head.position = orbit.position_at(angle);
        comet
    }

    /// Set the orbit angle growth in radians per second.
    pub fn with_angular_speed(mut self, speed: f32) -> Self {
        self.angular_speed = speed;
        self
    }

    /// Move the head `dt` seconds along its orbit and update the trail.
    pub fn advance(&mut self, dt: f32, sun_position: Vec3) {
        self.angle += self.angular_speed * dt;
        self.head.position = self.orbit.position_at(self.angle);
        self.head.rotation_angle += self.head.rotation_speed * dt;
        self.trail.update(self.head.position, sun_position, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::body::{test_handles, BodyId, Orbit};
    use std::f32::consts::PI;

    fn halley() -> EllipticalOrbit {
        EllipticalOrbit {
            center: Vec3::new(0.0, 0.0, -20.0),
            semi_major_axis: 45.0,
            eccentricity: 0.85,
        }
    }

    fn comet(orbit: EllipticalOrbit) -> Comet {
        let head = Body::new(BodyId::new(100), "Halley", 0.05, Orbit::STATIONARY, test_handles());
        let trail = Trail::new(MAX_TRAIL_POINTS, TRAIL_SAMPLE_INTERVAL, TrailAging::default());
        Comet::new(head, orbit, 0.0, trail, TrailHandle::new(0))
    }

    #[test]
    fn test_perihelion_and_aphelion() {
        for e in [0.1, 0.5, 0.7, 0.85, 0.99] {
            let orbit = EllipticalOrbit {
                eccentricity: e,
                ..halley()
            };
            let near = orbit.radius_at(0.0);
            let far = orbit.radius_at(PI);
            for i in 1..64 {
                let r = orbit.radius_at(i as f32 * PI / 64.0);
                assert!(r > near && r < far, "e = {}: r = {}", e, r);
            }
            assert!((near - 45.0 * (1.0 - e)).abs() < 1e-3);
            assert!((far - 45.0 * (1.0 + e)).abs() < 1e-2);
        }
    }

    #[test]
    fn test_circle_when_not_eccentric() {
        let orbit = EllipticalOrbit {
            eccentricity: 0.0,
            ..halley()
        };
        assert!((orbit.radius_at(0.0) - orbit.radius_at(2.0)).abs() < 1e-5);
    }

    #[test]
    fn test_head_follows_orbit() {
        let mut c = comet(halley());
        c.advance(2.0, Vec3::new(0.0, 0.0, -20.0));
        assert!((c.angle - 1.0).abs() < 1e-6);
        assert!(c.head.position.abs_diff_eq(halley().position_at(1.0), 1e-4));
        assert_eq!(c.head.position.y, 0.0);
    }

    #[test]
    fn test_first_update_samples() {
        let mut trail = Trail::new(10, 0.1, TrailAging::default());
        assert!(trail.update(Vec3::X, Vec3::ZERO, 0.0));
        assert_eq!(trail.len(), 1);
        assert!(!trail.update(Vec3::Y, Vec3::ZERO, 0.05));
        assert_eq!(trail.len(), 1);
        assert!(trail.update(Vec3::Z, Vec3::ZERO, 0.05));
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.newest().map(|p| p.position), Some(Vec3::Z));
    }

    #[test]
    fn test_trail_capped_with_newest_first() {
        let mut trail = Trail::new(MAX_TRAIL_POINTS, TRAIL_SAMPLE_INTERVAL, TrailAging::default());
        for i in 0..(MAX_TRAIL_POINTS + 50) {
            let head = Vec3::new(i as f32, 0.0, 0.0);
            assert!(trail.update(head, Vec3::ZERO, 0.1));
            assert!(trail.len() <= MAX_TRAIL_POINTS);
            assert_eq!(trail.newest().map(|p| p.position), Some(head));
        }
        assert_eq!(trail.len(), MAX_TRAIL_POINTS);
        // Oldest survivors are the most recent `max` samples
        assert_eq!(trail.oldest().map(|p| p.position.x), Some(50.0));
    }

    #[test]
    fn test_ages_increase_towards_back() {
        let mut trail = Trail::new(20, 0.1, TrailAging::default());
        for _ in 0..10 {
            trail.update(Vec3::ZERO, Vec3::ZERO, 0.1);
        }
        let ages: Vec<f32> = trail.points().map(|p| p.age).collect();
        assert!(ages.windows(2).all(|w| w[0] < w[1]));
        // New points age on the update that adds them
        assert!((ages[0] - FIXED_AGING_STEP).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_step_ignores_dt() {
        let mut trail = Trail::new(5, 0.1, TrailAging::FixedStep { step: 0.016 });
        trail.update(Vec3::ZERO, Vec3::ZERO, 0.0);
        trail.update(Vec3::ZERO, Vec3::ZERO, 0.0);
        trail.update(Vec3::ZERO, Vec3::ZERO, 0.0);
        assert_eq!(trail.len(), 1);
        assert!((trail.newest().map_or(0.0, |p| p.age) - 0.048).abs() < 1e-6);
    }

    #[test]
    fn test_elapsed_aging_follows_dt() {
        let mut trail = Trail::new(5, 10.0, TrailAging::Elapsed);
        trail.update(Vec3::ZERO, Vec3::ZERO, 0.25);
        trail.update(Vec3::ZERO, Vec3::ZERO, 0.5);
        assert!((trail.newest().map_or(0.0, |p| p.age) - 0.75).abs() < 1e-6);

        trail.update(Vec3::ZERO, Vec3::ZERO, 0.0);
        assert!((trail.newest().map_or(0.0, |p| p.age) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_brightness_falls_with_distance() {
        assert_eq!(brightness_at(0.0), 1.0);
        assert!((brightness_at(10.0) - 0.5).abs() < 1e-6);

        let mut trail = Trail::new(5, 0.1, TrailAging::default());
        trail.update(Vec3::new(30.0, 0.0, 0.0), Vec3::ZERO, 0.1);
        assert!((trail.newest().map_or(0.0, |p| p.brightness) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_color_fades_out() {
        let fresh = TrailPoint {
            position: Vec3::ZERO,
            age: 0.0,
            brightness: 1.0,
        };
        assert!(fresh.color().abs_diff_eq(Vec4::ONE, 1e-6));

        let old = TrailPoint { age: 12.0, ..fresh };
        assert_eq!(old.color(), Vec4::ZERO);

        let half = TrailPoint { age: 5.0, brightness: 0.0, ..fresh };
        assert!(half.color().abs_diff_eq(Vec4::new(0.35, 0.4, 0.5, 0.5), 1e-6));
    }

    #[test]
    fn test_vertices_match_points() {
        let mut c = comet(halley());
        for _ in 0..5 {
            c.advance(0.1, Vec3::new(0.0, 0.0, -20.0));
        }
        let vertices = c.trail.vertices();
        assert_eq!(vertices.len(), c.trail.len());
        assert_eq!(vertices[0].position, c.head.position.to_array());
    }
}
