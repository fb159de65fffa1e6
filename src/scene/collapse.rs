//! The "black hole" collapse effect.
//!
//! While active, every roster body slides from where it was at activation
//! toward a single point and shrinks to nothing over a fixed duration. Two
//! snapshots drive it, both keyed by [`BodyId`]:
//!
//! - `captured`, retaken on every activation: the interpolation source
//! - `baseline`, taken once after the starting layout: what Reset restores
//!
//! ```text
//!            activate                          reset
//! Inactive ───────────▶ Active { since } ───────────▶ Inactive
//!    ▲                                                   │
//!    └───────────────────────────────────────────────────┘
//! ```
//!
//! Times are simulated seconds, so pausing the scene freezes the ramp.

use glam::Vec3;
use std::collections::HashMap;

use super::body::{Body, BodyId};

/// Default seconds from activation to full collapse.
pub const DEFAULT_DURATION: f32 = 6.0;

/// Position and scale of one body at one moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    /// World position.
    pub position: Vec3,
    /// Scale.
    pub scale: Vec3,
}

impl Snapshot {
    /// Record `body`.
    pub fn of(body: &Body) -> Self {
        Self {
            position: body.position,
            scale: body.scale,
        }
    }

    /// Write this snapshot back into `body`.
    pub fn restore(&self, body: &mut Body) {
        body.position = self.position;
        body.scale = self.scale;
    }
}

/// Collapse state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollapsePhase {
    /// Bodies follow their orbits.
    Inactive,
    /// Bodies are collapsing.
    Active {
        /// Simulated time of activation.
        activated_at: f32,
    },
}

/// The collapse effect and its snapshots.
#[derive(Debug, Clone)]
pub struct CollapseEffect {
    center: Vec3,
    duration: f32,
    strength: f32,
    phase: CollapsePhase,
    captured: HashMap<BodyId, Snapshot>,
    baseline: HashMap<BodyId, Snapshot>,
}

impl CollapseEffect {
    /// An inactive effect whose baseline is the current state of `bodies`.
    pub fn new<'a>(center: Vec3, duration: f32, bodies: impl IntoIterator<Item = &'a Body>) -> Self {
        Self {
            center,
            duration,
            strength: 0.0,
            phase: CollapsePhase::Inactive,
            captured: HashMap::new(),
            baseline: capture(bodies),
        }
    }

    /// Point the bodies collapse into.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Seconds to full collapse.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Collapse progress in `[0, 1]`.
    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Current phase.
    pub fn phase(&self) -> CollapsePhase {
        self.phase
    }

    /// Whether the effect is running.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, CollapsePhase::Active { .. })
    }

    /// The startup layout that [`CollapseEffect::reset`] restores.
    pub fn baseline(&self, id: BodyId) -> Option<&Snapshot> {
        self.baseline.get(&id)
    }

    /// The layout captured at the latest activation.
    pub fn captured(&self, id: BodyId) -> Option<&Snapshot> {
        self.captured.get(&id)
    }

    /// Start collapsing from the current state of `bodies`.
    ///
    /// Does nothing and returns `false` if already active.
    pub fn activate<'a>(&mut self, now: f32, bodies: impl IntoIterator<Item = &'a Body>) -> bool {
        if self.is_active() {
            return false;
        }
        self.captured = capture(bodies);
        self.phase = CollapsePhase::Active { activated_at: now };
        self.strength = 0.0;
        log::info!("Collapse started ({} bodies)", self.captured.len());
        true
    }

    /// Strength the effect would have at `now`. Zero while inactive.
    pub fn strength_at(&self, now: f32) -> f32 {
        match self.phase {
            CollapsePhase::Inactive => 0.0,
            CollapsePhase::Active { activated_at } => ((now - activated_at) / self.duration).clamp(0.0, 1.0),
        }
    }

    /// Update the strength for `now` and place every captured body.
    ///
    /// Bodies without a captured snapshot are left alone.
    pub fn apply<'a>(&mut self, now: f32, bodies: impl IntoIterator<Item = &'a mut Body>) {
        if !self.is_active() {
            return;
        }
        self.strength = self.strength_at(now).max(self.strength);
        let shrink = 1.0 - self.strength;

        for body in bodies {
            if let Some(from) = self.captured.get(&body.id()) {
                // Exact at both ends: the captured position at 0, the center at 1.
                body.position = from.position * shrink + self.center * self.strength;
                body.scale = from.scale * shrink;
            }
        }
    }

    /// Stop the effect and put every body back on its baseline.
    ///
    /// Returns the number of bodies restored.
    pub fn reset<'a>(&mut self, bodies: impl IntoIterator<Item = &'a mut Body>) -> usize {
        self.phase = CollapsePhase::Inactive;
        self.strength = 0.0;

        let mut restored = 0;
        for body in bodies {
            if let Some(snapshot) = self.baseline.get(&body.id()) {
                snapshot.restore(body);
                restored += 1;
            }
        }
        log::info!("Collapse reset ({} bodies restored)", restored);
        restored
    }
}

fn capture<'a>(bodies: impl IntoIterator<Item = &'a Body>) -> HashMap<BodyId, Snapshot> {
    bodies.into_iter().map(|b| (b.id(), Snapshot::of(b))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::body::{test_handles, Orbit};

    const CENTER: Vec3 = Vec3::new(0.0, 0.0, -20.0);

    fn roster() -> Vec<Body> {
        (0..5)
            .map(|i| {
                let mut body = Body::new(BodyId::new(i), format!("b{}", i), 0.5 + i as f32, Orbit::new(i as f32 * 3.0, 1.0), test_handles());
                body.position = Vec3::new(i as f32 * 3.0, 1.0, -20.0);
                body
            })
            .collect()
    }

    #[test]
    fn test_ramp_over_duration() {
        let mut bodies = roster();
        let original: Vec<Snapshot> = bodies.iter().map(Snapshot::of).collect();
        let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies);

        assert!(effect.activate(0.0, &bodies));
        effect.apply(3.0, &mut bodies);
        assert!((effect.strength() - 0.5).abs() < 1e-6);
        for (body, before) in bodies.iter().zip(&original) {
            assert!(body.scale.abs_diff_eq(before.scale * 0.5, 1e-5));
            let midpoint = before.position.lerp(CENTER, 0.5);
            assert!(body.position.abs_diff_eq(midpoint, 1e-5));
        }

        effect.apply(6.0, &mut bodies);
        assert_eq!(effect.strength(), 1.0);
        for body in &bodies {
            assert_eq!(body.scale, Vec3::ZERO);
            assert_eq!(body.position, CENTER);
            assert!(!body.is_visible());
        }
    }

    #[test]
    fn test_strength_clamped() {
        let mut bodies = roster();
        let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies);
        effect.activate(10.0, &bodies);

        effect.apply(100.0, &mut bodies);
        assert_eq!(effect.strength(), 1.0);
        assert_eq!(effect.strength_at(5.0), 0.0);
    }

    #[test]
    fn test_activate_ignored_while_active() {
        let mut bodies = roster();
        let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies);
        assert!(effect.activate(0.0, &bodies));
        effect.apply(3.0, &mut bodies);

        assert!(!effect.activate(3.0, &bodies));
        assert_eq!(effect.phase(), CollapsePhase::Active { activated_at: 0.0 });
    }

    #[test]
    fn test_reset_restores_baseline_at_any_strength() {
        for t in [0.0, 1.5, 3.0, 6.0, 9.0] {
            let mut bodies = roster();
            let baseline: Vec<Snapshot> = bodies.iter().map(Snapshot::of).collect();
            let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies);

            // Bodies move on before the collapse starts
            for body in &mut bodies {
                body.position += Vec3::new(1.0, 0.0, 2.0);
            }
            effect.activate(0.0, &bodies);
            effect.apply(t, &mut bodies);

            assert_eq!(effect.reset(&mut bodies), bodies.len());
            assert!(!effect.is_active());
            assert_eq!(effect.strength(), 0.0);
            for (body, snapshot) in bodies.iter().zip(&baseline) {
                assert_eq!(Snapshot::of(body), *snapshot);
            }
        }
    }

    #[test]
    fn test_reactivation_captures_current_state() {
        let mut bodies = roster();
        let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies);
        effect.activate(0.0, &bodies);
        effect.apply(3.0, &mut bodies);
        effect.reset(&mut bodies);

        for body in &mut bodies {
            body.position.y = 7.0;
        }
        assert!(effect.activate(20.0, &bodies));
        let id = bodies[2].id();
        assert_eq!(effect.captured(id).map(|s| s.position.y), Some(7.0));
        assert_eq!(effect.baseline(id).map(|s| s.position.y), Some(1.0));
    }

    #[test]
    fn test_snapshots_follow_ids_not_order() {
        let mut bodies = roster();
        let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies);
        let expected: Vec<(BodyId, Snapshot)> = bodies.iter().map(|b| (b.id(), Snapshot::of(b))).collect();

        effect.activate(0.0, &bodies);
        effect.apply(6.0, &mut bodies);
        bodies.reverse();
        effect.reset(&mut bodies);

        for (id, snapshot) in expected {
            let body = bodies.iter().find(|b| b.id() == id).map(Snapshot::of);
            assert_eq!(body, Some(snapshot));
        }
    }

    #[test]
    fn test_unknown_bodies_untouched() {
        let mut bodies = roster();
        let mut effect = CollapseEffect::new(CENTER, DEFAULT_DURATION, &bodies[..3]);
        effect.activate(0.0, &bodies[..3]);
        let stranger = Snapshot::of(&bodies[4]);

        effect.apply(6.0, &mut bodies);
        assert_eq!(Snapshot::of(&bodies[4]), stranger);
        assert_eq!(effect.reset(&mut bodies), 3);
        assert_eq!(Snapshot::of(&bodies[4]), stranger);
    }
}
