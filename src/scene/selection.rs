//! Body selection and the follow camera.
//!
//! [`Selection`] cycles through the selectable bodies in roster order.
//! While selection mode is engaged, [`follow`] eases the camera toward a
//! vantage point above and behind the selected body:
//!
//! ```text
//! d        = max(min_distance, radius * distance_factor)
//! target   = body + (0, height_ratio * d, d)
//! position = lerp(position, target, speed * dt)
//! ```
//!
//! The camera lags behind and converges; it never snaps.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::BodyId;
use crate::camera::Camera;

/// One selectable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    /// The body.
    pub id: BodyId,
    /// Its display name.
    pub name: String,
}

/// Cycling selection over a fixed list of bodies.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
    index: usize,
    engaged: bool,
}

impl Selection {
    /// A selection over `entries`, starting at the first.
    pub fn new(entries: Vec<SelectionEntry>) -> Self {
        Self {
            entries,
            index: 0,
            engaged: false,
        }
    }

    /// Advance to the next entry, wrapping at the end.
    ///
    /// Returns the new selection, or `None` if there is nothing to select.
    pub fn next(&mut self) -> Option<&SelectionEntry> {
        if self.entries.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.entries.len();
        self.entries.get(self.index)
    }

    /// The selected entry, or `None` if there is nothing to select.
    pub fn current(&self) -> Option<&SelectionEntry> {
        self.entries.get(self.index)
    }

    /// Index of the selected entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of selectable bodies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to select.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether selection mode is on.
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Turn selection mode on, keeping the current index.
    pub fn engage(&mut self) -> Option<&SelectionEntry> {
        self.engaged = true;
        self.current()
    }

    /// Turn selection mode off.
    pub fn disengage(&mut self) {
        self.engaged = false;
    }
}

/// Framing of the follow camera and the selection marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowSettings {
    /// Viewing distance per unit of body radius.
    pub distance_factor: f32,
    /// Closest viewing distance.
    pub min_distance: f32,
    /// Height above the body, as a fraction of the viewing distance.
    pub height_ratio: f32,
    /// Convergence rate per second.
    pub speed: f32,
    /// Marker radius relative to the body radius.
    pub marker_scale: f32,
    /// Marker tint.
    pub marker_color: Vec3,
}

impl Default for FollowSettings {
    fn default() -> Self {
        Self {
            distance_factor: 8.0,
            min_distance: 3.0,
            height_ratio: 0.3,
            speed: 2.0,
            marker_scale: 1.5,
            marker_color: Vec3::new(1.0, 1.0, 0.0),
        }
    }
}

impl FollowSettings {
    /// Where the camera heads for a body at `position` with `radius`.
    pub fn vantage(&self, position: Vec3, radius: f32) -> Vec3 {
        let distance = (radius * self.distance_factor).max(self.min_distance);
        position + Vec3::new(0.0, distance * self.height_ratio, distance)
    }
}

/// Ease `camera` toward the vantage point of a body and face the body.
///
/// `dt` is real time. The blend factor is clamped to 1 so a long frame
/// lands on the target instead of overshooting it.
pub fn follow(camera: &mut Camera, position: Vec3, radius: f32, settings: &FollowSettings, dt: f32) {
    let target = settings.vantage(position, radius);
    let t = (settings.speed * dt).clamp(0.0, 1.0);
    camera.position = camera.position.lerp(target, t);
    camera.look_at(position);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: u32) -> Selection {
        Selection::new(
            (0..n)
                .map(|i| SelectionEntry {
                    id: BodyId::new(i),
                    name: format!("body {}", i),
                })
                .collect(),
        )
    }

    #[test]
    fn test_next_wraps_after_len_calls() {
        for n in 1..12 {
            let mut selection = roster(n);
            for _ in 0..3 {
                selection.next();
            }
            let start = selection.index();
            for _ in 0..n {
                selection.next();
            }
            assert_eq!(selection.index(), start);
        }
    }

    #[test]
    fn test_next_order() {
        let mut selection = roster(3);
        assert_eq!(selection.current().map(|e| e.id), Some(BodyId::new(0)));
        assert_eq!(selection.next().map(|e| e.id), Some(BodyId::new(1)));
        assert_eq!(selection.next().map(|e| e.id), Some(BodyId::new(2)));
        assert_eq!(selection.next().map(|e| e.id), Some(BodyId::new(0)));
    }

    #[test]
    fn test_empty_roster() {
        let mut selection = Selection::default();
        assert!(selection.current().is_none());
        assert!(selection.next().is_none());
        assert!(selection.engage().is_none());
        assert_eq!(selection.index(), 0);
    }

    #[test]
    fn test_vantage_floor() {
        let settings = FollowSettings::default();
        // Small body: clamped to the minimum distance
        let v = settings.vantage(Vec3::ZERO, 0.1);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.9, 3.0), 1e-6));
        // Large body: scaled by its radius
        let v = settings.vantage(Vec3::ZERO, 4.0);
        assert!(v.abs_diff_eq(Vec3::new(0.0, 9.6, 32.0), 1e-5));
    }

    #[test]
    fn test_follow_converges_without_snapping() {
        let settings = FollowSettings::default();
        let mut camera = Camera::default();
        let body = Vec3::new(12.0, 0.0, -20.0);
        let target = settings.vantage(body, 0.3);

        let mut last = camera.position.distance(target);
        follow(&mut camera, body, 0.3, &settings, 1.0 / 60.0);
        let first = camera.position.distance(target);
        assert!(first < last && first > 0.5 * last);

        for _ in 0..600 {
            follow(&mut camera, body, 0.3, &settings, 1.0 / 60.0);
            let d = camera.position.distance(target);
            assert!(d <= last + 1e-5);
            last = d;
        }
        assert!(last < 1e-3);
        assert!(camera.look.abs_diff_eq((body - camera.position).normalize(), 1e-4));
    }
}
