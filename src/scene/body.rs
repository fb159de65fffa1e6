//! Celestial bodies.

use glam::{Mat4, Vec3};

use crate::render::{SphereGeometry, TextureHandle};

/// Bodies with a scale at or below this are not drawn.
pub const VISIBILITY_THRESHOLD: f32 = 0.01;

/// Stable identifier of a body, assigned once at creation.
///
/// Per-body records kept outside the roster (collapse snapshots, selection
/// entries, parent links) are keyed by this, never by roster position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(u32);

impl BodyId {
    /// Wrap a raw identifier.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw identifier.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Circular orbit parameters. Fixed once the body exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    radius: f32,
    speed: f32,
}

impl Orbit {
    /// A body that sits on its orbit center.
    pub const STATIONARY: Orbit = Orbit {
        radius: 0.0,
        speed: 0.0,
    };

    /// Orbit at `radius`, advancing `speed` times the shared orbit angle.
    pub const fn new(radius: f32, speed: f32) -> Self {
        Self { radius, speed }
    }

    /// Distance from the orbit center.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Multiplier on the shared orbit angle.
    pub fn speed(&self) -> f32 {
        self.speed
    }
}

/// What a body orbits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitCenter {
    /// A fixed point.
    Anchor(Vec3),
    /// Another body's current position.
    Body(BodyId),
}

/// Render resources of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderHandles {
    /// Sphere mesh.
    pub sphere: SphereGeometry,
    /// Surface texture.
    pub texture: TextureHandle,
}

/// One simulated celestial object.
#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    name: String,
    orbit: Orbit,
    center: OrbitCenter,
    /// World position.
    pub position: Vec3,
    /// Per-axis scale; uniform in practice.
    pub scale: Vec3,
    /// Spin angle in degrees.
    pub rotation_angle: f32,
    /// Spin rate in degrees per second.
    pub rotation_speed: f32,
    /// Whether this body is the light source.
    pub luminous: bool,
    /// GPU resources.
    pub handles: RenderHandles,
}

impl Body {
    /// A body at the origin with uniform `scale`.
    pub fn new(id: BodyId, name: impl Into<String>, scale: f32, orbit: Orbit, handles: RenderHandles) -> Self {
        Self {
            id,
            name: name.into(),
            orbit,
            center: OrbitCenter::Anchor(Vec3::ZERO),
            position: Vec3::ZERO,
            scale: Vec3::splat(scale),
            rotation_angle: 0.0,
            rotation_speed: 0.0,
            luminous: false,
            handles,
        }
    }

    /// Set the orbit center.
    pub fn with_center(mut self, center: OrbitCenter) -> Self {
        if let OrbitCenter::Anchor(anchor) = center {
            self.position = anchor;
        }
        self.center = center;
        self
    }

    /// Set the spin rate in degrees per second.
    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    /// Mark this body as the light source.
    pub fn with_luminous(mut self, luminous: bool) -> Self {
        self.luminous = luminous;
        self
    }

    /// Stable identifier.
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Orbit parameters.
    pub fn orbit(&self) -> Orbit {
        self.orbit
    }

    /// What this body orbits.
    pub fn center(&self) -> OrbitCenter {
        self.center
    }

    /// Radius of the rendered sphere.
    pub fn radius(&self) -> f32 {
        self.scale.x
    }

    /// Whether the body is large enough to draw.
    pub fn is_visible(&self) -> bool {
        self.scale.x > VISIBILITY_THRESHOLD
    }

    /// Model matrix: translate, spin about Y, flip the texture upright, scale.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(self.rotation_angle.to_radians())
            * Mat4::from_rotation_x(std::f32::consts::PI)
            * Mat4::from_scale(self.scale)
    }
}

/// Placeholder handles for bodies built without a backend.
#[cfg(test)]
pub(crate) fn test_handles() -> RenderHandles {
    RenderHandles {
        sphere: SphereGeometry {
            handle: crate::render::GeometryHandle::new(0),
            index_count: 0,
        },
        texture: TextureHandle::MISSING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles() -> RenderHandles {
        test_handles()
    }

    #[test]
    fn test_visibility_threshold() {
        let mut body = Body::new(BodyId::new(0), "Pluto", 0.5, Orbit::STATIONARY, handles());
        assert!(body.is_visible());
        body.scale = Vec3::splat(VISIBILITY_THRESHOLD);
        assert!(!body.is_visible());
    }

    #[test]
    fn test_anchor_sets_position() {
        let anchor = Vec3::new(0.0, 0.0, -20.0);
        let body = Body::new(BodyId::new(0), "Sun", 4.0, Orbit::STATIONARY, handles())
            .with_center(OrbitCenter::Anchor(anchor));
        assert_eq!(body.position, anchor);
        assert_eq!(body.radius(), 4.0);
    }

    #[test]
    fn test_transform_places_and_scales() {
        let mut body = Body::new(BodyId::new(3), "Earth", 0.3, Orbit::new(12.0, 1.0), handles());
        body.position = Vec3::new(1.0, 2.0, 3.0);
        let m = body.transform();
        assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(body.position, 1e-5));
        let edge = m.transform_point3(Vec3::Y) - body.position;
        assert!((edge.length() - 0.3).abs() < 1e-5);
    }
}
