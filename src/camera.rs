//! Free-flying camera with first- and third-person views.
//!
//! Heading and elevation are kept as angles in degrees; the look direction
//! is derived from them:
//!
//! ```text
//! look = (cos pitch · cos yaw, sin pitch, -cos pitch · sin yaw)
//! ```
//!
//! so a yaw of 90° looks down -Z. In third person the eye sits a fixed
//! distance behind [`Camera::position`].

use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

/// Which eye the view matrix uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Eye at the camera position.
    FirstPerson,
    /// Eye behind the camera position, which shows the avatar.
    ThirdPerson,
}

/// Continuous movement and look input for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraControls {
    /// Move along the look direction.
    pub forward: bool,
    /// Move against the look direction.
    pub backward: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
    /// Rise along the up vector.
    pub up: bool,
    /// Sink along the up vector.
    pub down: bool,
    /// Use the fast speed.
    pub sprint: bool,
    /// Turn left.
    pub look_left: bool,
    /// Turn right.
    pub look_right: bool,
    /// Tilt up.
    pub look_up: bool,
    /// Tilt down.
    pub look_down: bool,
    /// Pointer motion in pixels; +x right, +y down.
    pub mouse_delta: Vec2,
}

impl CameraControls {
    /// Whether any translation key is held.
    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }
}

/// Look direction for a heading and elevation in degrees.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(pitch.cos() * yaw.cos(), pitch.sin(), -pitch.cos() * yaw.sin())
}

/// Fly camera.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position (the eye in first person).
    pub position: Vec3,
    /// Unit look direction.
    pub look: Vec3,
    /// World up.
    pub up: Vec3,
    /// Heading in degrees.
    pub yaw: f32,
    /// Elevation in degrees.
    pub pitch: f32,
    /// Current view.
    pub mode: ViewMode,
    settings: CameraConfig,
}

impl Camera {
    /// A camera at the configured start.
    pub fn new(settings: CameraConfig) -> Self {
        Self {
            position: settings.position,
            look: look_direction(settings.yaw, settings.pitch),
            up: Vec3::Y,
            yaw: settings.yaw,
            pitch: settings.pitch,
            mode: if settings.first_person {
                ViewMode::FirstPerson
            } else {
                ViewMode::ThirdPerson
            },
            settings,
        }
    }

    /// Settings the camera was built with.
    pub fn settings(&self) -> &CameraConfig {
        &self.settings
    }

    /// Apply one frame of manual control. `dt` is real time.
    pub fn update(&mut self, controls: &CameraControls, dt: f32) {
        let rate = self.settings.look_rate * dt;

        self.yaw -= controls.mouse_delta.x * rate;
        self.pitch -= controls.mouse_delta.y * rate;
        if controls.look_left {
            self.yaw += rate;
        }
        if controls.look_right {
            self.yaw -= rate;
        }
        if controls.look_up {
            self.pitch += rate;
        }
        if controls.look_down {
            self.pitch -= rate;
        }

        let limit = self.settings.pitch_limit;
        self.pitch = self.pitch.clamp(-limit, limit);
        self.look = look_direction(self.yaw, self.pitch);

        let speed = if controls.sprint {
            self.settings.fast_speed
        } else {
            self.settings.speed
        };
        let step = speed * dt;
        let side = self.look.cross(self.up).normalize_or_zero();

        let mut motion = Vec3::ZERO;
        if controls.forward {
            motion += self.look;
        }
        if controls.backward {
            motion -= self.look;
        }
        if controls.right {
            motion += side;
        }
        if controls.left {
            motion -= side;
        }
        if controls.up {
            motion += self.up;
        }
        if controls.down {
            motion -= self.up;
        }
        self.position += motion * step;
    }

    /// Turn to face `target`. Ignored if `target` is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(dir) = (target - self.position).try_normalize() {
            self.look = dir;
        }
    }

    /// Recompute yaw and pitch from the look direction, so manual control
    /// continues from wherever the camera was pointed.
    pub fn sync_angles(&mut self) {
        let limit = self.settings.pitch_limit;
        self.pitch = self.look.y.clamp(-1.0, 1.0).asin().to_degrees().clamp(-limit, limit);
        self.yaw = (-self.look.z).atan2(self.look.x).to_degrees();
        self.look = look_direction(self.yaw, self.pitch);
    }

    /// Where the view is rendered from.
    pub fn eye(&self) -> Vec3 {
        match self.mode {
            ViewMode::FirstPerson => self.position,
            ViewMode::ThirdPerson => self.position - self.look * self.settings.third_person_distance,
        }
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.eye();
        Mat4::look_at_rh(eye, eye + self.look, self.up)
    }

    /// Perspective projection for a viewport of the given aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.settings.fov_y.to_radians(),
            aspect.max(f32::EPSILON),
            self.settings.near,
            self.settings.far,
        )
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}
