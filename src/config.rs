//! Scene description.
//!
//! A [`SceneConfig`] lists every body, comet and tunable of the scene. The
//! [`Default`] is the full solar system; a JSON file can override any part
//! of it, since every section falls back to its default when omitted.
//!
//! # Example
//!
//! ```ignore
//! use orrery::SceneConfig;
//!
//! // Built-in solar system
//! let config = SceneConfig::default();
//!
//! // Or a custom scene; missing sections keep their defaults
//! let config = SceneConfig::from_json_file("scenes/binary.json")?;
//! ```
//!
//! A minimal scene file:
//!
//! ```json
//! {
//!   "bodies": [
//!     { "name": "Star", "scale": 2.0, "luminous": true },
//!     { "name": "Rock", "scale": 0.3, "orbit_radius": 6.0, "orbit_speed": 1.0, "parent": "Star" }
//!   ],
//!   "comets": []
//! }
//! ```

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::input::Bindings;
use crate::scene::comet::TrailAging;
use crate::scene::selection::FollowSettings;

/// Where the sun sits and the collapse effect pulls towards.
pub const SYSTEM_CENTER: Vec3 = Vec3::new(0.0, 0.0, -20.0);

/// Complete description of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Window title and initial size.
    pub window: WindowConfig,
    /// Directory that relative asset paths are resolved against.
    pub assets: PathBuf,
    /// Tessellation of the shared sphere mesh.
    pub sphere: SphereConfig,
    /// Growth rate of the shared orbit angle, in degrees per second.
    pub orbit_rate: f32,
    /// Animation speed multiplier.
    pub time_scale: f32,
    /// Bodies in roster order (selection cycles in this order).
    pub bodies: Vec<BodyConfig>,
    /// Comets on elliptical orbits.
    pub comets: Vec<CometConfig>,
    /// Comet trail sampling and fading.
    pub trail: TrailConfig,
    /// The collapse effect.
    pub collapse: CollapseConfig,
    /// Camera framing while following a selected body.
    pub selection: FollowSettings,
    /// Free-flying camera.
    pub camera: CameraConfig,
    /// Six cubemap faces, or `None` for a plain background.
    pub skybox: Option<SkyboxConfig>,
    /// Model shown under the camera in third-person view.
    pub avatar: Option<AvatarConfig>,
    /// Key bindings for discrete actions.
    pub bindings: Bindings,
}

/// Window settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Initial width in logical pixels.
    pub width: u32,
    /// Initial height in logical pixels.
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Orrery".into(),
            width: 1280,
            height: 720,
        }
    }
}

/// UV sphere resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    /// Horizontal bands, pole to pole.
    pub rings: u32,
    /// Vertical slices around the axis.
    pub sectors: u32,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            rings: 40,
            sectors: 40,
        }
    }
}

/// One body on a circular orbit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Unique name, shown when selected.
    pub name: String,
    /// Surface texture, relative to the asset directory.
    #[serde(default)]
    pub texture: Option<PathBuf>,
    /// Uniform scale (sphere radius).
    pub scale: f32,
    /// Distance from the orbit center.
    #[serde(default)]
    pub orbit_radius: f32,
    /// Multiplier applied to the shared orbit angle.
    #[serde(default)]
    pub orbit_speed: f32,
    /// Spin in degrees per second. Negative spins retrograde.
    #[serde(default)]
    pub rotation_speed: f32,
    /// Shared-angle value used for the starting layout, in degrees.
    #[serde(default)]
    pub initial_angle: f32,
    /// Body to orbit. Without a parent the body orbits `anchor`.
    #[serde(default)]
    pub parent: Option<String>,
    /// Orbit center for bodies without a parent.
    #[serde(default = "default_anchor")]
    pub anchor: Vec3,
    /// Emits light and is drawn unlit.
    #[serde(default)]
    pub luminous: bool,
    /// Included in selection cycling.
    #[serde(default = "default_true")]
    pub selectable: bool,
}

impl BodyConfig {
    /// A body orbiting `parent`.
    pub fn planet(name: &str, parent: &str, scale: f32, radius: f32, speed: f32, spin: f32, angle: f32) -> Self {
        Self {
            name: name.into(),
            texture: Some(PathBuf::from(format!("textures/{}.jpg", name.to_lowercase()))),
            scale,
            orbit_radius: radius,
            orbit_speed: speed,
            rotation_speed: spin,
            initial_angle: angle,
            parent: Some(parent.into()),
            anchor: SYSTEM_CENTER,
            luminous: false,
            selectable: true,
        }
    }
}

/// One comet on a focus-centered ellipse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CometConfig {
    /// Comet name.
    pub name: String,
    /// Head texture, relative to the asset directory.
    #[serde(default)]
    pub texture: Option<PathBuf>,
    /// Focus of the ellipse.
    #[serde(default = "default_anchor")]
    pub center: Vec3,
    /// Semi-major axis `a`.
    pub semi_major_axis: f32,
    /// Eccentricity `e`, in `[0, 1)`.
    pub eccentricity: f32,
    /// Starting orbit angle, in radians.
    #[serde(default)]
    pub initial_angle: f32,
    /// Orbit angle growth, in radians per second.
    #[serde(default = "default_comet_speed")]
    pub angular_speed: f32,
    /// Head scale.
    #[serde(default = "default_comet_scale")]
    pub scale: f32,
    /// Head spin in degrees per second.
    #[serde(default = "default_comet_spin")]
    pub rotation_speed: f32,
}

/// Comet trail settings, shared by all comets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// Maximum points per trail.
    pub max_points: usize,
    /// Simulated seconds between samples.
    pub sample_interval: f32,
    /// How points age on each update.
    pub aging: TrailAging,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            max_points: crate::scene::comet::MAX_TRAIL_POINTS,
            sample_interval: crate::scene::comet::TRAIL_SAMPLE_INTERVAL,
            aging: TrailAging::default(),
        }
    }
}

/// Collapse effect settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollapseConfig {
    /// Point the bodies fall into.
    pub center: Vec3,
    /// Seconds of simulated time until full collapse.
    pub duration: f32,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            center: SYSTEM_CENTER,
            duration: crate::scene::collapse::DEFAULT_DURATION,
        }
    }
}

/// Free-flying camera settings. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position.
    pub position: Vec3,
    /// Starting heading; 90° looks down -Z.
    pub yaw: f32,
    /// Starting elevation.
    pub pitch: f32,
    /// Elevation limit in both directions.
    pub pitch_limit: f32,
    /// Units per second.
    pub speed: f32,
    /// Units per second while sprinting.
    pub fast_speed: f32,
    /// Look rate for mouse (per pixel) and arrow keys, in degrees per second.
    pub look_rate: f32,
    /// Distance behind the camera position of the third-person eye.
    pub third_person_distance: f32,
    /// Start in first-person view.
    pub first_person: bool,
    /// Vertical field of view.
    pub fov_y: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 5.0),
            yaw: 90.0,
            pitch: 0.0,
            pitch_limit: 85.0,
            speed: 3.0,
            fast_speed: 6.0,
            look_rate: 60.0,
            third_person_distance: 1.5,
            first_person: true,
            fov_y: 70.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

/// Cubemap face images in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyboxConfig {
    /// Face paths, relative to the asset directory.
    pub faces: [PathBuf; 6],
}

/// Third-person avatar model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    /// Wavefront OBJ file, relative to the asset directory.
    pub path: PathBuf,
    /// Uniform scale applied to the model.
    pub scale: f32,
    /// Offset from the camera position.
    pub offset: Vec3,
    /// Spin in degrees per second of real time.
    pub spin_rate: f32,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/rubber_duck/duck.obj"),
            scale: 0.0006,
            offset: Vec3::new(0.0, -0.2, 0.0),
            spin_rate: 180.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::solar_system()
    }
}

impl SceneConfig {
    /// The sun, eight planets, the moon and two comets.
    pub fn solar_system() -> Self {
        let sun = BodyConfig {
            name: "Sun".into(),
            texture: Some(PathBuf::from("textures/sun.jpg")),
            scale: 4.0,
            orbit_radius: 0.0,
            orbit_speed: 0.0,
            rotation_speed: 15.0,
            initial_angle: 0.0,
            parent: None,
            anchor: SYSTEM_CENTER,
            luminous: true,
            selectable: true,
        };

        let bodies = vec![
            sun,
            BodyConfig::planet("Mercury", "Sun", 0.11, 8.0, 2.0, 35.0, 0.0),
            BodyConfig::planet("Venus", "Sun", 0.28, 10.0, 1.6, -12.0, 45.0),
            BodyConfig::planet("Earth", "Sun", 0.3, 12.0, 1.0, 20.0, 90.0),
            BodyConfig::planet("Moon", "Earth", 0.08, 1.2, 4.0, 5.0, 0.0),
            BodyConfig::planet("Mars", "Sun", 0.16, 15.0, 0.8, 18.0, 135.0),
            BodyConfig::planet("Jupiter", "Sun", 3.36, 22.0, 0.5, 30.0, 180.0),
            BodyConfig::planet("Saturn", "Sun", 2.82, 28.0, 0.35, 28.0, 225.0),
            BodyConfig::planet("Uranus", "Sun", 1.2, 34.0, 0.25, -15.0, 270.0),
            BodyConfig::planet("Neptune", "Sun", 1.17, 40.0, 0.2, 18.0, 315.0),
        ];

        let comet = |name: &str, a: f32, e: f32, angle: f32| CometConfig {
            name: name.into(),
            texture: Some(PathBuf::from("textures/comet.jpg")),
            center: SYSTEM_CENTER,
            semi_major_axis: a,
            eccentricity: e,
            initial_angle: angle,
            angular_speed: default_comet_speed(),
            scale: default_comet_scale(),
            rotation_speed: default_comet_spin(),
        };

        let faces = ["1", "2", "3", "4", "5", "6"].map(|n| PathBuf::from(format!("textures/skybox/{}.png", n)));

        Self {
            window: WindowConfig::default(),
            assets: PathBuf::from("assets"),
            sphere: SphereConfig::default(),
            orbit_rate: crate::scene::orbit::DEFAULT_ORBIT_RATE,
            time_scale: 1.0,
            bodies,
            // Encke starts half a turn (π rad) from Halley, on the far side of the focus.
            comets: vec![comet("Halley", 45.0, 0.85, 0.0), comet("Encke", 25.0, 0.7, PI)],
            trail: TrailConfig::default(),
            collapse: CollapseConfig::default(),
            selection: FollowSettings::default(),
            camera: CameraConfig::default(),
            skybox: Some(SkyboxConfig { faces }),
            avatar: Some(AvatarConfig::default()),
            bindings: Bindings::default(),
        }
    }

    /// Parse a scene from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a scene file and validate it.
    ///
    /// A relative `assets` directory is resolved against the file's own
    /// directory, so scene files can ship next to their textures.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        if config.assets.is_relative() {
            if let Some(dir) = path.parent() {
                config.assets = dir.join(&config.assets);
            }
        }
        Ok(config)
    }

    /// Resolve an asset path against the asset directory.
    pub fn asset_path(&self, relative: &Path) -> PathBuf {
        self.assets.join(relative)
    }

    /// Check names, parent links and numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for body in &self.bodies {
            if !names.insert(body.name.as_str()) {
                return Err(ConfigError::DuplicateBody(body.name.clone()));
            }
            if body.scale < 0.0 {
                return Err(ConfigError::Invalid(format!("body '{}' has a negative scale", body.name)));
            }
        }

        let parents: HashMap<&str, &str> = self
            .bodies
            .iter()
            .filter_map(|b| b.parent.as_deref().map(|p| (b.name.as_str(), p)))
            .collect();

        for (&body, &parent) in &parents {
            if !names.contains(parent) {
                return Err(ConfigError::UnknownParent {
                    body: body.into(),
                    parent: parent.into(),
                });
            }
        }

        // Walking up from any body must end at a root within `len` steps.
        for body in &self.bodies {
            let mut current = body.name.as_str();
            let mut steps = 0;
            while let Some(&parent) = parents.get(current) {
                steps += 1;
                if steps > self.bodies.len() {
                    return Err(ConfigError::ParentCycle(body.name.clone()));
                }
                current = parent;
            }
        }

        for comet in &self.comets {
            if !(0.0..1.0).contains(&comet.eccentricity) {
                return Err(ConfigError::Eccentricity {
                    comet: comet.name.clone(),
                    value: comet.eccentricity,
                });
            }
            if comet.semi_major_axis <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "comet '{}' needs a positive semi-major axis",
                    comet.name
                )));
            }
        }

        if self.trail.max_points == 0 {
            return Err(ConfigError::Invalid("trail.max_points must be at least 1".into()));
        }
        if self.trail.sample_interval < 0.0 {
            return Err(ConfigError::Invalid("trail.sample_interval must not be negative".into()));
        }
        if self.collapse.duration <= 0.0 {
            return Err(ConfigError::Invalid("collapse.duration must be positive".into()));
        }
        if self.sphere.rings < 2 || self.sphere.sectors < 3 {
            return Err(ConfigError::Invalid("sphere needs at least 2 rings and 3 sectors".into()));
        }
        if self.time_scale < 0.0 {
            return Err(ConfigError::Invalid("time_scale must not be negative".into()));
        }

        Ok(())
    }
}

fn default_anchor() -> Vec3 {
    SYSTEM_CENTER
}

fn default_true() -> bool {
    true
}

fn default_comet_speed() -> f32 {
    crate::scene::comet::COMET_ANGULAR_SPEED
}

fn default_comet_scale() -> f32 {
    0.05
}

fn default_comet_spin() -> f32 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SceneConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bodies.len(), 10);
        assert_eq!(config.comets.len(), 2);
        assert_eq!(config.bodies[0].name, "Sun");
        assert_eq!(config.bodies[4].parent.as_deref(), Some("Earth"));
    }

    #[test]
    fn test_comets_start_opposite() {
        let config = SceneConfig::solar_system();
        let angles: Vec<f32> = config.comets.iter().map(|c| c.initial_angle).collect();
        assert_eq!(angles, vec![0.0, PI]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SceneConfig::from_json_str(r#"{ "time_scale": 2.0 }"#).unwrap();
        assert_eq!(config.time_scale, 2.0);
        assert_eq!(config.bodies.len(), 10);
        assert_eq!(config.trail.max_points, 150);
    }

    #[test]
    fn test_minimal_scene() {
        let json = r#"{
            "bodies": [
                { "name": "Star", "scale": 2.0, "luminous": true },
                { "name": "Rock", "scale": 0.3, "orbit_radius": 6.0, "orbit_speed": 1.0, "parent": "Star" }
            ],
            "comets": [],
            "skybox": null
        }"#;
        let config = SceneConfig::from_json_str(json).unwrap();
        assert_eq!(config.bodies.len(), 2);
        assert!(config.bodies[1].selectable);
        assert_eq!(config.bodies[1].anchor, SYSTEM_CENTER);
        assert!(config.skybox.is_none());
    }

    #[test]
    fn test_rejects_unknown_parent() {
        let mut config = SceneConfig::default();
        config.bodies[4].parent = Some("Vulcan".into());
        assert!(matches!(config.validate(), Err(ConfigError::UnknownParent { .. })));
    }

    #[test]
    fn test_rejects_parent_cycle() {
        let mut config = SceneConfig::default();
        config.bodies[0].parent = Some("Moon".into());
        assert!(matches!(config.validate(), Err(ConfigError::ParentCycle(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let mut config = SceneConfig::default();
        config.bodies[2].name = "Mercury".into();
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateBody(_))));
    }

    #[test]
    fn test_rejects_open_orbit() {
        let mut config = SceneConfig::default();
        config.comets[0].eccentricity = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Eccentricity { .. })));
    }

    #[test]
    fn test_json_round_trip_of_default() {
        let config = SceneConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = SceneConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
