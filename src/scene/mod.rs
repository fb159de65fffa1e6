//! The animated scene: bodies, comets, the collapse effect and the camera.
//!
//! One call to [`Scene::advance_frame`] runs a whole frame of simulation in
//! a fixed order:
//!
//! 1. the pause toggle, then the clock tick
//! 2. the remaining [`Action`]s (selection, view mode, collapse, exit)
//! 3. the shared orbit angle, by animation time
//! 4. exactly one [`Placement`] strategy for every roster body
//! 5. comets and their trails, by animation time
//! 6. the camera and the avatar spin, by real time
//!
//! [`Scene::submit`] then describes the finished frame to a
//! [`RenderBackend`]. Nothing in here touches the GPU.
//!
//! # Example
//!
//! ```ignore
//! use orrery::{RecordingBackend, Scene, SceneClock, SceneConfig};
//!
//! let mut backend = RecordingBackend::new();
//! let mut scene = Scene::build(&SceneConfig::default(), &mut backend)?;
//! let mut clock = SceneClock::starting_at(0.0);
//!
//! let report = scene.advance_frame(&mut clock, 1.0 / 60.0, &[], &Default::default());
//! scene.submit(&mut backend, 16.0 / 9.0);
//! ```

pub mod body;
pub mod collapse;
pub mod comet;
pub mod orbit;
pub mod selection;

use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::camera::{Camera, CameraControls, ViewMode};
use crate::config::{AvatarConfig, SceneConfig};
use crate::error::ConfigError;
use crate::input::Action;
use crate::render::{DrawCommand, FrameView, MeshHandle, Occluder, RenderBackend, Shading, TextureHandle, MAX_OCCLUDERS};
use crate::time::{SceneClock, Tick};

use body::{Body, BodyId, Orbit, OrbitCenter, RenderHandles};
use collapse::CollapseEffect;
use comet::{Comet, EllipticalOrbit, Trail};
use orbit::OrbitClock;
use selection::{FollowSettings, Selection, SelectionEntry};

/// The position update applied to roster bodies in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Bodies follow their orbits.
    Orbital,
    /// The collapse effect places every body.
    Collapsing,
    /// A reset fired this frame; bodies stay on the baseline layout.
    Restored,
}

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Timing used for the frame.
    pub tick: Tick,
    /// Strategy that placed the bodies.
    pub placement: Placement,
    /// The exit action fired.
    pub exit_requested: bool,
}

/// The model that rides under the camera in third person.
#[derive(Debug, Clone)]
struct Avatar {
    meshes: Vec<MeshHandle>,
    settings: AvatarConfig,
    spin: f32,
}

/// All simulated state of the orrery.
#[derive(Debug)]
pub struct Scene {
    bodies: Vec<Body>,
    lookup: HashMap<BodyId, usize>,
    /// Parents before children.
    update_order: Vec<BodyId>,
    star: Option<BodyId>,
    comets: Vec<Comet>,
    orbit_clock: OrbitClock,
    collapse: CollapseEffect,
    selection: Selection,
    follow: FollowSettings,
    camera: Camera,
    avatar: Option<Avatar>,
    skybox: bool,
    placement: Placement,
}

impl Scene {
    /// Create every body, comet and resource described by `config`.
    ///
    /// Bodies start on their configured initial angles, and that layout
    /// becomes the baseline the collapse reset returns to. Missing textures
    /// and models degrade; an invalid description is an error.
    pub fn build(config: &SceneConfig, backend: &mut dyn RenderBackend) -> Result<Self, ConfigError> {
        config.validate()?;

        let sphere = backend.create_sphere_geometry(config.sphere.rings, config.sphere.sectors);

        let ids: HashMap<&str, BodyId> = config
            .bodies
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.as_str(), BodyId::new(i as u32)))
            .collect();

        let mut bodies = Vec::with_capacity(config.bodies.len());
        for (i, desc) in config.bodies.iter().enumerate() {
            let center = match &desc.parent {
                Some(parent) => OrbitCenter::Body(ids.get(parent.as_str()).copied().ok_or_else(|| ConfigError::UnknownParent {
                    body: desc.name.clone(),
                    parent: parent.clone(),
                })?),
                None => OrbitCenter::Anchor(desc.anchor),
            };
            let handles = RenderHandles {
                sphere,
                texture: load_texture(backend, config, desc.texture.as_ref()),
            };
            let body = Body::new(
                BodyId::new(i as u32),
                desc.name.as_str(),
                desc.scale,
                Orbit::new(desc.orbit_radius, desc.orbit_speed),
                handles,
            )
            .with_center(center)
            .with_rotation_speed(desc.rotation_speed)
            .with_luminous(desc.luminous);
            bodies.push(body);
        }

        let lookup: HashMap<BodyId, usize> = bodies.iter().enumerate().map(|(i, b)| (b.id(), i)).collect();
        let update_order = parents_first(&bodies, &lookup);
        let star = bodies.iter().find(|b| b.luminous).map(Body::id);

        let selection = Selection::new(
            config
                .bodies
                .iter()
                .zip(&bodies)
                .filter(|(desc, _)| desc.selectable)
                .map(|(_, body)| SelectionEntry {
                    id: body.id(),
                    name: body.name().to_string(),
                })
                .collect(),
        );

        let mut scene = Self {
            bodies,
            lookup,
            update_order,
            star,
            comets: Vec::new(),
            orbit_clock: OrbitClock::new(config.orbit_rate),
            collapse: CollapseEffect::new(config.collapse.center, config.collapse.duration, std::iter::empty()),
            selection,
            follow: config.selection,
            camera: Camera::new(config.camera),
            avatar: None,
            skybox: false,
            placement: Placement::Orbital,
        };

        // Starting layout: each body at its own initial angle.
        let initial: HashMap<BodyId, f32> = config
            .bodies
            .iter()
            .zip(&scene.bodies)
            .map(|(desc, body)| (body.id(), desc.initial_angle))
            .collect();
        for id in scene.update_order.clone() {
            let angle = initial.get(&id).copied().unwrap_or_default();
            scene.place(id, angle, 0.0);
        }
        scene.collapse = CollapseEffect::new(config.collapse.center, config.collapse.duration, &scene.bodies);

        let first_comet_id = scene.bodies.len() as u32;
        for (j, desc) in config.comets.iter().enumerate() {
            let handles = RenderHandles {
                sphere,
                texture: load_texture(backend, config, desc.texture.as_ref()),
            };
            let head = Body::new(
                BodyId::new(first_comet_id + j as u32),
                desc.name.as_str(),
                desc.scale,
                Orbit::STATIONARY,
                handles,
            )
            .with_rotation_speed(desc.rotation_speed);
            let orbit = EllipticalOrbit {
                center: desc.center,
                semi_major_axis: desc.semi_major_axis,
                eccentricity: desc.eccentricity,
            };
            let trail = Trail::new(config.trail.max_points, config.trail.sample_interval, config.trail.aging);
            let handle = backend.create_trail(config.trail.max_points);
            scene
                .comets
                .push(Comet::new(head, orbit, desc.initial_angle, trail, handle).with_angular_speed(desc.angular_speed));
        }

        if let Some(skybox) = &config.skybox {
            let faces: [PathBuf; 6] = skybox.faces.clone().map(|face| config.asset_path(&face));
            scene.skybox = backend.load_skybox(&faces);
        }

        if let Some(avatar) = &config.avatar {
            let meshes = backend.load_model(&config.asset_path(&avatar.path));
            if meshes.is_empty() {
                log::warn!("Avatar model {} unavailable, third person view will show no model", avatar.path.display());
            }
            scene.avatar = Some(Avatar {
                meshes,
                settings: avatar.clone(),
                spin: 0.0,
            });
        }

        log::info!(
            "Scene ready: {} bodies, {} comets, {} selectable",
            scene.bodies.len(),
            scene.comets.len(),
            scene.selection.len()
        );
        Ok(scene)
    }

    /// Toggle pause if asked, tick `clock` to `now`, and run one frame.
    pub fn advance_frame(&mut self, clock: &mut SceneClock, now: f64, actions: &[Action], controls: &CameraControls) -> FrameReport {
        if actions.contains(&Action::TogglePause) {
            clock.toggle_pause();
            log::info!("{}", if clock.is_paused() { "Paused" } else { "Resumed" });
        }
        let tick = clock.tick(now);
        self.step(tick, actions, controls)
    }

    /// Run one frame with an already computed tick.
    ///
    /// [`Action::TogglePause`] is ignored here; it belongs to the clock.
    pub fn step(&mut self, tick: Tick, actions: &[Action], controls: &CameraControls) -> FrameReport {
        let mut exit_requested = false;
        let mut reset = false;

        for action in actions {
            match action {
                Action::TogglePause => {}
                Action::CycleSelection => self.cycle_selection(),
                Action::ExitSelection => self.exit_selection(),
                Action::FirstPerson if !self.selection.is_engaged() => self.camera.mode = ViewMode::FirstPerson,
                Action::ThirdPerson if !self.selection.is_engaged() => self.camera.mode = ViewMode::ThirdPerson,
                Action::FirstPerson | Action::ThirdPerson => {}
                Action::ActivateCollapse => {
                    self.collapse.activate(tick.sim_time, &self.bodies);
                }
                Action::ResetCollapse => {
                    self.collapse.reset(&mut self.bodies);
                    reset = true;
                }
                Action::Exit => exit_requested = true,
            }
        }

        self.orbit_clock.advance(tick.animation_dt);

        self.placement = if reset {
            Placement::Restored
        } else if self.collapse.is_active() {
            Placement::Collapsing
        } else {
            Placement::Orbital
        };
        match self.placement {
            Placement::Orbital => {
                let angle = self.orbit_clock.angle();
                for id in self.update_order.clone() {
                    self.place(id, angle, tick.animation_dt);
                }
            }
            Placement::Collapsing => self.collapse.apply(tick.sim_time, &mut self.bodies),
            Placement::Restored => {}
        }

        let sun = self.light_position();
        for comet in &mut self.comets {
            comet.advance(tick.animation_dt, sun);
        }

        self.update_camera(controls, tick.dt);
        if let Some(avatar) = &mut self.avatar {
            avatar.spin += avatar.settings.spin_rate * tick.dt;
        }

        FrameReport {
            tick,
            placement: self.placement,
            exit_requested,
        }
    }

    /// Describe the current frame to `backend`.
    ///
    /// Trails are re-uploaded on every call, whether or not they changed.
    pub fn submit(&self, backend: &mut dyn RenderBackend, aspect: f32) {
        let occluders = self
            .bodies
            .iter()
            .filter(|b| !b.luminous && b.is_visible())
            .take(MAX_OCCLUDERS)
            .map(|b| Occluder {
                center: b.position,
                radius: b.radius(),
            })
            .collect();

        backend.begin_frame(&FrameView {
            view: self.camera.view_matrix(),
            projection: self.camera.projection(aspect),
            eye: self.camera.eye(),
            light_position: self.light_position(),
            occluders,
        });

        if self.skybox {
            backend.draw(DrawCommand::Skybox);
        }

        if let Some(avatar) = self.visible_avatar() {
            let transform = self.avatar_transform(avatar);
            for &mesh in &avatar.meshes {
                backend.draw(DrawCommand::Mesh {
                    mesh,
                    transform,
                    shading: Shading::Unlit,
                });
            }
        }

        for body in self.bodies.iter().filter(|b| b.is_visible()) {
            backend.draw(body_command(body));
        }

        for comet in &self.comets {
            backend.update_trail(comet.trail_handle, &comet.trail.vertices());
            // A line strip needs two points.
            if comet.trail.len() >= 2 {
                backend.draw(DrawCommand::Trail {
                    trail: comet.trail_handle,
                });
            }
            if comet.head.is_visible() {
                backend.draw(body_command(&comet.head));
            }
        }

        if let Some(body) = self.selected_body().filter(|b| b.is_visible()) {
            if self.selection.is_engaged() {
                backend.draw(DrawCommand::Marker {
                    geometry: body.handles.sphere.handle,
                    transform: Mat4::from_translation(body.position)
                        * Mat4::from_scale(Vec3::splat(body.radius() * self.follow.marker_scale)),
                    color: self.follow.marker_color,
                });
            }
        }
    }

    /// Roster bodies, in configuration order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Look up a roster body.
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.lookup.get(&id).and_then(|&i| self.bodies.get(i))
    }

    /// Look up a roster body by name.
    pub fn body_by_name(&self, name: &str) -> Option<&Body> {
        self.bodies.iter().find(|b| b.name() == name)
    }

    /// The comets.
    pub fn comets(&self) -> &[Comet] {
        &self.comets
    }

    /// The camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The collapse effect.
    pub fn collapse(&self) -> &CollapseEffect {
        &self.collapse
    }

    /// The selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The selected body, whether or not selection mode is engaged.
    pub fn selected_body(&self) -> Option<&Body> {
        self.selection.current().and_then(|entry| self.body(entry.id))
    }

    /// Shared orbit angle in degrees.
    pub fn orbit_angle(&self) -> f32 {
        self.orbit_clock.angle()
    }

    /// Strategy used by the last frame.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Position of the light source: the luminous body, else the collapse center.
    pub fn light_position(&self) -> Vec3 {
        self.star
            .and_then(|id| self.body(id))
            .map_or(self.collapse.center(), |b| b.position)
    }

    /// Whether the avatar model is drawn this frame.
    pub fn avatar_visible(&self) -> bool {
        self.visible_avatar().is_some()
    }

    fn visible_avatar(&self) -> Option<&Avatar> {
        let shown = self.camera.mode == ViewMode::ThirdPerson && !self.selection.is_engaged();
        self.avatar.as_ref().filter(|a| shown && !a.meshes.is_empty())
    }

    fn avatar_transform(&self, avatar: &Avatar) -> Mat4 {
        Mat4::from_translation(self.camera.position + avatar.settings.offset)
            * Mat4::from_rotation_y(avatar.spin.to_radians())
            * Mat4::from_rotation_z(1.0f32.to_radians())
            * Mat4::from_scale(Vec3::splat(avatar.settings.scale))
    }

    /// Move one body along its orbit. Its center must already be placed.
    fn place(&mut self, id: BodyId, base_angle: f32, dt: f32) {
        let Some(&index) = self.lookup.get(&id) else {
            return;
        };
        let center = match self.bodies[index].center() {
            OrbitCenter::Anchor(point) => point,
            OrbitCenter::Body(parent) => match self.body(parent) {
                Some(parent) => parent.position,
                None => return,
            },
        };
        orbit::advance(&mut self.bodies[index], center, base_angle, dt);
    }

    fn cycle_selection(&mut self) {
        if self.selection.is_empty() {
            log::warn!("No selectable bodies");
            return;
        }
        let entry = if self.selection.is_engaged() {
            self.selection.next()
        } else {
            self.camera.mode = ViewMode::ThirdPerson;
            self.selection.engage()
        };
        if let Some(entry) = entry {
            log::info!("Selected {}", entry.name);
        }
    }

    fn exit_selection(&mut self) {
        if self.selection.is_engaged() {
            self.selection.disengage();
            self.camera.sync_angles();
            log::info!("Selection mode off");
        }
    }

    fn update_camera(&mut self, controls: &CameraControls, dt: f32) {
        if !self.selection.is_engaged() {
            self.camera.update(controls, dt);
            return;
        }
        let target = self.selected_body().map(|b| (b.position, b.radius()));
        if let Some((position, radius)) = target {
            selection::follow(&mut self.camera, position, radius, &self.follow, dt);
        }
    }
}

fn body_command(body: &Body) -> DrawCommand {
    DrawCommand::Body {
        geometry: body.handles.sphere.handle,
        texture: body.handles.texture,
        transform: body.transform(),
        shading: if body.luminous { Shading::Unlit } else { Shading::Lit },
    }
}

fn load_texture(backend: &mut dyn RenderBackend, config: &SceneConfig, path: Option<&PathBuf>) -> TextureHandle {
    match path {
        Some(path) => backend.load_texture(&config.asset_path(path)),
        None => TextureHandle::MISSING,
    }
}

/// Body ids ordered so every parent comes before its children.
fn parents_first(bodies: &[Body], lookup: &HashMap<BodyId, usize>) -> Vec<BodyId> {
    let depth = |body: &Body| {
        let mut depth = 0;
        let mut center = body.center();
        while let OrbitCenter::Body(parent) = center {
            depth += 1;
            match lookup.get(&parent) {
                Some(&i) if depth <= bodies.len() => center = bodies[i].center(),
                _ => break,
            }
        }
        depth
    };
    let mut order: Vec<(usize, BodyId)> = bodies.iter().map(|b| (depth(b), b.id())).collect();
    order.sort_by_key(|&(depth, _)| depth);
    order.into_iter().map(|(_, id)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;

    fn scene() -> (Scene, RecordingBackend) {
        let mut backend = RecordingBackend::new();
        let scene = Scene::build(&SceneConfig::default(), &mut backend).unwrap();
        (scene, backend)
    }

    fn tick(dt: f32, sim_time: f32) -> Tick {
        Tick {
            dt,
            animation_dt: dt,
            sim_time,
            paused: false,
        }
    }

    #[test]
    fn test_moon_updates_after_earth() {
        let (scene, _) = scene();
        let earth = scene.body_by_name("Earth").map(Body::id);
        let moon = scene.body_by_name("Moon").map(Body::id);
        let pos = |id| scene.update_order.iter().position(|&x| Some(x) == id);
        assert!(pos(earth) < pos(moon));
    }

    #[test]
    fn test_initial_layout() {
        let (scene, _) = scene();
        let sun = scene.body_by_name("Sun").map(|b| b.position);
        assert_eq!(sun, Some(Vec3::new(0.0, 0.0, -20.0)));

        // Venus starts at 45° * 1.6
        let venus = scene.body_by_name("Venus").map(|b| b.position).unwrap_or_default();
        let phase = (45.0f32 * 1.6).to_radians();
        let expected = Vec3::new(0.0, 0.0, -20.0) + 10.0 * Vec3::new(phase.cos(), 0.0, phase.sin());
        assert!(venus.abs_diff_eq(expected, 1e-4));

        let earth = scene.body_by_name("Earth").map(|b| b.position).unwrap_or_default();
        let moon = scene.body_by_name("Moon").map(|b| b.position).unwrap_or_default();
        assert!((moon.distance(earth) - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_moon_orbits_current_earth() {
        let (mut scene, _) = scene();
        for i in 1..=30 {
            scene.step(tick(0.1, i as f32 * 0.1), &[], &CameraControls::default());
            let earth = scene.body_by_name("Earth").map(|b| b.position).unwrap_or_default();
            let moon = scene.body_by_name("Moon").map(|b| b.position).unwrap_or_default();
            assert!((moon.distance(earth) - 1.2).abs() < 1e-4);
        }
    }

    #[test]
    fn test_placement_strategy_per_frame() {
        let (mut scene, _) = scene();
        let none = CameraControls::default();

        let report = scene.step(tick(0.1, 0.1), &[], &none);
        assert_eq!(report.placement, Placement::Orbital);

        let report = scene.step(tick(0.1, 0.2), &[Action::ActivateCollapse], &none);
        assert_eq!(report.placement, Placement::Collapsing);

        let report = scene.step(tick(0.1, 0.3), &[Action::ResetCollapse], &none);
        assert_eq!(report.placement, Placement::Restored);

        let report = scene.step(tick(0.1, 0.4), &[], &none);
        assert_eq!(report.placement, Placement::Orbital);
    }

    #[test]
    fn test_view_mode_locked_during_selection() {
        let (mut scene, _) = scene();
        let none = CameraControls::default();

        scene.step(tick(0.0, 0.0), &[Action::CycleSelection], &none);
        assert!(scene.selection().is_engaged());
        assert_eq!(scene.camera().mode, ViewMode::ThirdPerson);

        scene.step(tick(0.0, 0.0), &[Action::FirstPerson], &none);
        assert_eq!(scene.camera().mode, ViewMode::ThirdPerson);

        scene.step(tick(0.0, 0.0), &[Action::ExitSelection, Action::FirstPerson], &none);
        assert!(!scene.selection().is_engaged());
        assert_eq!(scene.camera().mode, ViewMode::FirstPerson);
    }

    #[test]
    fn test_exit_reported() {
        let (mut scene, _) = scene();
        let report = scene.step(tick(0.0, 0.0), &[Action::Exit], &CameraControls::default());
        assert!(report.exit_requested);
    }
}
