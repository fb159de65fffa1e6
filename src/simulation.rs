//! The windowed application: event loop, input plumbing and frame pacing.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::SceneConfig;
use crate::error::SimulationError;
use crate::gpu::Renderer;
use crate::input::Input;
use crate::scene::Scene;
use crate::time::SceneClock;

const TITLE_REFRESH_SECS: f64 = 0.5;

/// Opens a window and runs a [`Scene`] in it until exit.
///
/// ```ignore
/// use orrery::{SceneConfig, Simulation};
///
/// Simulation::new(SceneConfig::solar_system()).run()?;
/// ```
pub struct Simulation {
    config: SceneConfig,
}

impl Simulation {
    /// A simulation of `config`.
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }

    /// A simulation of the scene described by a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        Ok(Self::new(SceneConfig::from_json_file(path)?))
    }

    /// The scene description.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Run until the window closes or [`Action::Exit`](crate::Action::Exit) fires.
    pub fn run(self) -> Result<(), SimulationError> {
        self.config.validate()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.config);
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct App {
    config: SceneConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Option<Scene>,
    clock: SceneClock,
    input: Input,
    cursor_grabbed: bool,
    started: Instant,
    last_title: f64,
    error: Option<SimulationError>,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        let mut clock = SceneClock::new();
        clock.set_time_scale(config.time_scale);
        Self {
            config,
            window: None,
            renderer: None,
            scene: None,
            clock,
            input: Input::new(),
            cursor_grabbed: false,
            started: Instant::now(),
            last_title: 0.0,
            error: None,
        }
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let settings = &self.config.window;
        let window_attrs = Window::default_attributes()
            .with_title(settings.title.clone())
            .with_inner_size(LogicalSize::new(settings.width, settings.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let mut renderer = pollster::block_on(Renderer::new(window.clone()))?;
        let scene = Scene::build(&self.config, &mut renderer)?;

        self.cursor_grabbed = grab_cursor(&window);
        // Loading time does not count as the first frame.
        let mut clock = SceneClock::starting_at(self.now());
        clock.set_time_scale(self.clock.time_scale());
        self.clock = clock;

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.scene = Some(scene);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.now();
        let (Some(scene), Some(renderer)) = (&mut self.scene, &mut self.renderer) else {
            return;
        };

        let actions = self.input.actions(&self.config.bindings);
        let controls = self.input.controls();
        let report = scene.advance_frame(&mut self.clock, now, &actions, &controls);
        self.input.begin_frame();

        if report.exit_requested {
            log::info!("Exit requested");
            event_loop.exit();
            return;
        }

        let aspect = renderer.aspect();
        scene.submit(renderer, aspect);
        match renderer.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("Render error: {:?}", e),
        }

        if now - self.last_title >= TITLE_REFRESH_SECS {
            self.last_title = now;
            if let Some(window) = &self.window {
                let mut title = format!("{} | {:.0} fps", self.config.window.title, self.clock.fps());
                if self.clock.is_paused() {
                    title.push_str(" | paused");
                }
                if scene.selection().is_engaged() {
                    if let Some(body) = scene.selected_body() {
                        title.push_str(&format!(" | {}", body.name()));
                    }
                }
                window.set_title(&title);
            }
        }
    }
}

fn grab_cursor(window: &Window) -> bool {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Confined)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked));
    match grabbed {
        Ok(()) => {
            window.set_cursor_visible(false);
            true
        }
        Err(e) => {
            log::warn!("Cursor grab unavailable, using cursor motion: {}", e);
            false
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("Startup failed: {}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.input.handle_event(&event, self.cursor_grabbed);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::Focused(true) => {
                if let Some(window) = &self.window {
                    self.cursor_grabbed = grab_cursor(window);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.cursor_grabbed {
                self.input.add_mouse_motion(dx as f32, dy as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
