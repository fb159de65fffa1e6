//! Error types for Orrery.
//!
//! Startup failures (window, GPU, scene description) are fatal and surface
//! as [`SimulationError`]. Asset failures ([`TextureError`], [`ModelError`])
//! are logged by the renderer, which then falls back to a blank texture or
//! an empty mesh list.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for the window.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter can present to the window surface.
    NoAdapter(wgpu::RequestAdapterError),
    /// Failed to create the GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    UnsupportedSurface,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter(e) => write!(f, "No compatible GPU adapter found: {}", e),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::UnsupportedSurface => write!(f, "The window surface has no supported texture format"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::NoAdapter(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::UnsupportedSurface => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        GpuError::NoAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur during texture loading.
#[derive(Debug)]
pub enum TextureError {
    /// Failed to decode the image file.
    ImageLoad(image::ImageError),
    /// No cubemap face could be loaded.
    NoFaces,
    /// Cubemap faces disagree on size.
    FaceSize {
        /// The offending face.
        path: PathBuf,
        /// Size of the first face.
        expected: (u32, u32),
        /// Size of this face.
        found: (u32, u32),
    },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::ImageLoad(e) => write!(f, "Failed to load image: {}", e),
            TextureError::NoFaces => write!(f, "No skybox face could be loaded"),
            TextureError::FaceSize { path, expected, found } => write!(
                f,
                "Skybox face {} is {}x{}, expected {}x{}",
                path.display(),
                found.0,
                found.1,
                expected.0,
                expected.1
            ),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::ImageLoad(e) => Some(e),
            TextureError::NoFaces | TextureError::FaceSize { .. } => None,
        }
    }
}

impl From<image::ImageError> for TextureError {
    fn from(e: image::ImageError) -> Self {
        TextureError::ImageLoad(e)
    }
}

/// Errors that can occur while loading a model file.
#[derive(Debug)]
pub enum ModelError {
    /// The OBJ file could not be read or parsed.
    Load(tobj::LoadError),
    /// The file parsed but contains no triangles.
    Empty(PathBuf),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Load(e) => write!(f, "Failed to load model: {}", e),
            ModelError::Empty(path) => write!(f, "Model {} contains no meshes", path.display()),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Load(e) => Some(e),
            ModelError::Empty(_) => None,
        }
    }
}

impl From<tobj::LoadError> for ModelError {
    fn from(e: tobj::LoadError) -> Self {
        ModelError::Load(e)
    }
}

/// Errors in a scene description.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the scene file.
    Io(std::io::Error),
    /// The scene file is not valid JSON for a scene.
    Parse(serde_json::Error),
    /// Two bodies share a name.
    DuplicateBody(String),
    /// A body names a parent that does not exist.
    UnknownParent {
        /// The orbiting body.
        body: String,
        /// The missing parent name.
        parent: String,
    },
    /// Parent links form a loop.
    ParentCycle(String),
    /// A comet's eccentricity is outside `[0, 1)`.
    Eccentricity {
        /// The comet.
        comet: String,
        /// The rejected value.
        value: f32,
    },
    /// A numeric setting is out of range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read scene file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse scene file: {}", e),
            ConfigError::DuplicateBody(name) => write!(f, "Body '{}' is defined more than once", name),
            ConfigError::UnknownParent { body, parent } => {
                write!(f, "Body '{}' orbits unknown body '{}'", body, parent)
            }
            ConfigError::ParentCycle(name) => write!(f, "Body '{}' is part of a parent cycle", name),
            ConfigError::Eccentricity { comet, value } => write!(
                f,
                "Comet '{}' has eccentricity {}, which must be in [0, 1)",
                comet, value
            ),
            ConfigError::Invalid(msg) => write!(f, "Invalid scene setting: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that can occur when running the interactive scene.
#[derive(Debug)]
pub enum SimulationError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// The scene description was rejected.
    Config(ConfigError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SimulationError::Window(e) => write!(f, "Failed to create window: {}", e),
            SimulationError::Gpu(e) => write!(f, "GPU error: {}", e),
            SimulationError::Config(e) => write!(f, "Scene error: {}", e),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::EventLoop(e) => Some(e),
            SimulationError::Window(e) => Some(e),
            SimulationError::Gpu(e) => Some(e),
            SimulationError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for SimulationError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SimulationError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SimulationError {
    fn from(e: winit::error::OsError) -> Self {
        SimulationError::Window(e)
    }
}

impl From<GpuError> for SimulationError {
    fn from(e: GpuError) -> Self {
        SimulationError::Gpu(e)
    }
}

impl From<ConfigError> for SimulationError {
    fn from(e: ConfigError) -> Self {
        SimulationError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::UnknownParent {
            body: "Moon".into(),
            parent: "Earth".into(),
        };
        assert_eq!(err.to_string(), "Body 'Moon' orbits unknown body 'Earth'");

        let err = ConfigError::Eccentricity {
            comet: "Halley".into(),
            value: 1.0,
        };
        assert!(err.to_string().contains("[0, 1)"));
    }

    #[test]
    fn test_simulation_error_source_chain() {
        let err: SimulationError = ConfigError::DuplicateBody("Sun".into()).into();
        assert!(err.to_string().starts_with("Scene error"));
        assert!(err.source().is_some());
    }
}
