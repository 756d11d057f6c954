//! Rendering seam
//!
//! Components never talk to a graphics API. During the render phase they
//! describe what they want drawn and hand it to a [`RenderBackend`]; a real
//! backend turns those descriptions into GPU work. [`NullRenderer`] and
//! [`RecordingRenderer`] cover headless runs and tests.

use crate::ecs::GameObjectId;
use crate::foundation::math::{Color, Mat4, Vec3};

/// Rendering errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Mesh, texture or shader not known to the backend
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Backend failed to accept the draw
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// A textured or coloured mesh draw
#[derive(Debug, Clone, PartialEq)]
pub struct MeshDraw {
    /// Object that issued the draw
    pub owner: GameObjectId,
    /// Mesh resource name
    pub mesh: String,
    /// Optional texture resource name
    pub texture: Option<String>,
    /// Shader program name
    pub shader: String,
    /// Tint colour
    pub color: Color,
    /// How strongly `color` replaces the texture colour, in `[0, 1]`
    pub apply_force: f32,
    /// Blend as transparent geometry
    pub transparent: bool,
    /// Cull back faces
    pub backface_culling: bool,
    /// Projection matrix of the frame
    pub projection: Mat4,
    /// Accumulated view * model matrix of the owner
    pub model_view: Mat4,
}

/// A screen-space textured quad
#[derive(Debug, Clone, PartialEq)]
pub struct GuiDraw {
    /// Object that issued the draw
    pub owner: GameObjectId,
    /// Texture resource name
    pub texture: String,
    /// Tint colour
    pub color: Color,
    /// Left edge in pixels
    pub x: f32,
    /// Bottom edge in pixels
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

/// One live particle, positioned in the emitter's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleInstance {
    /// Local position
    pub position: Vec3,
    /// Uniform billboard scale
    pub scale: f32,
    /// Billboard roll in degrees
    pub angle: f32,
    /// Colour at the particle's current age
    pub color: Color,
}

/// A batch of billboards from one emitter
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleDraw {
    /// Object that issued the draw
    pub owner: GameObjectId,
    /// Billboard texture
    pub texture: Option<String>,
    /// Projection matrix of the frame
    pub projection: Mat4,
    /// Accumulated view * model matrix of the emitter
    pub model_view: Mat4,
    /// Live particles
    pub particles: Vec<ParticleInstance>,
}

/// Rendering backend trait
pub trait RenderBackend {
    /// Drawable surface size in pixels (width, height)
    fn surface_size(&self) -> (u32, u32);

    /// Submit a mesh draw
    fn draw_mesh(&mut self, draw: MeshDraw) -> BackendResult<()>;

    /// Submit a GUI quad
    fn draw_gui(&mut self, draw: GuiDraw) -> BackendResult<()>;

    /// Submit a particle batch
    fn draw_particles(&mut self, draw: ParticleDraw) -> BackendResult<()>;
}

/// Backend that accepts and discards everything
#[derive(Debug, Clone, Copy)]
pub struct NullRenderer {
    width: u32,
    height: u32,
}

impl NullRenderer {
    /// Create a null renderer reporting the given surface size
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl RenderBackend for NullRenderer {
    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw_mesh(&mut self, _draw: MeshDraw) -> BackendResult<()> {
        Ok(())
    }

    fn draw_gui(&mut self, _draw: GuiDraw) -> BackendResult<()> {
        Ok(())
    }

    fn draw_particles(&mut self, _draw: ParticleDraw) -> BackendResult<()> {
        Ok(())
    }
}

/// A submitted draw, as stored by [`RecordingRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// From [`RenderBackend::draw_mesh`]
    Mesh(MeshDraw),
    /// From [`RenderBackend::draw_gui`]
    Gui(GuiDraw),
    /// From [`RenderBackend::draw_particles`]
    Particles(ParticleDraw),
}

impl DrawCall {
    /// Object that issued the draw
    pub const fn owner(&self) -> GameObjectId {
        match self {
            Self::Mesh(draw) => draw.owner,
            Self::Gui(draw) => draw.owner,
            Self::Particles(draw) => draw.owner,
        }
    }
}

/// Backend that records every draw in submission order
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    surface: NullRenderer,
    /// Draws received so far
    pub draws: Vec<DrawCall>,
}

impl RecordingRenderer {
    /// Create an empty recorder with an 800x600 surface
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh draws only
    pub fn meshes(&self) -> impl Iterator<Item = &MeshDraw> {
        self.draws.iter().filter_map(|draw| match draw {
            DrawCall::Mesh(mesh) => Some(mesh),
            _ => None,
        })
    }

    /// Forget recorded draws
    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for RecordingRenderer {
    fn surface_size(&self) -> (u32, u32) {
        self.surface.surface_size()
    }

    fn draw_mesh(&mut self, draw: MeshDraw) -> BackendResult<()> {
        self.draws.push(DrawCall::Mesh(draw));
        Ok(())
    }

    fn draw_gui(&mut self, draw: GuiDraw) -> BackendResult<()> {
        self.draws.push(DrawCall::Gui(draw));
        Ok(())
    }

    fn draw_particles(&mut self, draw: ParticleDraw) -> BackendResult<()> {
        self.draws.push(DrawCall::Particles(draw));
        Ok(())
    }
}
