use renderkit_common::{ClearConfig, CullMode};
use renderkit_mesh::{IndexWidth, Mesh};

use crate::RenderError;
use crate::uniforms::{FrameUniforms, ModelUniforms};

/// GPU-resident buffer set for one instance, as seen by the draw loop.
pub trait Geometry {
    fn index_count(&self) -> u32;
    fn index_width(&self) -> IndexWidth;
}

/// One indexed draw: the instance's buffers plus its model uniforms.
#[derive(Debug)]
pub struct DrawItem<'a, G> {
    pub geometry: &'a G,
    pub model: ModelUniforms,
}

/// Everything a backend needs to encode one frame.
#[derive(Debug)]
pub struct FramePass<'a, G> {
    pub clear: ClearConfig,
    pub cull_mode: CullMode,
    pub frame: FrameUniforms,
    pub draws: Vec<DrawItem<'a, G>>,
}

/// Result of one `draw` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was encoded, submitted and presented.
    Presented,
    /// No drawable was available; nothing was encoded.
    Skipped,
}

/// Device-side half of the renderer. All backends implement this trait.
///
/// The renderer decides *what* to draw each frame; the backend owns the
/// device, the drawable and the pipeline and decides *how*.
pub trait RenderBackend {
    /// Buffer set produced by [`RenderBackend::upload_mesh`].
    type Geometry: Geometry;

    /// Current drawable size in physical pixels.
    fn drawable_size(&self) -> (u32, u32);

    /// Upload a mesh into GPU buffers.
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<Self::Geometry, RenderError>;

    /// The drawable is about to change size.
    fn resize(&mut self, width: u32, height: u32);

    /// Acquire the drawable, encode `pass`, submit and present.
    ///
    /// Returns [`FrameOutcome::Skipped`] without encoding anything when no
    /// drawable is available.
    fn submit(&mut self, pass: &FramePass<'_, Self::Geometry>) -> FrameOutcome;
}
