use renderkit_common::{ClearConfig, CullMode};
use renderkit_mesh::{IndexWidth, Mesh};

use crate::RenderError;
use crate::backend::{FrameOutcome, FramePass, Geometry, RenderBackend};
use crate::uniforms::{FrameUniforms, ModelUniforms};

/// Buffer set handed out by [`RecordingBackend`]; `id` stands in for the
/// GPU buffer bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedGeometry {
    pub id: u64,
    pub vertex_count: u32,
    pub index_count: u32,
    pub index_width: IndexWidth,
}

impl Geometry for RecordedGeometry {
    fn index_count(&self) -> u32 {
        self.index_count
    }

    fn index_width(&self) -> IndexWidth {
        self.index_width
    }
}

/// One indexed draw call as the backend received it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    pub geometry: u64,
    pub index_count: u32,
    pub index_width: IndexWidth,
    pub model: ModelUniforms,
}

/// One frame that was encoded and presented.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub clear: ClearConfig,
    pub cull_mode: CullMode,
    pub frame: FrameUniforms,
    pub draws: Vec<RecordedDraw>,
}

/// GPU-free backend that records the frames it is asked to draw.
///
/// Used for tests and for headless runs. Mesh uploads are validated the
/// same way the GPU backend validates them.
#[derive(Debug)]
pub struct RecordingBackend {
    size: (u32, u32),
    drawable_available: bool,
    next_geometry: u64,
    frames: Vec<RecordedFrame>,
    retain: Option<usize>,
    presented: usize,
    skipped: usize,
}

impl RecordingBackend {
    /// Backend that keeps every presented frame.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            drawable_available: true,
            next_geometry: 0,
            frames: Vec::new(),
            retain: None,
            presented: 0,
            skipped: 0,
        }
    }

    /// Backend that keeps only the most recent `keep` frames (at least one).
    pub fn with_retention(width: u32, height: u32, keep: usize) -> Self {
        Self {
            retain: Some(keep.max(1)),
            ..Self::new(width, height)
        }
    }

    /// Simulate a host view that has no drawable (e.g. a minimized window).
    pub fn set_drawable_available(&mut self, available: bool) {
        self.drawable_available = available;
    }

    /// Retained frames, oldest first.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    /// Number of frames presented so far, retained or not.
    pub fn presented(&self) -> usize {
        self.presented
    }

    /// Number of frames skipped for lack of a drawable.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of buffer sets uploaded so far.
    pub fn uploads(&self) -> u64 {
        self.next_geometry
    }
}

impl RenderBackend for RecordingBackend {
    type Geometry = RecordedGeometry;

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<RecordedGeometry, RenderError> {
        mesh.validate()?;
        let id = self.next_geometry;
        self.next_geometry += 1;
        Ok(RecordedGeometry {
            id,
            vertex_count: mesh.vertex_count() as u32,
            index_count: mesh.index_count() as u32,
            index_width: mesh.index_width(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn submit(&mut self, pass: &FramePass<'_, RecordedGeometry>) -> FrameOutcome {
        if !self.drawable_available || self.size.0 == 0 || self.size.1 == 0 {
            self.skipped += 1;
            return FrameOutcome::Skipped;
        }
        let draws = pass
            .draws
            .iter()
            .map(|item| RecordedDraw {
                geometry: item.geometry.id,
                index_count: item.geometry.index_count(),
                index_width: item.geometry.index_width(),
                model: item.model,
            })
            .collect();
        self.frames.push(RecordedFrame {
            clear: pass.clear,
            cull_mode: pass.cull_mode,
            frame: pass.frame,
            draws,
        });
        self.presented += 1;
        if let Some(keep) = self.retain {
            if self.frames.len() > keep {
                let excess = self.frames.len() - keep;
                self.frames.drain(..excess);
            }
        }
        FrameOutcome::Presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Renderer;
    use glam::Mat4;
    use renderkit_common::Material;

    #[test]
    fn retention_keeps_latest_frames() {
        let mut r = Renderer::new(RecordingBackend::with_retention(640, 480, 2));
        let id = r
            .add_instance(&renderkit_mesh::cube(1.0), Material::default(), Mat4::IDENTITY)
            .unwrap();
        for step in 0..5 {
            let t = Mat4::from_translation(glam::Vec3::X * step as f32);
            r.update_instance(id, Some(t), None);
            r.draw();
        }

        let backend = r.backend();
        assert_eq!(backend.presented(), 5);
        assert_eq!(backend.frames().len(), 2);
        let last = backend.last_frame().unwrap();
        assert_eq!(
            last.draws[0].model.model,
            Mat4::from_translation(glam::Vec3::X * 4.0).to_cols_array_2d()
        );
    }

    #[test]
    fn zero_retention_still_keeps_last_frame() {
        let mut r = Renderer::new(RecordingBackend::with_retention(640, 480, 0));
        r.draw();
        r.draw();
        assert_eq!(r.backend().frames().len(), 1);
        assert!(r.backend().last_frame().is_some());
    }

    #[test]
    fn unbounded_backend_keeps_everything() {
        let mut r = Renderer::new(RecordingBackend::new(640, 480));
        for _ in 0..4 {
            r.draw();
        }
        assert_eq!(r.backend().frames().len(), 4);
        assert_eq!(r.backend().presented(), 4);
    }
}
