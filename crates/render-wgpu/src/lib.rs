//! wgpu render backend.
//!
//! Draws every instance with one forward pipeline under a single
//! directional light. Geometry lives in three vertex buffers per instance
//! (position, normal, UV); per-instance uniforms share one buffer addressed
//! by dynamic offset.
//!
//! # Invariants
//! - Color format, depth format and sample count are fixed at construction.
//! - Setup failures are returned as `RenderError`, never panics.
//! - A frame without a drawable is skipped.

mod config;
mod gpu;
mod mesh_upload;
mod pipeline;
mod shaders;

pub use config::{DEPTH_FORMAT, RendererConfig};
pub use gpu::WgpuBackend;
pub use mesh_upload::{GpuMesh, index_format, upload_mesh};
pub use shaders::{FORWARD_SHADER, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// Renderer driving a wgpu surface.
pub type WgpuRenderer = renderkit_render::Renderer<WgpuBackend>;

pub fn crate_info() -> &'static str {
    "renderkit-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("wgpu"));
    }
}
