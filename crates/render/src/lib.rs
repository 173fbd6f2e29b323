//! Rendering core: backend-agnostic forward renderer.
//!
//! # Invariants
//! - Every live instance is drawn exactly once per presented frame.
//! - Instance handles never alias a removed instance.
//! - The cached view-projection only changes on resize.
//! - A frame without a drawable is skipped, never reported as an error.
//!
//! The GPU lives behind [`RenderBackend`]. [`RecordingBackend`] implements
//! the same trait without a device, for tests and headless runs.

mod backend;
mod error;
mod instances;
mod recording;
mod renderer;
mod uniforms;

pub use backend::{DrawItem, FrameOutcome, FramePass, Geometry, RenderBackend};
pub use error::RenderError;
pub use instances::{InstanceId, InstanceRecord, InstanceTable};
pub use recording::{RecordedDraw, RecordedFrame, RecordedGeometry, RecordingBackend};
pub use renderer::{Renderer, UpdateFn};
pub use uniforms::{FrameUniforms, ModelUniforms};

pub fn crate_info() -> &'static str {
    "renderkit-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
