//! View adapter: binds a winit window to a wgpu-backed renderer.
//!
//! The window redraws continuously (never on demand). Resize events reach
//! `Renderer::resize` and every redraw calls `Renderer::draw`. The view's
//! configuration is fixed once the window exists.

mod adapter;

pub use adapter::{ViewConfig, ViewError, ViewHandler, run};

pub fn crate_info() -> &'static str {
    "renderkit-view v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("view"));
    }
}
