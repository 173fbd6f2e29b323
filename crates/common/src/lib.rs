//! Shared value types for the renderer: material, camera, light, clear
//! values, cull mode, plus the 4x4 matrix helpers used to build the
//! view-projection.
//!
//! # Invariants
//! - All types are plain values; nothing here touches the GPU.
//! - `DirectionalLight::direction` is unit length after construction.

pub mod math;
mod types;

pub use types::{Camera, ClearConfig, CullMode, DirectionalLight, Material};

pub fn crate_info() -> &'static str {
    "renderkit-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
