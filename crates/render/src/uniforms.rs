use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use renderkit_common::{DirectionalLight, Material};

/// Per-frame block shared by every draw. Layout matches `Frame` in the WGSL shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 3],
    pub _pad0: f32,
    /// Light color premultiplied by intensity; `w` is always 1.
    pub light_color: [f32; 4],
    pub camera_pos: [f32; 3],
    pub _pad1: f32,
}

impl FrameUniforms {
    pub fn new(view_proj: Mat4, light: &DirectionalLight, camera_pos: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: light.direction.to_array(),
            _pad0: 0.0,
            light_color: light.radiance().extend(1.0).to_array(),
            camera_pos: camera_pos.to_array(),
            _pad1: 0.0,
        }
    }
}

/// Per-instance block. Layout matches `Model` in the WGSL shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    pub base_color: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub _pad: [f32; 3],
}

impl ModelUniforms {
    pub fn new(model: Mat4, material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            base_color: material.base_color.to_array(),
            metallic: material.metallic,
            roughness: material.roughness,
            _pad: [0.0; 3],
        }
    }
}
