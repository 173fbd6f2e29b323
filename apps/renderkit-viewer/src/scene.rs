//! Scene description loaded from JSON and applied to a renderer.

use std::path::Path;

use glam::{Mat4, Vec3};
use renderkit_common::{Camera, ClearConfig, CullMode, DirectionalLight, Material, math};
use renderkit_mesh::Mesh;
use renderkit_render::{InstanceId, RenderBackend, RenderError, Renderer};
use serde::{Deserialize, Serialize};

/// Errors from scene loading.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which primitive to generate for an instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MeshShape {
    Cube {
        #[serde(default = "unit")]
        size: f32,
    },
    Plane {
        #[serde(default = "unit")]
        size: f32,
        #[serde(default)]
        subdivisions: u32,
    },
    Sphere {
        #[serde(default = "half")]
        radius: f32,
        #[serde(default = "sphere_segments")]
        segments: u32,
        #[serde(default = "sphere_rings")]
        rings: u32,
    },
}

fn unit() -> f32 {
    1.0
}

fn half() -> f32 {
    0.5
}

fn sphere_segments() -> u32 {
    32
}

fn sphere_rings() -> u32 {
    16
}

impl Default for MeshShape {
    fn default() -> Self {
        Self::Cube { size: 1.0 }
    }
}

impl MeshShape {
    pub fn build(&self) -> Mesh {
        match *self {
            Self::Cube { size } => renderkit_mesh::cube(size),
            Self::Plane { size, subdivisions } => renderkit_mesh::plane(size, subdivisions),
            Self::Sphere {
                radius,
                segments,
                rings,
            } => renderkit_mesh::uv_sphere(radius, segments, rings),
        }
    }
}

/// One instance in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceDesc {
    pub mesh: MeshShape,
    pub material: Material,
    pub translation: Vec3,
    pub scale: Vec3,
    /// Rotation rate about +Y in radians per second.
    pub spin: f32,
}

impl Default for InstanceDesc {
    fn default() -> Self {
        Self {
            mesh: MeshShape::default(),
            material: Material::default(),
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            spin: 0.0,
        }
    }
}

impl InstanceDesc {
    pub fn transform(&self, angle: f32) -> Mat4 {
        math::translate(self.translation)
            * Mat4::from_rotation_y(angle)
            * math::scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Full scene: renderer configuration plus instances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub camera: Camera,
    pub light: DirectionalLight,
    pub clear: ClearConfig,
    pub cull_mode: CullMode,
    pub instances: Vec<InstanceDesc>,
}

/// An added instance that rotates every frame.
#[derive(Debug, Clone)]
pub struct Spinner {
    pub id: InstanceId,
    pub desc: InstanceDesc,
}

impl Scene {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Built-in scene used when no file is given.
    pub fn demo() -> Self {
        Self {
            instances: vec![
                InstanceDesc {
                    mesh: MeshShape::Plane {
                        size: 8.0,
                        subdivisions: 4,
                    },
                    material: Material::new(Vec3::splat(0.35), 0.0, 0.9),
                    ..Default::default()
                },
                InstanceDesc {
                    mesh: MeshShape::Cube { size: 0.8 },
                    translation: Vec3::new(-1.2, 0.4, 0.0),
                    spin: 0.8,
                    ..Default::default()
                },
                InstanceDesc {
                    mesh: MeshShape::Sphere {
                        radius: 0.5,
                        segments: 48,
                        rings: 24,
                    },
                    material: Material::new(Vec3::new(0.95, 0.93, 0.88), 1.0, 0.25),
                    translation: Vec3::new(1.2, 0.5, 0.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    /// Configure `renderer` and add every instance. Returns the instances
    /// that need per-frame rotation.
    pub fn apply<B: RenderBackend>(
        &self,
        renderer: &mut Renderer<B>,
    ) -> Result<Vec<Spinner>, RenderError> {
        renderer.camera = self.camera;
        renderer.light = self.light;
        renderer.clear = self.clear;
        renderer.cull_mode = self.cull_mode;
        // The cached view-projection only refreshes on resize.
        let (width, height) = renderer.backend().drawable_size();
        renderer.resize(width, height);

        let mut spinners = Vec::new();
        for desc in &self.instances {
            let id = renderer.add_instance(&desc.mesh.build(), desc.material, desc.transform(0.0))?;
            if desc.spin != 0.0 {
                spinners.push(Spinner {
                    id,
                    desc: desc.clone(),
                });
            }
        }
        tracing::info!(
            instances = self.instances.len(),
            spinning = spinners.len(),
            "scene applied"
        );
        Ok(spinners)
    }
}

/// Rotate `spinners` from the renderer's per-frame update hook.
pub fn install_spin<B: RenderBackend + 'static>(renderer: &mut Renderer<B>, spinners: Vec<Spinner>) {
    if spinners.is_empty() {
        return;
    }
    let mut elapsed = 0.0_f32;
    renderer.set_on_update(move |renderer, dt| {
        elapsed += dt;
        for s in &spinners {
            renderer.update_instance(s.id, Some(s.desc.transform(elapsed * s.desc.spin)), None);
        }
    });
}
