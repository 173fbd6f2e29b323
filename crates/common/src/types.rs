use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Surface material: base color plus metallic/roughness scalars.
///
/// Replaced wholesale on update; the renderer never mutates it in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub base_color: Vec3,
    pub metallic: f32,
    pub roughness: f32,
}

impl Material {
    pub fn new(base_color: Vec3, metallic: f32, roughness: f32) -> Self {
        Self {
            base_color,
            metallic,
            roughness,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::new(0.9, 0.6, 0.3),
            metallic: 0.0,
            roughness: 0.6,
        }
    }
}

/// Look-at camera with a perspective projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 3.8),
            target: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::Y,
            fov_y: 60.0_f32.to_radians(),
            near: 0.01,
            far: 100.0,
        }
    }
}

/// Single directional light.
///
/// `direction` points from the lit surface toward the light and is unit
/// length when built through [`DirectionalLight::new`] or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LightFields")]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Build a light, normalizing `direction`. A zero direction falls back to +Y.
    pub fn new(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            direction: direction.try_normalize().unwrap_or(Vec3::Y),
            color,
            intensity,
        }
    }

    /// Light color premultiplied by intensity.
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.6, 1.0, 0.3), Vec3::ONE, 1.0)
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct LightFields {
    direction: Vec3,
    color: Vec3,
    intensity: f32,
}

impl Default for LightFields {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.6, 1.0, 0.3),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl From<LightFields> for DirectionalLight {
    fn from(f: LightFields) -> Self {
        Self::new(f.direction, f.color, f.intensity)
    }
}

/// Clear values applied at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearConfig {
    /// RGBA clear color.
    pub color: Vec4,
    pub depth: f32,
}

impl Default for ClearConfig {
    fn default() -> Self {
        Self {
            color: Vec4::new(0.08, 0.09, 0.11, 1.0),
            depth: 1.0,
        }
    }
}

/// Which triangle faces are discarded during rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CullMode {
    None,
    #[default]
    Back,
    Front,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_direction_is_normalized() {
        let light = DirectionalLight::new(Vec3::new(0.0, 3.0, 4.0), Vec3::ONE, 2.0);
        assert!((light.direction.length() - 1.0).abs() < 1e-6);
        assert!(light.direction.abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), 1e-6));
        assert_eq!(light.radiance(), Vec3::splat(2.0));
    }

    #[test]
    fn zero_light_direction_falls_back_to_up() {
        let light = DirectionalLight::new(Vec3::ZERO, Vec3::ONE, 1.0);
        assert_eq!(light.direction, Vec3::Y);
    }

    #[test]
    fn defaults() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec3::new(0.0, 1.6, 3.8));
        assert!((cam.fov_y - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert_eq!(CullMode::default(), CullMode::Back);
        assert_eq!(ClearConfig::default().depth, 1.0);
        assert_eq!(Material::default().roughness, 0.6);
    }

    #[test]
    fn deserialized_light_is_normalized() {
        let light: DirectionalLight =
            serde_json::from_str(r#"{ "direction": [2.0, 0.0, 0.0], "intensity": 3.0 }"#)
                .unwrap();
        assert!(light.direction.abs_diff_eq(Vec3::X, 1e-6));
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.intensity, 3.0);
    }

    #[test]
    fn partial_material_uses_defaults() {
        let mat: Material = serde_json::from_str(r#"{ "metallic": 1.0 }"#).unwrap();
        assert_eq!(mat.metallic, 1.0);
        assert_eq!(mat.base_color, Material::default().base_color);
    }

    #[test]
    fn cull_mode_lowercase_names() {
        let mode: CullMode = serde_json::from_str(r#""front""#).unwrap();
        assert_eq!(mode, CullMode::Front);
    }
}
