use glam::{Mat4, Vec3, Vec4};

use crate::Camera;

/// Right-handed perspective projection with a 0..1 depth range.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, aspect, near, far)
}

/// Right-handed view matrix looking from `eye` toward `center`.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, center, up)
}

pub fn scale(sx: f32, sy: f32, sz: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(sx, 0.0, 0.0, 0.0),
        Vec4::new(0.0, sy, 0.0, 0.0),
        Vec4::new(0.0, 0.0, sz, 0.0),
        Vec4::W,
    )
}

pub fn translate(t: Vec3) -> Mat4 {
    Mat4::from_translation(t)
}

/// Drawable aspect ratio, clamped to at least 1 and safe for zero sizes.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    (width as f32 / height.max(1) as f32).max(1.0)
}

/// `perspective * look_at` for `camera` rendered into a `width` x `height` drawable.
pub fn view_projection(camera: &Camera, width: u32, height: u32) -> Mat4 {
    let proj = perspective(
        camera.fov_y,
        aspect_ratio(width, height),
        camera.near,
        camera.far,
    );
    let view = look_at(camera.position, camera.target, camera.up);
    proj * view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_close(a: Mat4, b: Mat4) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-5, "component {i}: {x} != {y}");
        }
    }

    #[test]
    fn perspective_matches_closed_form() {
        let (fov, aspect, near, far) = (1.0_f32, 1.5_f32, 0.1_f32, 50.0_f32);
        let y = 1.0 / (fov * 0.5).tan();
        let x = y / aspect;
        let z = far / (near - far);
        let expected = Mat4::from_cols(
            Vec4::new(x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, z, -1.0),
            Vec4::new(0.0, 0.0, z * near, 0.0),
        );
        assert_mat_close(perspective(fov, aspect, near, far), expected);
    }

    #[test]
    fn look_at_maps_eye_to_origin() {
        let eye = Vec3::new(2.0, 3.0, 4.0);
        let view = look_at(eye, Vec3::ZERO, Vec3::Y);
        let p = view.transform_point3(eye);
        assert!(p.length() < 1e-5);
        // Target lands on the -Z axis.
        let t = view.transform_point3(Vec3::ZERO);
        assert!(t.x.abs() < 1e-5 && t.y.abs() < 1e-5 && t.z < 0.0);
    }

    #[test]
    fn scale_and_translate() {
        let m = translate(Vec3::new(1.0, 2.0, 3.0)) * scale(2.0, 3.0, 4.0);
        assert_eq!(
            m.transform_point3(Vec3::ONE),
            Vec3::new(3.0, 5.0, 7.0)
        );
    }

    #[test]
    fn aspect_is_clamped() {
        assert_eq!(aspect_ratio(1600, 900), 1600.0 / 900.0);
        assert_eq!(aspect_ratio(900, 1600), 1.0);
        assert_eq!(aspect_ratio(0, 0), 1.0);
        assert_eq!(aspect_ratio(640, 0), 640.0);
    }

    #[test]
    fn view_projection_is_deterministic() {
        let cam = Camera::default();
        assert_eq!(
            view_projection(&cam, 1280, 720),
            view_projection(&cam, 1280, 720)
        );
    }
}
