use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::{Indices, Mesh};

/// Axis-aligned cube centered on the origin, 24 vertices (4 per face).
pub fn cube(size: f32) -> Mesh {
    let h = size * 0.5;
    // (normal, u axis, v axis) with u x v == normal so faces wind CCW.
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let base = positions.len() as u32;
        for (su, sv) in corners {
            positions.push((normal + u * su + v * sv) * h);
            normals.push(normal);
            uvs.push(Vec2::new((su + 1.0) * 0.5, (1.0 - sv) * 0.5));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Mesh {
        positions,
        normals,
        uvs,
        indices: Indices::compact(indices),
    }
}

/// Flat square in the XZ plane facing +Y, split into a grid of quads.
pub fn plane(size: f32, subdivisions: u32) -> Mesh {
    let n = subdivisions.max(1);
    let h = size * 0.5;
    let row = n + 1;

    let mut positions = Vec::with_capacity((row * row) as usize);
    let mut uvs = Vec::with_capacity((row * row) as usize);
    for j in 0..row {
        for i in 0..row {
            let (fu, fv) = (i as f32 / n as f32, j as f32 / n as f32);
            positions.push(Vec3::new(-h + size * fu, 0.0, -h + size * fv));
            uvs.push(Vec2::new(fu, fv));
        }
    }

    let mut indices = Vec::with_capacity((n * n * 6) as usize);
    for j in 0..n {
        for i in 0..n {
            let p00 = j * row + i;
            let p10 = p00 + 1;
            let p01 = p00 + row;
            let p11 = p01 + 1;
            indices.extend_from_slice(&[p00, p01, p11, p00, p11, p10]);
        }
    }

    Mesh {
        normals: vec![Vec3::Y; positions.len()],
        positions,
        uvs,
        indices: Indices::compact(indices),
    }
}

/// Latitude/longitude sphere. `segments` is clamped to at least 3 and
/// `rings` to at least 2.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let stride = segments + 1;

    let vertex_count = (stride * (rings + 1)) as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for r in 0..=rings {
        let theta = PI * r as f32 / rings as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        for s in 0..=segments {
            let phi = TAU * s as f32 / segments as f32;
            let (sin_p, cos_p) = phi.sin_cos();
            let n = Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p);
            positions.push(n * radius);
            normals.push(n);
            uvs.push(Vec2::new(s as f32 / segments as f32, r as f32 / rings as f32));
        }
    }

    let mut indices = Vec::with_capacity((segments * (rings - 1) * 6) as usize);
    for r in 0..rings {
        for s in 0..segments {
            let a = r * stride + s;
            let b = a + stride;
            let c = a + 1;
            let d = b + 1;
            // Skip the triangles that collapse onto a pole.
            if r != 0 {
                indices.extend_from_slice(&[a, c, b]);
            }
            if r != rings - 1 {
                indices.extend_from_slice(&[c, d, b]);
            }
        }
    }

    tracing::trace!(
        vertices = positions.len(),
        indices = indices.len(),
        "generated uv sphere"
    );

    Mesh {
        positions,
        normals,
        uvs,
        indices: Indices::compact(indices),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IndexWidth;

    /// Every triangle's geometric normal agrees with its vertex normals.
    fn assert_outward_winding(mesh: &Mesh) {
        let idx: Vec<u32> = mesh.indices.iter().collect();
        for tri in idx.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
            let face = (mesh.positions[b] - mesh.positions[a])
                .cross(mesh.positions[c] - mesh.positions[a]);
            let avg = mesh.normals[a] + mesh.normals[b] + mesh.normals[c];
            assert!(face.dot(avg) > 0.0, "triangle {tri:?} winds inward");
        }
    }

    #[test]
    fn cube_counts_and_winding() {
        let mesh = cube(2.0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.index_width(), IndexWidth::U16);
        assert!(mesh.validate().is_ok());
        assert!(mesh.positions.iter().all(|p| p.abs().max_element() == 1.0));
        assert_outward_winding(&mesh);
    }

    #[test]
    fn plane_counts_and_winding() {
        let mesh = plane(4.0, 3);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.index_count(), 54);
        assert!(mesh.validate().is_ok());
        assert_outward_winding(&mesh);
    }

    #[test]
    fn plane_clamps_subdivisions() {
        let mesh = plane(1.0, 0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.index_count(), 6);
    }

    #[test]
    fn sphere_counts_and_winding() {
        let mesh = uv_sphere(0.5, 16, 8);
        assert_eq!(mesh.vertex_count(), 17 * 9);
        assert_eq!(mesh.index_count(), (16 * 2 * 7 * 3) as usize);
        assert!(mesh.validate().is_ok());
        assert!(
            mesh.positions
                .iter()
                .all(|p| (p.length() - 0.5).abs() < 1e-5)
        );
        assert_outward_winding(&mesh);
    }

    #[test]
    fn dense_sphere_switches_to_u32_indices() {
        let mesh = uv_sphere(1.0, 512, 256);
        assert!(mesh.vertex_count() > u16::MAX as usize);
        assert_eq!(mesh.index_width(), IndexWidth::U32);
        assert!(mesh.validate().is_ok());
    }
}
