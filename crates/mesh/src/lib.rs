//! Mesh description consumed by the renderer.
//!
//! A mesh is split into three separately stored vertex attributes
//! (position, normal, UV) plus an index list, matching the three vertex
//! buffer slots the render pipeline expects.
//!
//! # Invariants
//! - A mesh that passed [`Mesh::validate`] has equal-length attribute
//!   arrays, a non-empty triangle list and only in-range indices.
//! - Generators always emit counter-clockwise front faces.

mod primitives;

use glam::{Vec2, Vec3};

pub use primitives::{cube, plane, uv_sphere};

/// Width of one index element on the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    /// Size of one index in bytes.
    pub fn bytes(self) -> u64 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Triangle-list indices in their GPU element width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    /// Pack `indices` as 16-bit when every index fits, 32-bit otherwise.
    pub fn compact(indices: Vec<u32>) -> Self {
        if indices.iter().all(|&i| i <= u16::MAX as u32) {
            Self::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            Self::U32(indices)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> IndexWidth {
        match self {
            Self::U16(_) => IndexWidth::U16,
            Self::U32(_) => IndexWidth::U32,
        }
    }

    /// Iterate indices widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Self::U16(v) => Box::new(v.iter().map(|&i| i as u32)),
            Self::U32(v) => Box::new(v.iter().copied()),
        }
    }
}

/// Errors raised when a mesh cannot be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no vertices")]
    NoVertices,
    #[error("mesh has no indices")]
    NoIndices,
    #[error("{attribute} has {found} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("index count {0} is not a multiple of 3")]
    NotTriangles(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
}

/// Indexed triangle mesh with per-vertex position, normal and UV.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Indices,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn index_width(&self) -> IndexWidth {
        self.indices.width()
    }

    /// Check that the mesh can be drawn as an indexed triangle list.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.positions.len();
        if vertex_count == 0 {
            return Err(MeshError::NoVertices);
        }
        if self.normals.len() != vertex_count {
            return Err(MeshError::AttributeLength {
                attribute: "normals",
                expected: vertex_count,
                found: self.normals.len(),
            });
        }
        if self.uvs.len() != vertex_count {
            return Err(MeshError::AttributeLength {
                attribute: "uvs",
                expected: vertex_count,
                found: self.uvs.len(),
            });
        }
        if self.indices.is_empty() {
            return Err(MeshError::NoIndices);
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::NotTriangles(self.indices.len()));
        }
        if let Some(index) = self.indices.iter().find(|&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }
}

pub fn crate_info() -> &'static str {
    "renderkit-mesh v0.1.0"
}
