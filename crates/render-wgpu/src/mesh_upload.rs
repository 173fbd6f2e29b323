use renderkit_mesh::{IndexWidth, Indices, Mesh, MeshError};
use renderkit_render::Geometry;
use wgpu::util::DeviceExt;

/// GPU buffer set for one mesh: one vertex buffer per attribute plus the
/// index buffer.
#[derive(Debug)]
pub struct GpuMesh {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub index_count: u32,
    pub index_width: IndexWidth,
}

impl Geometry for GpuMesh {
    fn index_count(&self) -> u32 {
        self.index_count
    }

    fn index_width(&self) -> IndexWidth {
        self.index_width
    }
}

pub fn index_format(width: IndexWidth) -> wgpu::IndexFormat {
    match width {
        IndexWidth::U16 => wgpu::IndexFormat::Uint16,
        IndexWidth::U32 => wgpu::IndexFormat::Uint32,
    }
}

/// Validate `mesh` and upload it into fresh GPU buffers.
pub fn upload_mesh(device: &wgpu::Device, mesh: &Mesh) -> Result<GpuMesh, MeshError> {
    mesh.validate()?;

    let vertex_buffer = |label: &str, contents: &[u8]| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        })
    };
    let positions = vertex_buffer("mesh_positions", bytemuck::cast_slice(&mesh.positions));
    let normals = vertex_buffer("mesh_normals", bytemuck::cast_slice(&mesh.normals));
    let uvs = vertex_buffer("mesh_uvs", bytemuck::cast_slice(&mesh.uvs));

    let index_bytes: &[u8] = match &mesh.indices {
        Indices::U16(v) => bytemuck::cast_slice(v),
        Indices::U32(v) => bytemuck::cast_slice(v),
    };
    let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("mesh_indices"),
        contents: index_bytes,
        usage: wgpu::BufferUsages::INDEX,
    });

    Ok(GpuMesh {
        positions,
        normals,
        uvs,
        indices,
        index_count: mesh.index_count() as u32,
        index_width: mesh.index_width(),
    })
}
