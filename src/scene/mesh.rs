//! Target object geometry: CPU mesh data and its GPU upload.

use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::camera::bounds::Aabb;

/// Vertex of the object pass and the mesh-based effects.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space unit normal.
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    /// Vertex buffer layout matching `@location(0..2)`.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Unindexed wireframe vertex carrying its corner's barycentric coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WireVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space unit normal.
    pub normal: [f32; 3],
    /// `(1,0,0)`, `(0,1,0)` or `(0,0,1)` for the triangle's three corners.
    pub barycentric: [f32; 3],
}

impl WireVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3
    ];

    /// Vertex buffer layout matching `@location(0..3)`.
    #[must_use]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const CORNERS: [[f32; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Indexed triangle mesh of one sub-mesh of the previewed object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals, one per position.
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned cube centered on the origin with flat-shaded faces.
    #[must_use]
    pub fn cube(half_size: f32) -> Self {
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];
        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let base = mesh.positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (normal + u * su + v * sv) * half_size;
                mesh.positions.push(p.to_array());
                mesh.normals.push(normal.to_array());
            }
            // wind counter-clockwise when seen from outside
            let (a, b) = if u.cross(v).dot(normal) > 0.0 { (1, 3) } else { (3, 1) };
            mesh.indices
                .extend([base, base + a, base + 2, base, base + 2, base + b]);
        }
        mesh
    }

    /// UV sphere centered on the origin.
    #[must_use]
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Self::default();
        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let theta = std::f32::consts::TAU * segment as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.positions.push((n * radius).to_array());
                mesh.normals.push(n.to_array());
            }
        }
        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                mesh.indices.extend([a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    /// Copy moved by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p = (Vec3::from_array(*p) + offset).to_array();
        }
        self
    }

    /// Bounding box of all positions, `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        let points: Vec<Vec3> =
            self.positions.iter().map(|p| Vec3::from_array(*p)).collect();
        Aabb::from_points(&points)
    }

    /// Bounding box of several meshes.
    #[must_use]
    pub fn combined_bounds(meshes: &[Self]) -> Option<Aabb> {
        meshes
            .iter()
            .filter_map(Self::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Whether normals match positions and every index is in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.normals.len() == self.positions.len()
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|i| (*i as usize) < self.positions.len())
    }

    /// Interleaved vertices for the indexed passes.
    #[must_use]
    pub fn vertices(&self) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(position, normal)| MeshVertex {
                position: *position,
                normal: *normal,
            })
            .collect()
    }

    /// Triangles expanded to unindexed vertices with barycentric corners.
    #[must_use]
    pub fn wire_vertices(&self) -> Vec<WireVertex> {
        self.indices
            .chunks_exact(3)
            .flat_map(|tri| {
                tri.iter().zip(CORNERS).map(|(index, barycentric)| {
                    let i = *index as usize;
                    WireVertex {
                        position: self.positions[i],
                        normal: self.normals[i],
                        barycentric,
                    }
                })
            })
            .collect()
    }
}

/// GPU buffers for one sub-mesh.
pub struct GpuMesh {
    /// Interleaved [`MeshVertex`] buffer.
    pub vertex_buffer: wgpu::Buffer,
    /// `u32` triangle indices.
    pub index_buffer: wgpu::Buffer,
    /// Number of indices.
    pub index_count: u32,
    /// Unindexed [`WireVertex`] buffer.
    pub wire_buffer: wgpu::Buffer,
    /// Number of wire vertices.
    pub wire_count: u32,
}

impl GpuMesh {
    /// Upload a mesh. Returns `None` for empty or malformed meshes.
    #[must_use]
    pub fn upload(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Option<Self> {
        if mesh.indices.is_empty() || !mesh.is_valid() {
            log::warn!("skipping mesh '{label}': empty or malformed");
            return None;
        }
        let vertices = mesh.vertices();
        let wire = mesh.wire_vertices();
        let buffer = |suffix: &str, contents: &[u8], usage| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} {suffix}")),
                contents,
                usage,
            })
        };
        Some(Self {
            vertex_buffer: buffer(
                "Vertices",
                bytemuck::cast_slice(&vertices),
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: buffer(
                "Indices",
                bytemuck::cast_slice(&mesh.indices),
                wgpu::BufferUsages::INDEX,
            ),
            index_count: mesh.indices.len() as u32,
            wire_buffer: buffer(
                "Wire Vertices",
                bytemuck::cast_slice(&wire),
                wgpu::BufferUsages::VERTEX,
            ),
            wire_count: wire.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_is_closed_and_bounded() {
        let cube = MeshData::cube(1.0);
        assert!(cube.is_valid());
        assert_eq!(cube.positions.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        let bounds = cube.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        assert_eq!(bounds.max, Vec3::splat(1.0));
    }

    #[test]
    fn cube_triangles_face_outward() {
        let cube = MeshData::cube(1.0);
        for tri in cube.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]]
                .map(|i| Vec3::from_array(cube.positions[i as usize]));
            let face_normal = (b - a).cross(c - a);
            let normal = Vec3::from_array(cube.normals[tri[0] as usize]);
            assert!(face_normal.dot(normal) > 0.0);
        }
    }

    #[test]
    fn sphere_bounds_match_radius() {
        let sphere = MeshData::uv_sphere(0.5, 16, 8).translated(Vec3::X);
        assert!(sphere.is_valid());
        let bounds = sphere.bounds().unwrap();
        assert!((bounds.max.x - 1.5).abs() < 1e-5);
        assert!((bounds.min.y + 0.5).abs() < 1e-5);
    }

    #[test]
    fn combined_bounds_cover_all_meshes() {
        let meshes = [
            MeshData::cube(1.0),
            MeshData::cube(0.5).translated(Vec3::new(3.0, 0.0, 0.0)),
        ];
        let bounds = MeshData::combined_bounds(&meshes).unwrap();
        assert_eq!(bounds.max.x, 3.5);
        assert_eq!(bounds.min.x, -1.0);
        assert!(MeshData::combined_bounds(&[]).is_none());
    }

    #[test]
    fn wire_vertices_tag_each_corner() {
        let cube = MeshData::cube(1.0);
        let wire = cube.wire_vertices();
        assert_eq!(wire.len(), cube.indices.len());
        for tri in wire.chunks_exact(3) {
            assert_eq!(tri[0].barycentric, [1.0, 0.0, 0.0]);
            assert_eq!(tri[1].barycentric, [0.0, 1.0, 0.0]);
            assert_eq!(tri[2].barycentric, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let mut mesh = MeshData::cube(1.0);
        mesh.indices[0] = 999;
        assert!(!mesh.is_valid());
    }
}
