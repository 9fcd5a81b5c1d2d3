//! Geometry of the previewed object.
//!
//! The preview core only needs the object's bounds (for framing) and the
//! renderer needs its triangles; [`MeshData`] carries both.

mod mesh;

pub use mesh::{GpuMesh, MeshData, MeshVertex, WireVertex};
