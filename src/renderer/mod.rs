//! wgpu renderer behind the [`GraphicsBackend`](crate::gpu::backend::GraphicsBackend)
//! seam.
//!
//! Draws the target meshes with a Lambert object pass and executes effect
//! commands bound to the pipeline stages: full-screen blits through a
//! scratch texture and geometry overrides redrawn over the scene.

mod downsample;
mod materials;
mod object_pass;
pub(crate) mod pipeline_util;
mod readback;
mod wgpu_backend;

pub use wgpu_backend::WgpuBackend;
