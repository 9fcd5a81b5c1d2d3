//! GPU resource management utilities.
//!
//! Provides the renderer seam, wgpu device/surface initialization, offscreen
//! targets and shader composition.

/// Handles and the trait the preview core renders through.
pub mod backend;
/// Shared wgpu boilerplate helpers for bind groups and screen-space pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// Named WGSL shaders with `#import` support via naga-oil.
pub mod shader_library;
/// Scene and readback render-target textures.
pub mod texture;
