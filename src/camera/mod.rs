//! Camera system for previewing a single object.
//!
//! Provides a damped orbital rig with auto-framing, the render camera and
//! its GPU uniform, bounding volumes, and pointer input mapping.

/// Axis-aligned bounding boxes for framing targets.
pub mod bounds;
/// Core camera struct and GPU uniform types.
pub mod core;
/// Pointer-event-based camera input mapping.
pub mod input;
/// Orbital camera rig: damping, zoom limits and fit-to-bounds.
pub mod rig;

pub use bounds::Aabb;
pub use rig::{CameraTransform, OrbitCameraRig, OrbitState, RigInput};
