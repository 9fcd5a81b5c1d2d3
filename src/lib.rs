// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Camera-and-rendering core of an interactive 3D asset preview viewer,
//! built on wgpu.
//!
//! Vantage frames a target object with an orbit camera rig, renders it with
//! switchable diagnostic overlays (wireframe, ground grid, planar shadow,
//! depth/normal view, solid tint) bound to ordered pipeline stages, and
//! captures supersampled screenshots with optional transparency.
//!
//! # Key entry points
//!
//! - [`preview::PreviewSession`] - owns the rig, the effect pipeline and
//!   every backend resource between `open` and `close`
//! - [`camera::OrbitCameraRig`] - smoothed yaw/pitch/distance orbit camera
//! - [`effects::EffectPipeline`] - effect descriptors and stage bindings
//! - [`capture::CaptureService`] - supersampled, sRGB-correct screenshots
//! - [`renderer::WgpuBackend`] - the wgpu implementation of
//!   [`gpu::backend::GraphicsBackend`]
//! - [`options::Options`] - TOML-backed configuration
//!
//! # Architecture
//!
//! The preview core talks to the renderer only through
//! [`gpu::backend::GraphicsBackend`], handing out small copyable handles
//! for cameras, nodes, materials, commands and surfaces. Everything above
//! that seam is GPU-free and is tested against an in-memory backend.

pub mod camera;
pub mod capture;
pub mod effects;
pub mod error;
pub mod gpu;
pub mod options;
pub mod preview;
pub mod renderer;
pub mod scene;
#[cfg(test)]
mod testing;
pub mod util;

pub use error::VantageError;
pub use options::Options;
pub use preview::PreviewSession;
