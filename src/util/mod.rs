//! Shared numeric and timing utilities.

pub mod angle;
/// Tick delta time and smoothed frame rate.
pub mod frame_timing;
