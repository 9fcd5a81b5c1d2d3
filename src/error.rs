//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::gpu::shader_library::MaterialError;

/// Caller-side violations of the preview session's open/close contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// The session was used (rendered, captured, closed) while not open.
    NotOpen,
    /// `open` was called on a session that is already open.
    AlreadyOpen,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => write!(f, "preview session is not open"),
            Self::AlreadyOpen => {
                write!(f, "preview session is already open")
            }
        }
    }
}

impl std::error::Error for LifecycleError {}

/// Errors produced by the vantage crate.
#[derive(Debug)]
pub enum VantageError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Open/close contract violated by the caller.
    Lifecycle(LifecycleError),
    /// A material could not be created, even from the passthrough fallback.
    Material(MaterialError),
    /// A handle did not name a live backend resource.
    UnknownResource(String),
    /// Capture surface readback failed.
    Readback(String),
    /// Field of view must be strictly positive.
    InvalidFieldOfView(f32),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for VantageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle error: {e}"),
            Self::Material(e) => write!(f, "material error: {e}"),
            Self::UnknownResource(what) => {
                write!(f, "unknown resource: {what}")
            }
            Self::Readback(msg) => write!(f, "readback failed: {msg}"),
            Self::InvalidFieldOfView(fov) => {
                write!(f, "field of view must be positive, got {fov}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for VantageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Lifecycle(e) => Some(e),
            Self::Material(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for VantageError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<LifecycleError> for VantageError {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

impl From<MaterialError> for VantageError {
    fn from(e: MaterialError) -> Self {
        Self::Material(e)
    }
}

impl From<std::io::Error> for VantageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
