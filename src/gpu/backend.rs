//! Interface to the rendering collaborator.
//!
//! The preview core never touches wgpu directly. Everything it needs from a
//! renderer (cameras, pivot nodes, materials, effect commands, render
//! surfaces, frame submission and readback) goes through
//! [`GraphicsBackend`]. Resources are named by small copyable handles that
//! the backend hands out and the caller gives back through
//! [`GraphicsBackend::release`].

use std::fmt;

use glam::Mat4;

use crate::camera::core::Camera;
use crate::effects::{CommandStyle, EffectKind, EffectParams, StageBindings};
use crate::error::VantageError;
use crate::gpu::shader_library::MaterialError;

/// Shader name of the fallback material used when an effect's shader fails
/// to resolve. Blit commands copy the frame unchanged through it; geometry
/// commands skip drawing.
pub const PASSTHROUGH: &str = "passthrough";

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

define_handle!(
    /// Offscreen camera owned by the backend.
    CameraHandle
);
define_handle!(
    /// Transform node (model pivot, light pivot).
    NodeHandle
);
define_handle!(
    /// Material built from a named shader.
    MaterialHandle
);
define_handle!(
    /// Effect command that can be bound to a pipeline stage.
    CommandHandle
);
define_handle!(
    /// Render target or readback surface.
    SurfaceHandle
);

/// Any releasable backend resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// An offscreen camera.
    Camera(CameraHandle),
    /// A transform node.
    Node(NodeHandle),
    /// A material.
    Material(MaterialHandle),
    /// An effect command.
    Command(CommandHandle),
    /// A render or readback surface.
    Surface(SurfaceHandle),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera(h) => h.fmt(f),
            Self::Node(h) => h.fmt(f),
            Self::Material(h) => h.fmt(f),
            Self::Command(h) => h.fmt(f),
            Self::Surface(h) => h.fmt(f),
        }
    }
}

/// What a surface is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceUsage {
    /// Linear-light HDR scene target with depth and normals.
    Scene,
    /// 8-bit RGBA target that can be read back to the CPU.
    Readback,
}

/// Surface creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDesc {
    /// Width in pixels (at least 1).
    pub width: u32,
    /// Height in pixels (at least 1).
    pub height: u32,
    /// Intended use.
    pub usage: SurfaceUsage,
}

/// Effect command creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Effect the command draws.
    pub kind: EffectKind,
    /// Blit or geometry override.
    pub style: CommandStyle,
    /// Material the command draws with.
    pub material: MaterialHandle,
}

/// One frame to render.
#[derive(Debug, Clone, Copy)]
pub struct FrameRequest<'a> {
    /// Camera whose uniforms are updated from `view`.
    pub camera: CameraHandle,
    /// Scene surface the frame is drawn into.
    pub target: SurfaceHandle,
    /// View and projection for this frame.
    pub view: Camera,
    /// Clear color (linear RGBA).
    pub clear_color: [f32; 4],
    /// Node holding the object's model transform.
    pub model_node: NodeHandle,
    /// Node whose +Y axis points toward the key light.
    pub light_node: NodeHandle,
    /// Ambient light term.
    pub ambient: f32,
    /// World-space height of the ground plane (grid and shadow).
    pub ground_height: f32,
    /// Effect commands bound per stage.
    pub bindings: &'a StageBindings,
}

/// Rendering collaborator used by the preview core.
///
/// Implementations must execute stage bindings in
/// [`PipelineStage::ALL`](crate::effects::PipelineStage::ALL) order, with
/// commands in the same stage in attach order.
pub trait GraphicsBackend {
    /// Create an offscreen camera.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot allocate the camera.
    fn create_camera(&mut self, label: &str) -> Result<CameraHandle, VantageError>;

    /// Create a transform node initialized to identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot allocate the node.
    fn create_node(&mut self, label: &str) -> Result<NodeHandle, VantageError>;

    /// Set a node's world transform.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] for a released node.
    fn set_node_transform(
        &mut self,
        node: NodeHandle,
        transform: Mat4,
    ) -> Result<(), VantageError>;

    /// Build a material from the shader registered under `shader`.
    ///
    /// # Errors
    ///
    /// Returns a [`MaterialError`] if the shader is unknown or fails to
    /// compile.
    fn create_material(&mut self, shader: &str) -> Result<MaterialHandle, MaterialError>;

    /// Write parameters to a material.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] for a released material.
    fn update_material(
        &mut self,
        material: MaterialHandle,
        params: &EffectParams,
    ) -> Result<(), VantageError>;

    /// Create an effect command.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] if the material is not live.
    fn create_command(&mut self, spec: &CommandSpec) -> Result<CommandHandle, VantageError>;

    /// Allocate a surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot allocate the surface.
    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceHandle, VantageError>;

    /// Size of a live surface.
    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)>;

    /// Release a resource. Releasing an unknown handle is a no-op.
    fn release(&mut self, resource: Resource);

    /// Render one frame: clear, bound effects and the object pass, in stage
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] if any referenced handle is
    /// not live.
    fn render_frame(&mut self, frame: &FrameRequest<'_>) -> Result<(), VantageError>;

    /// Box-filter `src` down (or copy) into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] if either surface is not live.
    fn blit(&mut self, src: SurfaceHandle, dst: SurfaceHandle) -> Result<(), VantageError>;

    /// Encode linear values to sRGB when writing to readback surfaces.
    fn set_srgb_write(&mut self, enabled: bool);

    /// Whether scene surfaces hold linear-light values.
    fn linear_color_space(&self) -> bool;

    /// Copy a readback surface to the CPU as tightly packed RGBA8 rows.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readback`] if mapping fails.
    fn read_pixels(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, VantageError>;
}

impl<B: GraphicsBackend + ?Sized> GraphicsBackend for &mut B {
    fn create_camera(&mut self, label: &str) -> Result<CameraHandle, VantageError> {
        (**self).create_camera(label)
    }

    fn create_node(&mut self, label: &str) -> Result<NodeHandle, VantageError> {
        (**self).create_node(label)
    }

    fn set_node_transform(
        &mut self,
        node: NodeHandle,
        transform: Mat4,
    ) -> Result<(), VantageError> {
        (**self).set_node_transform(node, transform)
    }

    fn create_material(&mut self, shader: &str) -> Result<MaterialHandle, MaterialError> {
        (**self).create_material(shader)
    }

    fn update_material(
        &mut self,
        material: MaterialHandle,
        params: &EffectParams,
    ) -> Result<(), VantageError> {
        (**self).update_material(material, params)
    }

    fn create_command(&mut self, spec: &CommandSpec) -> Result<CommandHandle, VantageError> {
        (**self).create_command(spec)
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceHandle, VantageError> {
        (**self).create_surface(desc)
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        (**self).surface_size(surface)
    }

    fn release(&mut self, resource: Resource) {
        (**self).release(resource);
    }

    fn render_frame(&mut self, frame: &FrameRequest<'_>) -> Result<(), VantageError> {
        (**self).render_frame(frame)
    }

    fn blit(&mut self, src: SurfaceHandle, dst: SurfaceHandle) -> Result<(), VantageError> {
        (**self).blit(src, dst)
    }

    fn set_srgb_write(&mut self, enabled: bool) {
        (**self).set_srgb_write(enabled);
    }

    fn linear_color_space(&self) -> bool {
        (**self).linear_color_space()
    }

    fn read_pixels(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, VantageError> {
        (**self).read_pixels(surface)
    }
}
