//! Named WGSL shaders composed with naga-oil.
//!
//! Effect materials are resolved by name (`"wireframe"`, `"grid"`, ...).
//! Shared code lives in composable modules imported as
//! `#import vantage::fullscreen` and `#import vantage::view`.

use std::borrow::Cow;
use std::fmt;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor,
    ShaderLanguage, ShaderType,
};

/// Failure to resolve or compile a named shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// No material shader is registered under the name.
    NotFound(String),
    /// The shader source failed to compose or validate.
    Compose {
        /// Shader name.
        name: String,
        /// Composer diagnostic.
        message: String,
    },
}

impl fmt::Display for MaterialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "no shader named '{name}'"),
            Self::Compose { name, message } => {
                write!(f, "shader '{name}' failed to compose: {message}")
            }
        }
    }
}

impl std::error::Error for MaterialError {}

/// How a shader is drawn, which fixes its vertex input and bind groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialLayout {
    /// Full-screen triangle reading the scene color, depth and normals.
    Screen,
    /// Object mesh (position, normal) with the effect uniform.
    Mesh,
    /// Object mesh expanded per triangle with barycentric coordinates.
    Wire,
    /// Object mesh flattened onto the ground plane, blended, no depth write.
    Shadow,
    /// Renderer-internal pass, not usable as an effect material.
    Internal,
}

struct ShaderDef {
    name: &'static str,
    source: &'static str,
    file_path: &'static str,
    layout: MaterialLayout,
}

/// Shared modules, in dependency order.
const MODULES: &[(&str, &str)] = &[
    (
        include_str!("../../assets/shaders/modules/fullscreen.wgsl"),
        "modules/fullscreen.wgsl",
    ),
    (
        include_str!("../../assets/shaders/modules/view.wgsl"),
        "modules/view.wgsl",
    ),
];

const SHADERS: &[ShaderDef] = &[
    ShaderDef {
        name: "object",
        source: include_str!("../../assets/shaders/object.wgsl"),
        file_path: "object.wgsl",
        layout: MaterialLayout::Internal,
    },
    ShaderDef {
        name: "downsample",
        source: include_str!("../../assets/shaders/downsample.wgsl"),
        file_path: "downsample.wgsl",
        layout: MaterialLayout::Internal,
    },
    ShaderDef {
        name: "passthrough",
        source: include_str!("../../assets/shaders/effects/passthrough.wgsl"),
        file_path: "effects/passthrough.wgsl",
        layout: MaterialLayout::Screen,
    },
    ShaderDef {
        name: "wireframe",
        source: include_str!("../../assets/shaders/effects/wireframe.wgsl"),
        file_path: "effects/wireframe.wgsl",
        layout: MaterialLayout::Wire,
    },
    ShaderDef {
        name: "grid",
        source: include_str!("../../assets/shaders/effects/grid.wgsl"),
        file_path: "effects/grid.wgsl",
        layout: MaterialLayout::Screen,
    },
    ShaderDef {
        name: "planar_shadow",
        source: include_str!("../../assets/shaders/effects/planar_shadow.wgsl"),
        file_path: "effects/planar_shadow.wgsl",
        layout: MaterialLayout::Shadow,
    },
    ShaderDef {
        name: "depth_normal",
        source: include_str!("../../assets/shaders/effects/depth_normal.wgsl"),
        file_path: "effects/depth_normal.wgsl",
        layout: MaterialLayout::Screen,
    },
    ShaderDef {
        name: "solid_tint",
        source: include_str!("../../assets/shaders/effects/solid_tint.wgsl"),
        file_path: "effects/solid_tint.wgsl",
        layout: MaterialLayout::Mesh,
    },
];

/// Wraps `naga_oil::compose::Composer` with a fixed table of named shaders.
///
/// The composer produces `naga::Module` IR directly, skipping WGSL re-parse
/// at runtime.
pub struct ShaderLibrary {
    composer: Composer,
}

impl ShaderLibrary {
    /// Register the shared modules.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::Compose`] if a shared module fails to parse.
    pub fn new() -> Result<Self, MaterialError> {
        let mut composer = Composer::default();
        for &(source, file_path) in MODULES {
            composer
                .add_composable_module(ComposableModuleDescriptor {
                    source,
                    file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map(|_| ())
                .map_err(|e| MaterialError::Compose {
                    name: file_path.to_owned(),
                    message: e.to_string(),
                })?;
        }
        Ok(Self { composer })
    }

    /// Layout of an effect material shader. Internal passes are not
    /// materials and resolve to [`MaterialError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::NotFound`] for unknown names.
    pub fn material_layout(name: &str) -> Result<MaterialLayout, MaterialError> {
        find(name)
            .map(|def| def.layout)
            .filter(|layout| *layout != MaterialLayout::Internal)
            .ok_or_else(|| MaterialError::NotFound(name.to_owned()))
    }

    /// Compose a named shader into naga IR without a device.
    ///
    /// # Errors
    ///
    /// Returns [`MaterialError::NotFound`] for unknown names and
    /// [`MaterialError::Compose`] for composition failures.
    pub fn compose_naga(
        &mut self,
        name: &str,
    ) -> Result<naga::Module, MaterialError> {
        let def = find(name)
            .ok_or_else(|| MaterialError::NotFound(name.to_owned()))?;
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: def.source,
                file_path: def.file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| MaterialError::Compose {
                name: name.to_owned(),
                message: e.to_string(),
            })
    }

    /// Compose a named shader into a `wgpu::ShaderModule`.
    ///
    /// # Errors
    ///
    /// See [`ShaderLibrary::compose_naga`].
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        name: &str,
    ) -> Result<wgpu::ShaderModule, MaterialError> {
        let module = self.compose_naga(name)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Naga(Cow::Owned(module)),
        }))
    }
}

fn find(name: &str) -> Option<&'static ShaderDef> {
    SHADERS.iter().find(|def| def.name == name)
}
