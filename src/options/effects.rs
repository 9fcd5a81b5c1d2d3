use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::effects::{EffectKind, EffectParams, PipelineStage};

/// What the depth/normal effect visualizes.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DepthNormalMode {
    /// Linearized depth as grayscale.
    #[default]
    Depth,
    /// Surface normals as RGB.
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Wireframe", inline)]
#[serde(default)]
/// Wireframe overlay settings.
pub struct WireframeOptions {
    /// Whether the overlay is drawn.
    #[schemars(title = "Show Wireframe")]
    pub enabled: bool,
    /// Insertion point.
    #[schemars(skip)]
    pub stage: PipelineStage,
    /// Line color (linear RGBA).
    #[schemars(skip)]
    pub color: [f32; 4],
    /// Line thickness in pixels.
    #[schemars(title = "Thickness", range(min = 0.5, max = 4.0), extend("step" = 0.25))]
    pub thickness: f32,
}

impl Default for WireframeOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            stage: EffectKind::Wireframe.default_stage(),
            color: [0.05, 0.05, 0.05, 1.0],
            thickness: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Grid", inline)]
#[serde(default)]
/// Ground grid settings.
pub struct GridOptions {
    /// Whether the grid is drawn.
    #[schemars(title = "Show Grid")]
    pub enabled: bool,
    /// Insertion point.
    #[schemars(skip)]
    pub stage: PipelineStage,
    /// Line color (linear RGBA).
    #[schemars(skip)]
    pub color: [f32; 4],
    /// Cell size in world units.
    #[schemars(title = "Spacing", range(min = 0.01, max = 100.0))]
    pub spacing: f32,
    /// Line width in pixels.
    #[schemars(title = "Line Width", range(min = 0.5, max = 4.0), extend("step" = 0.25))]
    pub line_width: f32,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            stage: EffectKind::Grid.default_stage(),
            color: [0.5, 0.5, 0.5, 0.6],
            spacing: 1.0,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Planar Shadow", inline)]
#[serde(default)]
/// Planar shadow settings.
pub struct PlanarShadowOptions {
    /// Whether the shadow is drawn.
    #[schemars(title = "Show Shadow")]
    pub enabled: bool,
    /// Insertion point.
    #[schemars(skip)]
    pub stage: PipelineStage,
    /// Shadow color (linear RGBA; alpha is opacity).
    #[schemars(skip)]
    pub color: [f32; 4],
    /// Height of the shadow plane above the object's lowest point.
    #[schemars(title = "Bias", range(min = 0.0, max = 0.1), extend("step" = 0.001))]
    pub bias: f32,
}

impl Default for PlanarShadowOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            stage: EffectKind::PlanarShadow.default_stage(),
            color: [0.0, 0.0, 0.0, 0.5],
            bias: 0.001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Depth / Normal", inline)]
#[serde(default)]
/// Depth/normal visualization settings.
pub struct DepthNormalOptions {
    /// Whether the visualization replaces the shaded frame.
    #[schemars(title = "Show Depth/Normal")]
    pub enabled: bool,
    /// Insertion point.
    #[schemars(skip)]
    pub stage: PipelineStage,
    /// Depth or normals.
    #[schemars(title = "Mode")]
    pub mode: DepthNormalMode,
}

impl Default for DepthNormalOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            stage: EffectKind::DepthNormal.default_stage(),
            mode: DepthNormalMode::Depth,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Solid Tint", inline)]
#[serde(default)]
/// Solid tint overlay settings.
pub struct SolidTintOptions {
    /// Whether the tint is drawn.
    #[schemars(title = "Show Tint")]
    pub enabled: bool,
    /// Insertion point.
    #[schemars(skip)]
    pub stage: PipelineStage,
    /// Tint color (linear RGBA; alpha is opacity).
    #[schemars(skip)]
    pub color: [f32; 4],
}

impl Default for SolidTintOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            stage: EffectKind::SolidTint.default_stage(),
            color: [0.9, 0.45, 0.1, 0.5],
        }
    }
}

/// Settings for every diagnostic effect.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[schemars(title = "Effects", inline)]
#[serde(default)]
pub struct EffectOptions {
    /// Wireframe overlay.
    pub wireframe: WireframeOptions,
    /// Ground grid.
    pub grid: GridOptions,
    /// Planar shadow.
    pub planar_shadow: PlanarShadowOptions,
    /// Depth/normal visualization.
    pub depth_normal: DepthNormalOptions,
    /// Solid tint overlay.
    pub solid_tint: SolidTintOptions,
}

impl EffectOptions {
    /// Whether the effect is switched on.
    #[must_use]
    pub fn enabled(&self, kind: EffectKind) -> bool {
        match kind {
            EffectKind::Wireframe => self.wireframe.enabled,
            EffectKind::Grid => self.grid.enabled,
            EffectKind::PlanarShadow => self.planar_shadow.enabled,
            EffectKind::DepthNormal => self.depth_normal.enabled,
            EffectKind::SolidTint => self.solid_tint.enabled,
        }
    }

    /// Switch an effect on or off.
    pub fn set_enabled(&mut self, kind: EffectKind, enabled: bool) {
        match kind {
            EffectKind::Wireframe => self.wireframe.enabled = enabled,
            EffectKind::Grid => self.grid.enabled = enabled,
            EffectKind::PlanarShadow => self.planar_shadow.enabled = enabled,
            EffectKind::DepthNormal => self.depth_normal.enabled = enabled,
            EffectKind::SolidTint => self.solid_tint.enabled = enabled,
        }
    }

    /// Configured insertion point.
    #[must_use]
    pub fn stage(&self, kind: EffectKind) -> PipelineStage {
        match kind {
            EffectKind::Wireframe => self.wireframe.stage,
            EffectKind::Grid => self.grid.stage,
            EffectKind::PlanarShadow => self.planar_shadow.stage,
            EffectKind::DepthNormal => self.depth_normal.stage,
            EffectKind::SolidTint => self.solid_tint.stage,
        }
    }

    /// Material parameters for the effect.
    #[must_use]
    pub fn params(&self, kind: EffectKind) -> EffectParams {
        let defaults = EffectParams::default();
        match kind {
            EffectKind::Wireframe => EffectParams {
                color: self.wireframe.color,
                thickness: self.wireframe.thickness,
                ..defaults
            },
            EffectKind::Grid => EffectParams {
                color: self.grid.color,
                thickness: self.grid.line_width,
                spacing: self.grid.spacing,
                ..defaults
            },
            EffectKind::PlanarShadow => EffectParams {
                color: self.planar_shadow.color,
                bias: self.planar_shadow.bias,
                ..defaults
            },
            EffectKind::DepthNormal => EffectParams {
                mode: match self.depth_normal.mode {
                    DepthNormalMode::Depth => 0,
                    DepthNormalMode::Normal => 1,
                },
                ..defaults
            },
            EffectKind::SolidTint => EffectParams {
                color: self.solid_tint.color,
                ..defaults
            },
        }
    }
}
