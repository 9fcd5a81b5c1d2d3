//! Effect kinds, the frame stages they bind to and how they draw.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Insertion point in the frame where effect commands can be bound.
///
/// Stages execute in the order of [`PipelineStage::ALL`]; commands bound to
/// the same stage execute in the order they were attached.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// After the clear, before the object is drawn.
    BeforeOpaque,
    /// After the object is drawn; depth and normals are available.
    AfterOpaque,
    /// Before full-frame image effects.
    BeforeImageEffects,
    /// After full-frame image effects.
    AfterImageEffects,
    /// Last stage of the frame.
    AfterEverything,
}

impl PipelineStage {
    /// Every stage, in execution order.
    pub const ALL: [Self; 5] = [
        Self::BeforeOpaque,
        Self::AfterOpaque,
        Self::BeforeImageEffects,
        Self::AfterImageEffects,
        Self::AfterEverything,
    ];

    /// Human-readable label for logs and GPU debug markers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BeforeOpaque => "Before Opaque",
            Self::AfterOpaque => "After Opaque",
            Self::BeforeImageEffects => "Before Image Effects",
            Self::AfterImageEffects => "After Image Effects",
            Self::AfterEverything => "After Everything",
        }
    }
}

/// How an effect's command draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStyle {
    /// Full-frame pass: source through the material into a temporary
    /// surface, then copied back to the camera target.
    Blit,
    /// Redraw every sub-mesh of the target object with the material.
    GeometryOverride,
}

/// The toggleable diagnostic effects.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Triangle edges drawn over the shaded object.
    Wireframe,
    /// Ground-plane grid under the object.
    Grid,
    /// Object silhouette projected onto the ground plane along the light.
    PlanarShadow,
    /// Linear depth or surface normal visualization.
    DepthNormal,
    /// Flat color overlay on the object.
    SolidTint,
}

impl EffectKind {
    /// Every effect kind, in creation order.
    pub const ALL: [Self; 5] = [
        Self::Wireframe,
        Self::Grid,
        Self::PlanarShadow,
        Self::DepthNormal,
        Self::SolidTint,
    ];

    /// Name of the shader resource the effect's material is built from.
    #[must_use]
    pub fn shader_name(self) -> &'static str {
        match self {
            Self::Wireframe => "wireframe",
            Self::Grid => "grid",
            Self::PlanarShadow => "planar_shadow",
            Self::DepthNormal => "depth_normal",
            Self::SolidTint => "solid_tint",
        }
    }

    /// How the effect's command draws.
    #[must_use]
    pub fn style(self) -> CommandStyle {
        match self {
            Self::Wireframe | Self::SolidTint | Self::PlanarShadow => {
                CommandStyle::GeometryOverride
            }
            Self::Grid | Self::DepthNormal => CommandStyle::Blit,
        }
    }

    /// Stage the effect binds to unless configured otherwise.
    #[must_use]
    pub fn default_stage(self) -> PipelineStage {
        match self {
            Self::Grid | Self::PlanarShadow => PipelineStage::BeforeOpaque,
            Self::Wireframe | Self::SolidTint => PipelineStage::AfterOpaque,
            Self::DepthNormal => PipelineStage::BeforeImageEffects,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Wireframe => "Wireframe",
            Self::Grid => "Grid",
            Self::PlanarShadow => "Planar Shadow",
            Self::DepthNormal => "Depth/Normal",
            Self::SolidTint => "Solid Tint",
        }
    }
}
