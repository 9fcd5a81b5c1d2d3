//! Toggleable diagnostic effects and the stage compositor that binds them.
//!
//! Each [`EffectKind`] owns one material and one command. The
//! [`EffectPipeline`] decides which commands are bound at which
//! [`PipelineStage`]; the renderer executes whatever the bindings say.

mod descriptor;
mod kind;
mod params;
mod pipeline;

pub use descriptor::{DescriptorState, EffectDescriptor};
pub use kind::{CommandStyle, EffectKind, PipelineStage};
pub use params::{EffectParams, EffectUniform};
pub use pipeline::{resolve_material, EffectPipeline, StageBindings};
