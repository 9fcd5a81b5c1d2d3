//! Per-effect record of its material, command, stage and attachment state.

use crate::effects::kind::{EffectKind, PipelineStage};
use crate::effects::params::EffectParams;
use crate::gpu::backend::{CommandHandle, MaterialHandle};

/// Observable attachment state of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorState {
    /// Not bound to any stage.
    Disabled,
    /// Bound to exactly one stage.
    Attached,
}

/// One effect's material, command and toggle state.
///
/// `attached` is only changed by [`EffectPipeline`](super::EffectPipeline),
/// which keeps it true iff the effect is enabled and its command is bound at
/// exactly one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDescriptor {
    kind: EffectKind,
    insertion_point: PipelineStage,
    params: EffectParams,
    material: MaterialHandle,
    command: CommandHandle,
    enabled: bool,
    attached: bool,
    inert: bool,
}

impl EffectDescriptor {
    /// New, disabled descriptor. `inert` marks a material that fell back to
    /// passthrough.
    #[must_use]
    pub fn new(
        kind: EffectKind,
        insertion_point: PipelineStage,
        params: EffectParams,
        material: MaterialHandle,
        command: CommandHandle,
        inert: bool,
    ) -> Self {
        Self {
            kind,
            insertion_point,
            params: params.clamped(),
            material,
            command,
            enabled: false,
            attached: false,
            inert,
        }
    }

    /// Effect kind.
    #[must_use]
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Stage the command binds to when enabled.
    #[must_use]
    pub fn insertion_point(&self) -> PipelineStage {
        self.insertion_point
    }

    /// Last parameters written to the material (clamped).
    #[must_use]
    pub fn params(&self) -> &EffectParams {
        &self.params
    }

    /// Material handle.
    #[must_use]
    pub fn material(&self) -> MaterialHandle {
        self.material
    }

    /// Command handle.
    #[must_use]
    pub fn command(&self) -> CommandHandle {
        self.command
    }

    /// Whether the user switched the effect on.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the command is currently bound.
    #[must_use]
    pub fn attached(&self) -> bool {
        self.attached
    }

    /// Whether the material fell back to passthrough.
    #[must_use]
    pub fn inert(&self) -> bool {
        self.inert
    }

    /// Current attachment state.
    #[must_use]
    pub fn state(&self) -> DescriptorState {
        if self.attached {
            DescriptorState::Attached
        } else {
            DescriptorState::Disabled
        }
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(super) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    pub(super) fn set_insertion_point(&mut self, stage: PipelineStage) {
        self.insertion_point = stage;
    }

    pub(super) fn set_params(&mut self, params: EffectParams) {
        self.params = params;
    }
}
