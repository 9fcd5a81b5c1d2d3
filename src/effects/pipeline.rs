//! Ordered effect compositor over the renderer's pipeline stages.
//!
//! Every toggle goes through a detach-from-all sweep: the command is first
//! removed from every stage in [`PipelineStage::ALL`], then attached once at
//! its insertion point if enabled. A command can therefore never end up bound
//! twice or left behind at a stale stage.

use rustc_hash::FxHashMap;

use crate::effects::descriptor::EffectDescriptor;
use crate::effects::kind::{EffectKind, PipelineStage};
use crate::effects::params::EffectParams;
use crate::error::VantageError;
use crate::gpu::backend::{
    CommandHandle, GraphicsBackend, MaterialHandle, PASSTHROUGH,
};

/// Commands bound per pipeline stage, in attach order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageBindings {
    stages: FxHashMap<PipelineStage, Vec<CommandHandle>>,
}

impl StageBindings {
    /// Empty bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a command at the end of a stage. Binding a command that is
    /// already present at that stage does nothing.
    pub fn attach(&mut self, stage: PipelineStage, command: CommandHandle) {
        let commands = self.stages.entry(stage).or_default();
        if !commands.contains(&command) {
            commands.push(command);
        }
    }

    /// Remove a command from every stage. Returns how many bindings were
    /// removed.
    pub fn detach_everywhere(&mut self, command: CommandHandle) -> usize {
        let mut removed = 0;
        for stage in PipelineStage::ALL {
            if let Some(commands) = self.stages.get_mut(&stage) {
                let before = commands.len();
                commands.retain(|c| *c != command);
                removed += before - commands.len();
            }
        }
        removed
    }

    /// Commands bound at a stage, in execution order.
    #[must_use]
    pub fn at(&self, stage: PipelineStage) -> &[CommandHandle] {
        self.stages.get(&stage).map_or(&[][..], Vec::as_slice)
    }

    /// Number of stages the command is bound at.
    #[must_use]
    pub fn count_of(&self, command: CommandHandle) -> usize {
        PipelineStage::ALL
            .iter()
            .filter(|stage| self.at(**stage).contains(&command))
            .count()
    }

    /// Stage the command is bound at, if any.
    #[must_use]
    pub fn stage_of(&self, command: CommandHandle) -> Option<PipelineStage> {
        PipelineStage::ALL
            .into_iter()
            .find(|stage| self.at(*stage).contains(&command))
    }

    /// Whether nothing is bound anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.values().all(Vec::is_empty)
    }

    /// Unbind everything.
    pub fn clear(&mut self) {
        self.stages.clear();
    }
}

/// Create the material for an effect, falling back to passthrough if the
/// effect's shader cannot be resolved.
///
/// Returns the material and whether the fallback was used.
///
/// # Errors
///
/// Returns [`VantageError::Material`] if even the passthrough material
/// cannot be created.
pub fn resolve_material<B: GraphicsBackend + ?Sized>(
    backend: &mut B,
    kind: EffectKind,
) -> Result<(MaterialHandle, bool), VantageError> {
    match backend.create_material(kind.shader_name()) {
        Ok(material) => Ok((material, false)),
        Err(e) => {
            log::warn!(
                "{} material unavailable ({e}), falling back to {PASSTHROUGH}",
                kind.label()
            );
            let material = backend.create_material(PASSTHROUGH)?;
            Ok((material, true))
        }
    }
}

/// Owns the effect descriptors and the stage bindings handed to the
/// renderer each frame.
#[derive(Debug, Clone, Default)]
pub struct EffectPipeline {
    descriptors: Vec<EffectDescriptor>,
    bindings: StageBindings,
}

impl EffectPipeline {
    /// Empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor, replacing (and detaching) any previous descriptor
    /// of the same kind. The new descriptor starts disabled.
    pub fn insert(
        &mut self,
        descriptor: EffectDescriptor,
    ) -> Option<EffectDescriptor> {
        let kind = descriptor.kind();
        let previous = self
            .descriptors
            .iter()
            .position(|d| d.kind() == kind)
            .map(|index| self.descriptors.remove(index));
        if let Some(previous) = &previous {
            let _ = self.bindings.detach_everywhere(previous.command());
        }
        self.descriptors.push(descriptor);
        previous
    }

    /// Switch an effect on or off. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] if no descriptor of this
    /// kind was inserted.
    pub fn set_enabled(
        &mut self,
        kind: EffectKind,
        enabled: bool,
    ) -> Result<(), VantageError> {
        let descriptor = find_mut(&mut self.descriptors, kind)?;
        descriptor.set_enabled(enabled);
        sync_binding(&mut self.bindings, descriptor);
        Ok(())
    }

    /// Clamp and write new parameters to the effect's material. Does not
    /// change the attachment.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] for an unknown kind, or the
    /// backend's error if the material write fails.
    pub fn update_parameters<B: GraphicsBackend + ?Sized>(
        &mut self,
        kind: EffectKind,
        params: &EffectParams,
        backend: &mut B,
    ) -> Result<(), VantageError> {
        let descriptor = find_mut(&mut self.descriptors, kind)?;
        let params = params.clamped();
        backend.update_material(descriptor.material(), &params)?;
        descriptor.set_params(params);
        Ok(())
    }

    /// Move an effect to another stage, re-binding it if enabled.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] for an unknown kind.
    pub fn set_insertion_point(
        &mut self,
        kind: EffectKind,
        stage: PipelineStage,
    ) -> Result<(), VantageError> {
        let descriptor = find_mut(&mut self.descriptors, kind)?;
        if descriptor.insertion_point() == stage {
            return Ok(());
        }
        descriptor.set_insertion_point(stage);
        if descriptor.enabled() {
            sync_binding(&mut self.bindings, descriptor);
        }
        Ok(())
    }

    /// Descriptor for an effect kind.
    #[must_use]
    pub fn descriptor(&self, kind: EffectKind) -> Option<&EffectDescriptor> {
        self.descriptors.iter().find(|d| d.kind() == kind)
    }

    /// All descriptors, in insertion order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.descriptors.iter()
    }

    /// Current stage bindings.
    #[must_use]
    pub fn bindings(&self) -> &StageBindings {
        &self.bindings
    }

    /// Unbind every command, keeping the descriptors and their enabled flags.
    pub fn detach_all(&mut self) {
        for descriptor in &mut self.descriptors {
            let _ = self.bindings.detach_everywhere(descriptor.command());
            descriptor.set_attached(false);
        }
        self.bindings.clear();
    }

    /// Unbind and drop every descriptor.
    pub fn clear(&mut self) {
        self.detach_all();
        self.descriptors.clear();
    }
}

fn find_mut(
    descriptors: &mut [EffectDescriptor],
    kind: EffectKind,
) -> Result<&mut EffectDescriptor, VantageError> {
    descriptors
        .iter_mut()
        .find(|d| d.kind() == kind)
        .ok_or_else(|| {
            VantageError::UnknownResource(format!("{} effect", kind.label()))
        })
}

fn sync_binding(bindings: &mut StageBindings, descriptor: &mut EffectDescriptor) {
    let command = descriptor.command();
    let removed = bindings.detach_everywhere(command);
    if descriptor.enabled() {
        bindings.attach(descriptor.insertion_point(), command);
    }
    descriptor.set_attached(bindings.count_of(command) == 1);
    log::debug!(
        "{}: removed {removed} binding(s), attached={}",
        descriptor.kind().label(),
        descriptor.attached()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::descriptor::DescriptorState;
    use crate::effects::kind::CommandStyle;
    use crate::gpu::backend::CommandSpec;
    use crate::testing::RecordingBackend;

    fn pipeline_with(
        backend: &mut RecordingBackend,
        kinds: &[EffectKind],
    ) -> EffectPipeline {
        let mut pipeline = EffectPipeline::new();
        for kind in kinds {
            let (material, inert) = resolve_material(backend, *kind).unwrap();
            let command = backend
                .create_command(&CommandSpec {
                    kind: *kind,
                    style: kind.style(),
                    material,
                })
                .unwrap();
            let _ = pipeline.insert(EffectDescriptor::new(
                *kind,
                kind.default_stage(),
                EffectParams::default(),
                material,
                command,
                inert,
            ));
        }
        pipeline
    }

    fn command(pipeline: &EffectPipeline, kind: EffectKind) -> CommandHandle {
        pipeline.descriptor(kind).unwrap().command()
    }

    #[test]
    fn enabling_twice_binds_once() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::Wireframe]);
        pipeline.set_enabled(EffectKind::Wireframe, true).unwrap();
        pipeline.set_enabled(EffectKind::Wireframe, true).unwrap();

        let cmd = command(&pipeline, EffectKind::Wireframe);
        assert_eq!(pipeline.bindings().count_of(cmd), 1);
        assert_eq!(pipeline.bindings().at(PipelineStage::AfterOpaque), &[cmd]);
        assert_eq!(
            pipeline.descriptor(EffectKind::Wireframe).unwrap().state(),
            DescriptorState::Attached
        );
    }

    #[test]
    fn disabling_leaves_no_binding_at_any_stage() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::Grid]);
        let cmd = command(&pipeline, EffectKind::Grid);
        pipeline.bindings.attach(PipelineStage::AfterEverything, cmd);
        pipeline.set_enabled(EffectKind::Grid, true).unwrap();
        pipeline.set_enabled(EffectKind::Grid, false).unwrap();

        for stage in PipelineStage::ALL {
            assert!(!pipeline.bindings().at(stage).contains(&cmd));
        }
        let descriptor = pipeline.descriptor(EffectKind::Grid).unwrap();
        assert_eq!(descriptor.state(), DescriptorState::Disabled);
        assert!(!descriptor.attached());
    }

    #[test]
    fn stray_binding_is_swept_on_enable() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::SolidTint]);
        let cmd = command(&pipeline, EffectKind::SolidTint);
        pipeline.bindings.attach(PipelineStage::AfterImageEffects, cmd);

        pipeline.set_enabled(EffectKind::SolidTint, true).unwrap();
        assert_eq!(pipeline.bindings().count_of(cmd), 1);
        assert_eq!(
            pipeline.bindings().stage_of(cmd),
            Some(PipelineStage::AfterOpaque)
        );
    }

    #[test]
    fn toggle_cycle_follows_state_machine() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::DepthNormal]);
        let state = |p: &EffectPipeline| {
            p.descriptor(EffectKind::DepthNormal).unwrap().state()
        };
        assert_eq!(state(&pipeline), DescriptorState::Disabled);
        for _ in 0..3 {
            pipeline.set_enabled(EffectKind::DepthNormal, true).unwrap();
            assert_eq!(state(&pipeline), DescriptorState::Attached);
            pipeline
                .update_parameters(
                    EffectKind::DepthNormal,
                    &EffectParams::default(),
                    &mut backend,
                )
                .unwrap();
            assert_eq!(state(&pipeline), DescriptorState::Attached);
            pipeline.set_enabled(EffectKind::DepthNormal, false).unwrap();
            assert_eq!(state(&pipeline), DescriptorState::Disabled);
        }
    }

    #[test]
    fn update_parameters_clamps_and_does_not_attach() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::Wireframe]);
        let params = EffectParams {
            thickness: 500.0,
            ..Default::default()
        };
        pipeline
            .update_parameters(EffectKind::Wireframe, &params, &mut backend)
            .unwrap();

        let descriptor = pipeline.descriptor(EffectKind::Wireframe).unwrap();
        assert!(!descriptor.attached());
        assert!(pipeline.bindings().is_empty());
        assert_eq!(descriptor.params().thickness, 16.0);
        assert_eq!(
            backend.material_params(descriptor.material()).unwrap().thickness,
            16.0
        );
    }

    #[test]
    fn moving_insertion_point_rebinds_enabled_effect() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::Grid]);
        let cmd = command(&pipeline, EffectKind::Grid);
        pipeline.set_enabled(EffectKind::Grid, true).unwrap();
        pipeline
            .set_insertion_point(EffectKind::Grid, PipelineStage::AfterEverything)
            .unwrap();
        assert_eq!(
            pipeline.bindings().stage_of(cmd),
            Some(PipelineStage::AfterEverything)
        );
        assert_eq!(pipeline.bindings().count_of(cmd), 1);

        pipeline.set_enabled(EffectKind::Grid, false).unwrap();
        pipeline
            .set_insertion_point(EffectKind::Grid, PipelineStage::BeforeOpaque)
            .unwrap();
        assert!(pipeline.bindings().is_empty());
    }

    #[test]
    fn same_stage_commands_keep_attach_order() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(
            &mut backend,
            &[EffectKind::SolidTint, EffectKind::Wireframe],
        );
        pipeline.set_enabled(EffectKind::Wireframe, true).unwrap();
        pipeline.set_enabled(EffectKind::SolidTint, true).unwrap();
        assert_eq!(
            pipeline.bindings().at(PipelineStage::AfterOpaque),
            &[
                command(&pipeline, EffectKind::Wireframe),
                command(&pipeline, EffectKind::SolidTint)
            ]
        );
    }

    #[test]
    fn missing_shader_falls_back_to_passthrough() {
        let mut backend = RecordingBackend::new();
        backend.fail_shader("grid");
        let pipeline = pipeline_with(&mut backend, &[EffectKind::Grid]);
        let descriptor = pipeline.descriptor(EffectKind::Grid).unwrap();
        assert!(descriptor.inert());
        assert_eq!(
            backend.material_shader(descriptor.material()),
            Some(PASSTHROUGH)
        );
        assert_eq!(EffectKind::Grid.style(), CommandStyle::Blit);
    }

    #[test]
    fn inert_effect_still_toggles() {
        let mut backend = RecordingBackend::new();
        backend.fail_shader("wireframe");
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::Wireframe]);
        pipeline.set_enabled(EffectKind::Wireframe, true).unwrap();
        assert!(pipeline.descriptor(EffectKind::Wireframe).unwrap().attached());
        pipeline.set_enabled(EffectKind::Wireframe, false).unwrap();
        assert!(pipeline.bindings().is_empty());
    }

    #[test]
    fn missing_passthrough_is_an_error() {
        let mut backend = RecordingBackend::new();
        backend.fail_shader("grid");
        backend.fail_shader(PASSTHROUGH);
        assert!(matches!(
            resolve_material(&mut backend, EffectKind::Grid),
            Err(VantageError::Material(_))
        ));
    }

    #[test]
    fn unknown_kind_is_reported() {
        let mut pipeline = EffectPipeline::new();
        assert!(matches!(
            pipeline.set_enabled(EffectKind::Grid, true),
            Err(VantageError::UnknownResource(_))
        ));
    }

    #[test]
    fn insert_replaces_and_detaches_previous() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &[EffectKind::Grid]);
        pipeline.set_enabled(EffectKind::Grid, true).unwrap();
        let old = command(&pipeline, EffectKind::Grid);

        let replaced = pipeline.insert(EffectDescriptor::new(
            EffectKind::Grid,
            PipelineStage::BeforeOpaque,
            EffectParams::default(),
            MaterialHandle(900),
            CommandHandle(901),
            false,
        ));
        assert_eq!(replaced.map(|d| d.command()), Some(old));
        assert_eq!(pipeline.bindings().count_of(old), 0);
        assert_eq!(pipeline.descriptors().count(), 1);
    }

    #[test]
    fn detach_all_keeps_enabled_flags() {
        let mut backend = RecordingBackend::new();
        let mut pipeline = pipeline_with(&mut backend, &EffectKind::ALL);
        for kind in EffectKind::ALL {
            pipeline.set_enabled(kind, true).unwrap();
        }
        pipeline.detach_all();
        assert!(pipeline.bindings().is_empty());
        for descriptor in pipeline.descriptors() {
            assert!(descriptor.enabled());
            assert!(!descriptor.attached());
        }
    }
}
