//! Preview session lifecycle.
//!
//! A [`PreviewSession`] owns the orbit rig, the effect pipeline and the
//! capture service, and brackets every backend resource they need between
//! [`open`](PreviewSession::open) and [`close`](PreviewSession::close).
//! Resources are recorded in a creation ledger and released in reverse
//! order. The camera state survives a close/open cycle.

use glam::{Mat4, Quat, Vec3};

use crate::camera::bounds::Aabb;
use crate::camera::rig::{OrbitCameraRig, OrbitState, RigInput};
use crate::capture::{CaptureRequest, CaptureResult, CaptureService, Viewport};
use crate::effects::{
    resolve_material, EffectDescriptor, EffectKind, EffectParams,
    EffectPipeline, StageBindings,
};
use crate::error::{LifecycleError, VantageError};
use crate::gpu::backend::{
    CameraHandle, CommandSpec, FrameRequest, GraphicsBackend, NodeHandle,
    Resource, SurfaceDesc, SurfaceHandle, SurfaceUsage,
};
use crate::options::Options;

/// Backend resources that exist only while the session is open.
struct SessionResources {
    camera: CameraHandle,
    model_node: NodeHandle,
    light_node: NodeHandle,
    view_surface: SurfaceHandle,
    /// Every created resource, in creation order.
    ledger: Vec<Resource>,
}

impl SessionResources {
    fn frame<'a>(
        &self,
        rig: &OrbitCameraRig,
        viewport: &Viewport,
        clear_color: [f32; 4],
        options: &Options,
        ground_height: f32,
        bindings: &'a StageBindings,
    ) -> FrameRequest<'a> {
        FrameRequest {
            camera: self.camera,
            target: self.view_surface,
            view: rig.camera(viewport.aspect()),
            clear_color,
            model_node: self.model_node,
            light_node: self.light_node,
            ambient: options.lighting.ambient,
            ground_height,
            bindings,
        }
    }
}

/// Single-camera preview of one object, with toggleable effects and
/// screenshot capture.
pub struct PreviewSession<B: GraphicsBackend> {
    backend: B,
    options: Options,
    rig: OrbitCameraRig,
    viewport: Viewport,
    capture: CaptureService,
    pipeline: EffectPipeline,
    resources: Option<SessionResources>,
    preserved: Option<OrbitState>,
    model_transform: Mat4,
    ground_height: f32,
}

impl<B: GraphicsBackend> PreviewSession<B> {
    /// Closed session rendering at the given live view size.
    pub fn new(backend: B, width: u32, height: u32) -> Self {
        let options = Options::default();
        Self {
            backend,
            viewport: Viewport::new(
                width,
                height,
                options.capture.supersample_multiplier,
            ),
            capture: CaptureService::new(options.camera.clear_color),
            options,
            rig: OrbitCameraRig::new(),
            pipeline: EffectPipeline::new(),
            resources: None,
            preserved: None,
            model_transform: Mat4::IDENTITY,
            ground_height: 0.0,
        }
    }

    /// Create the camera, pivot nodes, effect materials and commands, and
    /// the live view surface, then apply `options`.
    ///
    /// If any step fails, everything created so far is released and the
    /// session stays closed.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::AlreadyOpen`] if the session is open, or
    /// the backend error that stopped the open.
    pub fn open(&mut self, options: Options) -> Result<(), VantageError> {
        if self.resources.is_some() {
            return Err(misuse("open", LifecycleError::AlreadyOpen));
        }
        self.options = options;
        self.viewport
            .set_supersample_multiplier(self.options.capture.supersample_multiplier);

        let mut ledger = Vec::new();
        match self.create_resources(&mut ledger) {
            Ok(resources) => self.resources = Some(resources),
            Err(e) => {
                log::error!("preview open failed: {e}");
                self.pipeline.clear();
                release_all(&mut self.backend, ledger);
                return Err(e);
            }
        }

        if let Some(state) = self.preserved.take() {
            self.rig.restore(state);
        }
        if let Err(e) = self.apply_options() {
            log::error!("preview open failed: {e}");
            self.preserved = Some(self.rig.state());
            self.teardown();
            return Err(e);
        }

        log::info!(
            "preview opened at {}x{} ({}x supersampling)",
            self.viewport.size().0,
            self.viewport.size().1,
            self.viewport.supersample_multiplier()
        );
        Ok(())
    }

    /// Detach every effect and release all session resources in reverse
    /// creation order. The camera state is kept for the next `open`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotOpen`] if the session is not open.
    pub fn close(&mut self) -> Result<(), VantageError> {
        if self.resources.is_none() {
            return Err(misuse("close", LifecycleError::NotOpen));
        }
        self.preserved = Some(self.rig.state());
        self.teardown();
        log::info!("preview closed");
        Ok(())
    }

    /// Whether the session is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.resources.is_some()
    }

    /// Advance the camera by one tick of input, then render the frame.
    ///
    /// # Errors
    ///
    /// See [`PreviewSession::render`].
    pub fn tick(&mut self, input: RigInput, dt: f32) -> Result<(), VantageError> {
        self.rig.integrate(input, dt);
        self.render()
    }

    /// Render the live view with the current camera and bound effects.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotOpen`] if the session is not open, or
    /// the backend's render error.
    pub fn render(&mut self) -> Result<(), VantageError> {
        let resources = self
            .resources
            .as_ref()
            .ok_or_else(|| misuse("render", LifecycleError::NotOpen))?;
        let frame = resources.frame(
            &self.rig,
            &self.viewport,
            self.capture.clear_color(),
            &self.options,
            self.ground_height,
            self.pipeline.bindings(),
        );
        self.backend.render_frame(&frame)
    }

    /// Render the current view once at capture resolution and read it back.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotOpen`] if the session is not open, or
    /// the capture error.
    pub fn capture(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<CaptureResult, VantageError> {
        let resources = self
            .resources
            .as_ref()
            .ok_or_else(|| misuse("capture", LifecycleError::NotOpen))?;
        let frame = resources.frame(
            &self.rig,
            &self.viewport,
            self.capture.clear_color(),
            &self.options,
            self.ground_height,
            self.pipeline.bindings(),
        );
        self.capture
            .capture(&mut self.backend, &frame, &self.viewport, request)
    }

    /// Change the live view size, recreating the view surface if open.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the new surface cannot be created; the
    /// old surface stays in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), VantageError> {
        self.viewport.set_size(width, height);
        self.recreate_view_surface()
    }

    /// Frame the target bounds and put the ground plane at their base.
    pub fn frame_target(&mut self, bounds: &Aabb) {
        self.rig.fit_to_bounds(bounds);
        self.ground_height = bounds.min.y;
    }

    /// Switch an effect on or off.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotOpen`] if the session is not open.
    pub fn set_effect_enabled(
        &mut self,
        kind: EffectKind,
        enabled: bool,
    ) -> Result<(), VantageError> {
        if self.resources.is_none() {
            return Err(misuse("set_effect_enabled", LifecycleError::NotOpen));
        }
        self.pipeline.set_enabled(kind, enabled)?;
        self.options.effects.set_enabled(kind, enabled);
        Ok(())
    }

    /// Write new parameters to an effect's material.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotOpen`] if the session is not open, or
    /// the backend's material error.
    pub fn update_effect(
        &mut self,
        kind: EffectKind,
        params: &EffectParams,
    ) -> Result<(), VantageError> {
        if self.resources.is_none() {
            return Err(misuse("update_effect", LifecycleError::NotOpen));
        }
        self.pipeline
            .update_parameters(kind, params, &mut self.backend)
    }

    /// Replace the options of an open session and re-apply them.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotOpen`] if the session is not open, or
    /// the first backend error hit while applying.
    pub fn reload(&mut self, options: Options) -> Result<(), VantageError> {
        if self.resources.is_none() {
            return Err(misuse("reload", LifecycleError::NotOpen));
        }
        let supersample = options.capture.supersample_multiplier.max(1);
        self.options = options;
        if supersample != self.viewport.supersample_multiplier() {
            self.viewport.set_supersample_multiplier(supersample);
            self.recreate_view_surface()?;
        }
        self.apply_options()
    }

    /// Set the model transform of the previewed object.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the node update fails.
    pub fn set_model_transform(&mut self, transform: Mat4) -> Result<(), VantageError> {
        self.model_transform = transform;
        match &self.resources {
            Some(resources) => self
                .backend
                .set_node_transform(resources.model_node, transform),
            None => Ok(()),
        }
    }

    /// Live view surface, for presentation.
    #[must_use]
    pub fn view_surface(&self) -> Option<SurfaceHandle> {
        self.resources.as_ref().map(|r| r.view_surface)
    }

    /// The orbit rig.
    #[must_use]
    pub fn rig(&self) -> &OrbitCameraRig {
        &self.rig
    }

    /// Mutable orbit rig (projection toggles, snapping).
    pub fn rig_mut(&mut self) -> &mut OrbitCameraRig {
        &mut self.rig
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Live viewport.
    #[must_use]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Effect pipeline (read-only).
    #[must_use]
    pub fn pipeline(&self) -> &EffectPipeline {
        &self.pipeline
    }

    /// The rendering backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable rendering backend (mesh upload, presentation).
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn create_resources(
        &mut self,
        ledger: &mut Vec<Resource>,
    ) -> Result<SessionResources, VantageError> {
        let backend = &mut self.backend;

        let camera = backend.create_camera("Preview Camera")?;
        ledger.push(Resource::Camera(camera));
        let model_node = backend.create_node("Model Pivot")?;
        ledger.push(Resource::Node(model_node));
        let light_node = backend.create_node("Light Pivot")?;
        ledger.push(Resource::Node(light_node));

        for kind in EffectKind::ALL {
            let (material, inert) = resolve_material(backend, kind)?;
            ledger.push(Resource::Material(material));
            let command = backend.create_command(&CommandSpec {
                kind,
                style: kind.style(),
                material,
            })?;
            ledger.push(Resource::Command(command));
            let _ = self.pipeline.insert(EffectDescriptor::new(
                kind,
                self.options.effects.stage(kind),
                self.options.effects.params(kind),
                material,
                command,
                inert,
            ));
        }

        let (width, height) = self.viewport.render_size()?;
        let view_surface = backend.create_surface(&SurfaceDesc {
            width,
            height,
            usage: SurfaceUsage::Scene,
        })?;
        ledger.push(Resource::Surface(view_surface));
        log::debug!("created {} preview resources", ledger.len());

        Ok(SessionResources {
            camera,
            model_node,
            light_node,
            view_surface,
            ledger: std::mem::take(ledger),
        })
    }

    /// Push the stored options into the rig, capture service, nodes and
    /// effect pipeline.
    fn apply_options(&mut self) -> Result<(), VantageError> {
        if let Err(e) = self.rig.apply_options(&self.options.camera) {
            log::warn!("keeping previous field of view: {e}");
        }
        self.capture.set_clear_color(self.options.camera.clear_color);

        let Some(resources) = &self.resources else {
            return Ok(());
        };
        let light = Quat::from_rotation_arc(
            Vec3::Y,
            self.options.lighting.light_direction(),
        );
        self.backend
            .set_node_transform(resources.light_node, Mat4::from_quat(light))?;
        self.backend
            .set_node_transform(resources.model_node, self.model_transform)?;

        let effects = &self.options.effects;
        for kind in EffectKind::ALL {
            self.pipeline.set_insertion_point(kind, effects.stage(kind))?;
            self.pipeline
                .update_parameters(kind, &effects.params(kind), &mut self.backend)?;
            self.pipeline.set_enabled(kind, effects.enabled(kind))?;
        }
        Ok(())
    }

    fn recreate_view_surface(&mut self) -> Result<(), VantageError> {
        let Some(resources) = self.resources.as_mut() else {
            return Ok(());
        };
        let (width, height) = self.viewport.render_size()?;
        let surface = self.backend.create_surface(&SurfaceDesc {
            width,
            height,
            usage: SurfaceUsage::Scene,
        })?;
        let old = std::mem::replace(&mut resources.view_surface, surface);
        resources.ledger.retain(|r| *r != Resource::Surface(old));
        resources.ledger.push(Resource::Surface(surface));
        self.backend.release(Resource::Surface(old));
        log::debug!("view surface resized to {width}x{height}");
        Ok(())
    }

    fn teardown(&mut self) {
        self.pipeline.clear();
        if let Some(resources) = self.resources.take() {
            release_all(&mut self.backend, resources.ledger);
        }
    }
}

impl<B: GraphicsBackend> Drop for PreviewSession<B> {
    fn drop(&mut self) {
        if self.resources.is_some() {
            log::warn!("preview session dropped while open, releasing resources");
            self.teardown();
        }
    }
}

fn release_all<B: GraphicsBackend + ?Sized>(backend: &mut B, ledger: Vec<Resource>) {
    for resource in ledger.into_iter().rev() {
        log::debug!("releasing {resource}");
        backend.release(resource);
    }
}

fn misuse(operation: &str, error: LifecycleError) -> VantageError {
    log::error!("{operation}: {error}");
    VantageError::Lifecycle(error)
}
