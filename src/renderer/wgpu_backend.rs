use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::downsample::{BlitEnd, DownsamplePass};
use super::materials::{Material, SharedLayouts};
use super::object_pass::ObjectPass;
use super::pipeline_util::{clear_attachment, depth_attachment, load_attachment};
use super::readback::read_rgba8;
use crate::camera::core::ViewUniform;
use crate::effects::{CommandStyle, EffectParams, PipelineStage};
use crate::error::VantageError;
use crate::gpu::backend::{
    CameraHandle, CommandHandle, CommandSpec, FrameRequest, GraphicsBackend,
    MaterialHandle, NodeHandle, Resource, SurfaceDesc, SurfaceHandle,
    SurfaceUsage,
};
use crate::gpu::pipeline_helpers::uniform_bind_group;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_library::{MaterialError, MaterialLayout, ShaderLibrary};
use crate::gpu::texture::{
    extent, ReadbackTarget, RenderTarget, SceneTargets, READBACK_FORMAT,
    READBACK_SRGB_FORMAT, SCENE_COLOR_FORMAT,
};
use crate::scene::{GpuMesh, MeshData};

struct CameraSlot {
    uniform: ViewUniform,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct SceneSurface {
    targets: SceneTargets,
    /// Color, depth and normals bound for screen materials.
    textures: wgpu::BindGroup,
}

enum SurfaceSlot {
    Scene(SceneSurface),
    Readback(ReadbackTarget),
}

impl SurfaceSlot {
    fn size(&self) -> (u32, u32) {
        match self {
            Self::Scene(scene) => scene.targets.size,
            Self::Readback(target) => target.size,
        }
    }

    fn color_view(&self) -> &wgpu::TextureView {
        match self {
            Self::Scene(scene) => &scene.targets.color.view,
            Self::Readback(target) => &target.view,
        }
    }
}

/// [`GraphicsBackend`] on wgpu.
///
/// Scene surfaces are linear HDR (`Rgba16Float`) with depth and normal
/// targets; readback surfaces are `Rgba8Unorm` with an sRGB view used while
/// sRGB write is enabled. Each frame clears the target, runs the
/// `BeforeOpaque` commands, draws the target meshes, then runs the remaining
/// stages. Blit commands render through a scratch texture that is copied
/// back over the scene color.
pub struct WgpuBackend {
    context: RenderContext,
    library: ShaderLibrary,
    layouts: SharedLayouts,
    object_pass: ObjectPass,
    downsample: DownsamplePass,
    meshes: Vec<GpuMesh>,
    next_id: u32,
    cameras: FxHashMap<CameraHandle, CameraSlot>,
    nodes: FxHashMap<NodeHandle, Mat4>,
    materials: FxHashMap<MaterialHandle, Material>,
    commands: FxHashMap<CommandHandle, CommandSpec>,
    surfaces: FxHashMap<SurfaceHandle, SurfaceSlot>,
    srgb_write: bool,
}

impl WgpuBackend {
    /// Build the shared layouts and internal passes on `context`'s device.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Material`] if a built-in shader fails to
    /// compose.
    pub fn new(context: RenderContext) -> Result<Self, VantageError> {
        let mut library = ShaderLibrary::new()?;
        let layouts = SharedLayouts::new(&context.device);
        let object_pass =
            ObjectPass::new(&context.device, &mut library, &layouts.view)?;
        let downsample = DownsamplePass::new(&context.device, &mut library)?;
        log::info!(
            "wgpu backend ready (presentation format {:?})",
            context.format()
        );
        Ok(Self {
            context,
            library,
            layouts,
            object_pass,
            downsample,
            meshes: Vec::new(),
            next_id: 0,
            cameras: FxHashMap::default(),
            nodes: FxHashMap::default(),
            materials: FxHashMap::default(),
            commands: FxHashMap::default(),
            surfaces: FxHashMap::default(),
            srgb_write: false,
        })
    }

    /// The underlying device context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Mutable device context (window resize).
    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// Replace the meshes drawn by the object pass and geometry effects.
    /// Empty or malformed meshes are skipped with a warning.
    pub fn set_target_meshes(&mut self, meshes: &[MeshData]) {
        self.meshes = meshes
            .iter()
            .enumerate()
            .filter_map(|(i, mesh)| {
                GpuMesh::upload(&self.context.device, mesh, &format!("Mesh {i}"))
            })
            .collect();
        log::debug!("uploaded {} target meshes", self.meshes.len());
    }

    /// Number of uploaded target meshes.
    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Box-filter a scene surface onto the window's swapchain and present.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::UnknownResource`] for a dead surface and
    /// [`VantageError::Viewer`] if no swapchain frame could be acquired.
    pub fn present(&mut self, surface: SurfaceHandle) -> Result<(), VantageError> {
        let slot = self
            .surfaces
            .get(&surface)
            .ok_or_else(|| unknown(Resource::Surface(surface)))?;
        let frame = self
            .context
            .get_next_frame()
            .map_err(|e| VantageError::Viewer(e.to_string()))?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.context.create_encoder("Present Encoder");
        self.downsample.encode(
            &self.context.device,
            &mut encoder,
            &BlitEnd {
                view: slot.color_view(),
                size: slot.size(),
            },
            &BlitEnd {
                view: &view,
                size: self.context.size(),
            },
            self.context.format(),
        );
        self.context.submit(encoder);
        frame.present();
        Ok(())
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn node(&self, node: NodeHandle) -> Result<Mat4, VantageError> {
        self.nodes
            .get(&node)
            .copied()
            .ok_or_else(|| unknown(Resource::Node(node)))
    }

    /// Encode one bound effect command against a scene surface.
    fn encode_command(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        command: CommandHandle,
        scene: &SceneSurface,
        view_bind_group: &wgpu::BindGroup,
    ) -> Result<(), VantageError> {
        let spec = self
            .commands
            .get(&command)
            .ok_or_else(|| unknown(Resource::Command(command)))?;
        let material = self
            .materials
            .get(&spec.material)
            .ok_or_else(|| unknown(Resource::Material(spec.material)))?;
        match (spec.style, material.layout()) {
            (CommandStyle::Blit, MaterialLayout::Screen) => {
                self.encode_blit(encoder, material, scene, view_bind_group);
            }
            (CommandStyle::GeometryOverride, _) if material.is_passthrough() => {}
            (
                CommandStyle::GeometryOverride,
                MaterialLayout::Mesh | MaterialLayout::Wire | MaterialLayout::Shadow,
            ) => {
                self.encode_geometry(encoder, material, scene, view_bind_group);
            }
            (style, layout) => log::warn!(
                "{:?} command for '{}' cannot draw a {layout:?} material; skipped",
                style,
                material.shader()
            ),
        }
        Ok(())
    }

    fn encode_blit(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        material: &Material,
        scene: &SceneSurface,
        view_bind_group: &wgpu::BindGroup,
    ) {
        let size = scene.targets.size;
        let scratch = RenderTarget::new(
            &self.context.device,
            "Effect Scratch",
            size,
            SCENE_COLOR_FORMAT,
            wgpu::TextureUsages::COPY_SRC,
        );
        {
            let mut pass =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(material.shader()),
                    color_attachments: &[clear_attachment(
                        &scratch.view,
                        wgpu::Color::TRANSPARENT,
                    )],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            pass.set_pipeline(material.pipeline());
            pass.set_bind_group(0, view_bind_group, &[]);
            pass.set_bind_group(1, material.bind_group(), &[]);
            pass.set_bind_group(2, &scene.textures, &[]);
            pass.draw(0..3, 0..1);
        }
        encoder.copy_texture_to_texture(
            scratch.texture.as_image_copy(),
            scene.targets.color.texture.as_image_copy(),
            extent(size.0, size.1),
        );
    }

    fn encode_geometry(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        material: &Material,
        scene: &SceneSurface,
        view_bind_group: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(material.shader()),
            color_attachments: &[load_attachment(&scene.targets.color.view)],
            depth_stencil_attachment: Some(depth_attachment(
                &scene.targets.depth.view,
                false,
            )),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(material.pipeline());
        pass.set_bind_group(0, view_bind_group, &[]);
        pass.set_bind_group(1, material.bind_group(), &[]);
        for mesh in &self.meshes {
            if material.layout() == MaterialLayout::Wire {
                pass.set_vertex_buffer(0, mesh.wire_buffer.slice(..));
                pass.draw(0..mesh.wire_count, 0..1);
            } else {
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(
                    mesh.index_buffer.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
    }
}

fn unknown(resource: Resource) -> VantageError {
    VantageError::UnknownResource(resource.to_string())
}

fn clear_scene(
    encoder: &mut wgpu::CommandEncoder,
    targets: &SceneTargets,
    clear_color: [f32; 4],
) {
    let [r, g, b, a] = clear_color.map(f64::from);
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Clear Pass"),
        color_attachments: &[
            clear_attachment(&targets.color.view, wgpu::Color { r, g, b, a }),
            clear_attachment(&targets.normal.view, wgpu::Color::TRANSPARENT),
        ],
        depth_stencil_attachment: Some(depth_attachment(&targets.depth.view, true)),
        timestamp_writes: None,
        occlusion_query_set: None,
    });
}

impl GraphicsBackend for WgpuBackend {
    fn create_camera(&mut self, label: &str) -> Result<CameraHandle, VantageError> {
        let handle = CameraHandle(self.allocate_id());
        let uniform = ViewUniform::new();
        let buffer = self.context.device.create_buffer_init(
            &wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} View")),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            },
        );
        let bind_group = uniform_bind_group(
            &self.context.device,
            &format!("{label} View"),
            &self.layouts.view,
            &buffer,
        );
        let _ = self.cameras.insert(
            handle,
            CameraSlot {
                uniform,
                buffer,
                bind_group,
            },
        );
        Ok(handle)
    }

    fn create_node(&mut self, label: &str) -> Result<NodeHandle, VantageError> {
        let handle = NodeHandle(self.allocate_id());
        log::trace!("node '{label}' -> {handle}");
        let _ = self.nodes.insert(handle, Mat4::IDENTITY);
        Ok(handle)
    }

    fn set_node_transform(
        &mut self,
        node: NodeHandle,
        transform: Mat4,
    ) -> Result<(), VantageError> {
        let slot = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| unknown(Resource::Node(node)))?;
        *slot = transform;
        Ok(())
    }

    fn create_material(&mut self, shader: &str) -> Result<MaterialHandle, MaterialError> {
        let material = Material::new(
            &self.context.device,
            &mut self.library,
            &self.layouts,
            shader,
        )?;
        let handle = MaterialHandle(self.allocate_id());
        let _ = self.materials.insert(handle, material);
        Ok(handle)
    }

    fn update_material(
        &mut self,
        material: MaterialHandle,
        params: &EffectParams,
    ) -> Result<(), VantageError> {
        self.materials
            .get(&material)
            .ok_or_else(|| unknown(Resource::Material(material)))?
            .write_params(&self.context.queue, params);
        Ok(())
    }

    fn create_command(&mut self, spec: &CommandSpec) -> Result<CommandHandle, VantageError> {
        if !self.materials.contains_key(&spec.material) {
            return Err(unknown(Resource::Material(spec.material)));
        }
        let handle = CommandHandle(self.allocate_id());
        let _ = self.commands.insert(handle, *spec);
        Ok(handle)
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> Result<SurfaceHandle, VantageError> {
        let device = &self.context.device;
        let size = (desc.width, desc.height);
        let limit = device.limits().max_texture_dimension_2d;
        if desc.width == 0
            || desc.height == 0
            || desc.width > limit
            || desc.height > limit
        {
            return Err(VantageError::Readback(format!(
                "{}x{} surface is outside the device limit of {limit}",
                desc.width, desc.height
            )));
        }
        let slot = match desc.usage {
            SurfaceUsage::Scene => {
                let targets = SceneTargets::new(device, size);
                let textures = self.layouts.scene_bind_group(device, &targets);
                SurfaceSlot::Scene(SceneSurface { targets, textures })
            }
            SurfaceUsage::Readback => {
                SurfaceSlot::Readback(ReadbackTarget::new(device, size))
            }
        };
        let handle = SurfaceHandle(self.allocate_id());
        log::debug!(
            "{handle}: {:?} surface {}x{}",
            desc.usage,
            desc.width,
            desc.height
        );
        let _ = self.surfaces.insert(handle, slot);
        Ok(handle)
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.surfaces.get(&surface).map(SurfaceSlot::size)
    }

    fn release(&mut self, resource: Resource) {
        let released = match resource {
            Resource::Camera(h) => self.cameras.remove(&h).is_some(),
            Resource::Node(h) => self.nodes.remove(&h).is_some(),
            Resource::Material(h) => self.materials.remove(&h).is_some(),
            Resource::Command(h) => self.commands.remove(&h).is_some(),
            Resource::Surface(h) => self.surfaces.remove(&h).is_some(),
        };
        if !released {
            log::debug!("release of unknown {resource} ignored");
        }
    }

    fn render_frame(&mut self, frame: &FrameRequest<'_>) -> Result<(), VantageError> {
        let model = self.node(frame.model_node)?;
        let light = self
            .node(frame.light_node)?
            .transform_vector3(Vec3::Y)
            .normalize_or(Vec3::Y);

        let camera = self
            .cameras
            .get_mut(&frame.camera)
            .ok_or_else(|| unknown(Resource::Camera(frame.camera)))?;
        camera.uniform.update_view_proj(&frame.view);
        camera.uniform.model = model.to_cols_array_2d();
        camera.uniform.clip[3] = frame.ground_height;
        camera.uniform.light = light.extend(frame.ambient).to_array();
        self.context.queue.write_buffer(
            &camera.buffer,
            0,
            bytemuck::bytes_of(&camera.uniform),
        );

        let Some(SurfaceSlot::Scene(scene)) = self.surfaces.get(&frame.target) else {
            return Err(unknown(Resource::Surface(frame.target)));
        };
        let view_bind_group = &self.cameras[&frame.camera].bind_group;

        let mut encoder = self.context.create_encoder("Frame Encoder");
        clear_scene(&mut encoder, &scene.targets, frame.clear_color);
        for stage in PipelineStage::ALL {
            if stage == PipelineStage::AfterOpaque {
                self.object_pass.draw(
                    &mut encoder,
                    &scene.targets,
                    view_bind_group,
                    &self.meshes,
                );
            }
            for &command in frame.bindings.at(stage) {
                self.encode_command(&mut encoder, command, scene, view_bind_group)?;
            }
        }
        self.context.submit(encoder);
        Ok(())
    }

    fn blit(&mut self, src: SurfaceHandle, dst: SurfaceHandle) -> Result<(), VantageError> {
        let source = self
            .surfaces
            .get(&src)
            .ok_or_else(|| unknown(Resource::Surface(src)))?;
        let target = self
            .surfaces
            .get(&dst)
            .ok_or_else(|| unknown(Resource::Surface(dst)))?;
        let (view, format) = match target {
            SurfaceSlot::Scene(scene) => (&scene.targets.color.view, SCENE_COLOR_FORMAT),
            SurfaceSlot::Readback(readback) if self.srgb_write => {
                (&readback.srgb_view, READBACK_SRGB_FORMAT)
            }
            SurfaceSlot::Readback(readback) => (&readback.view, READBACK_FORMAT),
        };
        let mut encoder = self.context.create_encoder("Blit Encoder");
        self.downsample.encode(
            &self.context.device,
            &mut encoder,
            &BlitEnd {
                view: source.color_view(),
                size: source.size(),
            },
            &BlitEnd {
                view,
                size: target.size(),
            },
            format,
        );
        self.context.submit(encoder);
        Ok(())
    }

    fn set_srgb_write(&mut self, enabled: bool) {
        self.srgb_write = enabled;
    }

    fn linear_color_space(&self) -> bool {
        true
    }

    fn read_pixels(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, VantageError> {
        match self.surfaces.get(&surface) {
            Some(SurfaceSlot::Readback(target)) => read_rgba8(
                &self.context.device,
                &self.context.queue,
                &target.texture,
                target.size,
            ),
            Some(SurfaceSlot::Scene(_)) => Err(VantageError::Readback(format!(
                "{surface} is not a readback surface"
            ))),
            None => Err(unknown(Resource::Surface(surface))),
        }
    }
}
