//! CPU stand-in for the renderer, used by unit tests.
//!
//! Records every call, tracks live resources, and renders frames into
//! plain `Vec<[f32; 4]>` surfaces so capture and lifecycle behavior can be
//! checked without a GPU.

use glam::Mat4;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::effects::{EffectParams, PipelineStage};
use crate::error::VantageError;
use crate::gpu::backend::{
    CameraHandle, CommandHandle, CommandSpec, FrameRequest, GraphicsBackend,
    MaterialHandle, NodeHandle, Resource, SurfaceDesc, SurfaceHandle,
    SurfaceUsage,
};
use crate::gpu::shader_library::MaterialError;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Create(Resource),
    Release(Resource),
    SetNode(NodeHandle),
    UpdateMaterial(MaterialHandle),
    Render {
        target: SurfaceHandle,
        clear_color: [f32; 4],
        executed: Vec<CommandHandle>,
    },
    Blit {
        src: SurfaceHandle,
        dst: SurfaceHandle,
        srgb_write: bool,
    },
    SetSrgbWrite(bool),
    ReadPixels(SurfaceHandle),
}

struct CpuSurface {
    width: u32,
    height: u32,
    usage: SurfaceUsage,
    pixels: Vec<[f32; 4]>,
}

/// Opaque rectangle standing in for the rendered object, as
/// `[x0, y0, x1, y1]` fractions of the target size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectCoverage {
    pub rect: [f32; 4],
    pub color: [f32; 4],
}

pub(crate) struct RecordingBackend {
    pub calls: Vec<Call>,
    pub linear: bool,
    pub object: Option<ObjectCoverage>,
    pub fail_readback: bool,
    pub fail_render: bool,
    /// Fails the n-th `create_*` call (1-based), for partial-open tests.
    pub fail_create_at: Option<usize>,
    /// Largest surface edge accepted, like a device texture limit.
    pub max_surface_dimension: u32,
    creates: usize,
    next_id: u32,
    live: FxHashSet<Resource>,
    failing_shaders: FxHashSet<String>,
    materials: FxHashMap<MaterialHandle, (String, Option<EffectParams>)>,
    commands: FxHashMap<CommandHandle, CommandSpec>,
    nodes: FxHashMap<NodeHandle, Mat4>,
    surfaces: FxHashMap<SurfaceHandle, CpuSurface>,
    surface_log: Vec<(u32, u32, SurfaceUsage)>,
    srgb_write: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            linear: false,
            object: None,
            fail_readback: false,
            fail_render: false,
            fail_create_at: None,
            max_surface_dimension: 8192,
            creates: 0,
            next_id: 1,
            live: FxHashSet::default(),
            failing_shaders: FxHashSet::default(),
            materials: FxHashMap::default(),
            commands: FxHashMap::default(),
            nodes: FxHashMap::default(),
            surfaces: FxHashMap::default(),
            surface_log: Vec::new(),
            srgb_write: false,
        }
    }

    /// Backend whose scene surfaces are linear, like the wgpu renderer.
    pub fn linear() -> Self {
        Self {
            linear: true,
            ..Self::new()
        }
    }

    pub fn fail_shader(&mut self, name: &str) {
        let _ = self.failing_shaders.insert(name.to_owned());
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, resource: Resource) -> bool {
        self.live.contains(&resource)
    }

    pub fn srgb_write(&self) -> bool {
        self.srgb_write
    }

    pub fn material_params(
        &self,
        material: MaterialHandle,
    ) -> Option<EffectParams> {
        self.materials.get(&material).and_then(|(_, params)| *params)
    }

    pub fn material_shader(&self, material: MaterialHandle) -> Option<&str> {
        self.materials.get(&material).map(|(name, _)| name.as_str())
    }

    pub fn node_transform(&self, node: NodeHandle) -> Option<Mat4> {
        self.nodes.get(&node).copied()
    }

    pub fn created(&self) -> Vec<Resource> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Create(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<Resource> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Release(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn render_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Render { .. }))
            .count()
    }

    /// Commands executed by the most recent frame, in execution order.
    pub fn last_executed(&self) -> Vec<CommandHandle> {
        self.calls
            .iter()
            .rev()
            .find_map(|call| match call {
                Call::Render { executed, .. } => Some(executed.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Size and usage of every surface created so far, in creation order.
    pub fn surface_log(&self) -> &[(u32, u32, SurfaceUsage)] {
        &self.surface_log
    }

    fn allocate(&mut self) -> Result<u32, VantageError> {
        self.creates += 1;
        if self.fail_create_at == Some(self.creates) {
            return Err(VantageError::UnknownResource(format!(
                "allocation #{} refused",
                self.creates
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }

    fn track(&mut self, resource: Resource) {
        let _ = self.live.insert(resource);
        self.calls.push(Call::Create(resource));
    }

    fn require(&self, resource: Resource) -> Result<(), VantageError> {
        if self.live.contains(&resource) {
            Ok(())
        } else {
            Err(VantageError::UnknownResource(resource.to_string()))
        }
    }

    fn surface(&self, handle: SurfaceHandle) -> Result<&CpuSurface, VantageError> {
        self.surfaces.get(&handle).ok_or_else(|| {
            VantageError::UnknownResource(Resource::Surface(handle).to_string())
        })
    }
}

fn srgb_encode(linear: f32) -> f32 {
    let c = linear.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_camera(&mut self, _label: &str) -> Result<CameraHandle, VantageError> {
        let handle = CameraHandle(self.allocate()?);
        self.track(Resource::Camera(handle));
        Ok(handle)
    }

    fn create_node(&mut self, _label: &str) -> Result<NodeHandle, VantageError> {
        let handle = NodeHandle(self.allocate()?);
        let _ = self.nodes.insert(handle, Mat4::IDENTITY);
        self.track(Resource::Node(handle));
        Ok(handle)
    }

    fn set_node_transform(
        &mut self,
        node: NodeHandle,
        transform: Mat4,
    ) -> Result<(), VantageError> {
        self.require(Resource::Node(node))?;
        let _ = self.nodes.insert(node, transform);
        self.calls.push(Call::SetNode(node));
        Ok(())
    }

    fn create_material(
        &mut self,
        shader: &str,
    ) -> Result<MaterialHandle, MaterialError> {
        if self.failing_shaders.contains(shader) {
            return Err(MaterialError::NotFound(shader.to_owned()));
        }
        let id = self
            .allocate()
            .map_err(|e| MaterialError::NotFound(e.to_string()))?;
        let handle = MaterialHandle(id);
        let _ = self.materials.insert(handle, (shader.to_owned(), None));
        self.track(Resource::Material(handle));
        Ok(handle)
    }

    fn update_material(
        &mut self,
        material: MaterialHandle,
        params: &EffectParams,
    ) -> Result<(), VantageError> {
        self.require(Resource::Material(material))?;
        if let Some(entry) = self.materials.get_mut(&material) {
            entry.1 = Some(*params);
        }
        self.calls.push(Call::UpdateMaterial(material));
        Ok(())
    }

    fn create_command(
        &mut self,
        spec: &CommandSpec,
    ) -> Result<CommandHandle, VantageError> {
        self.require(Resource::Material(spec.material))?;
        let handle = CommandHandle(self.allocate()?);
        let _ = self.commands.insert(handle, *spec);
        self.track(Resource::Command(handle));
        Ok(handle)
    }

    fn create_surface(
        &mut self,
        desc: &SurfaceDesc,
    ) -> Result<SurfaceHandle, VantageError> {
        let (width, height) = (desc.width.max(1), desc.height.max(1));
        let limit = self.max_surface_dimension;
        if width > limit || height > limit {
            return Err(VantageError::Readback(format!(
                "{width}x{height} surface exceeds {limit}"
            )));
        }
        let handle = SurfaceHandle(self.allocate()?);
        let _ = self.surfaces.insert(
            handle,
            CpuSurface {
                width,
                height,
                usage: desc.usage,
                pixels: vec![[0.0; 4]; (width * height) as usize],
            },
        );
        self.surface_log.push((width, height, desc.usage));
        self.track(Resource::Surface(handle));
        Ok(handle)
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.surfaces.get(&surface).map(|s| (s.width, s.height))
    }

    fn release(&mut self, resource: Resource) {
        if !self.live.remove(&resource) {
            return;
        }
        match resource {
            Resource::Surface(h) => {
                let _ = self.surfaces.remove(&h);
            }
            Resource::Material(h) => {
                let _ = self.materials.remove(&h);
            }
            Resource::Command(h) => {
                let _ = self.commands.remove(&h);
            }
            Resource::Node(h) => {
                let _ = self.nodes.remove(&h);
            }
            Resource::Camera(_) => {}
        }
        self.calls.push(Call::Release(resource));
    }

    fn render_frame(&mut self, frame: &FrameRequest<'_>) -> Result<(), VantageError> {
        self.require(Resource::Camera(frame.camera))?;
        self.require(Resource::Node(frame.model_node))?;
        self.require(Resource::Node(frame.light_node))?;
        self.require(Resource::Surface(frame.target))?;
        if self.fail_render {
            return Err(VantageError::UnknownResource("render refused".to_owned()));
        }

        let mut executed = Vec::new();
        for stage in PipelineStage::ALL {
            for command in frame.bindings.at(stage) {
                self.require(Resource::Command(*command))?;
                executed.push(*command);
            }
        }

        let object = self.object;
        if let Some(surface) = self.surfaces.get_mut(&frame.target) {
            let (w, h) = (surface.width as f32, surface.height as f32);
            for y in 0..surface.height {
                for x in 0..surface.width {
                    let (fx, fy) = ((x as f32 + 0.5) / w, (y as f32 + 0.5) / h);
                    let covered = object.filter(|o| {
                        fx >= o.rect[0]
                            && fx < o.rect[2]
                            && fy >= o.rect[1]
                            && fy < o.rect[3]
                    });
                    surface.pixels[(y * surface.width + x) as usize] =
                        covered.map_or(frame.clear_color, |o| o.color);
                }
            }
        }

        self.calls.push(Call::Render {
            target: frame.target,
            clear_color: frame.clear_color,
            executed,
        });
        Ok(())
    }

    fn blit(
        &mut self,
        src: SurfaceHandle,
        dst: SurfaceHandle,
    ) -> Result<(), VantageError> {
        let source = self.surface(src)?;
        let target = self.surface(dst)?;
        let factor_x = (source.width / target.width).max(1);
        let factor_y = (source.height / target.height).max(1);
        let encode = self.srgb_write && target.usage == SurfaceUsage::Readback;
        let (tw, th) = (target.width, target.height);

        let mut out = Vec::with_capacity((tw * th) as usize);
        for y in 0..th {
            for x in 0..tw {
                let mut sum = [0.0f32; 4];
                for sy in 0..factor_y {
                    for sx in 0..factor_x {
                        let px = (x * factor_x + sx).min(source.width - 1);
                        let py = (y * factor_y + sy).min(source.height - 1);
                        let texel = source.pixels[(py * source.width + px) as usize];
                        for (acc, v) in sum.iter_mut().zip(texel) {
                            *acc += v;
                        }
                    }
                }
                let n = (factor_x * factor_y) as f32;
                let mut texel = sum.map(|v| v / n);
                if encode {
                    for c in &mut texel[..3] {
                        *c = srgb_encode(*c);
                    }
                }
                out.push(texel);
            }
        }

        if let Some(target) = self.surfaces.get_mut(&dst) {
            target.pixels = out;
        }
        self.calls.push(Call::Blit {
            src,
            dst,
            srgb_write: self.srgb_write,
        });
        Ok(())
    }

    fn set_srgb_write(&mut self, enabled: bool) {
        self.srgb_write = enabled;
        self.calls.push(Call::SetSrgbWrite(enabled));
    }

    fn linear_color_space(&self) -> bool {
        self.linear
    }

    fn read_pixels(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, VantageError> {
        let cpu = self.surface(surface)?;
        if cpu.usage != SurfaceUsage::Readback {
            return Err(VantageError::Readback(format!(
                "{} is not a readback surface",
                Resource::Surface(surface)
            )));
        }
        if self.fail_readback {
            return Err(VantageError::Readback("buffer map failed".to_owned()));
        }
        let bytes = cpu
            .pixels
            .iter()
            .flat_map(|texel| texel.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect();
        self.calls.push(Call::ReadPixels(surface));
        Ok(bytes)
    }
}
