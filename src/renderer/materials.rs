use wgpu::util::DeviceExt;

use super::pipeline_util::{overlay_depth_state, overlay_fragment_target};
use crate::effects::{EffectParams, EffectUniform};
use crate::gpu::backend::PASSTHROUGH;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, depth_texture_2d, texture_2d_unfilterable,
    uniform_bind_group, uniform_buffer,
};
use crate::gpu::shader_library::{MaterialError, MaterialLayout, ShaderLibrary};
use crate::gpu::texture::{SceneTargets, SCENE_COLOR_FORMAT};
use crate::scene::{MeshVertex, WireVertex};

/// Bind group layouts shared by every pass.
///
/// - group 0: view uniform
/// - group 1: effect parameters
/// - group 2: scene color, depth and normals (screen materials only)
pub(super) struct SharedLayouts {
    pub(super) view: wgpu::BindGroupLayout,
    pub(super) params: wgpu::BindGroupLayout,
    pub(super) scene: wgpu::BindGroupLayout,
}

impl SharedLayouts {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let single_uniform = |label| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[uniform_buffer(0)],
            })
        };
        Self {
            view: single_uniform("View Layout"),
            params: single_uniform("Effect Params Layout"),
            scene: device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("Scene Textures Layout"),
                    entries: &[
                        texture_2d_unfilterable(0),
                        depth_texture_2d(1),
                        texture_2d_unfilterable(2),
                    ],
                },
            ),
        }
    }

    /// Bind group exposing a scene surface to screen materials.
    pub(super) fn scene_bind_group(
        &self,
        device: &wgpu::Device,
        targets: &SceneTargets,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Textures"),
            layout: &self.scene,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        &targets.color.view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(
                        &targets.depth.view,
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(
                        &targets.normal.view,
                    ),
                },
            ],
        })
    }
}

/// A compiled effect material: pipeline plus its parameter uniform.
pub(super) struct Material {
    shader: String,
    layout: MaterialLayout,
    pipeline: wgpu::RenderPipeline,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Material {
    pub(super) fn new(
        device: &wgpu::Device,
        library: &mut ShaderLibrary,
        layouts: &SharedLayouts,
        shader: &str,
    ) -> Result<Self, MaterialError> {
        let layout = ShaderLibrary::material_layout(shader)?;
        let module = library.compose(device, shader)?;
        let pipeline = match layout {
            MaterialLayout::Screen => create_screen_space_pipeline(
                device,
                shader,
                &module,
                SCENE_COLOR_FORMAT,
                None,
                &[&layouts.view, &layouts.params, &layouts.scene],
            ),
            MaterialLayout::Mesh
            | MaterialLayout::Wire
            | MaterialLayout::Shadow => {
                create_geometry_pipeline(device, shader, &module, layout, layouts)
            }
            MaterialLayout::Internal => {
                return Err(MaterialError::NotFound(shader.to_owned()))
            }
        };
        let uniform =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{shader} Params")),
                contents: bytemuck::bytes_of(&EffectParams::default().to_uniform()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = uniform_bind_group(
            device,
            &format!("{shader} Params"),
            &layouts.params,
            &uniform,
        );
        Ok(Self {
            shader: shader.to_owned(),
            layout,
            pipeline,
            uniform,
            bind_group,
        })
    }

    pub(super) fn layout(&self) -> MaterialLayout {
        self.layout
    }

    pub(super) fn shader(&self) -> &str {
        &self.shader
    }

    /// Fallback materials draw nothing when used as a geometry override.
    pub(super) fn is_passthrough(&self) -> bool {
        self.shader == PASSTHROUGH
    }

    pub(super) fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub(super) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub(super) fn write_params(&self, queue: &wgpu::Queue, params: &EffectParams) {
        let uniform: EffectUniform = params.clamped().to_uniform();
        queue.write_buffer(&self.uniform, 0, bytemuck::bytes_of(&uniform));
    }
}

fn create_geometry_pipeline(
    device: &wgpu::Device,
    label: &str,
    module: &wgpu::ShaderModule,
    layout: MaterialLayout,
    layouts: &SharedLayouts,
) -> wgpu::RenderPipeline {
    let (vertex_layout, compare, cull_mode) = match layout {
        MaterialLayout::Wire => (
            WireVertex::layout(),
            wgpu::CompareFunction::LessEqual,
            None,
        ),
        MaterialLayout::Shadow => {
            (MeshVertex::layout(), wgpu::CompareFunction::Less, None)
        }
        _ => (
            MeshVertex::layout(),
            wgpu::CompareFunction::LessEqual,
            Some(wgpu::Face::Back),
        ),
    };
    let pipeline_layout =
        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &[&layouts.view, &layouts.params],
            push_constant_ranges: &[],
        });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &overlay_fragment_target(),
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(overlay_depth_state(compare)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
