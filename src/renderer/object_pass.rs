use super::pipeline_util::{
    depth_attachment, depth_stencil_state, load_attachment,
    object_fragment_targets,
};
use crate::gpu::shader_library::{MaterialError, ShaderLibrary};
use crate::gpu::texture::SceneTargets;
use crate::scene::{GpuMesh, MeshVertex};

/// Lambert-lit draw of the target meshes into color, normal and depth.
pub(super) struct ObjectPass {
    pipeline: wgpu::RenderPipeline,
}

impl ObjectPass {
    pub(super) fn new(
        device: &wgpu::Device,
        library: &mut ShaderLibrary,
        view_layout: &wgpu::BindGroupLayout,
    ) -> Result<Self, MaterialError> {
        let shader = library.compose(device, "object")?;
        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Object Pipeline Layout"),
                bind_group_layouts: &[view_layout],
                push_constant_ranges: &[],
            });
        let pipeline =
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Object Pipeline"),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &object_fragment_targets(),
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(depth_stencil_state()),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });
        Ok(Self { pipeline })
    }

    pub(super) fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        targets: &SceneTargets,
        view_bind_group: &wgpu::BindGroup,
        meshes: &[GpuMesh],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Object Pass"),
            color_attachments: &[
                load_attachment(&targets.color.view),
                load_attachment(&targets.normal.view),
            ],
            depth_stencil_attachment: Some(depth_attachment(
                &targets.depth.view,
                false,
            )),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, view_bind_group, &[]);
        for mesh in meshes {
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(
                mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
