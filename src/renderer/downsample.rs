use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::pipeline_util::clear_attachment;
use crate::gpu::pipeline_helpers::{
    create_screen_space_pipeline, texture_2d_unfilterable, uniform_buffer,
};
use crate::gpu::shader_library::{MaterialError, ShaderLibrary};

/// Integer box-filter blit between surfaces of any format.
///
/// Pipelines are built lazily per destination format.
pub(super) struct DownsamplePass {
    shader: wgpu::ShaderModule,
    layout: wgpu::BindGroupLayout,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

/// One side of a blit.
pub(super) struct BlitEnd<'a> {
    pub(super) view: &'a wgpu::TextureView,
    pub(super) size: (u32, u32),
}

impl DownsamplePass {
    pub(super) fn new(
        device: &wgpu::Device,
        library: &mut ShaderLibrary,
    ) -> Result<Self, MaterialError> {
        let shader = library.compose(device, "downsample")?;
        let layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Downsample Layout"),
                entries: &[texture_2d_unfilterable(0), uniform_buffer(1)],
            });
        Ok(Self {
            shader,
            layout,
            pipelines: FxHashMap::default(),
        })
    }

    /// Box-filter `src` into `dst`, whose view has format `format`. The
    /// filter factor is the integer ratio of the two sizes per axis.
    pub(super) fn encode(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        src: &BlitEnd<'_>,
        dst: &BlitEnd<'_>,
        format: wgpu::TextureFormat,
    ) {
        let factor = [
            (src.size.0 / dst.size.0.max(1)).max(1),
            (src.size.1 / dst.size.1.max(1)).max(1),
            0,
            0,
        ];
        let params =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Downsample Params"),
                contents: bytemuck::cast_slice(&factor),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Downsample Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params.as_entire_binding(),
                },
            ],
        });
        let pipeline = self.pipelines.entry(format).or_insert_with(|| {
            log::debug!("building downsample pipeline for {format:?}");
            create_screen_space_pipeline(
                device,
                "Downsample",
                &self.shader,
                format,
                None,
                &[&self.layout],
            )
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Downsample Pass"),
            color_attachments: &[clear_attachment(
                dst.view,
                wgpu::Color::TRANSPARENT,
            )],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
