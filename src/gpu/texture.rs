//! Offscreen render-target textures for scene and readback surfaces.

/// HDR color format of scene surfaces (linear light).
pub const SCENE_COLOR_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Rgba16Float;
/// Format of the world-space normal target (alpha 1 where the object is).
pub const SCENE_NORMAL_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Rgba16Float;
/// Depth format of scene surfaces.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Storage format of readback surfaces.
pub const READBACK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// View format used when writing readback surfaces with sRGB encoding.
pub const READBACK_SRGB_FORMAT: wgpu::TextureFormat =
    wgpu::TextureFormat::Rgba8UnormSrgb;

/// A texture and its default view.
pub struct RenderTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    /// Create a 2D render-target texture.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: usage | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Color, normal and depth targets of one scene surface.
pub struct SceneTargets {
    /// Linear HDR color.
    pub color: RenderTarget,
    /// World-space normals written by the object pass.
    pub normal: RenderTarget,
    /// Depth buffer.
    pub depth: RenderTarget,
    /// Size in pixels.
    pub size: (u32, u32),
}

impl SceneTargets {
    /// Allocate the three targets at `size` (clamped to at least 1x1).
    #[must_use]
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let sampled = wgpu::TextureUsages::TEXTURE_BINDING;
        Self {
            color: RenderTarget::new(
                device,
                "Scene Color",
                size,
                SCENE_COLOR_FORMAT,
                sampled
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
            ),
            normal: RenderTarget::new(
                device,
                "Scene Normal",
                size,
                SCENE_NORMAL_FORMAT,
                sampled,
            ),
            depth: RenderTarget::new(
                device,
                "Scene Depth",
                size,
                DEPTH_FORMAT,
                sampled,
            ),
            size,
        }
    }
}

/// 8-bit RGBA texture that can be copied back to the CPU.
///
/// Stored as `Rgba8Unorm` with an extra `Rgba8UnormSrgb` view, so a blit can
/// either copy raw values or let the hardware encode linear values to sRGB.
pub struct ReadbackTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// Raw `Rgba8Unorm` view.
    pub view: wgpu::TextureView,
    /// sRGB-encoding view.
    pub srgb_view: wgpu::TextureView,
    /// Size in pixels.
    pub size: (u32, u32),
}

impl ReadbackTarget {
    /// Allocate a readback texture (clamped to at least 1x1).
    #[must_use]
    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let size = (size.0.max(1), size.1.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Readback Target"),
            size: extent(size.0, size.1),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: READBACK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[READBACK_SRGB_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let srgb_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Readback sRGB View"),
            format: Some(READBACK_SRGB_FORMAT),
            ..Default::default()
        });
        Self {
            texture,
            view,
            srgb_view,
            size,
        }
    }
}

/// Single-layer extent.
#[must_use]
pub fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}
