//! Supersampled offscreen capture of the live view.
//!
//! A capture renders the current camera and effect bindings exactly once at
//! `viewport × supersample × multiplier`, box-filters the result down to
//! `viewport × multiplier` and reads it back to the CPU.

use crate::error::VantageError;
use crate::gpu::backend::{
    FrameRequest, GraphicsBackend, Resource, SurfaceDesc, SurfaceHandle,
    SurfaceUsage,
};
use crate::options::CaptureOptions;

/// Clear color used while capturing with a transparent background.
pub const TRANSPARENT: [f32; 4] = [0.0; 4];

/// Live view size and the multipliers applied on top of it.
///
/// Every field is kept at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
    supersample_multiplier: u32,
    capture_multiplier: u32,
}

impl Viewport {
    /// Viewport of the given size with no capture multiplier.
    #[must_use]
    pub fn new(width: u32, height: u32, supersample_multiplier: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            supersample_multiplier: supersample_multiplier.max(1),
            capture_multiplier: 1,
        }
    }

    /// Copy with a different capture multiplier.
    #[must_use]
    pub fn with_capture_multiplier(self, multiplier: u32) -> Self {
        Self {
            capture_multiplier: multiplier.max(1),
            ..self
        }
    }

    /// Change the live view size.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Change the supersample multiplier.
    pub fn set_supersample_multiplier(&mut self, multiplier: u32) {
        self.supersample_multiplier = multiplier.max(1);
    }

    /// Live view size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Supersample multiplier.
    #[must_use]
    pub fn supersample_multiplier(&self) -> u32 {
        self.supersample_multiplier
    }

    /// Capture multiplier.
    #[must_use]
    pub fn capture_multiplier(&self) -> u32 {
        self.capture_multiplier
    }

    /// Resolution the scene is rendered at.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readback`] if the scaled size overflows.
    pub fn render_size(&self) -> Result<(u32, u32), VantageError> {
        let scale = self
            .supersample_multiplier
            .checked_mul(self.capture_multiplier);
        scaled(self.size(), scale)
    }

    /// Resolution after downsampling.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Readback`] if the scaled size overflows.
    pub fn output_size(&self) -> Result<(u32, u32), VantageError> {
        scaled(self.size(), Some(self.capture_multiplier))
    }

    /// Width over height.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

fn scaled(
    (width, height): (u32, u32),
    scale: Option<u32>,
) -> Result<(u32, u32), VantageError> {
    scale
        .and_then(|s| Some((width.checked_mul(s)?, height.checked_mul(s)?)))
        .ok_or_else(|| {
            VantageError::Readback(format!(
                "{width}x{height} view cannot be scaled that far"
            ))
        })
}

/// Screenshot parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Output resolution multiplier over the live view (at least 1).
    pub resolution_multiplier: u32,
    /// Keep a transparent background and return RGBA.
    pub wants_alpha: bool,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            resolution_multiplier: 1,
            wants_alpha: false,
        }
    }
}

impl From<&CaptureOptions> for CaptureRequest {
    fn from(options: &CaptureOptions) -> Self {
        Self {
            resolution_multiplier: options.resolution_multiplier.max(1),
            wants_alpha: options.wants_alpha,
        }
    }
}

/// Layout of a captured pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, sRGB-encoded color, straight alpha.
    Rgba8,
    /// 8-bit RGB, sRGB-encoded.
    Rgb8,
}

impl PixelFormat {
    /// Bytes per pixel.
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
        }
    }
}

/// A finished screenshot, ready for the host to encode and save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    /// Tightly packed rows, top to bottom.
    pub pixels: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
}

impl CaptureResult {
    /// Whether the image carries an alpha channel.
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.format == PixelFormat::Rgba8
    }
}

/// Owns the live-view clear color and performs captures against it.
#[derive(Debug, Clone)]
pub struct CaptureService {
    clear_color: [f32; 4],
}

impl CaptureService {
    /// Service with the given live-view clear color.
    #[must_use]
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self { clear_color }
    }

    /// Clear color used for live frames.
    #[must_use]
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Change the live-view clear color.
    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    /// Render `frame` once at capture resolution and read it back.
    ///
    /// `frame.target` and `frame.clear_color` are replaced; everything else
    /// (camera, nodes, stage bindings) is used as given. Temporary surfaces
    /// are released and the clear color and sRGB write state are restored
    /// whether or not the capture succeeds.
    ///
    /// # Errors
    ///
    /// Propagates surface allocation, render and readback failures.
    pub fn capture<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame: &FrameRequest<'_>,
        viewport: &Viewport,
        request: &CaptureRequest,
    ) -> Result<CaptureResult, VantageError> {
        let viewport =
            viewport.with_capture_multiplier(request.resolution_multiplier);
        let mut temporaries = Vec::with_capacity(2);
        let result =
            self.render_and_read(backend, frame, &viewport, request, &mut temporaries);
        for surface in temporaries.into_iter().rev() {
            backend.release(Resource::Surface(surface));
        }
        if let Err(e) = &result {
            log::error!("capture failed: {e}");
        }
        result
    }

    fn render_and_read<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame: &FrameRequest<'_>,
        viewport: &Viewport,
        request: &CaptureRequest,
        temporaries: &mut Vec<SurfaceHandle>,
    ) -> Result<CaptureResult, VantageError> {
        let (render_w, render_h) = viewport.render_size()?;
        let (out_w, out_h) = viewport.output_size()?;
        let expected = (out_w as usize)
            .checked_mul(out_h as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                VantageError::Readback(format!(
                    "{out_w}x{out_h} image does not fit in memory"
                ))
            })?;

        let scene = backend.create_surface(&SurfaceDesc {
            width: render_w,
            height: render_h,
            usage: SurfaceUsage::Scene,
        })?;
        temporaries.push(scene);
        let readback = backend.create_surface(&SurfaceDesc {
            width: out_w,
            height: out_h,
            usage: SurfaceUsage::Readback,
        })?;
        temporaries.push(readback);

        let previous = self.clear_color;
        if request.wants_alpha {
            self.clear_color = TRANSPARENT;
        }
        let rendered = backend.render_frame(&FrameRequest {
            target: scene,
            clear_color: self.clear_color,
            ..*frame
        });
        self.clear_color = previous;
        rendered?;

        let linear = backend.linear_color_space();
        if linear {
            backend.set_srgb_write(true);
        }
        let downsampled = backend.blit(scene, readback);
        if linear {
            backend.set_srgb_write(false);
        }
        downsampled?;

        let rgba = backend.read_pixels(readback)?;
        if rgba.len() != expected {
            return Err(VantageError::Readback(format!(
                "expected {expected} bytes, got {}",
                rgba.len()
            )));
        }

        let (pixels, format) = if request.wants_alpha {
            (rgba, PixelFormat::Rgba8)
        } else {
            (strip_alpha(&rgba), PixelFormat::Rgb8)
        };
        log::info!(
            "captured {out_w}x{out_h} {format:?} (rendered at {render_w}x{render_h})"
        );
        Ok(CaptureResult {
            pixels,
            width: out_w,
            height: out_h,
            format,
        })
    }
}

fn strip_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::rig::OrbitCameraRig;
    use crate::effects::{CommandStyle, EffectKind, PipelineStage, StageBindings};
    use crate::gpu::backend::{CameraHandle, CommandSpec, NodeHandle};
    use crate::testing::{Call, ObjectCoverage, RecordingBackend};

    struct Fixture {
        camera: CameraHandle,
        model: NodeHandle,
        light: NodeHandle,
        view: SurfaceHandle,
    }

    fn fixture(backend: &mut RecordingBackend) -> Fixture {
        Fixture {
            camera: backend.create_camera("camera").unwrap(),
            model: backend.create_node("model").unwrap(),
            light: backend.create_node("light").unwrap(),
            view: backend
                .create_surface(&SurfaceDesc {
                    width: 4,
                    height: 3,
                    usage: SurfaceUsage::Scene,
                })
                .unwrap(),
        }
    }

    fn frame<'a>(f: &Fixture, bindings: &'a StageBindings) -> FrameRequest<'a> {
        FrameRequest {
            camera: f.camera,
            target: f.view,
            view: OrbitCameraRig::new().camera(1.0),
            clear_color: [0.18, 0.18, 0.2, 1.0],
            model_node: f.model,
            light_node: f.light,
            ambient: 0.25,
            ground_height: 0.0,
            bindings,
        }
    }

    fn pixel(result: &CaptureResult, x: u32, y: u32) -> &[u8] {
        let bpp = result.format.bytes_per_pixel();
        let start = (y * result.width + x) as usize * bpp;
        &result.pixels[start..start + bpp]
    }

    #[test]
    fn viewport_clamps_and_scales() {
        let viewport = Viewport::new(0, 300, 0).with_capture_multiplier(0);
        assert_eq!(viewport.size(), (1, 300));
        assert_eq!(viewport.render_size().unwrap(), (1, 300));

        let viewport = Viewport::new(400, 300, 2).with_capture_multiplier(3);
        assert_eq!(viewport.render_size().unwrap(), (2400, 1800));
        assert_eq!(viewport.output_size().unwrap(), (1200, 900));
    }

    #[test]
    fn viewport_scaling_overflow_is_an_error() {
        let viewport =
            Viewport::new(4000, 3000, 4).with_capture_multiplier(300_000);
        assert!(matches!(
            viewport.render_size(),
            Err(VantageError::Readback(_))
        ));
        assert!(matches!(
            viewport.output_size(),
            Err(VantageError::Readback(_))
        ));

        let viewport = Viewport::new(4000, 3000, u32::MAX)
            .with_capture_multiplier(2);
        assert!(viewport.render_size().is_err());
        assert_eq!(viewport.output_size().unwrap(), (8000, 6000));
    }

    #[test]
    fn oversized_capture_fails_without_rendering() {
        let mut backend = RecordingBackend::new();
        let f = fixture(&mut backend);
        let live_before = backend.live_count();
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.3, 0.3, 0.3, 1.0]);

        for multiplier in [300_000, 40] {
            let err = service
                .capture(
                    &mut backend,
                    &frame(&f, &bindings),
                    &Viewport::new(4000, 3000, 4),
                    &CaptureRequest {
                        resolution_multiplier: multiplier,
                        wants_alpha: true,
                    },
                )
                .unwrap_err();
            assert!(matches!(err, VantageError::Readback(_)));
        }
        assert_eq!(backend.render_count(), 0);
        assert_eq!(backend.live_count(), live_before);
        assert_eq!(service.clear_color(), [0.3, 0.3, 0.3, 1.0]);
    }

    #[test]
    fn opaque_capture_at_double_resolution_is_rgb() {
        let mut backend = RecordingBackend::new();
        let f = fixture(&mut backend);
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.18, 0.18, 0.2, 1.0]);

        let result = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(400, 300, 1),
                &CaptureRequest {
                    resolution_multiplier: 2,
                    wants_alpha: false,
                },
            )
            .unwrap();

        assert_eq!((result.width, result.height), (800, 600));
        assert_eq!(result.format, PixelFormat::Rgb8);
        assert!(!result.has_alpha());
        assert_eq!(result.pixels.len(), 800 * 600 * 3);
    }

    #[test]
    fn supersampled_capture_renders_larger_and_downsamples() {
        let mut backend = RecordingBackend::new();
        let f = fixture(&mut backend);
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.5, 0.5, 0.5, 1.0]);

        let result = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(40, 30, 2),
                &CaptureRequest {
                    resolution_multiplier: 2,
                    wants_alpha: false,
                },
            )
            .unwrap();

        let log = backend.surface_log();
        assert_eq!(log[log.len() - 2], (160, 120, SurfaceUsage::Scene));
        assert_eq!(log[log.len() - 1], (80, 60, SurfaceUsage::Readback));
        assert_eq!((result.width, result.height), (80, 60));
    }

    #[test]
    fn alpha_capture_keeps_background_transparent() {
        let mut backend = RecordingBackend::new();
        backend.object = Some(ObjectCoverage {
            rect: [0.25, 0.25, 0.75, 0.75],
            color: [1.0, 0.0, 0.0, 1.0],
        });
        let f = fixture(&mut backend);
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.18, 0.18, 0.2, 1.0]);

        let result = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(16, 16, 2),
                &CaptureRequest {
                    resolution_multiplier: 1,
                    wants_alpha: true,
                },
            )
            .unwrap();

        assert!(result.has_alpha());
        assert_eq!(pixel(&result, 0, 0)[3], 0);
        assert_eq!(pixel(&result, 15, 15)[3], 0);
        assert_eq!(pixel(&result, 8, 8), &[255, 0, 0, 255]);
        assert_eq!(service.clear_color(), [0.18, 0.18, 0.2, 1.0]);
    }

    #[test]
    fn alpha_capture_renders_exactly_once() {
        let mut backend = RecordingBackend::new();
        let f = fixture(&mut backend);
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.1, 0.1, 0.1, 1.0]);

        let _ = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(8, 8, 1),
                &CaptureRequest {
                    resolution_multiplier: 1,
                    wants_alpha: true,
                },
            )
            .unwrap();

        assert_eq!(backend.render_count(), 1);
        let clears: Vec<_> = backend
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Render { clear_color, .. } => Some(*clear_color),
                _ => None,
            })
            .collect();
        assert_eq!(clears, vec![TRANSPARENT]);
    }

    #[test]
    fn linear_backend_writes_srgb_only_during_downsample() {
        let mut backend = RecordingBackend::linear();
        let f = fixture(&mut backend);
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.18, 0.18, 0.18, 1.0]);

        let result = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(4, 4, 1),
                &CaptureRequest::default(),
            )
            .unwrap();

        let blits: Vec<bool> = backend
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Blit { srgb_write, .. } => Some(*srgb_write),
                _ => None,
            })
            .collect();
        assert_eq!(blits, vec![true]);
        assert!(!backend.srgb_write());
        // 0.18 linear encodes to roughly 0.46 in sRGB
        assert!((i32::from(pixel(&result, 0, 0)[0]) - 118).abs() <= 1);
    }

    #[test]
    fn non_linear_backend_never_toggles_srgb() {
        let mut backend = RecordingBackend::new();
        let f = fixture(&mut backend);
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.5, 0.5, 0.5, 1.0]);

        let _ = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(4, 4, 1),
                &CaptureRequest::default(),
            )
            .unwrap();
        assert!(!backend
            .calls
            .iter()
            .any(|call| matches!(call, Call::SetSrgbWrite(_))));
    }

    #[test]
    fn failed_readback_restores_state_and_releases_temporaries() {
        let mut backend = RecordingBackend::linear();
        backend.fail_readback = true;
        let f = fixture(&mut backend);
        let live_before = backend.live_count();
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.3, 0.3, 0.3, 1.0]);

        let err = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(4, 4, 2),
                &CaptureRequest {
                    resolution_multiplier: 2,
                    wants_alpha: true,
                },
            )
            .unwrap_err();

        assert!(matches!(err, VantageError::Readback(_)));
        assert_eq!(backend.live_count(), live_before);
        assert!(!backend.srgb_write());
        assert_eq!(service.clear_color(), [0.3, 0.3, 0.3, 1.0]);
    }

    #[test]
    fn failed_render_restores_clear_color() {
        let mut backend = RecordingBackend::new();
        backend.fail_render = true;
        let f = fixture(&mut backend);
        let live_before = backend.live_count();
        let bindings = StageBindings::new();
        let mut service = CaptureService::new([0.3, 0.3, 0.3, 1.0]);

        assert!(service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(4, 4, 1),
                &CaptureRequest {
                    resolution_multiplier: 1,
                    wants_alpha: true,
                },
            )
            .is_err());
        assert_eq!(service.clear_color(), [0.3, 0.3, 0.3, 1.0]);
        assert_eq!(backend.live_count(), live_before);
    }

    #[test]
    fn capture_uses_live_bindings() {
        let mut backend = RecordingBackend::new();
        let f = fixture(&mut backend);
        let material = backend.create_material("grid").unwrap();
        let command = backend
            .create_command(&CommandSpec {
                kind: EffectKind::Grid,
                style: CommandStyle::Blit,
                material,
            })
            .unwrap();
        let mut bindings = StageBindings::new();
        bindings.attach(PipelineStage::BeforeOpaque, command);
        let mut service = CaptureService::new([0.3, 0.3, 0.3, 1.0]);

        let _ = service
            .capture(
                &mut backend,
                &frame(&f, &bindings),
                &Viewport::new(4, 4, 1),
                &CaptureRequest::default(),
            )
            .unwrap();
        assert_eq!(backend.last_executed(), vec![command]);
    }
}
