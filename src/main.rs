//! Interactive preview window: orbit a demo object, toggle diagnostic
//! effects and take captures.
//!
//! Usage: `vantage [--options FILE]`
//!
//! Left drag orbits, right/middle (or shift + left) drag pans, the wheel
//! zooms. Keys `1`-`5` toggle wireframe, grid, planar shadow, depth/normal
//! and solid tint; `F` re-frames the object, `O` toggles orthographic
//! projection and `P` captures the view.

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use vantage::camera::input::{InputEvent, InputMapper};
use vantage::capture::CaptureRequest;
use vantage::effects::EffectKind;
use vantage::gpu::render_context::RenderContext;
use vantage::renderer::WgpuBackend;
use vantage::scene::MeshData;
use vantage::util::frame_timing::FrameTiming;
use vantage::{Options, PreviewSession, VantageError};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Render cap of the viewer loop.
const TARGET_FPS: u32 = 60;

struct PreviewApp {
    window: Option<Arc<Window>>,
    session: Option<PreviewSession<WgpuBackend>>,
    input: InputMapper,
    timing: FrameTiming,
    options: Options,
    meshes: Vec<MeshData>,
}

impl PreviewApp {
    fn new(options: Options) -> Self {
        Self {
            window: None,
            session: None,
            input: InputMapper::new(&options.camera),
            timing: FrameTiming::new(TARGET_FPS),
            options,
            meshes: demo_meshes(),
        }
    }

    fn start(
        &self,
        window: &Arc<Window>,
    ) -> Result<PreviewSession<WgpuBackend>, VantageError> {
        let size = window.inner_size();
        let context = pollster::block_on(RenderContext::new(
            Arc::clone(window),
            (size.width, size.height),
        ))?;
        let mut backend = WgpuBackend::new(context)?;
        backend.set_target_meshes(&self.meshes);

        let mut session = PreviewSession::new(backend, size.width, size.height);
        session.open(self.options.clone())?;
        self.frame(&mut session);
        session.rig_mut().snap_to_destination();
        Ok(session)
    }

    fn frame(&self, session: &mut PreviewSession<WgpuBackend>) {
        if let Some(bounds) = MeshData::combined_bounds(&self.meshes) {
            session.frame_target(&bounds);
        }
    }

    fn redraw(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        let dt = self.timing.tick();
        if let Err(e) = session.tick(self.input.take_input(), dt) {
            log::error!("render failed: {e}");
            return;
        }
        let Some(surface) = session.view_surface() else {
            return;
        };
        if let Err(e) = session.backend_mut().present(surface) {
            log::warn!("present failed: {e}");
            if let Some(window) = &self.window {
                let size = window.inner_size();
                let _ = session
                    .backend_mut()
                    .context_mut()
                    .resize(size.width, size.height);
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(session) = &mut self.session {
            if !session.backend_mut().context_mut().resize(width, height) {
                return;
            }
            if let Err(e) = session.resize(width, height) {
                log::error!("resize to {width}x{height} failed: {e}");
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        let Some(session) = &mut self.session else {
            return;
        };
        let effect = match code {
            KeyCode::Digit1 => Some(EffectKind::Wireframe),
            KeyCode::Digit2 => Some(EffectKind::Grid),
            KeyCode::Digit3 => Some(EffectKind::PlanarShadow),
            KeyCode::Digit4 => Some(EffectKind::DepthNormal),
            KeyCode::Digit5 => Some(EffectKind::SolidTint),
            _ => None,
        };
        if let Some(kind) = effect {
            let enabled = !session.options().effects.enabled(kind);
            match session.set_effect_enabled(kind, enabled) {
                Ok(()) => log::info!("{} {}", kind.label(), on_off(enabled)),
                Err(e) => log::error!("toggling {} failed: {e}", kind.label()),
            }
            return;
        }
        match code {
            KeyCode::KeyF => {
                if let Some(bounds) = MeshData::combined_bounds(&self.meshes) {
                    session.frame_target(&bounds);
                }
            }
            KeyCode::KeyO => {
                let orthographic = !session.rig().is_orthographic();
                session.rig_mut().set_orthographic(orthographic);
                log::info!("orthographic {}", on_off(orthographic));
            }
            KeyCode::KeyP => {
                let request = CaptureRequest::from(&session.options().capture);
                match session.capture(&request) {
                    Ok(result) => log::info!(
                        "captured {}x{} {:?} ({} bytes)",
                        result.width,
                        result.height,
                        result.format,
                        result.pixels.len()
                    ),
                    Err(e) => log::error!("capture failed: {e}"),
                }
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for PreviewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("Vantage")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        match self.start(&window) {
            Ok(session) => self.session = Some(session),
            Err(e) => {
                log::error!("failed to start preview: {e}");
                event_loop.exit();
                return;
            }
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(input) = InputEvent::from_window_event(&event) {
            let _ = self.input.handle_event(input);
        }
        match event {
            WindowEvent::CloseRequested => {
                if let Some(mut session) = self.session.take() {
                    if let Err(e) = session.close() {
                        log::warn!("close failed: {e}");
                    }
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if self.timing.should_render() {
                    self.redraw();
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_key(code);
                }
            }
            _ => {}
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// A cube with a sphere resting beside it.
fn demo_meshes() -> Vec<MeshData> {
    vec![
        MeshData::cube(0.5),
        MeshData::uv_sphere(0.35, 32, 16).translated(Vec3::new(1.1, -0.15, 0.0)),
    ]
}

fn load_options() -> Result<Options, VantageError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(Options::default()),
        [flag, path] if flag == "--options" => Options::load(Path::new(path)),
        _ => Err(VantageError::Viewer(
            "usage: vantage [--options FILE]".to_owned(),
        )),
    }
}

fn main() {
    env_logger::init();

    let options = match load_options() {
        Ok(options) => options,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PreviewApp::new(options);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
        std::process::exit(1);
    }
}
