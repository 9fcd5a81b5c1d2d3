//! Converts platform-agnostic pointer events into [`RigInput`] deltas.
//!
//! Left-drag rotates, right/middle-drag or shift+left-drag pans, and the
//! scroll wheel zooms. Deltas accumulate between ticks and are drained once
//! per frame with [`InputMapper::take_input`].

use glam::Vec2;

use crate::camera::rig::RigInput;
use crate::options::CameraOptions;

/// Degrees of rotation per pixel of drag at speed 1.
const ROTATE_DEGREES_PER_PIXEL: f32 = 0.2;
/// Zoom units per scroll line at speed 1.
const ZOOM_PER_LINE: f32 = 5.0;
/// Scroll lines per pixel for high-resolution trackpad deltas.
#[cfg(feature = "viewer")]
const LINES_PER_PIXEL: f32 = 0.01;

/// Platform-agnostic input events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Cursor moved to absolute screen position.
    CursorMoved {
        /// Horizontal position in physical pixels.
        x: f32,
        /// Vertical position in physical pixels.
        y: f32,
    },
    /// Mouse button pressed or released.
    MouseButton {
        /// Which button changed.
        button: MouseButton,
        /// `true` for press, `false` for release.
        pressed: bool,
    },
    /// Scroll wheel in lines (positive = zoom in).
    Scroll {
        /// Scroll amount.
        delta: f32,
    },
    /// Modifier key state changed.
    ModifiersChanged {
        /// Whether the shift key is held.
        shift: bool,
    },
}

/// Platform-agnostic mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left) mouse button.
    Left,
    /// Secondary (right) mouse button.
    Right,
    /// Middle mouse button (wheel click).
    Middle,
}

#[cfg(feature = "viewer")]
impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Right => Self::Right,
            winit::event::MouseButton::Middle => Self::Middle,
            _ => Self::Left,
        }
    }
}

#[cfg(feature = "viewer")]
impl InputEvent {
    /// Convert a winit window event, if it is one the camera cares about.
    #[must_use]
    pub fn from_window_event(event: &winit::event::WindowEvent) -> Option<Self> {
        use winit::event::{ElementState, WindowEvent};

        match event {
            WindowEvent::CursorMoved { position, .. } => Some(Self::CursorMoved {
                x: position.x as f32,
                y: position.y as f32,
            }),
            WindowEvent::MouseInput { button, state, .. } => {
                Some(Self::MouseButton {
                    button: (*button).into(),
                    pressed: *state == ElementState::Pressed,
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = scroll_lines(delta);
                Some(Self::Scroll { delta })
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                Some(Self::ModifiersChanged {
                    shift: modifiers.state().shift_key(),
                })
            }
            _ => None,
        }
    }
}

/// Wheel delta in scroll lines; trackpad pixel deltas are scaled down.
#[cfg(feature = "viewer")]
fn scroll_lines(delta: &winit::event::MouseScrollDelta) -> f32 {
    match delta {
        winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
        winit::event::MouseScrollDelta::PixelDelta(pos) => {
            pos.y as f32 * LINES_PER_PIXEL
        }
    }
}

/// Accumulates pointer events into one [`RigInput`] per tick.
#[derive(Debug, Clone)]
pub struct InputMapper {
    last_cursor: Option<Vec2>,
    left_down: bool,
    pan_down: bool,
    shift: bool,
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
    pending: RigInput,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(&CameraOptions::default())
    }
}

impl InputMapper {
    /// Mapper using the speed settings from `options`.
    #[must_use]
    pub fn new(options: &CameraOptions) -> Self {
        let mut mapper = Self {
            last_cursor: None,
            left_down: false,
            pan_down: false,
            shift: false,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            pending: RigInput::default(),
        };
        mapper.apply_options(options);
        mapper
    }

    /// Pick up new speed settings (clamped to 1..=5).
    pub fn apply_options(&mut self, options: &CameraOptions) {
        let (rotate, pan, zoom) = options.clamped_speeds();
        self.rotate_speed = rotate;
        self.pan_speed = pan;
        self.zoom_speed = zoom;
    }

    /// Whether a drag that moves the camera is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.left_down || self.pan_down
    }

    /// Feed one event. Returns `true` if the event was consumed.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::CursorMoved { x, y } => {
                let pos = Vec2::new(x, y);
                let delta = self.last_cursor.map_or(Vec2::ZERO, |last| pos - last);
                self.last_cursor = Some(pos);
                if self.pan_down || (self.left_down && self.shift) {
                    self.pending.pan += delta * self.pan_speed;
                } else if self.left_down {
                    self.pending.rotate +=
                        delta * ROTATE_DEGREES_PER_PIXEL * self.rotate_speed;
                } else {
                    return false;
                }
                true
            }
            InputEvent::MouseButton { button, pressed } => {
                match button {
                    MouseButton::Left => self.left_down = pressed,
                    MouseButton::Right | MouseButton::Middle => {
                        self.pan_down = pressed;
                    }
                }
                true
            }
            InputEvent::Scroll { delta } => {
                self.pending.zoom -= delta * ZOOM_PER_LINE * self.zoom_speed;
                true
            }
            InputEvent::ModifiersChanged { shift } => {
                self.shift = shift;
                false
            }
        }
    }

    /// Drain the input accumulated since the last call.
    pub fn take_input(&mut self) -> RigInput {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(mapper: &mut InputMapper, from: (f32, f32), to: (f32, f32)) {
        let _ = mapper.handle_event(InputEvent::CursorMoved {
            x: from.0,
            y: from.1,
        });
        let _ = mapper.handle_event(InputEvent::CursorMoved { x: to.0, y: to.1 });
    }

    #[test]
    fn left_drag_rotates() {
        let mut mapper = InputMapper::default();
        let _ = mapper.handle_event(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        drag(&mut mapper, (0.0, 0.0), (10.0, 5.0));
        let input = mapper.take_input();
        // default speed is 3
        assert!((input.rotate - Vec2::new(6.0, 3.0)).length() < 1e-5);
        assert_eq!(input.pan, Vec2::ZERO);
    }

    #[test]
    fn shift_left_and_right_drag_pan() {
        let mut mapper = InputMapper::default();
        let _ = mapper.handle_event(InputEvent::ModifiersChanged { shift: true });
        let _ = mapper.handle_event(InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        drag(&mut mapper, (0.0, 0.0), (2.0, 0.0));
        assert_eq!(mapper.take_input().pan, Vec2::new(6.0, 0.0));

        let mut mapper = InputMapper::default();
        let _ = mapper.handle_event(InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        });
        drag(&mut mapper, (0.0, 0.0), (0.0, 1.0));
        let input = mapper.take_input();
        assert_eq!(input.pan, Vec2::new(0.0, 3.0));
        assert_eq!(input.rotate, Vec2::ZERO);
    }

    #[test]
    fn hover_without_buttons_is_ignored() {
        let mut mapper = InputMapper::default();
        drag(&mut mapper, (0.0, 0.0), (50.0, 50.0));
        assert!(mapper.take_input().is_idle());
    }

    #[test]
    fn scroll_up_zooms_in() {
        let mut mapper = InputMapper::new(&CameraOptions {
            zoom_speed: 1,
            ..Default::default()
        });
        let _ = mapper.handle_event(InputEvent::Scroll { delta: 1.0 });
        assert_eq!(mapper.take_input().zoom, -5.0);
    }

    #[cfg(feature = "viewer")]
    #[test]
    fn pixel_scroll_is_scaled_to_lines() {
        use winit::dpi::PhysicalPosition;
        use winit::event::MouseScrollDelta;

        assert_eq!(scroll_lines(&MouseScrollDelta::LineDelta(0.0, -2.0)), -2.0);
        let pixels = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 250.0));
        assert!((scroll_lines(&pixels) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn take_input_drains() {
        let mut mapper = InputMapper::default();
        let _ = mapper.handle_event(InputEvent::Scroll { delta: 2.0 });
        assert!(!mapper.take_input().is_idle());
        assert!(mapper.take_input().is_idle());
    }
}
