use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Slowest user speed setting.
pub const MIN_SPEED: u8 = 1;
/// Fastest user speed setting.
pub const MAX_SPEED: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and control parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 5.0, max = 120.0), extend("step" = 1.0))]
    pub field_of_view: f32,
    /// Use an orthographic projection instead of perspective.
    #[schemars(title = "Orthographic")]
    pub orthographic: bool,
    /// Damping level: 0 = snappy, 5 = very smooth.
    #[schemars(title = "Smoothness", range(min = 0.0, max = 5.0), extend("step" = 1.0))]
    pub smoothness: f32,
    /// Rotation speed setting (1–5).
    #[schemars(title = "Rotate Speed", range(min = 1, max = 5))]
    pub rotate_speed: u8,
    /// Pan speed setting (1–5).
    #[schemars(title = "Pan Speed", range(min = 1, max = 5))]
    pub pan_speed: u8,
    /// Zoom speed setting (1–5).
    #[schemars(title = "Zoom Speed", range(min = 1, max = 5))]
    pub zoom_speed: u8,
    /// Offset subtracted from the camera position, in world units.
    #[schemars(skip)]
    pub target_offset: [f32; 3],
    /// Background clear color (linear RGBA).
    #[schemars(skip)]
    pub clear_color: [f32; 4],
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            field_of_view: 30.0,
            orthographic: false,
            smoothness: 2.0,
            rotate_speed: 3,
            pan_speed: 3,
            zoom_speed: 3,
            target_offset: [0.0; 3],
            clear_color: [0.18, 0.18, 0.2, 1.0],
        }
    }
}

impl CameraOptions {
    /// Speed settings clamped to the supported `1..=5` range, as
    /// `(rotate, pan, zoom)`.
    #[must_use]
    pub fn clamped_speeds(&self) -> (f32, f32, f32) {
        let clamp = |s: u8| f32::from(s.clamp(MIN_SPEED, MAX_SPEED));
        (
            clamp(self.rotate_speed),
            clamp(self.pan_speed),
            clamp(self.zoom_speed),
        )
    }
}
