use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Lighting", inline)]
#[serde(default)]
/// Directional key light used for shading and the planar shadow.
pub struct LightingOptions {
    /// Direction toward the light (world space, normalized on use).
    #[schemars(skip)]
    pub direction: [f32; 3],
    /// Ambient term added to the diffuse shading.
    #[schemars(title = "Ambient", range(min = 0.0, max = 1.0), extend("step" = 0.05))]
    pub ambient: f32,
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            direction: [0.35, 1.0, 0.25],
            ambient: 0.25,
        }
    }
}

impl LightingOptions {
    /// Normalized direction toward the light, kept above the horizon so the
    /// planar shadow projection stays finite.
    #[must_use]
    pub fn light_direction(&self) -> Vec3 {
        let dir = Vec3::from_array(self.direction);
        let dir = Vec3::new(dir.x, dir.y.max(0.05), dir.z);
        dir.try_normalize().unwrap_or(Vec3::Y)
    }
}
