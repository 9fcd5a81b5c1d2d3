use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Capture", inline)]
#[serde(default)]
/// Live-view supersampling and screenshot defaults.
pub struct CaptureOptions {
    /// Render scale applied before downsampling (1 = native).
    #[schemars(title = "Supersampling", range(min = 1, max = 4))]
    pub supersample_multiplier: u32,
    /// Default screenshot resolution multiplier.
    #[schemars(title = "Screenshot Scale", range(min = 1, max = 8))]
    pub resolution_multiplier: u32,
    /// Whether screenshots keep a transparent background.
    #[schemars(title = "Transparent Background")]
    pub wants_alpha: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            supersample_multiplier: 1,
            resolution_multiplier: 2,
            wants_alpha: false,
        }
    }
}
