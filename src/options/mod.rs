//! Centralized preview options with TOML support.
//!
//! All user-facing settings (camera, effects, capture, lighting) are
//! consolidated in [`Options`], which is handed to
//! [`PreviewSession::open`](crate::preview::PreviewSession::open) by value.
//! Persisting named profiles is the host's job; this module only parses and
//! serializes.

mod camera;
mod capture;
mod effects;
mod lighting;

use std::path::Path;

pub use camera::{CameraOptions, MAX_SPEED, MIN_SPEED};
pub use capture::CaptureOptions;
pub use effects::{
    DepthNormalMode, DepthNormalOptions, EffectOptions, GridOptions,
    PlanarShadowOptions, SolidTintOptions, WireframeOptions,
};
pub use lighting::LightingOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::VantageError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[camera]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Camera projection and control parameters.
    pub camera: CameraOptions,
    /// Diagnostic effect toggles and parameters.
    pub effects: EffectOptions,
    /// Supersampling and screenshot parameters.
    pub capture: CaptureOptions,
    /// Key light.
    pub lighting: LightingOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from TOML text. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::OptionsParse`] for malformed TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, VantageError> {
        toml::from_str(content)
            .map_err(|e| VantageError::OptionsParse(e.to_string()))
    }

    /// Serialize to pretty-printed TOML.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::OptionsParse`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, VantageError> {
        toml::to_string_pretty(self)
            .map_err(|e| VantageError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::Io`] if the file cannot be read and
    /// [`VantageError::OptionsParse`] if it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, VantageError> {
        let content = std::fs::read_to_string(path).map_err(VantageError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Copy with one field replaced, as a host settings panel edits it.
    ///
    /// `section` is a dotted path into the options tree (`"camera"`,
    /// `"effects.grid"`) and `field` a key inside it. The value must
    /// deserialize into the field's type.
    ///
    /// # Errors
    ///
    /// Returns [`VantageError::OptionsParse`] for an unknown section or
    /// field, or a value of the wrong type.
    pub fn with_field(
        &self,
        section: &str,
        field: &str,
        value: serde_json::Value,
    ) -> Result<Self, VantageError> {
        let parse_error = |e: serde_json::Error| VantageError::OptionsParse(e.to_string());
        let mut root = serde_json::to_value(self).map_err(parse_error)?;
        let table = section
            .split('.')
            .filter(|key| !key.is_empty())
            .try_fold(&mut root, |node, key| node.get_mut(key))
            .and_then(serde_json::Value::as_object_mut)
            .ok_or_else(|| {
                VantageError::OptionsParse(format!("no options section '{section}'"))
            })?;
        if !table.contains_key(field) {
            return Err(VantageError::OptionsParse(format!(
                "no field '{field}' in '{section}'"
            )));
        }
        let _ = table.insert(field.to_owned(), value);
        serde_json::from_value(root).map_err(parse_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectKind, PipelineStage};

    #[test]
    fn default_round_trips_through_toml() {
        let opts = Options::default();
        let toml_str = opts.to_toml_string().unwrap();
        let parsed = Options::from_toml_str(&toml_str).unwrap();
        assert_eq!(opts, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[camera]
smoothness = 4.0

[effects.grid]
enabled = true
stage = "after_opaque"
"#;
        let opts = Options::from_toml_str(toml_str).unwrap();
        assert_eq!(opts.camera.smoothness, 4.0);
        assert_eq!(opts.camera.field_of_view, 30.0);
        assert!(opts.effects.enabled(EffectKind::Grid));
        assert_eq!(
            opts.effects.stage(EffectKind::Grid),
            PipelineStage::AfterOpaque
        );
        assert!(!opts.effects.enabled(EffectKind::Wireframe));
        assert_eq!(opts.capture.supersample_multiplier, 1);
    }

    #[test]
    fn with_field_patches_nested_sections() {
        let opts = Options::default()
            .with_field("effects.grid", "spacing", serde_json::json!(0.5))
            .unwrap()
            .with_field("camera", "orthographic", serde_json::json!(true))
            .unwrap();
        assert_eq!(opts.effects.grid.spacing, 0.5);
        assert!(opts.camera.orthographic);
    }

    #[test]
    fn with_field_rejects_unknown_paths_and_bad_types() {
        let opts = Options::default();
        for (section, field, value) in [
            ("lens", "focus", serde_json::json!(1.0)),
            ("camera", "focus", serde_json::json!(1.0)),
            ("camera", "orthographic", serde_json::json!("yes")),
        ] {
            assert!(matches!(
                opts.with_field(section, field, value),
                Err(VantageError::OptionsParse(_))
            ));
        }
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = Options::from_toml_str("[camera\nsmoothness = ").unwrap_err();
        assert!(matches!(err, VantageError::OptionsParse(_)));
    }

    #[test]
    fn speeds_clamp_to_supported_range() {
        let camera = CameraOptions {
            rotate_speed: 0,
            pan_speed: 9,
            zoom_speed: 4,
            ..Default::default()
        };
        assert_eq!(camera.clamped_speeds(), (1.0, 5.0, 4.0));
    }

    #[test]
    fn effect_params_follow_typed_options() {
        let mut effects = EffectOptions::default();
        effects.grid.spacing = 0.25;
        effects.grid.line_width = 2.0;
        effects.depth_normal.mode = DepthNormalMode::Normal;

        let grid = effects.params(EffectKind::Grid);
        assert_eq!(grid.spacing, 0.25);
        assert_eq!(grid.thickness, 2.0);
        assert_eq!(effects.params(EffectKind::DepthNormal).mode, 1);
    }

    #[test]
    fn light_direction_stays_above_horizon() {
        let lighting = LightingOptions {
            direction: [1.0, -1.0, 0.0],
            ..Default::default()
        };
        let dir = lighting.light_direction();
        assert!(dir.y > 0.0);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema_value =
            serde_json::to_value(Options::json_schema()).unwrap();
        let props = schema_value["properties"].as_object().unwrap();

        assert!(props.contains_key("camera"));
        assert!(props.contains_key("effects"));
        assert!(props.contains_key("capture"));
        assert!(props.contains_key("lighting"));

        let camera = &props["camera"]["properties"];
        assert!(camera.get("smoothness").is_some());
        assert!(camera.get("clear_color").is_none());
    }
}
