//! Engine configuration.
//!
//! [`EngineConfig`] is plain data, deserialized from JSON. Missing fields take
//! their defaults, so a config file only lists what it changes:
//!
//! ```json
//! { "title": "Dungeon", "width": 1280, "height": 720, "y_sort": false }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub title: String,
    /// Window width in pixels.
    pub width: u32,
    pub height: u32,
    /// Frames per second the driver loop aims for. 0 runs unthrottled.
    pub target_fps: u32,
    /// Spatial grid cell size in world units.
    pub cell_size: f32,
    /// Pixels per world unit at zoom 1.
    pub pixels_per_unit: f32,
    /// Sort same-layer world renderables by Y (higher Y drawn first).
    pub y_sort: bool,
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "sable".to_string(),
            width: 800,
            height: 600,
            target_fps: 60,
            cell_size: 8.0,
            pixels_per_unit: 16.0,
            y_sort: true,
            debug: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(EngineError::Config(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if !(self.pixels_per_unit.is_finite() && self.pixels_per_unit > 0.0) {
            return Err(EngineError::Config(format!(
                "pixels_per_unit must be positive, got {}",
                self.pixels_per_unit
            )));
        }
        Ok(())
    }

    /// Settings for scenes created by an engine with this config.
    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            cell_size: self.cell_size,
            y_sort: self.y_sort,
            pixels_per_unit: self.pixels_per_unit,
            viewport: (self.width as f32, self.height as f32),
        }
    }
}

/// Per-scene settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSettings {
    pub cell_size: f32,
    pub y_sort: bool,
    pub pixels_per_unit: f32,
    /// Viewport used for the camera until the first frame reports the real
    /// surface size.
    pub viewport: (f32, f32),
}

impl Default for SceneSettings {
    fn default() -> Self {
        EngineConfig::default().scene_settings()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "title": "Dungeon", "y_sort": false }"#).unwrap();
        assert_eq!(config.title, "Dungeon");
        assert!(!config.y_sort);
        assert_eq!(config.cell_size, 8.0);
        assert_eq!(config.width, 800);
    }

    #[test]
    fn rejects_bad_cell_size() {
        let err = EngineConfig::from_json_str(r#"{ "cell_size": 0.0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ width: "),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "width": 1280, "height": 720 }}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        let settings = config.scene_settings();
        assert_eq!(settings.viewport, (1280.0, 720.0));
        assert!(settings.y_sort);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
