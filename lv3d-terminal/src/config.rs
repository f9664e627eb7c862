/// Viewer configuration (TOML)
use std::path::Path;

use anyhow::{Context, Result};
use lv3d_core::ProjectionMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Orthographic,
    #[default]
    Perspective,
}

impl From<Projection> for ProjectionMode {
    fn from(projection: Projection) -> Self {
        match projection {
            Projection::Orthographic => ProjectionMode::Orthographic,
            Projection::Perspective => ProjectionMode::Perspective,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    #[serde(default = "default_fov_y")]
    pub fov_y: f64,
    /// Clip planes; when unset they follow the framed model.
    #[serde(default)]
    pub near: Option<f64>,
    #[serde(default)]
    pub far: Option<f64>,
    /// Eye distance after framing; unset fits the model to the view.
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    /// Degrees per rotate or orbit key press.
    #[serde(default = "default_rotation_step")]
    pub rotation_step: f64,
    /// Distance multiplier per zoom key press.
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    #[serde(default)]
    pub show_travel: bool,
}

fn default_fov_y() -> f64 { 45.0 }
fn default_rotation_step() -> f64 { 5.0 }
fn default_zoom_step() -> f64 { 1.1 }
fn default_target_fps() -> u32 { 30 }

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y: default_fov_y(),
            near: None,
            far: None,
            distance: None,
            projection: Projection::default(),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            rotation_step: default_rotation_step(),
            zoom_step: default_zoom_step(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            show_travel: false,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid viewer configuration")
    }

    /// Reads `path`; a file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Zoom factor per key press, never below one so `+` and `-` stay opposites.
    pub fn zoom_step(&self) -> f64 {
        if self.controls.zoom_step.is_finite() && self.controls.zoom_step > 1.0 {
            self.controls.zoom_step
        } else {
            default_zoom_step()
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.display.target_fps.clamp(1, 240)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ViewerConfig::default();
        assert_eq!(config.camera.fov_y, 45.0);
        assert_eq!(config.camera.distance, None);
        assert_eq!(config.camera.projection, Projection::Perspective);
        assert_eq!(config.controls.rotation_step, 5.0);
        assert_eq!(config.target_fps(), 30);
        assert!(!config.display.show_travel);
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(ViewerConfig::from_toml("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [camera]
            fov_y = 60.0
            projection = "orthographic"

            [display]
            show_travel = true
        "#;
        let config = ViewerConfig::from_toml(toml).unwrap();
        assert_eq!(config.camera.fov_y, 60.0);
        assert_eq!(config.camera.projection, Projection::Orthographic);
        assert!(config.display.show_travel);
        assert_eq!(config.controls, ControlsConfig::default());
        assert_eq!(config.display.target_fps, 30);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(ViewerConfig::from_toml("[camera]\nfov_y = \"wide\"").is_err());
        assert!(ViewerConfig::from_toml("[camera").is_err());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut config = ViewerConfig::default();
        config.camera.distance = Some(12.5);
        config.camera.near = Some(0.5);
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ViewerConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = Path::new("/nonexistent/lv3d/viewer.toml");
        assert_eq!(ViewerConfig::load(path).unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_zoom_step_falls_back() {
        let mut config = ViewerConfig::default();
        config.controls.zoom_step = 0.5;
        assert_eq!(config.zoom_step(), 1.1);
        config.controls.zoom_step = 1.25;
        assert_eq!(config.zoom_step(), 1.25);
    }

    #[test]
    fn test_projection_maps_to_mode() {
        assert_eq!(
            ProjectionMode::from(Projection::Orthographic),
            ProjectionMode::Orthographic
        );
    }
}
