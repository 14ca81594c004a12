/// Viewer configuration loaded from TOML
///
/// Every field has a default, so a file only needs the values it changes:
///
/// ```toml
/// [camera]
/// eye = [0.0, 2.0, 0.0]
///
/// [projection]
/// fov_y = 75.0
/// ```
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::{CameraError, ConfigError, ProjectionError};
use crate::projection::{Projection, ProjectionSettings};
use crate::terrain::TerrainParams;
use crate::vector::Vector3;

/// Initial camera placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub eye: [f32; 3],
    pub center: [f32; 3],
    pub up: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: [0.0, 2.0, 0.0],
            center: [0.0, 0.0, -20.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

impl CameraSettings {
    pub fn build(&self) -> Result<Camera, CameraError> {
        Camera::new(
            Vector3::from(self.eye),
            Vector3::from(self.center),
            Vector3::from(self.up),
        )
    }
}

/// How input events translate into camera deltas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Degrees of pitch per unit of vertical pointer motion
    pub pitch_sensitivity: f32,
    /// Degrees of yaw per unit of horizontal pointer motion
    pub yaw_sensitivity: f32,
    /// World units moved per dolly step
    pub dolly_step: f32,
    /// Degrees turned per arrow key press
    pub key_rotation_step: f32,
    /// World units moved per forward/backward key press
    pub key_dolly_step: f32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            pitch_sensitivity: 100.0 / 720.0,
            yaw_sensitivity: 100.0 / 1280.0,
            dolly_step: 0.05,
            key_rotation_step: 2.0,
            key_dolly_step: 1.0,
        }
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraSettings,
    pub projection: ProjectionSettings,
    pub input: InputSettings,
    pub terrain: TerrainParams,
}

impl ViewerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = contents.parse()?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn build_camera(&self) -> Result<Camera, CameraError> {
        self.camera.build()
    }

    pub fn build_projection(&self, aspect: f32) -> Result<Projection, ProjectionError> {
        Projection::new(self.projection, aspect)
    }
}

impl FromStr for ViewerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionMode;

    #[test]
    fn test_defaults_round_trip() {
        let config = ViewerConfig::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[camera]"));
        assert!(text.contains("[terrain]"));
        let parsed: ViewerConfig = text.parse().unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: ViewerConfig = "
            [camera]
            eye = [1.0, 5.0, 2.0]

            [projection]
            fov_y = 75.0
            mode = \"orthographic\"
        "
        .parse()
        .unwrap();

        assert_eq!(config.camera.eye, [1.0, 5.0, 2.0]);
        assert_eq!(config.camera.center, CameraSettings::default().center);
        assert_eq!(config.projection.fov_y, 75.0);
        assert_eq!(config.projection.mode, ProjectionMode::Orthographic);
        assert_eq!(config.projection.far, 100.0);
        assert_eq!(config.input, InputSettings::default());
        assert_eq!(config.terrain, TerrainParams::default());

        let empty: ViewerConfig = "".parse().unwrap();
        assert_eq!(empty, ViewerConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!("[camera".parse::<ViewerConfig>(), Err(ConfigError::Parse(_))));
        assert!(matches!(
            "[camera]\neye = \"up\"".parse::<ViewerConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_projection_is_reported() {
        let config: ViewerConfig = "[projection]\nnear = 10.0\nfar = 5.0\n".parse().unwrap();
        assert_eq!(
            config.build_projection(1.0).unwrap_err(),
            ProjectionError::FarNotBeyondNear { near: 10.0, far: 5.0 }
        );
    }

    #[test]
    fn test_build_camera() {
        let camera = ViewerConfig::default().build_camera().unwrap();
        assert_eq!(camera.eye(), Vector3::new(0.0, 2.0, 0.0));

        let config: ViewerConfig = "[camera]\ncenter = [0.0, 2.0, 0.0]\n".parse().unwrap();
        assert_eq!(config.build_camera().unwrap_err(), CameraError::EyeAtCenter);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("glimpse-config-test-{}.toml", std::process::id()));
        let mut config = ViewerConfig::default();
        config.terrain.slices = 16;
        config.save(&path).unwrap();
        let loaded = ViewerConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);

        assert!(matches!(
            ViewerConfig::load("/nonexistent/viewer.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
