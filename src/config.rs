//! Scene configuration with RON persistence.
//!
//! Every value defaults to the look of the shipped backdrop, so an empty or
//! partial file is valid.

use std::path::Path;

use glam::Vec3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::color::{hex_to_rgb, ColorTriplet, DARK_BASE_HEX, LIGHT_BASE_HEX};
use crate::error::ConfigError;
use crate::theme::{Theme, DEFAULT_SMOOTHING};

/// Top-level backdrop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub plane: PlaneConfig,
    pub lights: LightsConfig,
    pub bloom: BloomConfig,
    pub theme: ThemeConfig,
    pub renderer: RendererConfig,
    pub animation: AnimationConfig,
    /// Seed for the vertex perturbation. `None` draws a fresh surface every run.
    pub seed: Option<u64>,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
}

/// Perspective camera and its damped controls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub damping_factor: f32,
}

/// Subdivided plane and its material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaneConfig {
    pub width: f32,
    pub height: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    /// Amplitude of the random out-of-plane offset; offsets span `[-d/2, d/2)`.
    pub displacement: f32,
    /// Initial rotation about the X axis, in radians.
    pub tilt: f32,
    pub shininess: f32,
    pub specular: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightsConfig {
    pub ambient_intensity: f32,
    pub point_intensity: f32,
    pub point_distance: f32,
    pub point_decay: f32,
    pub point_start: Vec3,
    pub helper_size: f32,
    pub orbit_radius: f32,
    pub orbit_height: f32,
    pub orbit_bob: f32,
    pub directional_position: Vec3,
}

/// Bloom post-processing parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BloomConfig {
    pub strength: f32,
    pub radius: f32,
    pub threshold: f32,
}

/// Palette and transition speed for the two themes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    /// Fraction of the remaining distance covered per frame, in `(0, 1]`.
    pub smoothing: f32,
    pub dark_color: String,
    pub light_color: String,
    pub dark_intensity: f32,
    pub light_intensity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererConfig {
    /// Ceiling applied to the device pixel ratio.
    pub max_pixel_ratio: f64,
    pub clear_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnimationConfig {
    /// Mesh spin added every frame, in radians.
    pub spin_per_frame: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            plane: PlaneConfig::default(),
            lights: LightsConfig::default(),
            bloom: BloomConfig::default(),
            theme: ThemeConfig::default(),
            renderer: RendererConfig::default(),
            animation: AnimationConfig::default(),
            seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(-2.52, -5.23, 10.58),
            target: Vec3::new(-2.52, -5.23, 0.0),
            damping_factor: 0.05,
        }
    }
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 50.0,
            width_segments: 40,
            height_segments: 50,
            displacement: 1.0,
            tilt: -0.2,
            shininess: 100.0,
            specular: "#111111".to_string(),
        }
    }
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_intensity: 0.4,
            point_intensity: 400.0,
            point_distance: 100.0,
            point_decay: 2.0,
            point_start: Vec3::new(0.0, 5.0, 10.0),
            helper_size: 0.5,
            orbit_radius: 35.0,
            orbit_height: 5.0,
            orbit_bob: 3.0,
            directional_position: Vec3::new(10.0, 10.0, 5.0),
        }
    }
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            strength: 0.25,
            radius: 0.15,
            threshold: 0.1,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            dark_color: DARK_BASE_HEX.to_string(),
            light_color: LIGHT_BASE_HEX.to_string(),
            dark_intensity: Theme::Dark.directional_intensity(),
            light_intensity: Theme::Light.directional_intensity(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 1.5,
            clear_color: "#000000".to_string(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            spin_per_frame: 0.0005,
        }
    }
}

impl ThemeConfig {
    /// Plane tint and directional intensity for `theme`.
    pub fn palette(&self, theme: Theme) -> (ColorTriplet, f32) {
        match theme {
            Theme::Dark => (hex_to_rgb(&self.dark_color), self.dark_intensity),
            Theme::Light => (hex_to_rgb(&self.light_color), self.light_intensity),
        }
    }
}

impl SceneConfig {
    /// Loads the config at `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config = Self::from_ron(&contents)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parses and validates RON text.
    pub fn from_ron(contents: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = ron::from_str(contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config to `path` as pretty RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(false)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Rejects values the renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let colors = [
            ("theme.dark_color", &self.theme.dark_color),
            ("theme.light_color", &self.theme.light_color),
            ("plane.specular", &self.plane.specular),
            ("renderer.clear_color", &self.renderer.clear_color),
        ];
        for (field, value) in colors {
            if !hex_to_rgb(value).is_finite() {
                return Err(ConfigError::InvalidColor {
                    field,
                    value: value.clone(),
                });
            }
        }

        let smoothing = self.theme.smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(invalid("theme.smoothing", format!("{smoothing} is not in (0, 1]")));
        }
        if self.plane.width <= 0.0 || self.plane.height <= 0.0 {
            return Err(invalid("plane", "width and height must be positive".into()));
        }
        if self.plane.width_segments == 0 || self.plane.height_segments == 0 {
            return Err(invalid("plane", "segment counts must be at least 1".into()));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(invalid("camera", "expected 0 < near < far".into()));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees", "must be in (0, 180)".into()));
        }
        if self.renderer.max_pixel_ratio <= 0.0 {
            return Err(invalid("renderer.max_pixel_ratio", "must be positive".into()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}
