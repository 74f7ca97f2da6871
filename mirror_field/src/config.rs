// THEORY:
// Every "scene" in the installation family is the same engine with different
// knobs. `AppConfig` gathers those knobs into one tree of plain structs whose
// `Default` impls carry the design values. A scene is loaded from a JSON file
// and then a handful of values can be overridden from `MF_*` environment
// variables, the same way the driver reads its bind/camera settings.

use crate::core_modules::gesture::DistanceMetric;
use crate::error::{FieldError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Layout and physics of the particle grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of particle columns. The sampler grid uses the same resolution.
    pub cols: u32,
    /// Number of particle rows.
    pub rows: u32,
    /// Spring constant pulling each particle back to its rest position.
    pub spring: f32,
    /// Velocity multiplier applied every tick.
    pub friction: f32,
    /// Hard cap on velocity magnitude.
    pub max_speed: f32,
    /// Motion value above which a particle counts as attracted.
    pub attraction_threshold: f32,
    /// Motion value mapped to a motion strength of 1.0.
    pub motion_scale: f32,
    /// Multiplier from local motion gradient to force.
    pub force_scale: f32,
    /// Amplitude of the idle wave, in pixels per tick.
    pub wave_amplitude: f32,
    /// Angular speed of the idle wave, in radians per second.
    pub wave_speed: f32,
    /// Seconds the field clock advances per tick.
    pub time_step: f32,
    /// How much an attracted particle's radius grows at full pulse.
    pub pulse_gain: f32,
    /// Seed for the particle layout RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            cols: 60,
            rows: 60,
            spring: 0.01,
            friction: 0.92,
            max_speed: 15.0,
            attraction_threshold: 10.0,
            motion_scale: 100.0,
            force_scale: 0.05,
            wave_amplitude: 0.3,
            wave_speed: 2.0,
            time_step: 1.0 / 60.0,
            pulse_gain: 1.5,
            seed: None,
        }
    }
}

/// Frame-diff thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Intensities at or below this are treated as sensor noise.
    pub noise_threshold: f32,
    /// Multiplier applied to intensities above the noise threshold.
    pub amplification: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            noise_threshold: 10.0,
            amplification: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Flip the horizontal axis for a self-facing camera.
    pub mirror: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { mirror: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Colour at the top of the canvas.
    pub warm: [u8; 3],
    /// Colour at the bottom of the canvas.
    pub cool: [u8; 3],
    /// Background colour used for the trail fade.
    pub background: [u8; 3],
    /// Opacity of the background fade drawn before each frame.
    pub fade_alpha: f32,
    /// Opacity multiplier for attracted particles.
    pub attracted_boost: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            warm: [255, 140, 60],
            cool: [60, 120, 255],
            background: [0, 0, 0],
            fade_alpha: 0.2,
            attracted_boost: 1.5,
        }
    }
}

/// Hand-gesture thresholds and hold durations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Fingertip-to-wrist distance above which a finger counts as extended.
    pub open_distance: f32,
    /// Adjacent-fingertip distance below which two fingers count as touching.
    pub closed_distance: f32,
    /// Open threshold in palm lengths, used with `DistanceMetric::PalmScale`.
    pub open_ratio: f32,
    /// Closed threshold in palm lengths, used with `DistanceMetric::PalmScale`.
    pub closed_ratio: f32,
    /// Extended fingers needed for an open hand.
    pub min_extended: usize,
    pub metric: DistanceMetric,
    pub poll_interval_ms: u64,
    pub open_hold_ms: u64,
    pub closed_hold_ms: u64,
    /// How long no gesture must persist before returning home.
    pub idle_hold_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            open_distance: 100.0,
            closed_distance: 30.0,
            open_ratio: 1.5,
            closed_ratio: 0.35,
            min_extended: 3,
            metric: DistanceMetric::Raw,
            poll_interval_ms: 1000,
            open_hold_ms: 5000,
            closed_hold_ms: 5000,
            idle_hold_ms: 60_000,
        }
    }
}

impl GestureConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Pages an open hand may navigate to, chosen uniformly at random.
    pub candidates: Vec<String>,
    pub home: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                "galaxy.html".to_string(),
                "vortex.html".to_string(),
                "particles.html".to_string(),
            ],
            home: "index.html".to_string(),
        }
    }
}

/// The full configuration tree for one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub field: FieldConfig,
    pub motion: MotionConfig,
    pub sampler: SamplerConfig,
    pub render: RenderConfig,
    pub gesture: GestureConfig,
    pub navigation: NavigationConfig,
}

impl AppConfig {
    /// Loads a scene from a JSON file. Missing keys fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads the optional file, applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `MF_*` overrides from an arbitrary lookup. Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cols) = lookup("MF_GRID_COLS").and_then(|v| v.parse().ok()) {
            self.field.cols = cols;
        }
        if let Some(rows) = lookup("MF_GRID_ROWS").and_then(|v| v.parse().ok()) {
            self.field.rows = rows;
        }
        if let Some(seed) = lookup("MF_SEED").and_then(|v| v.parse().ok()) {
            self.field.seed = Some(seed);
        }
        if let Some(mirror) = lookup("MF_MIRROR").and_then(|v| parse_flag(&v)) {
            self.sampler.mirror = mirror;
        }
        if let Some(home) = lookup("MF_HOME") {
            if !home.is_empty() {
                self.navigation.home = home;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.field.cols == 0 || self.field.rows == 0 {
            return Err(FieldError::InvalidConfig(format!(
                "grid must be non-empty, got {}x{}",
                self.field.cols, self.field.rows
            )));
        }
        if !(self.field.max_speed > 0.0) {
            return Err(FieldError::InvalidConfig("max_speed must be positive".into()));
        }
        if !(self.field.friction > 0.0 && self.field.friction <= 1.0) {
            return Err(FieldError::InvalidConfig("friction must be in (0, 1]".into()));
        }
        if !(self.field.time_step > 0.0 && self.field.time_step.is_finite()) {
            return Err(FieldError::InvalidConfig("time_step must be positive".into()));
        }
        if self.navigation.candidates.is_empty() {
            return Err(FieldError::InvalidConfig("no navigation candidates".into()));
        }
        if self.gesture.poll_interval_ms == 0 {
            return Err(FieldError::InvalidConfig("poll interval must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_carry_design_values() {
        let config = AppConfig::default();
        assert_eq!(config.field.spring, 0.01);
        assert_eq!(config.field.friction, 0.92);
        assert_eq!(config.field.max_speed, 15.0);
        assert_eq!(config.motion.noise_threshold, 10.0);
        assert_eq!(config.gesture.poll_interval(), Duration::from_millis(1000));
        assert_eq!(config.gesture.idle_hold_ms, 60_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = AppConfig::from_json_str(r#"{ "field": { "cols": 20 } }"#).unwrap();
        assert_eq!(config.field.cols, 20);
        assert_eq!(config.field.rows, 60);
        assert_eq!(config.navigation.home, "index.html");
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("MF_GRID_COLS", "32"),
            ("MF_MIRROR", "off"),
            ("MF_SEED", "7"),
            ("MF_GRID_ROWS", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let mut config = AppConfig::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.field.cols, 32);
        assert_eq!(config.field.rows, 60);
        assert_eq!(config.field.seed, Some(7));
        assert!(!config.sampler.mirror);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.field.cols = 0;
        assert!(matches!(config.validate(), Err(FieldError::InvalidConfig(_))));

        let mut config = AppConfig::default();
        config.field.friction = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.navigation.candidates.clear();
        assert!(config.validate().is_err());
    }
}
