use std::path::Path;
use std::time::Duration;

use edgeview_common::{OutputSize, Rgba};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Tunables for the demo. Every field has a default, so a config file only
/// needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Camera translation speed in world units per second.
    pub move_speed: f32,
    /// Camera rotation in degrees per mouse unit.
    pub rotate_speed: f32,
    pub background: Rgba,
    pub default_size: OutputSize,
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Run updates at this fixed rate (Hz) instead of once per tick.
    pub fixed_update_hz: Option<f64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            rotate_speed: 0.25,
            background: Rgba::CORNFLOWER_BLUE,
            default_size: OutputSize::new(800, 600),
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            fov_y_degrees: 45.0,
            z_near: 0.01,
            z_far: 1000.0,
            fixed_update_hz: None,
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GameError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GameError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |msg: String| Err(GameError::InvalidConfig(msg));

        if not_positive(self.move_speed) {
            return invalid(format!(
                "move_speed must be positive, got {}",
                self.move_speed
            ));
        }
        if not_positive(self.rotate_speed) {
            return invalid(format!(
                "rotate_speed must be positive, got {}",
                self.rotate_speed
            ));
        }
        if self.default_size.is_empty() {
            return invalid(format!(
                "default_size must be non-zero, got {}",
                self.default_size
            ));
        }
        if not_positive(self.fov_y_degrees) || self.fov_y_degrees >= 180.0 {
            return invalid(format!(
                "fov_y_degrees must be in (0, 180), got {}",
                self.fov_y_degrees
            ));
        }
        if not_positive(self.z_near) || self.z_far.is_nan() || self.z_far <= self.z_near {
            return invalid(format!(
                "clip planes must satisfy 0 < z_near < z_far, got {} / {}",
                self.z_near, self.z_far
            ));
        }
        if let Some(hz) = self.fixed_update_hz {
            if hz.is_nan() || hz <= 0.0 || self.fixed_step().is_none() {
                return invalid(format!(
                    "fixed_update_hz must give a representable non-zero step, got {hz}"
                ));
            }
        }
        Ok(())
    }

    /// Length of one fixed update, or `None` for variable steps. Rates whose
    /// period does not fit a non-zero `Duration` also yield `None`.
    pub fn fixed_step(&self) -> Option<Duration> {
        let hz = self.fixed_update_hz?;
        Duration::try_from_secs_f64(1.0 / hz)
            .ok()
            .filter(|step| !step.is_zero())
    }
}

fn not_positive(v: f32) -> bool {
    v.is_nan() || v <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GameConfig::default();
        config.validate().unwrap();
        assert_eq!(config.default_size, OutputSize::new(800, 600));
        assert_eq!(config.move_speed, 10.0);
        assert_eq!(config.rotate_speed, 0.25);
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let config = GameConfig::from_json_str(r#"{ "move_speed": 2.5, "fixed_update_hz": 60 }"#)
            .unwrap();
        assert_eq!(config.move_speed, 2.5);
        assert_eq!(config.fixed_update_hz, Some(60.0));
        assert_eq!(config.rotate_speed, 0.25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = GameConfig::from_json_str(r#"{ "move_speed": 0 }"#).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));

        let err = GameConfig::from_json_str(r#"{ "z_near": 5.0, "z_far": 1.0 }"#).unwrap_err();
        assert!(err.to_string().contains("z_near"));

        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn update_rate_must_give_a_usable_step() {
        let config = GameConfig::from_json_str(r#"{ "fixed_update_hz": 60 }"#).unwrap();
        let step = config.fixed_step().unwrap();
        assert!((step.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(GameConfig::default().fixed_step(), None);

        for json in [
            r#"{ "fixed_update_hz": 1e-300 }"#,
            r#"{ "fixed_update_hz": 1e300 }"#,
            r#"{ "fixed_update_hz": -5 }"#,
        ] {
            let err = GameConfig::from_json_str(json).unwrap_err();
            assert!(matches!(err, GameError::InvalidConfig(_)), "{json}");
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let err = GameConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
