use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Movement and collision tuning shared by the player and mobs.
///
/// Speeds are world units per second; the defaults reproduce a 60 ticks/s
/// per-frame tuning (gravity 0.5/frame, max fall 18/frame, and so on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Edge length of one tile in world units.
    pub tile_size: f32,
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub move_speed: f32,
    /// Rate (1/s) at which horizontal velocity converges on the input target.
    pub horizontal_smoothing: f32,
    /// Negative: upward.
    pub jump_velocity: f32,
    /// Upward shift per step-up nudge.
    pub step_nudge: f32,
    /// Nudges tried before a horizontal move is rejected.
    pub max_step_nudges: u32,
    /// Landing speeds at or below this cause no damage.
    pub fall_damage_threshold: f32,
    /// Each full step of excess speed over the threshold adds one point.
    pub fall_damage_step: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            gravity: 1800.0,
            max_fall_speed: 1080.0,
            move_speed: 240.0,
            horizontal_smoothing: 20.0,
            jump_velocity: -360.0,
            step_nudge: 1.0,
            max_step_nudges: 32,
            fall_damage_threshold: 840.0,
            fall_damage_step: 120.0,
        }
    }
}

impl PhysicsConfig {
    /// Largest climbable ledge in world units.
    pub fn max_step_height(&self) -> f32 {
        self.step_nudge * self.max_step_nudges as f32
    }
}

/// Everything needed to build a [`WorldSession`](crate::WorldSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub physics: PhysicsConfig,
    pub cols: usize,
    pub rows: usize,
    /// Row holding the grass surface of generated terrain.
    pub ground_level: usize,
    /// Player box size.
    pub player_size: [f32; 2],
    /// Top-left corner of the player box at spawn and respawn.
    pub spawn: [f32; 2],
    pub max_health: u32,
    /// Seconds a block must be held before it breaks.
    pub break_duration: f32,
    /// Horizontal placement reach in tiles from the player's centre column.
    pub place_reach: i32,
    pub attack_duration: f32,
    pub attack_range: f32,
    pub attack_height: f32,
    /// Seconds of immunity after taking contact damage.
    pub invincibility: f32,
    pub mob_columns: Vec<i32>,
    pub mob_size: f32,
    pub mob_speed: f32,
    /// Downward shift applied to each mob every tick, independent of dt.
    pub mob_fall_nudge: f32,
    /// Day-cycle phase gained per second.
    pub day_speed: f32,
    pub initial_time_of_day: f32,
    /// Upper bound on a single tick's dt.
    pub max_tick_dt: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let physics = PhysicsConfig::default();
        let ground_level = 20;
        let spawn = [480.0, (ground_level as f32 - 2.0) * physics.tile_size];
        Self {
            physics,
            cols: 200,
            rows: 30,
            ground_level,
            player_size: [24.0, 40.0],
            spawn,
            max_health: 10,
            break_duration: 0.5,
            place_reach: 1,
            attack_duration: 0.18,
            attack_range: 32.0,
            attack_height: 20.0,
            invincibility: 1.0,
            mob_columns: vec![20, 60, 100, 150],
            mob_size: 26.0,
            mob_speed: 60.0,
            mob_fall_nudge: 10.0,
            day_speed: 0.02,
            initial_time_of_day: 0.25,
            max_tick_dt: 0.05,
        }
    }
}

impl SessionConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.physics.tile_size <= 0.0 {
            return invalid("tile_size must be positive");
        }
        if self.physics.step_nudge <= 0.0 {
            return invalid("step_nudge must be positive");
        }
        if self.physics.fall_damage_step <= 0.0 {
            return invalid("fall_damage_step must be positive");
        }
        if self.cols == 0 || self.rows == 0 {
            return invalid("grid dimensions must be non-zero");
        }
        if self.ground_level >= self.rows {
            return invalid("ground_level must lie inside the grid");
        }
        if self.player_size.iter().any(|&d| d <= 0.0) || self.mob_size <= 0.0 {
            return invalid("player and mob sizes must be positive");
        }
        if self.max_health == 0 {
            return invalid("max_health must be non-zero");
        }
        if self.break_duration <= 0.0 {
            return invalid("break_duration must be positive");
        }
        if self.max_tick_dt <= 0.0 {
            return invalid("max_tick_dt must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SessionConfig::default().validate().unwrap();
    }

    #[test]
    fn default_step_height_is_one_tile() {
        let physics = PhysicsConfig::default();
        assert_eq!(physics.max_step_height(), physics.tile_size);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SessionConfig::from_json_str(r#"{ "cols": 40, "physics": { "gravity": 900.0 } }"#)
            .unwrap();
        assert_eq!(config.cols, 40);
        assert_eq!(config.rows, 30);
        assert_eq!(config.physics.gravity, 900.0);
        assert_eq!(config.physics.tile_size, 32.0);
    }

    #[test]
    fn ground_outside_grid_is_rejected() {
        let result = SessionConfig::from_json_str(r#"{ "rows": 10, "ground_level": 10 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, r#"{ "max_health": 3 }"#).unwrap();
        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.max_health, 3);
    }
}
