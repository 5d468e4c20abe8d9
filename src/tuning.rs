//! Data-driven game balance
//!
//! Every number the rules depend on lives in [`GameConfig`], so variants of the
//! game (taller box, lower danger line, faster drops) are just different configs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::catalog::FruitCatalog;

/// Physical material applied to every dropped fruit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub density: f32,
    pub friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            density: 1.0,
            friction: 0.1,
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// JSON parse error
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Game rules configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Container width (logical pixels)
    pub width: f32,
    /// Container height (logical pixels, y grows downward)
    pub height: f32,
    /// Thickness of the ground and side walls
    pub wall_thickness: f32,
    /// Extra inset kept between the aimed fruit and the side walls
    pub wall_margin: f32,
    /// Fixed y of the aimed fruit
    pub spawn_y: f32,
    /// Fruits resting above this y (smaller y) are in danger
    pub danger_line_y: f32,
    /// Speed below which a fruit counts as resting (pixels/second)
    pub settle_speed: f32,
    /// How long the danger condition must hold before the game ends (seconds)
    pub danger_hold_secs: f32,
    /// Delay between a drop and the next aimed fruit (seconds)
    pub drop_cooldown_secs: f32,
    /// Downward acceleration (pixels/second²)
    pub gravity: f32,
    /// Material of dropped and merged fruits
    pub material: Material,
    /// Aimed fruits are drawn uniformly from the first N tiers
    pub spawnable_tiers: usize,
    /// Lifetime of the merge pop effect (seconds)
    pub pop_lifetime_secs: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 800.0,
            wall_thickness: 40.0,
            wall_margin: 20.0,
            spawn_y: 80.0,
            danger_line_y: 150.0,
            settle_speed: 20.0,
            danger_hold_secs: 2.0,
            drop_cooldown_secs: 1.0,
            gravity: 1000.0,
            material: Material::default(),
            spawnable_tiers: 4,
            pop_lifetime_secs: 0.3,
        }
    }
}

impl GameConfig {
    /// Parse a JSON config (missing fields fall back to defaults) and validate it
    pub fn from_json(json: &str, catalog: &FruitCatalog) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate(catalog)?;
        Ok(config)
    }

    /// Check the config is playable with the given catalog
    pub fn validate(&self, catalog: &FruitCatalog) -> Result<(), ConfigError> {
        if !(self.width > 0.0) || !(self.height > 0.0) {
            return Err(ConfigError::invalid(
                "width/height",
                format!("container must be positive, got {}x{}", self.width, self.height),
            ));
        }
        if self.wall_thickness <= 0.0 || self.wall_margin < 0.0 {
            return Err(ConfigError::invalid(
                "wall_thickness/wall_margin",
                "thickness must be positive and margin non-negative",
            ));
        }
        if self.spawn_y < 0.0 || self.spawn_y >= self.height {
            return Err(ConfigError::invalid(
                "spawn_y",
                format!("{} is outside the container", self.spawn_y),
            ));
        }
        if self.danger_line_y <= 0.0 || self.danger_line_y >= self.height {
            return Err(ConfigError::invalid(
                "danger_line_y",
                format!("{} is outside the container", self.danger_line_y),
            ));
        }
        if self.settle_speed < 0.0 || self.danger_hold_secs < 0.0 || self.drop_cooldown_secs < 0.0
        {
            return Err(ConfigError::invalid(
                "settle_speed/danger_hold_secs/drop_cooldown_secs",
                "must not be negative",
            ));
        }
        if self.spawnable_tiers == 0 || self.spawnable_tiers > catalog.len() {
            return Err(ConfigError::invalid(
                "spawnable_tiers",
                format!(
                    "{} is not within 1..={}",
                    self.spawnable_tiers,
                    catalog.len()
                ),
            ));
        }
        let widest = (0..self.spawnable_tiers)
            .map(|i| catalog.radius(i))
            .fold(0.0, f32::max);
        if 2.0 * (widest + self.wall_margin) > self.width {
            return Err(ConfigError::invalid(
                "width",
                format!("too narrow to aim a fruit of radius {widest}"),
            ));
        }
        Ok(())
    }

    /// Horizontal range the aimed fruit of `radius` may occupy
    pub fn aim_range(&self, radius: f32) -> (f32, f32) {
        let min = radius + self.wall_margin;
        let max = self.width - radius - self.wall_margin;
        (min, max.max(min))
    }

    /// Clamp a pointer x into the aim range for `radius`
    pub fn clamp_aim(&self, x: f32, radius: f32) -> f32 {
        let (min, max) = self.aim_range(radius);
        x.clamp(min, max)
    }

    /// Where a freshly aimed fruit appears
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.spawn_y)
    }

    /// Ground and side walls as (center, half extents), outside the container
    pub fn walls(&self) -> [(Vec2, Vec2); 3] {
        let t = self.wall_thickness;
        let (w, h) = (self.width, self.height);
        [
            // Ground top sits 10px above the container bottom
            (
                Vec2::new(w / 2.0, h + t / 2.0 - 10.0),
                Vec2::new(w / 2.0, t / 2.0),
            ),
            (Vec2::new(-t / 2.0, h / 2.0), Vec2::new(t / 2.0, h)),
            (Vec2::new(w + t / 2.0, h / 2.0), Vec2::new(t / 2.0, h)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate(&FruitCatalog::classic()).is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let catalog = FruitCatalog::classic();
        let config = GameConfig::from_json(r#"{"danger_line_y": 200.0}"#, &catalog).unwrap();
        assert_eq!(config.danger_line_y, 200.0);
        assert_eq!(config.width, 600.0);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        let catalog = FruitCatalog::classic();
        assert!(matches!(
            GameConfig::from_json(r#"{"spawnable_tiers": 0}"#, &catalog),
            Err(ConfigError::Invalid { field: "spawnable_tiers", .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{"danger_line_y": 900.0}"#, &catalog),
            Err(ConfigError::Invalid { field: "danger_line_y", .. })
        ));
        assert!(matches!(
            GameConfig::from_json("not json", &catalog),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_clamp_aim_extremes() {
        let config = GameConfig::default();
        assert_eq!(config.clamp_aim(-1000.0, 15.0), 35.0);
        assert_eq!(config.clamp_aim(1000.0, 15.0), 565.0);
        assert_eq!(config.clamp_aim(300.0, 15.0), 300.0);
    }

    #[test]
    fn test_walls_enclose_container() {
        let config = GameConfig::default();
        let [ground, left, right] = config.walls();
        assert_eq!(ground.0.y - ground.1.y, config.height - 10.0);
        assert_eq!(left.0.x + left.1.x, 0.0);
        assert_eq!(right.0.x - right.1.x, config.width);
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_in_range(x in -1.0e6f32..1.0e6, radius in 1.0f32..120.0) {
            let config = GameConfig::default();
            let clamped = config.clamp_aim(x, radius);
            prop_assert!(clamped >= radius + config.wall_margin);
            prop_assert!(clamped <= config.width - radius - config.wall_margin);
        }
    }
}
