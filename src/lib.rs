//! Fruit Drop - a drop-and-merge physics puzzle
//!
//! Core modules:
//! - `catalog`: Fruit tiers (radius, score, sprite)
//! - `tuning`: Data-driven game balance
//! - `sim`: Game rules on top of a pluggable physics world (spawn, merge, game over)
//! - `renderer`: Canvas 2D view of the container
//! - `ui`: DOM HUD (score, next fruit, game over overlay)
//! - `audio`: Procedural sound effects

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod catalog;
pub mod highscores;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod ui;

pub use catalog::{FruitCatalog, Tier};
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::GameConfig;

/// Game loop constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, matches the browser frame rate)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Convert a duration in seconds to whole simulation ticks (at least one)
#[inline]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs / consts::SIM_DT).round().max(1.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_ticks() {
        assert_eq!(secs_to_ticks(1.0), 60);
        assert_eq!(secs_to_ticks(0.5), 30);
        assert_eq!(secs_to_ticks(0.0), 1);
    }
}
