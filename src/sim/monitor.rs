//! Game-over detection
//!
//! A run ends when some fruit rests above the danger line for longer than the
//! configured hold. Fruits just dropped pass through the zone fast, so only
//! slow ones count; the timer restarts whenever no fruit is in danger.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::PhysicsWorld;
use super::state::DiscSet;
use crate::tuning::GameConfig;

/// Hysteresis timer over the danger condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerMonitor {
    /// Tick at which the condition started holding
    since: Option<u64>,
}

impl DangerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(&self) -> Option<u64> {
        self.since
    }

    pub fn reset(&mut self) {
        self.since = None;
    }

    /// Feed one tick's condition; returns true once it has held for more
    /// than `hold_ticks` consecutive ticks
    pub fn observe(&mut self, now: u64, in_danger: bool, hold_ticks: u64) -> bool {
        if !in_danger {
            self.since = None;
            return false;
        }
        let since = *self.since.get_or_insert(now);
        now.saturating_sub(since) > hold_ticks
    }

    /// Fraction of the hold already elapsed (for a HUD warning)
    pub fn progress(&self, now: u64, hold_ticks: u64) -> f32 {
        match self.since {
            Some(since) if hold_ticks > 0 => {
                (now.saturating_sub(since) as f32 / hold_ticks as f32).min(1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }
}

/// Whether a single fruit is resting above the danger line
pub fn is_in_danger(pos: Vec2, vel: Vec2, config: &GameConfig) -> bool {
    pos.y < config.danger_line_y && vel.length() < config.settle_speed
}

/// Whether any dropped fruit is resting above the danger line
pub fn any_in_danger<W: PhysicsWorld>(world: &W, discs: &DiscSet, config: &GameConfig) -> bool {
    discs.iter().any(|disc| {
        match (world.position(disc.body), world.velocity(disc.body)) {
            (Some(pos), Some(vel)) => is_in_danger(pos, vel, config),
            _ => false,
        }
    })
}
