//! Spawn / aim controller
//!
//! Idle (no aimed fruit) and Aiming (one sensor fruit following the pointer).
//! Releasing commits a real fruit at the aimed position and disables actions
//! until the game controller re-enables them after the drop cooldown.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::physics::{BodyHandle, BodyKind, DiscBody, PhysicsWorld};
use super::state::Ghost;
use crate::catalog::FruitCatalog;
use crate::tuning::GameConfig;

/// A fruit committed by a release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub tier: usize,
    pub body: BodyHandle,
    pub x: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AimController {
    ghost: Option<Ghost>,
    /// Tier shown in the "next" preview
    pending_tier: usize,
    /// Set for the cooldown window after a drop
    action_disabled: bool,
}

impl AimController {
    pub fn new(rng: &mut Pcg32, config: &GameConfig) -> Self {
        Self {
            ghost: None,
            pending_tier: roll_tier(rng, config),
            action_disabled: false,
        }
    }

    pub fn ghost(&self) -> Option<&Ghost> {
        self.ghost.as_ref()
    }

    pub fn pending_tier(&self) -> usize {
        self.pending_tier
    }

    pub fn is_disabled(&self) -> bool {
        self.action_disabled
    }

    /// Allow aiming and dropping again (end of cooldown)
    pub fn enable(&mut self) {
        self.action_disabled = false;
    }

    /// Idle -> Aiming. Takes the pending tier, places a sensor fruit at the
    /// spawn point and rolls the next preview. Returns `(tier, next)`, or None
    /// if a fruit is already aimed.
    pub fn spawn<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        config: &GameConfig,
        catalog: &FruitCatalog,
        rng: &mut Pcg32,
    ) -> Option<(usize, usize)> {
        if self.ghost.is_some() {
            return None;
        }

        let tier = self.pending_tier;
        let pos = config.spawn_point();
        let body = world.add_disc(&DiscBody {
            pos,
            radius: catalog.radius(tier),
            kind: BodyKind::Sensor,
            material: config.material,
        });
        self.ghost = Some(Ghost { tier, body, x: pos.x });
        self.pending_tier = roll_tier(rng, config);

        Some((tier, self.pending_tier))
    }

    /// Move the aimed fruit toward pointer `x`, clamped inside the walls
    pub fn aim<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        config: &GameConfig,
        catalog: &FruitCatalog,
        x: f32,
    ) {
        if self.action_disabled {
            return;
        }
        let Some(ghost) = self.ghost.as_mut() else {
            return;
        };

        ghost.x = config.clamp_aim(x, catalog.radius(ghost.tier));
        world.set_position(ghost.body, glam::Vec2::new(ghost.x, config.spawn_y));
    }

    /// Aiming -> Idle. Swaps the sensor for a falling fruit of the same tier
    pub fn release<W: PhysicsWorld>(
        &mut self,
        world: &mut W,
        config: &GameConfig,
        catalog: &FruitCatalog,
    ) -> Option<Release> {
        if self.action_disabled {
            return None;
        }
        let ghost = self.ghost.take()?;

        let pos = world
            .position(ghost.body)
            .unwrap_or(glam::Vec2::new(ghost.x, config.spawn_y));
        world.remove(ghost.body);
        let body = world.add_disc(&DiscBody {
            pos,
            radius: catalog.radius(ghost.tier),
            kind: BodyKind::Dynamic,
            material: config.material,
        });
        self.action_disabled = true;

        Some(Release {
            tier: ghost.tier,
            body,
            x: pos.x,
        })
    }

    /// Drop the aimed fruit without committing it (restart)
    pub fn clear<W: PhysicsWorld>(&mut self, world: &mut W) {
        if let Some(ghost) = self.ghost.take() {
            world.remove(ghost.body);
        }
        self.action_disabled = false;
    }
}

/// Uniform pick among the spawnable tiers
fn roll_tier(rng: &mut Pcg32, config: &GameConfig) -> usize {
    rng.random_range(0..config.spawnable_tiers.max(1))
}
