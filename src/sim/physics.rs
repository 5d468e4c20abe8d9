//! Physics world boundary
//!
//! The game rules never touch the rigid-body engine directly. They create and
//! remove bodies, move the aimed fruit, read positions/velocities and consume
//! the collision-start pairs reported by each step. Anything that can do that
//! can stand in for the engine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Material;

/// Opaque body identifier handed out by a [`PhysicsWorld`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How a disc body takes part in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Falls under gravity and collides
    Dynamic,
    /// Held in place and passes through everything (the aimed fruit)
    Sensor,
}

/// Description of a circular body to create
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscBody {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: BodyKind,
    pub material: Material,
}

/// Two bodies that started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl ContactPair {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self { a, b }
    }
}

/// Rigid-body engine seen from the game rules
pub trait PhysicsWorld {
    /// Create a static box (container wall)
    fn add_wall(&mut self, center: Vec2, half_extents: Vec2) -> BodyHandle;

    /// Create a circular body
    fn add_disc(&mut self, desc: &DiscBody) -> BodyHandle;

    /// Destroy a body; returns false if it was unknown
    fn remove(&mut self, body: BodyHandle) -> bool;

    /// Teleport a body without disturbing anything else
    fn set_position(&mut self, body: BodyHandle, pos: Vec2);

    fn position(&self, body: BodyHandle) -> Option<Vec2>;

    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;

    /// Advance by `dt` seconds and report the pairs that started touching
    fn step(&mut self, dt: f32) -> Vec<ContactPair>;
}
