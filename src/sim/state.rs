//! Session state and core simulation types
//!
//! Dynamics (position, velocity) belong to the physics world; everything the
//! rules need on top of that lives here.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::monitor::DangerMonitor;
use super::physics::BodyHandle;

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No aimed fruit, waiting for the drop cooldown
    Idle,
    /// A fruit is aimed and follows the pointer
    Aiming,
    /// Run ended, only a restart gets out of here
    GameOver,
}

/// A dropped fruit living in the physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    pub id: u32,
    pub tier: usize,
    pub body: BodyHandle,
}

/// The aimed, not yet dropped fruit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ghost {
    pub tier: usize,
    pub body: BodyHandle,
    /// Current horizontal position (y is fixed by config)
    pub x: f32,
}

/// Expanding ring drawn where a merge happened
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopEffect {
    pub pos: Vec2,
    /// Radius of the fruit that was created
    pub radius: f32,
    /// 1 at creation, removed at 0
    pub life: f32,
}

/// Things the outside world (HUD, audio, renderer) may react to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A fruit is being aimed; `next` is the new preview tier
    Spawned { tier: usize, next: usize },
    /// The aimed fruit was released at `x`
    Dropped { tier: usize, x: f32 },
    /// Two `from` fruits became one `into` fruit at `pos`
    Merged {
        from: usize,
        into: usize,
        pos: Vec2,
        points: u64,
    },
    /// The danger line was occupied for too long
    GameOver { score: u64, largest_tier: usize },
    /// Board cleared by an explicit restart
    Restarted,
}

/// Dropped fruits, iterated in id (drop) order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscSet {
    discs: BTreeMap<u32, Disc>,
    /// Body to id, for contact lookups
    by_body: BTreeMap<BodyHandle, u32>,
    next_id: u32,
}

impl Default for DiscSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscSet {
    pub fn new() -> Self {
        Self {
            discs: BTreeMap::new(),
            by_body: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Track a new fruit, returning its id
    pub fn insert(&mut self, tier: usize, body: BodyHandle) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.discs.insert(id, Disc { id, tier, body });
        self.by_body.insert(body, id);
        id
    }

    pub fn by_body(&self, body: BodyHandle) -> Option<&Disc> {
        self.by_body.get(&body).and_then(|id| self.discs.get(id))
    }

    pub fn remove_body(&mut self, body: BodyHandle) -> Option<Disc> {
        let id = self.by_body.remove(&body)?;
        self.discs.remove(&id)
    }

    /// Remove and return every fruit
    pub fn take_all(&mut self) -> Vec<Disc> {
        self.by_body.clear();
        std::mem::take(&mut self.discs).into_values().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Disc> {
        self.discs.values()
    }

    pub fn len(&self) -> usize {
        self.discs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discs.is_empty()
    }

    /// Number of fruits of a given tier
    pub fn count_tier(&self, tier: usize) -> usize {
        self.discs.values().filter(|d| d.tier == tier).count()
    }
}

/// Per-run bookkeeping (everything a restart resets)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub score: u64,
    pub game_over: bool,
    pub paused: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Largest tier produced this run
    pub largest_tier: usize,
    pub danger: DangerMonitor,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to a fresh run, keeping the clock running
    pub fn reset(&mut self) {
        let time_ticks = self.time_ticks;
        *self = Self {
            time_ticks,
            ..Self::default()
        };
    }
}
