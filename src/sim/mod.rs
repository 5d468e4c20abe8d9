//! Game rules module
//!
//! Everything that decides what happens lives here, on top of a pluggable
//! physics world:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by disc ID)
//! - No rendering or platform dependencies

pub mod merge;
pub mod monitor;
pub mod physics;
pub mod rapier_world;
pub mod scheduler;
pub mod spawn;
pub mod state;
pub mod tick;

pub use merge::{Merge, resolve_merges};
pub use monitor::{DangerMonitor, any_in_danger, is_in_danger};
pub use physics::{BodyHandle, BodyKind, ContactPair, DiscBody, PhysicsWorld};
pub use rapier_world::RapierWorld;
pub use scheduler::{Scheduler, Task, TaskToken};
pub use spawn::{AimController, Release};
pub use state::{Disc, DiscSet, GameEvent, GamePhase, Ghost, PopEffect, Session};
pub use tick::{Game, TickInput};
