//! Simulation module
//!
//! The tick-driven world: agent storage, characters, spawners, events,
//! statistics and the [`Simulation`] context tying them together.

mod arena;
mod character;
mod events;
mod spawner;
mod stats;
mod view;
mod world;

pub use arena::{AgentHandle, Arena};
pub use character::{Character, CharacterId, boxes_overlap};
pub use events::{EventLog, SimEvent};
pub use spawner::{SpawnManager, Spawner, SpawnerDef, sample_in_circle};
pub use stats::TickStats;
pub use view::{HasPosition, HasSpriteKey};
pub use world::Simulation;
