//! Waypoint navigation and enemy AI for 2D top-down games
//!
//! This crate provides:
//! - An author-placed waypoint graph with geometric, range and shortest-path
//!   queries
//! - Enemy agents that roam onto the network, patrol, chase characters, get
//!   knocked back and stay leashed to their spawner
//! - Spawners that keep a capped population of agents alive
//! - Serde map data and configuration (RON / JSON)
//!
//! Everything is driven by [`sim::Simulation::tick`]; nothing here draws,
//! plays sound or touches the filesystem.

pub mod ai;
pub mod config;
pub mod map;
pub mod nav;
pub mod sim;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::ai::{Agent, AgentMode, AiState, HitOutcome, SpawnTag};
    pub use crate::config::{AgentTuning, CombatTuning, LeashTuning, SimConfig, SpawnTuning};
    pub use crate::map::{MapData, MapError, NodeRecord, PathRecord};
    pub use crate::nav::{NavGraph, NodeId, Route, find_route, find_route_within};
    pub use crate::sim::{
        AgentHandle, CharacterId, HasPosition, HasSpriteKey, SimEvent, Simulation, SpawnerDef,
    };
    pub use glam::Vec2;
}
