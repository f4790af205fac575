//! Simulation configuration
//!
//! Tuning constants for agents, leashes, spawning and contact combat. Every
//! section has sensible defaults, so a config file only needs the values it
//! wants to override.
//!
//! # Example
//!
//! ```ignore
//! let config = SimConfig::from_ron_str("(seed: 42, leash: (hard_multiplier: 3.0))")?;
//! let config = config.with_agent(AgentTuning { speed: 90.0, ..Default::default() });
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-agent movement, perception and hit-reaction tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTuning {
    /// Movement speed in world units per second
    pub speed: f32,
    /// Health on spawn
    pub max_hp: f32,
    /// Half size of the square bounding box
    pub half_extent: f32,
    /// Distance at which a route waypoint counts as reached
    pub arrival_tolerance: f32,
    /// Distance at which a roaming agent counts as back on the path network
    pub roam_join_threshold: f32,
    /// Hop budget for random patrol destinations
    pub patrol_hops: u32,
    /// Seconds to rest between patrol cycles
    pub patrol_cooldown: f32,
    /// Chase starts below this distance
    pub aggro_enter_radius: f32,
    /// Chase stops above this distance
    pub aggro_exit_radius: f32,
    /// Seconds the agent is flagged as recently hit
    pub hit_flash_duration: f32,
    /// Speed added by a single hit
    pub knockback_strength: f32,
    /// Upper bound on the stacked knockback speed
    pub knockback_max_speed: f32,
    /// Seconds knockback overrides movement after the latest hit
    pub knockback_duration: f32,
    /// Exponential decay rate of the knockback velocity
    pub knockback_damping: f32,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            speed: 60.0,
            max_hp: 30.0,
            half_extent: 8.0,
            arrival_tolerance: 4.0,
            roam_join_threshold: 4.0,
            patrol_hops: 3,
            patrol_cooldown: 1.5,
            aggro_enter_radius: 100.0,
            aggro_exit_radius: 400.0,
            hit_flash_duration: 0.2,
            knockback_strength: 220.0,
            knockback_max_speed: 420.0,
            knockback_duration: 0.25,
            knockback_damping: 8.0,
        }
    }
}

/// Leash thresholds, as multiples of a spawner's radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeashTuning {
    /// Beyond this the agent is pulled home and stops chasing
    pub soft_multiplier: f32,
    /// Beyond this the return overrides everything, checked before aggro
    pub hard_multiplier: f32,
}

impl Default for LeashTuning {
    fn default() -> Self {
        Self {
            soft_multiplier: 1.1,
            hard_multiplier: 4.0,
        }
    }
}

/// Spawn manager tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// BFS radius, in hops, used to build a spawner's allowed node region
    pub region_hops: u32,
    /// Spawn points snap to the network when the nearest path point is
    /// within `radius * snap_slack`
    pub snap_slack: f32,
    /// Interval used when a spawner is authored with a non-positive one
    pub interval_fallback: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            region_hops: 8,
            snap_slack: 1.1,
            interval_fallback: 1.0,
        }
    }
}

/// Contact damage between agents and characters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Damage per second a character takes while overlapping an agent
    pub character_contact_dps: f32,
    /// Damage per second an agent takes while overlapping a character
    pub agent_contact_dps: f32,
    /// Health of a newly added character
    pub character_max_hp: f32,
    /// Half size of a character's square bounding box
    pub character_half_extent: f32,
    /// Distance a character is shoved away from an overlapping agent
    pub character_push: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            character_contact_dps: 20.0,
            agent_contact_dps: 5.0,
            character_max_hp: 100.0,
            character_half_extent: 8.0,
            character_push: 10.0,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the simulation RNG
    pub seed: u64,
    /// Agent tuning
    pub agent: AgentTuning,
    /// Leash tuning
    pub leash: LeashTuning,
    /// Spawner tuning
    pub spawn: SpawnTuning,
    /// Contact combat tuning
    pub combat: CombatTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            agent: AgentTuning::default(),
            leash: LeashTuning::default(),
            spawn: SpawnTuning::default(),
            combat: CombatTuning::default(),
        }
    }
}

impl SimConfig {
    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replace agent tuning
    pub fn with_agent(mut self, agent: AgentTuning) -> Self {
        self.agent = agent;
        self
    }

    /// Replace leash tuning
    pub fn with_leash(mut self, leash: LeashTuning) -> Self {
        self.leash = leash;
        self
    }

    /// Replace spawn tuning
    pub fn with_spawn(mut self, spawn: SpawnTuning) -> Self {
        self.spawn = spawn;
        self
    }

    /// Replace combat tuning
    pub fn with_combat(mut self, combat: CombatTuning) -> Self {
        self.combat = combat;
        self
    }

    /// Parse a config from RON text. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid RON for this structure
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    /// Render the config as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Errors that can occur while reading or writing a config
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Serialization error
    Serialize(String),
    /// Deserialization error
    Deserialize(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Deserialize(e) => write!(f, "Config deserialization error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
