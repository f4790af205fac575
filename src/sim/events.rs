//! Simulation events
//!
//! Things that happened during a tick. The simulation records them as they
//! happen and publishes the whole batch when the tick ends; renderers, audio
//! and combat UI read the batch afterwards instead of being called from
//! inside the tick.
//!
//! # Example
//!
//! ```ignore
//! sim.tick(dt);
//! for event in sim.events().iter() {
//!     if let SimEvent::AgentDied { position, .. } = event {
//!         play_death_effect(*position);
//!     }
//! }
//! ```

use glam::Vec2;

use super::arena::AgentHandle;
use super::character::CharacterId;
use crate::ai::AgentMode;

// ============================================================================
// Event Types
// ============================================================================

/// Something that happened in the simulation.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SimEvent {
    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// An agent was created.
    AgentSpawned {
        /// The new agent
        agent: AgentHandle,
        /// Where it appeared
        position: Vec2,
        /// Owning spawner, if any
        spawner: Option<usize>,
    },

    /// An agent's health dropped to zero.
    AgentDied {
        /// The dead agent (its handle no longer resolves)
        agent: AgentHandle,
        /// Where it died
        position: Vec2,
        /// Spawner it was released from, if any
        spawner: Option<usize>,
    },

    /// An agent was removed by the host without dying.
    AgentDespawned {
        /// The removed agent
        agent: AgentHandle,
    },

    // -------------------------------------------------------------------------
    // Combat
    // -------------------------------------------------------------------------
    /// An agent took damage.
    AgentDamaged {
        /// The damaged agent
        agent: AgentHandle,
        /// Damage dealt
        amount: f32,
        /// Attacker position for hits, `None` for contact damage
        attacker: Option<Vec2>,
    },

    /// A character took contact damage from an agent.
    CharacterDamaged {
        /// The damaged character
        character: CharacterId,
        /// Damage dealt
        amount: f32,
        /// The agent it touched
        agent: AgentHandle,
    },

    // -------------------------------------------------------------------------
    // Behavior
    // -------------------------------------------------------------------------
    /// An agent's observable mode changed.
    ModeChanged {
        /// The agent
        agent: AgentHandle,
        /// Previous mode
        from: AgentMode,
        /// New mode
        to: AgentMode,
    },
}

// ============================================================================
// Event Log
// ============================================================================

/// Events of the last completed tick, plus those being recorded for the
/// current one.
///
/// Publishing replaces the previous batch, so events a host did not drain
/// are dropped at the next tick boundary.
#[derive(Debug, Default)]
pub struct EventLog {
    recording: Vec<SimEvent>,
    published: Vec<SimEvent>,
    /// Tick number that published the current batch
    published_at: Option<u64>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, event: SimEvent) {
        self.recording.push(event);
    }

    /// Close tick `tick`: everything recorded since the last boundary becomes
    /// the readable batch.
    pub(crate) fn publish(&mut self, tick: u64) {
        self.published.clear();
        std::mem::swap(&mut self.recording, &mut self.published);
        self.published_at = Some(tick);
    }

    /// Tick number that published the readable batch, `None` before the
    /// first tick.
    #[must_use]
    #[inline]
    pub fn published_at(&self) -> Option<u64> {
        self.published_at
    }

    /// Events from the last completed tick.
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.published.iter()
    }

    /// Take ownership of the last tick's events.
    pub fn drain(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.published.drain(..)
    }

    /// Whether the readable batch is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.published.is_empty()
    }

    /// Number of readable events.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.published.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
