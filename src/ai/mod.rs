//! Agent AI
//!
//! Steering primitives, knockback and the per-enemy behavior state machine.

mod agent;
mod knockback;
mod steering;

pub use agent::{
    Agent, AgentInput, AgentMode, AgentTick, AiState, HitOutcome, LeashStatus, RouteOutcome,
    SpawnTag,
};
pub use knockback::Knockback;
pub use steering::{Flee, Seek, SteeringBehavior, SteeringOutput};
