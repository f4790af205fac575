//! Read-only views for the rendering collaborator
//!
//! The simulation never draws anything. Renderers walk agents and characters
//! through these capability traits instead of depending on concrete types.

use glam::Vec2;

use super::character::Character;
use crate::ai::{Agent, AgentMode};

/// Something with a world position.
pub trait HasPosition {
    /// World position.
    fn world_position(&self) -> Vec2;
}

/// Something that picks its own sprite.
pub trait HasSpriteKey {
    /// Asset key of the sprite to draw.
    fn sprite_key(&self) -> &'static str;
}

impl HasPosition for Agent {
    fn world_position(&self) -> Vec2 {
        self.position()
    }
}

impl HasSpriteKey for Agent {
    fn sprite_key(&self) -> &'static str {
        match self.mode() {
            AgentMode::Dead => "enemy_dead",
            _ if self.is_flashing() => "enemy_hit",
            AgentMode::Chasing => "enemy_alert",
            _ => "enemy",
        }
    }
}

impl HasPosition for Character {
    fn world_position(&self) -> Vec2 {
        self.position()
    }
}

impl HasSpriteKey for Character {
    fn sprite_key(&self) -> &'static str {
        if self.is_alive() { "character" } else { "character_down" }
    }
}
