//! Reference characters
//!
//! Characters are positioned by the host (player input, scripted NPCs).
//! Agents chase them and deal contact damage to them; nothing else in the
//! simulation moves them except the contact push-back.

use std::fmt;

use glam::Vec2;

/// Index of a character in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(pub usize);

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "character {}", self.0)
    }
}

/// A chase target with health and a square bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    position: Vec2,
    hp: f32,
    half_extent: f32,
}

impl Character {
    /// Create a character.
    #[must_use]
    pub fn new(position: Vec2, hp: f32, half_extent: f32) -> Self {
        Self {
            position,
            hp,
            half_extent,
        }
    }

    /// Current position.
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Move the character.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Remaining health (may go negative; the host decides what death means).
    #[must_use]
    #[inline]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Whether the character still has health left.
    #[must_use]
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Half size of the bounding box.
    #[must_use]
    #[inline]
    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    /// Take `amount` damage from something at `source` and get shoved
    /// `push` units away from it.
    pub fn hurt(&mut self, amount: f32, source: Vec2, push: f32) {
        self.hp -= amount;
        self.position += (self.position - source).normalize_or_zero() * push;
    }
}

/// Whether two axis-aligned squares overlap.
#[must_use]
pub fn boxes_overlap(a: Vec2, a_half: f32, b: Vec2, b_half: f32) -> bool {
    let reach = a_half + b_half;
    (a.x - b.x).abs() < reach && (a.y - b.y).abs() < reach
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hurt_pushes_away_from_source() {
        let mut character = Character::new(Vec2::new(5.0, 0.0), 100.0, 8.0);
        character.hurt(20.0, Vec2::ZERO, 10.0);

        assert_eq!(character.hp(), 80.0);
        assert!((character.position() - Vec2::new(15.0, 0.0)).length() < 1e-5);
        assert!(character.is_alive());
    }

    #[test]
    fn test_hurt_at_same_position_does_not_move() {
        let mut character = Character::new(Vec2::ONE, 10.0, 8.0);
        character.hurt(10.0, Vec2::ONE, 10.0);
        assert_eq!(character.position(), Vec2::ONE);
        assert!(!character.is_alive());
    }

    #[test]
    fn test_boxes_overlap() {
        assert!(boxes_overlap(Vec2::ZERO, 8.0, Vec2::new(15.0, 15.0), 8.0));
        assert!(!boxes_overlap(Vec2::ZERO, 8.0, Vec2::new(16.0, 0.0), 8.0));
        assert!(!boxes_overlap(Vec2::ZERO, 8.0, Vec2::new(0.0, 20.0), 8.0));
    }
}
