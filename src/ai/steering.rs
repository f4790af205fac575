//! Steering behaviors for 2D agents
//!
//! Straight-line seek and flee. Every agent movement decision (roam, patrol,
//! chase, leash return) is a seek; knockback direction is a flee.

use glam::Vec2;

/// Output from a steering behavior
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringOutput {
    /// Desired velocity
    pub linear: Vec2,
}

impl SteeringOutput {
    /// Zero steering
    pub const ZERO: Self = Self { linear: Vec2::ZERO };

    /// Combine with another steering output
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        Self {
            linear: self.linear + other.linear,
        }
    }

    /// Scale the output
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self {
            linear: self.linear * factor,
        }
    }
}

/// Trait for steering behaviors
pub trait SteeringBehavior {
    /// Calculate steering for an agent at `position`
    fn calculate(&self, position: Vec2) -> SteeringOutput;
}

/// Seek behavior - move towards target
#[derive(Debug, Clone, Copy)]
pub struct Seek {
    /// Target position
    pub target: Vec2,
    /// Maximum speed
    pub max_speed: f32,
}

impl Seek {
    /// Create a new seek behavior
    #[must_use]
    pub fn new(target: Vec2, max_speed: f32) -> Self {
        Self { target, max_speed }
    }

    /// Position after moving for `dt` seconds, stopping exactly on the target
    /// instead of overshooting it.
    #[must_use]
    pub fn step(&self, position: Vec2, dt: f32) -> Vec2 {
        let reach = self.max_speed * dt;
        if position.distance(self.target) <= reach {
            return self.target;
        }
        position + self.calculate(position).linear * dt
    }
}

impl SteeringBehavior for Seek {
    fn calculate(&self, position: Vec2) -> SteeringOutput {
        let direction = (self.target - position).normalize_or_zero();
        SteeringOutput {
            linear: direction * self.max_speed,
        }
    }
}

/// Flee behavior - move away from a threat
#[derive(Debug, Clone, Copy)]
pub struct Flee {
    /// Position to flee from
    pub threat: Vec2,
    /// Maximum speed
    pub max_speed: f32,
}

impl Flee {
    /// Create a new flee behavior
    #[must_use]
    pub fn new(threat: Vec2, max_speed: f32) -> Self {
        Self { threat, max_speed }
    }
}

impl SteeringBehavior for Flee {
    fn calculate(&self, position: Vec2) -> SteeringOutput {
        let direction = (position - self.threat).normalize_or_zero();
        SteeringOutput {
            linear: direction * self.max_speed,
        }
    }
}
