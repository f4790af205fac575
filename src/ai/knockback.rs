//! Knockback impulse
//!
//! Hits push the agent away from the attacker. Repeated hits stack additively
//! up to a speed cap, and the velocity decays as `v * exp(-k * t)` until the
//! knockback window after the latest hit runs out.

use glam::Vec2;

use super::steering::{Flee, SteeringBehavior, SteeringOutput};
use crate::config::AgentTuning;

/// Knockback state of a single agent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Knockback {
    /// Current knockback velocity
    velocity: Vec2,
    /// Seconds left in the knockback window
    remaining: f32,
}

impl Knockback {
    /// Apply a hit from `attacker` to an agent at `position`.
    ///
    /// Adds an impulse of `knockback_strength` directed away from the
    /// attacker, clamps the stacked velocity and restarts the window.
    pub fn push(&mut self, position: Vec2, attacker: Vec2, tuning: &AgentTuning) {
        let impulse = Flee::new(attacker, tuning.knockback_strength).calculate(position);
        let stacked = SteeringOutput {
            linear: self.velocity,
        }
        .combine(impulse);
        self.velocity = stacked.linear.clamp_length_max(tuning.knockback_max_speed);
        self.remaining = tuning.knockback_duration;
    }

    /// Whether knockback currently overrides movement.
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Current velocity.
    #[must_use]
    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Seconds left in the window.
    #[must_use]
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Advance by `dt` and return the displacement to apply.
    ///
    /// The displacement is the exact integral of the decaying velocity over
    /// the step, so it does not depend on how time is sliced into ticks.
    pub fn integrate(&mut self, dt: f32, damping: f32) -> Vec2 {
        if !self.is_active() || dt <= 0.0 {
            return Vec2::ZERO;
        }

        let step = dt.min(self.remaining);
        let (displacement, decay) = if damping > 0.0 {
            let decay = (-damping * step).exp();
            (self.velocity * ((1.0 - decay) / damping), decay)
        } else {
            (self.velocity * step, 1.0)
        };

        self.velocity = SteeringOutput {
            linear: self.velocity,
        }
        .scale(decay)
        .linear;
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.clear();
        }
        displacement
    }

    /// Drop any pending knockback.
    pub fn clear(&mut self) {
        self.velocity = Vec2::ZERO;
        self.remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> AgentTuning {
        AgentTuning {
            knockback_strength: 100.0,
            knockback_max_speed: 250.0,
            knockback_duration: 1.0,
            knockback_damping: 3.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_push_direction_is_away_from_attacker() {
        let mut kb = Knockback::default();
        kb.push(Vec2::new(10.0, 0.0), Vec2::ZERO, &tuning());

        assert!(kb.is_active());
        assert!((kb.velocity() - Vec2::new(100.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_hits_stack_and_clamp() {
        let t = tuning();
        let mut kb = Knockback::default();
        kb.push(Vec2::new(10.0, 0.0), Vec2::ZERO, &t);
        kb.push(Vec2::new(10.0, 0.0), Vec2::ZERO, &t);
        assert!((kb.velocity().length() - 200.0).abs() < 1e-3);

        kb.push(Vec2::new(10.0, 0.0), Vec2::ZERO, &t);
        assert!((kb.velocity().length() - 250.0).abs() < 1e-3);
    }

    #[test]
    fn test_velocity_decays_exponentially() {
        let t = tuning();
        let mut kb = Knockback::default();
        kb.push(Vec2::X, Vec2::ZERO, &t);
        let v0 = kb.velocity().length();

        let dt = 1.0 / 60.0;
        let steps = 30;
        let mut displacement = Vec2::ZERO;
        for _ in 0..steps {
            displacement += kb.integrate(dt, t.knockback_damping);
        }
        let elapsed = dt * steps as f32;
        let k = t.knockback_damping;

        let expected_v = v0 * (-k * elapsed).exp();
        assert!((kb.velocity().length() - expected_v).abs() < 1e-2);

        let expected_d = v0 * (1.0 - (-k * elapsed).exp()) / k;
        assert!((displacement.length() - expected_d).abs() < 1e-2);
        assert!(displacement.x > 0.0);
    }

    #[test]
    fn test_window_expires() {
        let t = tuning();
        let mut kb = Knockback::default();
        kb.push(Vec2::X, Vec2::ZERO, &t);

        kb.integrate(0.6, t.knockback_damping);
        assert!(kb.is_active());
        kb.integrate(0.6, t.knockback_damping);
        assert!(!kb.is_active());
        assert_eq!(kb.velocity(), Vec2::ZERO);
        assert_eq!(kb.integrate(0.1, t.knockback_damping), Vec2::ZERO);
    }
}
