//! Enemy agent behavior
//!
//! Per-enemy controller deciding each tick where the agent moves:
//!
//! ```text
//! Roaming --(reaches path network)--> Idle <--> Patrolling
//!    ^                                  \          /
//!    +------- chase lost --------- Chasing <------+
//! ```
//!
//! Two overrides sit on top of the AI state. Knockback suspends all other
//! movement while its window lasts. For spawner-owned agents, the leash
//! forces a walk home when the agent strays too far from its spawner.
//!
//! Only the agent's own tick mutates its state; everything else it needs
//! (graph, chase target, tuning) arrives read-only through [`AgentInput`].

use std::fmt;

use glam::Vec2;
use rand::Rng;
use rustc_hash::FxHashSet;

use super::knockback::Knockback;
use super::steering::Seek;
use crate::config::{AgentTuning, LeashTuning};
use crate::nav::{
    NavGraph, NodeId, closest_node, closest_point_on_any_path, find_route, find_route_within,
    random_reachable_point_within,
};

// ============================================================================
// States
// ============================================================================

/// The agent's underlying AI state, ignoring overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiState {
    /// Walking straight towards the nearest point of the path network
    Roaming,
    /// On the network, resting until the next patrol cycle
    Idle,
    /// Following a patrol route
    Patrolling,
    /// Pursuing a character
    Chasing,
}

/// What the agent is observably doing this tick, overrides included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentMode {
    /// Roaming towards the network
    Roaming,
    /// Resting on the network
    Idle,
    /// Walking a patrol route
    Patrolling,
    /// Chasing a character
    Chasing,
    /// Being knocked back
    Knockback,
    /// Walking home because of the leash
    ForcedReturn,
    /// Dead, no further updates
    Dead,
}

impl AgentMode {
    /// Mode name for debugging and logging.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Roaming => "Roaming",
            Self::Idle => "Idle",
            Self::Patrolling => "Patrolling",
            Self::Chasing => "Chasing",
            Self::Knockback => "Knockback",
            Self::ForcedReturn => "ForcedReturn",
            Self::Dead => "Dead",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata attached to agents created by a spawner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnTag {
    /// Spawner anchor the agent is leashed to
    pub home: Vec2,
    /// Leash radius (the spawner's radius)
    pub leash_radius: f32,
    /// Index of the owning spawner
    pub spawner: usize,
}

/// Where an agent stands relative to its leash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeashStatus {
    /// Not spawner-owned, or leash disabled
    Unleashed,
    /// Within `leash_radius * soft_multiplier`
    Within,
    /// Beyond the soft threshold
    Soft,
    /// Beyond the hard threshold
    Hard,
}

/// How a patrol route request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Route found by the solver restricted to the spawner region
    Constrained,
    /// Route found over the whole graph
    Unconstrained,
    /// Constrained search failed, the unconstrained one succeeded
    Fallback,
    /// No route; the agent stays put and retries
    Failed,
}

/// Read-only world data an agent consults during its tick.
#[derive(Debug, Clone, Copy)]
pub struct AgentInput<'a> {
    /// Navigation graph
    pub graph: &'a NavGraph,
    /// Nodes a spawner-owned agent should route through
    pub region: Option<&'a FxHashSet<NodeId>>,
    /// Position of the nearest living character, if any
    pub target: Option<Vec2>,
    /// Agent tuning
    pub tuning: &'a AgentTuning,
    /// Leash tuning
    pub leash: &'a LeashTuning,
}

/// What happened during one agent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgentTick {
    /// Mode change, if any
    pub transition: Option<(AgentMode, AgentMode)>,
    /// Patrol route request made this tick, if any
    pub route: Option<RouteOutcome>,
}

/// Result of applying a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// The agent took damage and survived
    Damaged,
    /// The hit brought health to zero or below
    Killed,
    /// The agent was already dead
    Ignored,
}

/// A patrol route being walked one waypoint at a time.
#[derive(Debug, Clone, PartialEq)]
struct Patrol {
    waypoints: Vec<Vec2>,
    next: usize,
}

// ============================================================================
// Agent
// ============================================================================

/// An enemy agent.
#[derive(Debug, Clone)]
pub struct Agent {
    position: Vec2,
    speed: f32,
    hp: f32,
    state: AiState,
    patrol: Option<Patrol>,
    /// Seconds since the last patrol cycle ended
    since_rest: f32,
    returning: bool,
    hit_flash: f32,
    knockback: Knockback,
    spawn: Option<SpawnTag>,
    facing: Vec2,
    dead: bool,
}

impl Agent {
    /// Create a roaming agent at `position`.
    #[must_use]
    pub fn new(position: Vec2, tuning: &AgentTuning) -> Self {
        Self {
            position,
            speed: tuning.speed,
            hp: tuning.max_hp,
            state: AiState::Roaming,
            patrol: None,
            since_rest: tuning.patrol_cooldown,
            returning: false,
            hit_flash: 0.0,
            knockback: Knockback::default(),
            spawn: None,
            facing: Vec2::Y,
            dead: false,
        }
    }

    /// Attach spawner ownership and leash metadata.
    #[must_use]
    pub fn with_spawn_tag(mut self, tag: SpawnTag) -> Self {
        self.spawn = Some(tag);
        self
    }

    // -------------------------------------------------------------------------
    // Read-only view
    // -------------------------------------------------------------------------

    /// Current position.
    #[must_use]
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Movement speed.
    #[must_use]
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Remaining health.
    #[must_use]
    #[inline]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Underlying AI state.
    #[must_use]
    #[inline]
    pub fn ai_state(&self) -> AiState {
        self.state
    }

    /// Whether the agent is chasing a character.
    #[must_use]
    #[inline]
    pub fn is_chasing(&self) -> bool {
        self.state == AiState::Chasing
    }

    /// Whether the agent was hit recently (visual feedback only).
    #[must_use]
    #[inline]
    pub fn is_flashing(&self) -> bool {
        self.hit_flash > 0.0
    }

    /// Whether the agent is dead.
    #[must_use]
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Spawner metadata, if spawner-owned.
    #[must_use]
    #[inline]
    pub fn spawn_tag(&self) -> Option<&SpawnTag> {
        self.spawn.as_ref()
    }

    /// Last movement direction (unit length).
    #[must_use]
    #[inline]
    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    /// Knockback state.
    #[must_use]
    #[inline]
    pub fn knockback(&self) -> &Knockback {
        &self.knockback
    }

    /// Remaining waypoints of the current patrol route.
    #[must_use]
    pub fn route(&self) -> &[Vec2] {
        match &self.patrol {
            Some(patrol) => &patrol.waypoints[patrol.next..],
            None => &[],
        }
    }

    /// Observable mode, overrides included.
    #[must_use]
    pub fn mode(&self) -> AgentMode {
        if self.dead {
            AgentMode::Dead
        } else if self.knockback.is_active() {
            AgentMode::Knockback
        } else if self.returning {
            AgentMode::ForcedReturn
        } else {
            match self.state {
                AiState::Roaming => AgentMode::Roaming,
                AiState::Idle => AgentMode::Idle,
                AiState::Patrolling => AgentMode::Patrolling,
                AiState::Chasing => AgentMode::Chasing,
            }
        }
    }

    /// Distance from the leash home, if spawner-owned.
    #[must_use]
    pub fn distance_from_home(&self) -> Option<f32> {
        self.spawn.map(|tag| self.position.distance(tag.home))
    }

    /// Classify the current position against the leash thresholds.
    #[must_use]
    pub fn leash_status(&self, leash: &LeashTuning) -> LeashStatus {
        let Some(tag) = self.spawn.filter(|tag| tag.leash_radius > 0.0) else {
            return LeashStatus::Unleashed;
        };
        let d = self.position.distance(tag.home);
        if d > tag.leash_radius * leash.hard_multiplier {
            LeashStatus::Hard
        } else if d > tag.leash_radius * leash.soft_multiplier {
            LeashStatus::Soft
        } else {
            LeashStatus::Within
        }
    }

    // -------------------------------------------------------------------------
    // Combat hooks
    // -------------------------------------------------------------------------

    /// Apply a hit: damage, hit flash and a knockback impulse away from
    /// `attacker`.
    pub fn apply_hit(&mut self, attacker: Vec2, damage: f32, tuning: &AgentTuning) -> HitOutcome {
        if self.dead {
            return HitOutcome::Ignored;
        }
        self.hit_flash = tuning.hit_flash_duration;
        self.knockback.push(self.position, attacker, tuning);
        if self.take_damage(damage) {
            HitOutcome::Killed
        } else {
            HitOutcome::Damaged
        }
    }

    /// Subtract health. Returns `true` only on the call that kills the agent.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.dead {
            return false;
        }
        self.hp -= amount;
        if self.hp <= 0.0 {
            self.kill()
        } else {
            false
        }
    }

    /// Mark the agent dead. Idempotent; returns `true` the first time.
    pub fn kill(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.patrol = None;
        self.returning = false;
        self.knockback.clear();
        true
    }

    // -------------------------------------------------------------------------
    // Tick
    // -------------------------------------------------------------------------

    /// Advance the agent by `dt` seconds.
    pub fn update(&mut self, dt: f32, input: &AgentInput<'_>, rng: &mut impl Rng) -> AgentTick {
        let mut tick = AgentTick::default();
        if self.dead {
            return tick;
        }
        let before = self.mode();

        self.hit_flash = (self.hit_flash - dt).max(0.0);

        if self.knockback.is_active() {
            self.position += self.knockback.integrate(dt, input.tuning.knockback_damping);
            self.contain_knockback(input.leash);
        } else {
            self.since_rest += dt;
            if !self.enforce_leash_before(dt, input.leash) {
                tick.route = self.run_ai(dt, input, rng);
                self.enforce_leash_after(input.leash);
            }
        }

        let after = self.mode();
        if after != before {
            log::trace!("Agent {} -> {}", before, after);
            tick.transition = Some((before, after));
        }
        tick
    }

    /// Leash check ahead of the AI. Returns `true` if the leash consumed this
    /// tick's movement.
    fn enforce_leash_before(&mut self, dt: f32, leash: &LeashTuning) -> bool {
        let Some(tag) = self.spawn else {
            return false;
        };
        match self.leash_status(leash) {
            LeashStatus::Unleashed => return false,
            // Hard is checked first so it wins when both thresholds are crossed
            LeashStatus::Hard | LeashStatus::Soft => self.begin_return(),
            LeashStatus::Within => {
                if self.returning && self.position.distance(tag.home) <= tag.leash_radius {
                    self.returning = false;
                    self.state = AiState::Roaming;
                }
            }
        }
        if self.returning {
            self.seek(tag.home, dt);
            return true;
        }
        false
    }

    /// Leash check after the AI moved: clamp an overshoot back onto the soft
    /// boundary within the same tick.
    fn enforce_leash_after(&mut self, leash: &LeashTuning) {
        let Some(tag) = self.spawn else {
            return;
        };
        if matches!(self.leash_status(leash), LeashStatus::Soft | LeashStatus::Hard) {
            let limit = tag.leash_radius * leash.soft_multiplier;
            let offset = (self.position - tag.home).clamp_length_max(limit);
            self.position = tag.home + offset;
            self.begin_return();
        }
    }

    /// Knockback may carry the agent past the soft boundary but not the hard
    /// one. Reaching it cancels the knockback and starts the return.
    fn contain_knockback(&mut self, leash: &LeashTuning) {
        let Some(tag) = self.spawn else {
            return;
        };
        if self.leash_status(leash) != LeashStatus::Hard {
            return;
        }
        let limit = tag.leash_radius * leash.hard_multiplier;
        let offset = (self.position - tag.home).clamp_length_max(limit);
        self.position = tag.home + offset;
        self.knockback.clear();
        self.begin_return();
    }

    fn begin_return(&mut self) {
        if !self.returning {
            log::debug!("Agent at {} leashed back home", self.position);
        }
        self.returning = true;
        self.patrol = None;
        if self.state == AiState::Chasing {
            self.state = AiState::Roaming;
        }
    }

    fn run_ai(&mut self, dt: f32, input: &AgentInput<'_>, rng: &mut impl Rng) -> Option<RouteOutcome> {
        self.update_chase(input);

        match self.state {
            AiState::Chasing => {
                if let Some(target) = input.target {
                    self.seek(target, dt);
                }
                None
            }
            AiState::Roaming => {
                self.roam(dt, input.graph, input.tuning);
                None
            }
            AiState::Idle => {
                if self.since_rest < input.tuning.patrol_cooldown {
                    return None;
                }
                let outcome = self.plan_patrol(input, rng);
                if outcome != RouteOutcome::Failed {
                    self.state = AiState::Patrolling;
                    self.follow_patrol(dt, input.tuning);
                }
                Some(outcome)
            }
            AiState::Patrolling => {
                self.follow_patrol(dt, input.tuning);
                None
            }
        }
    }

    /// Start or stop chasing with enter/exit hysteresis.
    fn update_chase(&mut self, input: &AgentInput<'_>) {
        let distance = input.target.map(|t| self.position.distance(t));
        if self.state == AiState::Chasing {
            if distance.is_none_or(|d| d > input.tuning.aggro_exit_radius) {
                self.state = AiState::Roaming;
            }
        } else if distance.is_some_and(|d| d < input.tuning.aggro_enter_radius) {
            self.state = AiState::Chasing;
            self.patrol = None;
        }
    }

    fn roam(&mut self, dt: f32, graph: &NavGraph, tuning: &AgentTuning) {
        let Some((point, distance)) = closest_point_on_any_path(graph, self.position) else {
            return;
        };
        if distance <= tuning.roam_join_threshold {
            self.state = AiState::Idle;
        } else {
            self.seek(point, dt);
        }
    }

    /// Pick a random destination near the agent and route to it.
    fn plan_patrol(&mut self, input: &AgentInput<'_>, rng: &mut impl Rng) -> RouteOutcome {
        let graph = input.graph;
        let Some(start) = closest_node(graph, self.position).map(|node| node.id) else {
            return RouteOutcome::Failed;
        };
        let region = input.region.filter(|region| region.contains(&start));
        let Some(destination) =
            random_reachable_point_within(graph, start, input.tuning.patrol_hops, region, rng)
        else {
            return RouteOutcome::Failed;
        };
        let Some(goal) = closest_node(graph, destination).map(|node| node.id) else {
            return RouteOutcome::Failed;
        };

        let (route, outcome) = match region {
            Some(region) => {
                let constrained = find_route_within(graph, start, goal, region);
                if constrained.is_empty() {
                    log::debug!("Constrained route {start}->{goal} failed, using full graph");
                    (find_route(graph, start, goal), RouteOutcome::Fallback)
                } else {
                    (constrained, RouteOutcome::Constrained)
                }
            }
            None => (find_route(graph, start, goal), RouteOutcome::Unconstrained),
        };

        if route.is_empty() {
            log::debug!("No route {start}->{goal}, agent stays put");
            return RouteOutcome::Failed;
        }

        let mut waypoints = route.waypoints;
        waypoints.push(destination);
        self.patrol = Some(Patrol { waypoints, next: 0 });
        outcome
    }

    fn follow_patrol(&mut self, dt: f32, tuning: &AgentTuning) {
        let Some(target) = self
            .patrol
            .as_ref()
            .and_then(|patrol| patrol.waypoints.get(patrol.next).copied())
        else {
            self.finish_patrol();
            return;
        };

        self.seek(target, dt);

        if self.position.distance(target) <= tuning.arrival_tolerance
            && let Some(patrol) = self.patrol.as_mut()
        {
            patrol.next += 1;
            if patrol.next >= patrol.waypoints.len() {
                self.finish_patrol();
            }
        }
    }

    fn finish_patrol(&mut self) {
        self.patrol = None;
        self.state = AiState::Idle;
        self.since_rest = 0.0;
    }

    fn seek(&mut self, target: Vec2, dt: f32) {
        let next = Seek::new(target, self.speed).step(self.position, dt);
        let moved = next - self.position;
        if moved != Vec2::ZERO {
            self.facing = moved.normalize_or_zero();
        }
        self.position = next;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    /// Horizontal line of nodes 50 units apart along y = 0.
    fn line_graph(count: usize) -> NavGraph {
        let mut graph = NavGraph::new();
        let ids: Vec<NodeId> = (0..count)
            .map(|i| graph.add_node(Vec2::new(i as f32 * 50.0, 0.0)).unwrap())
            .collect();
        for pair in ids.windows(2) {
            graph.add_edge_euclidean(pair[0], pair[1]).unwrap();
        }
        graph
    }

    fn input<'a>(
        graph: &'a NavGraph,
        target: Option<Vec2>,
        tuning: &'a AgentTuning,
        leash: &'a LeashTuning,
    ) -> AgentInput<'a> {
        AgentInput {
            graph,
            region: None,
            target,
            tuning,
            leash,
        }
    }

    fn run(agent: &mut Agent, ticks: usize, input: &AgentInput<'_>, rng: &mut ChaCha8Rng) {
        for _ in 0..ticks {
            agent.update(DT, input, rng);
        }
    }

    #[test]
    fn test_roams_onto_network_then_idles() {
        let graph = line_graph(3);
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut agent = Agent::new(Vec2::new(60.0, 40.0), &tuning);
        let input = input(&graph, None, &tuning, &leash);

        assert_eq!(agent.mode(), AgentMode::Roaming);
        agent.update(DT, &input, &mut rng);
        assert!(agent.position().y < 40.0);
        assert!((agent.position().x - 60.0).abs() < 1e-3, "moves straight down to the path");

        run(&mut agent, 60, &input, &mut rng);
        assert_ne!(agent.ai_state(), AiState::Roaming);
        assert!(agent.position().y.abs() <= tuning.roam_join_threshold + 1e-3);
    }

    #[test]
    fn test_empty_graph_stays_put() {
        let graph = NavGraph::new();
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut agent = Agent::new(Vec2::new(5.0, 5.0), &tuning);

        run(&mut agent, 30, &input(&graph, None, &tuning, &leash), &mut rng);
        assert_eq!(agent.position(), Vec2::new(5.0, 5.0));
        assert_eq!(agent.mode(), AgentMode::Roaming);
    }

    #[test]
    fn test_patrol_walks_route_and_rests() {
        let graph = line_graph(4);
        let tuning = AgentTuning {
            patrol_cooldown: 0.5,
            ..Default::default()
        };
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut agent = Agent::new(Vec2::new(50.0, 0.0), &tuning);
        let input = input(&graph, None, &tuning, &leash);

        // Join the network, then the first patrol starts right away
        agent.update(DT, &input, &mut rng);
        assert_eq!(agent.ai_state(), AiState::Idle);
        let tick = agent.update(DT, &input, &mut rng);
        assert_eq!(tick.route, Some(RouteOutcome::Unconstrained));
        assert_eq!(agent.mode(), AgentMode::Patrolling);
        assert!(!agent.route().is_empty());

        let mut finished = false;
        for _ in 0..600 {
            agent.update(DT, &input, &mut rng);
            assert!(agent.position().y.abs() < 1e-3, "patrol stays on the path");
            if agent.ai_state() == AiState::Idle {
                finished = true;
                break;
            }
        }
        assert!(finished, "patrol should complete");
        assert!(agent.route().is_empty());

        // Resting: no new route until the cooldown elapses
        let tick = agent.update(DT, &input, &mut rng);
        assert_eq!(tick.route, None);
        assert_eq!(agent.ai_state(), AiState::Idle);
    }

    #[test]
    fn test_chase_hysteresis() {
        let graph = line_graph(2);
        let tuning = AgentTuning {
            speed: 0.0,
            ..Default::default()
        };
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut agent = Agent::new(Vec2::ZERO, &tuning);

        agent.update(DT, &input(&graph, Some(Vec2::new(150.0, 0.0)), &tuning, &leash), &mut rng);
        assert!(!agent.is_chasing());

        agent.update(DT, &input(&graph, Some(Vec2::new(99.0, 0.0)), &tuning, &leash), &mut rng);
        assert!(agent.is_chasing());
        assert_eq!(agent.mode(), AgentMode::Chasing);

        for d in [150.0, 300.0, 399.0, 400.0] {
            agent.update(DT, &input(&graph, Some(Vec2::new(d, 0.0)), &tuning, &leash), &mut rng);
            assert!(agent.is_chasing(), "still chasing at {d}");
        }

        agent.update(DT, &input(&graph, Some(Vec2::new(401.0, 0.0)), &tuning, &leash), &mut rng);
        assert!(!agent.is_chasing());
        assert_ne!(agent.mode(), AgentMode::Chasing);
    }

    #[test]
    fn test_chase_moves_towards_target() {
        let graph = line_graph(2);
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut agent = Agent::new(Vec2::ZERO, &tuning);
        let target = Vec2::new(0.0, 80.0);

        agent.update(DT, &input(&graph, Some(target), &tuning, &leash), &mut rng);
        assert!(agent.is_chasing());
        assert!((agent.position().y - tuning.speed * DT).abs() < 1e-3);
        assert!((agent.facing() - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_knockback_overrides_chase() {
        let graph = line_graph(2);
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = Agent::new(Vec2::new(10.0, 0.0), &tuning);
        let target = Vec2::new(0.0, 0.0);

        assert_eq!(agent.apply_hit(target, 1.0, &tuning), HitOutcome::Damaged);
        assert!(agent.is_flashing());
        assert_eq!(agent.mode(), AgentMode::Knockback);

        let start = agent.position();
        agent.update(DT, &input(&graph, Some(target), &tuning, &leash), &mut rng);
        assert!(agent.position().x > start.x, "pushed away despite the target");
        assert!(!agent.is_chasing());

        run(&mut agent, 60, &input(&graph, Some(target), &tuning, &leash), &mut rng);
        assert!(!agent.knockback().is_active());
        assert!(!agent.is_flashing());
        assert!(agent.is_chasing(), "normal AI resumes after knockback");
    }

    #[test]
    fn test_death_is_idempotent_and_freezes_agent() {
        let graph = line_graph(2);
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut agent = Agent::new(Vec2::new(0.0, 30.0), &tuning);

        assert_eq!(agent.apply_hit(Vec2::ZERO, tuning.max_hp, &tuning), HitOutcome::Killed);
        assert!(agent.is_dead());
        assert_eq!(agent.apply_hit(Vec2::ZERO, 5.0, &tuning), HitOutcome::Ignored);
        assert!(!agent.kill());
        assert!(!agent.take_damage(1.0));

        let frozen = agent.position();
        let tick = agent.update(DT, &input(&graph, Some(Vec2::ZERO), &tuning, &leash), &mut rng);
        assert_eq!(tick, AgentTick::default());
        assert_eq!(agent.position(), frozen);
        assert_eq!(agent.mode(), AgentMode::Dead);
    }

    #[test]
    fn test_leash_clamps_chase_to_soft_boundary() {
        let graph = line_graph(2);
        let tuning = AgentTuning {
            aggro_enter_radius: 1000.0,
            aggro_exit_radius: 2000.0,
            ..Default::default()
        };
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let home = Vec2::ZERO;
        let mut agent = Agent::new(home, &tuning).with_spawn_tag(SpawnTag {
            home,
            leash_radius: 20.0,
            spawner: 0,
        });
        let input = input(&graph, Some(Vec2::new(500.0, 0.0)), &tuning, &leash);

        let mut saw_return = false;
        for _ in 0..300 {
            agent.update(DT, &input, &mut rng);
            let d = agent.distance_from_home().unwrap();
            assert!(d <= 20.0 * leash.soft_multiplier + 1e-3, "escaped leash: {d}");
            saw_return |= agent.mode() == AgentMode::ForcedReturn;
        }
        assert!(saw_return);
    }

    #[test]
    fn test_hard_leash_overrides_aggro() {
        let graph = line_graph(2);
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let home = Vec2::ZERO;
        let mut agent = Agent::new(Vec2::new(100.0, 0.0), &tuning).with_spawn_tag(SpawnTag {
            home,
            leash_radius: 10.0,
            spawner: 0,
        });
        assert_eq!(agent.leash_status(&leash), LeashStatus::Hard);

        // Close enough to aggro, but the hard leash is checked first
        let input = input(&graph, Some(Vec2::new(150.0, 0.0)), &tuning, &leash);
        agent.update(DT, &input, &mut rng);
        assert_eq!(agent.mode(), AgentMode::ForcedReturn);
        assert!(!agent.is_chasing());

        let mut last = agent.distance_from_home().unwrap();
        let mut ticks = 0;
        while agent.mode() == AgentMode::ForcedReturn {
            agent.update(DT, &input, &mut rng);
            let d = agent.distance_from_home().unwrap();
            if agent.mode() == AgentMode::ForcedReturn {
                assert!(d <= last + 1e-3, "return must head home");
            }
            last = d;
            ticks += 1;
            assert!(ticks < 200, "never got home");
        }
        assert!(last <= 10.0 * leash.soft_multiplier);
    }

    #[test]
    fn test_repeated_knockback_stops_at_hard_leash() {
        let graph = line_graph(2);
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let home = Vec2::ZERO;
        let mut agent = Agent::new(Vec2::new(5.0, 0.0), &tuning).with_spawn_tag(SpawnTag {
            home,
            leash_radius: 30.0,
            spawner: 0,
        });
        let hard = 30.0 * leash.hard_multiplier;
        let input = input(&graph, None, &tuning, &leash);

        // A hit every 0.1s keeps the 0.25s knockback window open
        let mut farthest = 0.0_f32;
        let mut saw_return = false;
        for tick in 0..120 {
            if tick % 6 == 0 {
                agent.apply_hit(Vec2::new(-5.0, 0.0), 0.0, &tuning);
            }
            agent.update(DT, &input, &mut rng);
            let d = agent.distance_from_home().unwrap();
            assert!(d <= hard + 1e-3, "knocked past hard leash: {d}");
            farthest = farthest.max(d);
            saw_return |= agent.mode() == AgentMode::ForcedReturn;
        }
        assert!(farthest >= hard - 1e-2, "never reached the hard boundary");
        assert!(saw_return);
    }

    #[test]
    fn test_leash_status_thresholds() {
        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let tag = SpawnTag {
            home: Vec2::ZERO,
            leash_radius: 10.0,
            spawner: 0,
        };
        let at = |x: f32| Agent::new(Vec2::new(x, 0.0), &tuning).with_spawn_tag(tag);

        assert_eq!(at(10.0).leash_status(&leash), LeashStatus::Within);
        assert_eq!(at(12.0).leash_status(&leash), LeashStatus::Soft);
        assert_eq!(at(41.0).leash_status(&leash), LeashStatus::Hard);
        assert_eq!(
            Agent::new(Vec2::new(1e6, 0.0), &tuning).leash_status(&leash),
            LeashStatus::Unleashed
        );
    }

    #[test]
    fn test_constrained_patrol_falls_back_to_full_graph() {
        // A - B - C - D around three sides of a square, region excludes B
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec2::new(0.0, 0.0)).unwrap();
        let b = graph.add_node(Vec2::new(50.0, 0.0)).unwrap();
        let c = graph.add_node(Vec2::new(50.0, 50.0)).unwrap();
        let d = graph.add_node(Vec2::new(0.0, 50.0)).unwrap();
        graph.add_edge_euclidean(a, b).unwrap();
        graph.add_edge_euclidean(b, c).unwrap();
        graph.add_edge_euclidean(c, d).unwrap();
        let region: FxHashSet<NodeId> = [a, c, d].into_iter().collect();

        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut agent = Agent::new(Vec2::ZERO, &tuning);
        let mut input = input(&graph, None, &tuning, &leash);
        input.region = Some(&region);

        agent.update(DT, &input, &mut rng);
        assert_eq!(agent.ai_state(), AiState::Idle);

        let tick = agent.update(DT, &input, &mut rng);
        assert_eq!(tick.route, Some(RouteOutcome::Fallback));
        assert_eq!(agent.mode(), AgentMode::Patrolling);
        assert!(agent.route().contains(&Vec2::new(50.0, 0.0)), "detours through B");
    }

    #[test]
    fn test_unreachable_patrol_goal_stays_put_and_retries() {
        // S - A is the only edge. Destinations on it snap to N or T, which
        // share no edge with S.
        let mut graph = NavGraph::new();
        let s = graph.add_node(Vec2::ZERO).unwrap();
        let _t = graph.add_node(Vec2::new(100.0, 0.0)).unwrap();
        let a = graph.add_node(Vec2::new(100.0, 0.0)).unwrap();
        let _n = graph.add_node(Vec2::new(0.001, 0.0)).unwrap();
        graph.add_edge_euclidean(s, a).unwrap();

        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut agent = Agent::new(Vec2::ZERO, &tuning);
        let input = input(&graph, None, &tuning, &leash);

        let mut failed_at = None;
        for _ in 0..10 {
            let before = agent.position();
            if agent.update(DT, &input, &mut rng).route == Some(RouteOutcome::Failed) {
                failed_at = Some(before);
                break;
            }
        }
        let before = failed_at.expect("route planning never failed");
        assert_eq!(agent.position(), before);
        assert_eq!(agent.mode(), AgentMode::Idle);
        assert!(agent.route().is_empty());

        let retry = agent.update(DT, &input, &mut rng);
        assert_eq!(retry.route, Some(RouteOutcome::Failed));
        assert_eq!(agent.position(), before);
    }

    #[test]
    fn test_patrol_outside_region_is_unconstrained() {
        let graph = line_graph(3);
        let far = graph.nodes()[2].id;
        let region: FxHashSet<NodeId> = [far].into_iter().collect();

        let tuning = AgentTuning::default();
        let leash = LeashTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let mut agent = Agent::new(Vec2::ZERO, &tuning);
        let mut input = input(&graph, None, &tuning, &leash);
        input.region = Some(&region);

        agent.update(DT, &input, &mut rng);
        assert_eq!(agent.ai_state(), AiState::Idle);

        let tick = agent.update(DT, &input, &mut rng);
        assert_eq!(tick.route, Some(RouteOutcome::Unconstrained));
        assert_eq!(agent.mode(), AgentMode::Patrolling);
    }
}
