//! Spawn manager
//!
//! Spawners periodically create agents around an anchor point, up to a cap of
//! simultaneously alive agents. Each spawner tracks the handles of the agents
//! it owns; the manager is the only code that edits those sets.
//!
//! The first spawn of every spawner is delayed by a random fraction of its
//! interval so spawners authored with identical settings do not fire in
//! lockstep.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::arena::AgentHandle;
use crate::config::{LeashTuning, SpawnTuning};
use crate::nav::{NavGraph, NodeId, closest_point_on_any_path, leash_region};

/// Authored spawner settings, as stored in map data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnerDef {
    /// Anchor point; also the home of every agent it spawns
    pub position: Vec2,
    /// Spawn circle radius; also the leash radius of its agents
    pub radius: f32,
    /// Seconds between spawns
    pub interval: f32,
    /// Cap on simultaneously alive agents
    pub max_alive: usize,
}

/// Runtime state of one spawner.
#[derive(Debug, Clone)]
pub struct Spawner {
    def: SpawnerDef,
    timer: f32,
    /// Extra delay before the first spawn only
    jitter: f32,
    alive: FxHashSet<AgentHandle>,
    /// Nodes its agents may patrol through
    region: FxHashSet<NodeId>,
}

impl Spawner {
    fn new(def: SpawnerDef, jitter: f32) -> Self {
        Self {
            def,
            timer: 0.0,
            jitter,
            alive: FxHashSet::default(),
            region: FxHashSet::default(),
        }
    }

    /// Authored settings.
    #[must_use]
    pub fn def(&self) -> &SpawnerDef {
        &self.def
    }

    /// Agents currently owned.
    pub fn alive(&self) -> impl Iterator<Item = AgentHandle> + '_ {
        self.alive.iter().copied()
    }

    /// Number of agents currently owned.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Whether `handle` is owned by this spawner.
    #[must_use]
    pub fn owns(&self, handle: AgentHandle) -> bool {
        self.alive.contains(&handle)
    }

    /// Whether the alive cap has been reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.alive.len() >= self.def.max_alive
    }

    /// Patrol region of its agents. Empty when no node lies near the anchor.
    #[must_use]
    pub fn region(&self) -> &FxHashSet<NodeId> {
        &self.region
    }

    /// Seconds accumulated towards the next spawn.
    #[must_use]
    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Whether the first-spawn delay is still pending.
    #[must_use]
    pub fn has_jitter(&self) -> bool {
        self.jitter > 0.0
    }

    fn interval(&self, fallback: f32) -> f32 {
        if self.def.interval > 0.0 {
            self.def.interval
        } else {
            fallback
        }
    }
}

/// Owner of every spawner in a simulation.
#[derive(Debug, Clone)]
pub struct SpawnManager {
    spawners: Vec<Spawner>,
    tuning: SpawnTuning,
    /// Region nodes must lie within `radius * soft_multiplier` of the anchor
    soft_multiplier: f32,
}

impl SpawnManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new(tuning: SpawnTuning, leash: &LeashTuning) -> Self {
        Self {
            spawners: Vec::new(),
            tuning,
            soft_multiplier: leash.soft_multiplier,
        }
    }

    /// Add a spawner and return its index.
    pub fn add(&mut self, def: SpawnerDef, graph: &NavGraph, rng: &mut impl Rng) -> usize {
        let interval = if def.interval > 0.0 {
            def.interval
        } else {
            self.tuning.interval_fallback
        };
        let jitter = rng.gen_range(0.0..1.0_f32) * interval;
        let mut spawner = Spawner::new(def, jitter);
        spawner.region = self.region_for(&def, graph);

        let index = self.spawners.len();
        log::debug!(
            "Spawner {index} at {} (radius {}, max {}), {} region nodes",
            def.position,
            def.radius,
            def.max_alive,
            spawner.region.len()
        );
        self.spawners.push(spawner);
        index
    }

    /// Recompute every patrol region after the graph changed.
    pub fn rebuild_regions(&mut self, graph: &NavGraph) {
        for index in 0..self.spawners.len() {
            let def = self.spawners[index].def;
            self.spawners[index].region = self.region_for(&def, graph);
        }
    }

    fn region_for(&self, def: &SpawnerDef, graph: &NavGraph) -> FxHashSet<NodeId> {
        leash_region(
            graph,
            def.position,
            self.tuning.region_hops,
            def.radius * self.soft_multiplier,
        )
    }

    /// Remove every spawner.
    pub fn clear(&mut self) {
        self.spawners.clear();
    }

    /// Spawner at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Spawner> {
        self.spawners.get(index)
    }

    /// All spawners in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Spawner> {
        self.spawners.iter()
    }

    /// Number of spawners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spawners.len()
    }

    /// Whether there are no spawners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spawners.is_empty()
    }

    // -------------------------------------------------------------------------
    // Live sets
    // -------------------------------------------------------------------------

    /// Record `handle` as owned by spawner `index`.
    ///
    /// Returns `false` (and records nothing) for an unknown index or a full
    /// spawner.
    pub fn register(&mut self, index: usize, handle: AgentHandle) -> bool {
        match self.spawners.get_mut(index) {
            Some(spawner) if !spawner.is_full() => spawner.alive.insert(handle),
            _ => false,
        }
    }

    /// Drop `handle` from spawner `index`. Returns whether it was owned.
    pub fn release(&mut self, index: usize, handle: AgentHandle) -> bool {
        self.spawners
            .get_mut(index)
            .is_some_and(|spawner| spawner.alive.remove(&handle))
    }

    /// Drop every owned handle for which `is_alive` is false. Returns how many
    /// were dropped.
    pub fn prune(&mut self, is_alive: impl Fn(AgentHandle) -> bool) -> usize {
        let mut pruned = 0;
        for spawner in &mut self.spawners {
            let before = spawner.alive.len();
            spawner.alive.retain(|handle| is_alive(*handle));
            pruned += before - spawner.alive.len();
        }
        pruned
    }

    // -------------------------------------------------------------------------
    // Timing
    // -------------------------------------------------------------------------

    /// Advance every timer by `dt` and return the spawners that should spawn
    /// now. Their timers restart and their first-spawn jitter is consumed.
    pub fn advance(&mut self, dt: f32) -> Vec<usize> {
        let fallback = self.tuning.interval_fallback;
        let mut due = Vec::new();
        for (index, spawner) in self.spawners.iter_mut().enumerate() {
            spawner.timer += dt;
            let threshold = spawner.interval(fallback) + spawner.jitter;
            if !spawner.is_full() && spawner.timer >= threshold {
                spawner.timer = 0.0;
                spawner.jitter = 0.0;
                due.push(index);
            }
        }
        due
    }

    /// Pick a spawn position for spawner `index`.
    ///
    /// Samples uniformly over the spawn circle, then snaps onto the path
    /// network when the nearest path point is within
    /// `radius * snap_slack`. A non-positive radius spawns at the anchor.
    pub fn spawn_point(&self, index: usize, graph: &NavGraph, rng: &mut impl Rng) -> Option<Vec2> {
        let def = self.spawners.get(index)?.def;
        if def.radius <= 0.0 {
            return Some(def.position);
        }

        let sampled = sample_in_circle(def.position, def.radius, rng);
        match closest_point_on_any_path(graph, sampled) {
            Some((snapped, distance)) if distance < def.radius * self.tuning.snap_slack => {
                Some(snapped)
            }
            _ => Some(sampled),
        }
    }
}

/// Area-uniform random point inside a circle.
pub fn sample_in_circle(center: Vec2, radius: f32, rng: &mut impl Rng) -> Vec2 {
    let u: f32 = rng.gen_range(0.0..1.0);
    let r = radius * u.sqrt();
    let theta = rng.gen_range(0.0..TAU);
    center + Vec2::from_angle(theta) * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Arena;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn def(interval: f32, max_alive: usize) -> SpawnerDef {
        SpawnerDef {
            position: Vec2::ZERO,
            radius: 40.0,
            interval,
            max_alive,
        }
    }

    fn manager() -> SpawnManager {
        SpawnManager::new(SpawnTuning::default(), &LeashTuning::default())
    }

    #[test]
    fn test_first_spawn_waits_for_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut spawns = manager();
        let graph = NavGraph::new();
        spawns.add(def(2.0, 5), &graph, &mut rng);
        let jitter = spawns.get(0).unwrap().jitter;
        assert!((0.0..2.0).contains(&jitter));

        // Interval alone is not enough while jitter is pending
        let mut elapsed = 0.0;
        let mut fired_at = None;
        for _ in 0..400 {
            elapsed += 0.01;
            if !spawns.advance(0.01).is_empty() {
                fired_at = Some(elapsed);
                break;
            }
        }
        let fired_at = fired_at.unwrap();
        assert!(fired_at >= 2.0 + jitter - 0.02);
        assert!(!spawns.get(0).unwrap().has_jitter());

        // Later spawns follow the plain interval
        let ticks = (0..400).position(|_| !spawns.advance(0.01).is_empty()).unwrap();
        assert!((ticks as f32 * 0.01 - 2.0).abs() < 0.03);
    }

    #[test]
    fn test_non_positive_interval_uses_fallback() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut spawns = manager();
        spawns.add(def(0.0, 5), &NavGraph::new(), &mut rng);

        let fallback = SpawnTuning::default().interval_fallback;
        let mut fired = 0;
        for _ in 0..100 {
            fired += spawns.advance(fallback / 10.0).len();
        }
        assert!((4..=10).contains(&fired), "fired {fired} times");
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut spawns = manager();
        spawns.add(def(0.1, 2), &NavGraph::new(), &mut rng);
        let mut arena = Arena::new();

        let mut owned = Vec::new();
        for _ in 0..200 {
            for index in spawns.advance(0.05) {
                let handle = arena.insert(());
                assert!(spawns.register(index, handle));
                owned.push(handle);
            }
            assert!(spawns.get(0).unwrap().alive_count() <= 2);
        }
        assert_eq!(owned.len(), 2);

        let extra = arena.insert(());
        assert!(!spawns.register(0, extra), "full spawner rejects");
        assert!(!spawns.register(7, extra), "unknown index rejects");

        // Freeing a slot lets the timer spawn again
        arena.remove(owned[0]);
        assert_eq!(spawns.prune(|h| arena.contains(h)), 1);
        assert!(!spawns.get(0).unwrap().owns(owned[0]));
        assert!(!spawns.advance(0.2).is_empty());
    }

    #[test]
    fn test_release() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut spawns = manager();
        spawns.add(def(1.0, 3), &NavGraph::new(), &mut rng);
        let handle = Arena::new().insert(());

        assert!(spawns.register(0, handle));
        assert!(spawns.release(0, handle));
        assert!(!spawns.release(0, handle));
        assert!(!spawns.release(9, handle));
    }

    #[test]
    fn test_circle_sampling_is_area_uniform() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let samples = 4000;
        let mut inner = 0;
        for _ in 0..samples {
            let p = sample_in_circle(Vec2::new(3.0, 3.0), 10.0, &mut rng);
            let d = p.distance(Vec2::new(3.0, 3.0));
            assert!(d <= 10.0 + 1e-4);
            if d < 5.0 {
                inner += 1;
            }
        }
        // Inner half radius covers a quarter of the area
        let fraction = inner as f32 / samples as f32;
        assert!((fraction - 0.25).abs() < 0.03, "inner fraction {fraction}");
    }

    #[test]
    fn test_spawn_point_snaps_to_network() {
        let mut graph = NavGraph::new();
        let a = graph.add_node(Vec2::new(-100.0, 2.0)).unwrap();
        let b = graph.add_node(Vec2::new(100.0, 2.0)).unwrap();
        graph.add_edge_euclidean(a, b).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut spawns = manager();
        let index = spawns.add(def(1.0, 1), &graph, &mut rng);

        for _ in 0..50 {
            let p = spawns.spawn_point(index, &graph, &mut rng).unwrap();
            assert!((p.y - 2.0).abs() < 1e-4, "not snapped: {p}");
        }
        assert!(spawns.spawn_point(3, &graph, &mut rng).is_none());
    }

    #[test]
    fn test_zero_radius_spawns_at_anchor() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut spawns = manager();
        let anchor = Vec2::new(12.0, -4.0);
        spawns.add(
            SpawnerDef {
                position: anchor,
                radius: 0.0,
                interval: 1.0,
                max_alive: 1,
            },
            &NavGraph::new(),
            &mut rng,
        );
        assert_eq!(spawns.spawn_point(0, &NavGraph::new(), &mut rng), Some(anchor));
    }

    #[test]
    fn test_region_limited_to_leash() {
        let mut graph = NavGraph::new();
        let near = graph.add_node(Vec2::new(10.0, 0.0)).unwrap();
        let far = graph.add_node(Vec2::new(200.0, 0.0)).unwrap();
        graph.add_edge_euclidean(near, far).unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut spawns = manager();
        spawns.add(def(1.0, 1), &graph, &mut rng);
        let region = spawns.get(0).unwrap().region();
        assert!(region.contains(&near));
        assert!(!region.contains(&far));

        graph.remove_node(near);
        spawns.rebuild_regions(&graph);
        assert!(spawns.get(0).unwrap().region().is_empty());
    }
}
