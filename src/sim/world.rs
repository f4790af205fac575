//! Simulation context
//!
//! [`Simulation`] owns everything one running map needs: the navigation
//! graph, agents, characters, spawners, the RNG, the event queue and tick
//! statistics. Independent simulations share nothing, so tests can run as
//! many as they like side by side.
//!
//! # Tick order
//!
//! 1. Every live agent runs its state machine.
//! 2. Contact damage between agents and characters.
//! 3. Dead agents are removed and released from their spawners.
//! 4. Spawners prune, accumulate time and spawn.
//! 5. Events raised during the tick are published.
//!
//! # Example
//!
//! ```ignore
//! let mut sim = Simulation::new(SimConfig::default());
//! sim.load_map(&MapData::from_ron_str(&text)?);
//! let player = sim.add_character(Vec2::new(100.0, 40.0));
//!
//! loop {
//!     sim.set_character_position(player, input_position());
//!     sim.tick(1.0 / 60.0);
//!     for (_, agent) in sim.agents() {
//!         draw(agent.world_position(), agent.sprite_key());
//!     }
//! }
//! ```

use std::time::Instant;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::arena::{AgentHandle, Arena};
use super::character::{Character, CharacterId, boxes_overlap};
use super::events::{EventLog, SimEvent};
use super::spawner::{SpawnManager, Spawner, SpawnerDef};
use super::stats::TickStats;
use crate::ai::{Agent, AgentInput, HitOutcome, SpawnTag};
use crate::config::SimConfig;
use crate::map::MapData;
use crate::nav::{LoadSummary, NavGraph, NodeId};

/// A running simulation.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    graph: NavGraph,
    agents: Arena<Agent>,
    characters: Vec<Character>,
    spawns: SpawnManager,
    rng: ChaCha8Rng,
    events: EventLog,
    stats: TickStats,
}

impl Simulation {
    /// Create an empty simulation.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            graph: NavGraph::new(),
            agents: Arena::new(),
            characters: Vec::new(),
            spawns: SpawnManager::new(config.spawn, &config.leash),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            events: EventLog::new(),
            stats: TickStats::new(),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    // =========================================================================
    // Map
    // =========================================================================

    /// Navigation graph.
    #[must_use]
    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// Mutate the graph (editor operations). Spawner regions are rebuilt
    /// afterwards.
    pub fn edit_graph<R>(&mut self, edit: impl FnOnce(&mut NavGraph) -> R) -> R {
        let result = edit(&mut self.graph);
        self.spawns.rebuild_regions(&self.graph);
        result
    }

    /// Replace the graph with persisted nodes and edges.
    pub fn load_graph(
        &mut self,
        nodes: impl IntoIterator<Item = (NodeId, Vec2)>,
        edges: impl IntoIterator<Item = (NodeId, NodeId, f32)>,
    ) -> LoadSummary {
        let summary = self.graph.load(nodes, edges);
        self.spawns.rebuild_regions(&self.graph);
        summary
    }

    /// Replace graph, spawners and agents with the contents of `map`.
    /// Characters are kept.
    pub fn load_map(&mut self, map: &MapData) -> LoadSummary {
        self.agents.clear();
        self.spawns.clear();
        let summary = self.graph.load(map.node_entries(), map.path_entries());
        for def in &map.spawners {
            self.spawns.add(*def, &self.graph, &mut self.rng);
        }
        log::info!(
            "Loaded map '{}' with {} spawners",
            map.name,
            self.spawns.len()
        );
        summary
    }

    // =========================================================================
    // Agents
    // =========================================================================

    /// Place a free agent (no spawner, no leash).
    pub fn spawn_agent(&mut self, position: Vec2) -> AgentHandle {
        let handle = self.agents.insert(Agent::new(position, &self.config.agent));
        self.on_spawned(handle, position, None);
        handle
    }

    /// Spawn an agent from spawner `index`.
    ///
    /// Returns `None` for an unknown index or a spawner at capacity.
    pub fn spawn_agent_from_spawner(&mut self, index: usize) -> Option<AgentHandle> {
        let spawner = self.spawns.get(index)?;
        if spawner.is_full() {
            return None;
        }
        let def = *spawner.def();
        let position = self.spawns.spawn_point(index, &self.graph, &mut self.rng)?;

        let agent = Agent::new(position, &self.config.agent).with_spawn_tag(SpawnTag {
            home: def.position,
            leash_radius: def.radius,
            spawner: index,
        });
        let handle = self.agents.insert(agent);
        if !self.spawns.register(index, handle) {
            self.agents.remove(handle);
            return None;
        }
        self.on_spawned(handle, position, Some(index));
        Some(handle)
    }

    fn on_spawned(&mut self, handle: AgentHandle, position: Vec2, spawner: Option<usize>) {
        log::debug!("Spawned agent {handle} at {position}");
        self.stats.record_spawn();
        self.events.record(SimEvent::AgentSpawned {
            agent: handle,
            position,
            spawner,
        });
    }

    /// Remove an agent without killing it. Returns `false` for a stale handle.
    pub fn despawn_agent(&mut self, handle: AgentHandle) -> bool {
        let Some(agent) = self.agents.remove(handle) else {
            return false;
        };
        if let Some(tag) = agent.spawn_tag() {
            self.spawns.release(tag.spawner, handle);
        }
        self.events.record(SimEvent::AgentDespawned { agent: handle });
        true
    }

    /// Apply a hit from the combat collaborator: damage, hit flash and
    /// knockback away from `attacker`. An agent killed by the hit is removed
    /// immediately.
    ///
    /// Returns `None` for a stale handle.
    pub fn on_agent_hit(
        &mut self,
        handle: AgentHandle,
        attacker: Vec2,
        damage: f32,
    ) -> Option<HitOutcome> {
        let agent = self.agents.get_mut(handle)?;
        let outcome = agent.apply_hit(attacker, damage, &self.config.agent);
        if outcome != HitOutcome::Ignored {
            self.events.record(SimEvent::AgentDamaged {
                agent: handle,
                amount: damage,
                attacker: Some(attacker),
            });
        }
        if outcome == HitOutcome::Killed {
            self.reap(handle);
        }
        Some(outcome)
    }

    /// Agent behind `handle`, if still alive.
    #[must_use]
    pub fn agent(&self, handle: AgentHandle) -> Option<&Agent> {
        self.agents.get(handle)
    }

    /// Every live agent.
    pub fn agents(&self) -> impl Iterator<Item = (AgentHandle, &Agent)> {
        self.agents.iter()
    }

    /// Number of live agents.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Remove a dead agent and release it from its spawner.
    fn reap(&mut self, handle: AgentHandle) {
        let Some(agent) = self.agents.remove(handle) else {
            return;
        };
        let spawner = agent.spawn_tag().map(|tag| tag.spawner);
        if let Some(index) = spawner {
            self.spawns.release(index, handle);
        }
        log::debug!("Agent {handle} died at {}", agent.position());
        self.stats.record_death();
        self.events.record(SimEvent::AgentDied {
            agent: handle,
            position: agent.position(),
            spawner,
        });
    }

    // =========================================================================
    // Characters
    // =========================================================================

    /// Add a character at `position` with full health.
    pub fn add_character(&mut self, position: Vec2) -> CharacterId {
        let combat = &self.config.combat;
        self.characters.push(Character::new(
            position,
            combat.character_max_hp,
            combat.character_half_extent,
        ));
        CharacterId(self.characters.len() - 1)
    }

    /// Move a character. Returns `false` for an unknown ID.
    pub fn set_character_position(&mut self, id: CharacterId, position: Vec2) -> bool {
        match self.characters.get_mut(id.0) {
            Some(character) => {
                character.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Character behind `id`.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(id.0)
    }

    /// Every character.
    pub fn characters(&self) -> impl Iterator<Item = (CharacterId, &Character)> {
        self.characters
            .iter()
            .enumerate()
            .map(|(index, character)| (CharacterId(index), character))
    }

    /// Position of the nearest living character.
    fn nearest_character(characters: &[Character], from: Vec2) -> Option<Vec2> {
        characters
            .iter()
            .filter(|character| character.is_alive())
            .map(Character::position)
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    }

    // =========================================================================
    // Spawners
    // =========================================================================

    /// Add a spawner and return its index.
    pub fn add_spawner(&mut self, def: SpawnerDef) -> usize {
        self.spawns.add(def, &self.graph, &mut self.rng)
    }

    /// Spawner at `index`.
    #[must_use]
    pub fn spawner(&self, index: usize) -> Option<&Spawner> {
        self.spawns.get(index)
    }

    /// Every spawner in index order.
    pub fn spawners(&self) -> impl Iterator<Item = &Spawner> {
        self.spawns.iter()
    }

    // =========================================================================
    // Events & Stats
    // =========================================================================

    /// Events published by the last tick.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take the events published by the last tick.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.events.drain()
    }

    /// Tick statistics.
    #[must_use]
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance the simulation by `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` is ignored.
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            log::debug!("Ignoring tick with dt {dt}");
            return;
        }
        let started = Instant::now();
        let handles = self.agents.handles();

        self.update_agents(&handles, dt);
        self.resolve_contacts(&handles, dt);

        for handle in handles {
            if self.agents.get(handle).is_some_and(Agent::is_dead) {
                self.reap(handle);
            }
        }

        let agents = &self.agents;
        self.spawns
            .prune(|handle| agents.get(handle).is_some_and(|agent| !agent.is_dead()));
        for index in self.spawns.advance(dt) {
            self.spawn_agent_from_spawner(index);
        }

        self.stats.record_tick(dt, started.elapsed());
        self.events.publish(self.stats.total_ticks());
    }

    fn update_agents(&mut self, handles: &[AgentHandle], dt: f32) {
        for &handle in handles {
            let Some(agent) = self.agents.get_mut(handle) else {
                continue;
            };
            let region = agent
                .spawn_tag()
                .and_then(|tag| self.spawns.get(tag.spawner))
                .map(Spawner::region)
                .filter(|region| !region.is_empty());
            let input = AgentInput {
                graph: &self.graph,
                region,
                target: Self::nearest_character(&self.characters, agent.position()),
                tuning: &self.config.agent,
                leash: &self.config.leash,
            };

            let tick = agent.update(dt, &input, &mut self.rng);

            if let Some(outcome) = tick.route {
                self.stats.record_route(outcome);
            }
            if let Some((from, to)) = tick.transition {
                self.events.record(SimEvent::ModeChanged {
                    agent: handle,
                    from,
                    to,
                });
            }
        }
    }

    /// Overlapping agents and characters hurt each other. Only the character
    /// is pushed back.
    fn resolve_contacts(&mut self, handles: &[AgentHandle], dt: f32) {
        let combat = self.config.combat;
        let agent_half = self.config.agent.half_extent;

        for &handle in handles {
            let Some(agent) = self.agents.get_mut(handle) else {
                continue;
            };
            for (index, character) in self.characters.iter_mut().enumerate() {
                if agent.is_dead() {
                    break;
                }
                if !character.is_alive()
                    || !boxes_overlap(
                        agent.position(),
                        agent_half,
                        character.position(),
                        character.half_extent(),
                    )
                {
                    continue;
                }

                let to_character = combat.character_contact_dps * dt;
                let to_agent = combat.agent_contact_dps * dt;
                character.hurt(to_character, agent.position(), combat.character_push);
                agent.take_damage(to_agent);

                self.events.record(SimEvent::CharacterDamaged {
                    character: CharacterId(index),
                    amount: to_character,
                    agent: handle,
                });
                self.events.record(SimEvent::AgentDamaged {
                    agent: handle,
                    amount: to_agent,
                    attacker: None,
                });
            }
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

// ============================================================================
// Tests
// ============================================================================
