//! Headless demo: a small waypoint map with two spawners and a player
//! walking laps through it while swinging at nearby enemies.
//!
//! Run with `RUST_LOG=info` (or `debug`) to watch the simulation. An optional
//! first argument names a RON file with `SimConfig` overrides.

use std::f32::consts::TAU;

use waypoint_ai::prelude::*;

/// Simulated seconds per tick
const DT: f32 = 1.0 / 60.0;
/// Total ticks to run
const TICKS: u32 = 60 * 45;
/// Ticks between stat lines
const REPORT_EVERY: u32 = 60 * 5;
/// Player sword reach and damage
const SWING_RANGE: f32 = 28.0;
const SWING_DAMAGE: f32 = 12.0;

/// A 4x3 grid of waypoints 80 units apart, fully connected along rows and
/// columns, with spawners in two opposite corners.
fn build_map() -> MapData {
    let mut map = MapData::new("demo");
    let id = |col: u32, row: u32| row * 4 + col;

    for row in 0..3 {
        for col in 0..4 {
            map.nodes.push(NodeRecord {
                id: id(col, row),
                position: Vec2::new(col as f32 * 80.0, row as f32 * 80.0),
            });
            if col > 0 {
                map.paths.push(PathRecord {
                    a: id(col - 1, row),
                    b: id(col, row),
                    cost: None,
                });
            }
            if row > 0 {
                map.paths.push(PathRecord {
                    a: id(col, row - 1),
                    b: id(col, row),
                    cost: None,
                });
            }
        }
    }

    map.spawners.push(SpawnerDef {
        position: Vec2::new(20.0, 20.0),
        radius: 70.0,
        interval: 2.0,
        max_alive: 3,
    });
    map.spawners.push(SpawnerDef {
        position: Vec2::new(220.0, 140.0),
        radius: 90.0,
        interval: 3.0,
        max_alive: 4,
    });
    map
}

/// Demo state: the simulation plus the player's scripted walk
struct Demo {
    sim: Simulation,
    player: CharacterId,
    center: Vec2,
    swings: u32,
    kills: u32,
}

impl Demo {
    fn new(config: SimConfig, map: &MapData) -> Self {
        let mut sim = Simulation::new(config);
        sim.load_map(map);
        let center = Vec2::new(120.0, 80.0);
        let player = sim.add_character(center);
        Self {
            sim,
            player,
            center,
            swings: 0,
            kills: 0,
        }
    }

    /// Player position on an ellipse around the map center
    fn player_position(&self, tick: u32) -> Vec2 {
        let angle = tick as f32 * DT * TAU / 20.0;
        self.center + Vec2::new(angle.cos() * 140.0, angle.sin() * 70.0)
    }

    fn swing(&mut self) {
        let Some(origin) = self.sim.character(self.player).map(|c| c.position()) else {
            return;
        };
        let target = self
            .sim
            .agents()
            .map(|(handle, agent)| (handle, agent.position().distance(origin)))
            .filter(|(_, d)| *d <= SWING_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle);

        if let Some(handle) = target {
            self.swings += 1;
            if self.sim.on_agent_hit(handle, origin, SWING_DAMAGE) == Some(HitOutcome::Killed) {
                self.kills += 1;
            }
        }
    }

    fn run(&mut self) {
        for tick in 0..TICKS {
            let position = self.player_position(tick);
            self.sim.set_character_position(self.player, position);

            if tick % 30 == 0 {
                self.swing();
            }

            self.sim.tick(DT);

            for event in self.sim.drain_events() {
                if let SimEvent::ModeChanged { agent, from, to } = event {
                    log::trace!("{agent}: {from} -> {to}");
                }
            }

            if (tick + 1) % REPORT_EVERY == 0 {
                self.report();
            }
        }
    }

    fn report(&self) {
        log::info!("{}", self.sim.stats().format_stats());
        for (handle, agent) in self.sim.agents() {
            log::debug!(
                "  {handle} {} at {} hp {:.1} sprite {}",
                agent.mode(),
                agent.world_position(),
                agent.hp(),
                agent.sprite_key()
            );
        }
        if let Some(player) = self.sim.character(self.player) {
            log::info!(
                "Player hp {:.1}, {} swings, {} kills, {} agents alive",
                player.hp(),
                self.swings,
                self.kills,
                self.sim.agent_count()
            );
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {path}");
            SimConfig::from_ron_str(&std::fs::read_to_string(path)?)?
        }
        None => SimConfig::default(),
    };

    // Round-trip the map through its text form the way a host loads it
    let text = build_map().to_ron_string()?;
    let map = MapData::from_ron_str(&text)?;

    let mut demo = Demo::new(config, &map);
    demo.run();
    log::info!("Demo finished after {:.1}s simulated", demo.sim.stats().sim_time());
    Ok(())
}
