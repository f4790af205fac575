//! Tick statistics

use std::collections::VecDeque;
use std::time::Duration;

use crate::ai::RouteOutcome;

/// Rolling tick timings plus lifetime counters
#[derive(Debug, Clone)]
pub struct TickStats {
    /// Wall-clock cost of recent ticks
    tick_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    avg_tick_time_ms: f32,
    min_tick_time_ms: f32,
    max_tick_time_ms: f32,
    /// Total ticks simulated
    total_ticks: u64,
    /// Simulated seconds
    sim_time: f64,
    spawns: u64,
    deaths: u64,
    route_requests: u64,
    route_fallbacks: u64,
    route_failures: u64,
}

impl TickStats {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            tick_times: VecDeque::with_capacity(120),
            max_samples: 120,
            avg_tick_time_ms: 0.0,
            min_tick_time_ms: 0.0,
            max_tick_time_ms: 0.0,
            total_ticks: 0,
            sim_time: 0.0,
            spawns: 0,
            deaths: 0,
            route_requests: 0,
            route_fallbacks: 0,
            route_failures: 0,
        }
    }

    /// Record a completed tick of `dt` simulated seconds that took `elapsed`
    pub fn record_tick(&mut self, dt: f32, elapsed: Duration) {
        self.total_ticks += 1;
        self.sim_time += f64::from(dt);

        if self.tick_times.len() >= self.max_samples {
            self.tick_times.pop_front();
        }
        self.tick_times.push_back(elapsed);

        self.update_timings();
    }

    fn update_timings(&mut self) {
        if self.tick_times.is_empty() {
            return;
        }

        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for &t in &self.tick_times {
            total += t;
            min = min.min(t);
            max = max.max(t);
        }

        let count = self.tick_times.len() as f32;
        self.avg_tick_time_ms = total.as_secs_f32() / count * 1000.0;
        self.min_tick_time_ms = min.as_secs_f32() * 1000.0;
        self.max_tick_time_ms = max.as_secs_f32() * 1000.0;
    }

    /// Count a spawned agent
    pub fn record_spawn(&mut self) {
        self.spawns += 1;
    }

    /// Count a dead agent
    pub fn record_death(&mut self) {
        self.deaths += 1;
    }

    /// Count a patrol route request by outcome
    pub fn record_route(&mut self, outcome: RouteOutcome) {
        self.route_requests += 1;
        match outcome {
            RouteOutcome::Fallback => self.route_fallbacks += 1,
            RouteOutcome::Failed => self.route_failures += 1,
            RouteOutcome::Constrained | RouteOutcome::Unconstrained => {}
        }
    }

    /// Average tick time in milliseconds
    pub fn avg_tick_time_ms(&self) -> f32 {
        self.avg_tick_time_ms
    }

    /// Fastest recent tick in milliseconds
    pub fn min_tick_time_ms(&self) -> f32 {
        self.min_tick_time_ms
    }

    /// Slowest recent tick in milliseconds
    pub fn max_tick_time_ms(&self) -> f32 {
        self.max_tick_time_ms
    }

    /// Total ticks simulated
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Simulated seconds
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Agents spawned so far
    pub fn spawns(&self) -> u64 {
        self.spawns
    }

    /// Agents died so far
    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    /// Patrol route requests so far
    pub fn route_requests(&self) -> u64 {
        self.route_requests
    }

    /// Requests that needed the unconstrained fallback
    pub fn route_fallbacks(&self) -> u64 {
        self.route_fallbacks
    }

    /// Requests where no route was found
    pub fn route_failures(&self) -> u64 {
        self.route_failures
    }

    /// One-line summary
    pub fn format_stats(&self) -> String {
        format!(
            "Tick {} ({:.1}s) | {:.3}ms (min: {:.3}, max: {:.3}) | spawns {} deaths {} | routes {} (fallback {}, failed {})",
            self.total_ticks,
            self.sim_time,
            self.avg_tick_time_ms,
            self.min_tick_time_ms,
            self.max_tick_time_ms,
            self.spawns,
            self.deaths,
            self.route_requests,
            self.route_fallbacks,
            self.route_failures
        )
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}
