//! Shortest-path search on the waypoint graph
//!
//! Cost-ordered best-first search (Dijkstra) between two node IDs, either over
//! the whole graph or restricted to an allowed node subset.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};

use super::graph::{NavGraph, NodeId};

/// Result of a route query
#[derive(Debug, Clone)]
pub struct Route {
    /// Node IDs from start to goal, inclusive
    pub nodes: Vec<NodeId>,
    /// Node positions from start to goal, inclusive
    pub waypoints: Vec<Vec2>,
    /// Summed edge cost
    pub cost: f32,
}

impl Route {
    /// Check if a route was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of waypoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }
}

impl Default for Route {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            waypoints: Vec::new(),
            cost: 0.0,
        }
    }
}

/// Frontier entry for the priority queue
#[derive(Debug, Clone, Copy)]
struct Frontier {
    node: NodeId,
    cost: f32,
    /// Insertion counter, breaks cost ties first-in first-out
    seq: u64,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find the cheapest route between two nodes over the whole graph.
///
/// Returns an empty route if either node is unknown or the goal is
/// unreachable.
#[must_use]
pub fn find_route(graph: &NavGraph, start: NodeId, goal: NodeId) -> Route {
    search(graph, start, goal, |_| true)
}

/// Find the cheapest route that only visits nodes in `allowed`.
///
/// Returns an empty route immediately if `start` or `goal` is not allowed.
#[must_use]
pub fn find_route_within(
    graph: &NavGraph,
    start: NodeId,
    goal: NodeId,
    allowed: &FxHashSet<NodeId>,
) -> Route {
    if !allowed.contains(&start) || !allowed.contains(&goal) {
        return Route::default();
    }
    search(graph, start, goal, |id| allowed.contains(&id))
}

fn search(graph: &NavGraph, start: NodeId, goal: NodeId, admit: impl Fn(NodeId) -> bool) -> Route {
    if !graph.contains(start) || !graph.contains(goal) {
        return Route::default();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: FxHashMap<NodeId, NodeId> = FxHashMap::default();
    let mut cost_so_far: FxHashMap<NodeId, f32> = FxHashMap::default();
    let mut seq = 0_u64;

    cost_so_far.insert(start, 0.0);
    open_set.push(Frontier {
        node: start,
        cost: 0.0,
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.node == goal {
            return reconstruct(graph, &came_from, start, goal, current.cost);
        }

        // Stale entry superseded by a cheaper one
        if current.cost > cost_so_far.get(&current.node).copied().unwrap_or(f32::MAX) {
            continue;
        }

        for (neighbor, edge_cost) in graph.neighbors(current.node) {
            if !admit(neighbor) {
                continue;
            }

            let tentative = current.cost + edge_cost;
            if tentative < cost_so_far.get(&neighbor).copied().unwrap_or(f32::MAX) {
                cost_so_far.insert(neighbor, tentative);
                came_from.insert(neighbor, current.node);
                seq += 1;
                open_set.push(Frontier {
                    node: neighbor,
                    cost: tentative,
                    seq,
                });
            }
        }
    }

    // No path found
    Route::default()
}

/// Walk predecessor links back from the goal.
fn reconstruct(
    graph: &NavGraph,
    came_from: &FxHashMap<NodeId, NodeId>,
    start: NodeId,
    goal: NodeId,
    cost: f32,
) -> Route {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(&prev) = came_from.get(&current) else {
            return Route::default();
        };
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();

    let mut waypoints = Vec::with_capacity(nodes.len());
    for &id in &nodes {
        let Some(position) = graph.position(id) else {
            log::warn!("Node {id} vanished during route reconstruction");
            return Route::default();
        };
        waypoints.push(position);
    }

    Route {
        nodes,
        waypoints,
        cost,
    }
}
