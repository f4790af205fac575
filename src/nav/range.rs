//! Hop-bounded range queries
//!
//! Breadth-first exploration of the waypoint graph with a hop budget. Used to
//! pick random patrol destinations near an agent and to build the node subset
//! a spawner's agents are allowed to route through.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rustc_hash::FxHashSet;

use super::geometry::closest_node;
use super::graph::{Edge, NavGraph, NodeId};

/// Nodes reachable from `start` in at most `max_hops` edge traversals.
///
/// The start node itself is included (zero hops). An unknown start yields an
/// empty set.
#[must_use]
pub fn reachable_nodes(graph: &NavGraph, start: NodeId, max_hops: u32) -> FxHashSet<NodeId> {
    let mut visited = FxHashSet::default();
    if !graph.contains(start) {
        return visited;
    }

    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0_u32));

    while let Some((current, hops)) = queue.pop_front() {
        if hops >= max_hops {
            continue;
        }
        for (neighbor, _) in graph.neighbors(current) {
            if visited.insert(neighbor) {
                queue.push_back((neighbor, hops + 1));
            }
        }
    }

    visited
}

/// A uniformly random point on a random edge near `start`.
///
/// Candidate edges are those with both endpoints within `max_hops` of
/// `start`. Falls back to the start node's own position when no edge
/// qualifies. Returns `None` only if `start` is not in the graph.
#[must_use]
pub fn random_reachable_point(
    graph: &NavGraph,
    start: NodeId,
    max_hops: u32,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    random_reachable_point_within(graph, start, max_hops, None, rng)
}

/// Like [`random_reachable_point`], but only edges whose endpoints are both
/// in `allowed` are candidates.
#[must_use]
pub fn random_reachable_point_within(
    graph: &NavGraph,
    start: NodeId,
    max_hops: u32,
    allowed: Option<&FxHashSet<NodeId>>,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    let origin = graph.position(start)?;
    let reachable = reachable_nodes(graph, start, max_hops);
    let admits = |id: &NodeId| reachable.contains(id) && allowed.is_none_or(|set| set.contains(id));

    let candidates: Vec<&Edge> = graph
        .edges()
        .iter()
        .filter(|edge| admits(&edge.a) && admits(&edge.b))
        .collect();

    if candidates.is_empty() {
        return Some(origin);
    }

    let edge = candidates[rng.gen_range(0..candidates.len())];
    let (Some(a), Some(b)) = (graph.position(edge.a), graph.position(edge.b)) else {
        return Some(origin);
    };
    let t: f32 = rng.gen_range(0.0..1.0);
    Some(a.lerp(b, t))
}

/// Node subset that agents owned by a spawner at `anchor` may route through.
///
/// Explores `max_hops` from the node nearest the anchor and keeps only nodes
/// within `max_distance` of the anchor. Empty for an empty graph.
#[must_use]
pub fn leash_region(
    graph: &NavGraph,
    anchor: Vec2,
    max_hops: u32,
    max_distance: f32,
) -> FxHashSet<NodeId> {
    let Some(start) = closest_node(graph, anchor) else {
        return FxHashSet::default();
    };
    let mut region = reachable_nodes(graph, start.id, max_hops);
    region.retain(|id| {
        graph
            .position(*id)
            .is_some_and(|pos| pos.distance(anchor) <= max_distance)
    });
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// A chain 0 - 1 - 2 - 3 - 4 spaced 10 units apart, plus a detached node.
    fn chain() -> (NavGraph, Vec<NodeId>, NodeId) {
        let mut graph = NavGraph::new();
        let ids: Vec<NodeId> = (0..5)
            .map(|i| graph.add_node(Vec2::new(i as f32 * 10.0, 0.0)).unwrap())
            .collect();
        for pair in ids.windows(2) {
            graph.add_edge_euclidean(pair[0], pair[1]).unwrap();
        }
        let island = graph.add_node(Vec2::new(0.0, 500.0)).unwrap();
        (graph, ids, island)
    }

    /// Hop distances by brute-force relaxation, for comparison.
    fn hop_counts(graph: &NavGraph, start: NodeId) -> Vec<(NodeId, Option<u32>)> {
        let mut dist: Vec<(NodeId, Option<u32>)> = graph
            .nodes()
            .iter()
            .map(|n| (n.id, (n.id == start).then_some(0)))
            .collect();
        for _ in 0..graph.node_count() {
            for edge in graph.edges() {
                let da = dist.iter().find(|(id, _)| *id == edge.a).and_then(|(_, d)| *d);
                let db = dist.iter().find(|(id, _)| *id == edge.b).and_then(|(_, d)| *d);
                for (id, d) in dist.iter_mut() {
                    let via = if *id == edge.a {
                        db
                    } else if *id == edge.b {
                        da
                    } else {
                        None
                    };
                    if let Some(v) = via {
                        *d = Some(d.map_or(v + 1, |cur| cur.min(v + 1)));
                    }
                }
            }
        }
        dist
    }

    #[test]
    fn test_reachable_respects_hop_bound() {
        let (mut graph, ids, _) = chain();
        // Shortcut so hop counts differ from chain order
        graph.add_edge_euclidean(ids[0], ids[3]).unwrap();

        for k in 0..5 {
            let reach = reachable_nodes(&graph, ids[0], k);
            for (id, hops) in hop_counts(&graph, ids[0]) {
                let expected = hops.is_some_and(|h| h <= k);
                assert_eq!(reach.contains(&id), expected, "node {id} at k={k}");
            }
        }
    }

    #[test]
    fn test_reachable_zero_hops_and_unknown_start() {
        let (graph, ids, _) = chain();
        let reach = reachable_nodes(&graph, ids[2], 0);
        assert_eq!(reach.len(), 1);
        assert!(reach.contains(&ids[2]));

        assert!(reachable_nodes(&graph, NodeId(999), 3).is_empty());
    }

    #[test]
    fn test_random_point_lies_on_reachable_edge() {
        let (graph, ids, _) = chain();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..50 {
            let p = random_reachable_point(&graph, ids[0], 2, &mut rng).unwrap();
            assert!(p.y.abs() < 1e-5);
            assert!((0.0..=20.0).contains(&p.x), "point {p} beyond two hops");
        }
    }

    #[test]
    fn test_random_point_falls_back_to_start() {
        let (graph, _, island) = chain();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            random_reachable_point(&graph, island, 4, &mut rng),
            Some(Vec2::new(0.0, 500.0))
        );
        assert_eq!(random_reachable_point(&graph, NodeId(999), 4, &mut rng), None);
    }

    #[test]
    fn test_random_point_within_allowed_subset() {
        let (graph, ids, _) = chain();
        let allowed: FxHashSet<NodeId> = [ids[1], ids[2]].into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..20 {
            let p = random_reachable_point_within(&graph, ids[0], 4, Some(&allowed), &mut rng)
                .unwrap();
            assert!((10.0..=20.0).contains(&p.x));
        }
    }

    #[test]
    fn test_leash_region_filters_by_distance() {
        let (graph, ids, _) = chain();
        let region = leash_region(&graph, Vec2::new(2.0, 0.0), 10, 15.0);
        assert!(region.contains(&ids[0]));
        assert!(region.contains(&ids[1]));
        assert!(!region.contains(&ids[2]));

        assert!(leash_region(&NavGraph::new(), Vec2::ZERO, 3, 10.0).is_empty());
    }
}
