//! Geometric queries against the waypoint graph
//!
//! Closest-point projection onto path segments and nearest-node lookup.
//! These are what an off-graph agent uses to find where to re-join the
//! path network.

use glam::Vec2;

use super::graph::{NavGraph, Node};

/// Segments shorter than this (squared length) are treated as a point.
const DEGENERATE_LENGTH_SQ: f32 = 1e-12;

/// Euclidean distance between two points.
#[must_use]
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Project `target` onto the segment `a`-`b`.
///
/// Uses the clamped scalar projection, so the result always lies on the
/// segment. A zero-length segment yields `a`.
#[must_use]
pub fn closest_point_on_segment(target: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= DEGENERATE_LENGTH_SQ {
        return a;
    }
    let t = ((target - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Node nearest to `target` by straight-line distance.
///
/// Returns `None` for an empty graph. Ties keep the earliest inserted node.
#[must_use]
pub fn closest_node(graph: &NavGraph, target: Vec2) -> Option<&Node> {
    let mut best: Option<(&Node, f32)> = None;
    for node in graph.nodes() {
        let d = node.position.distance_squared(target);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((node, d));
        }
    }
    best.map(|(node, _)| node)
}

/// Closest point on any path segment, with its distance from `target`.
///
/// Returns `None` when the graph has no edges.
#[must_use]
pub fn closest_point_on_any_path(graph: &NavGraph, target: Vec2) -> Option<(Vec2, f32)> {
    let mut best: Option<(Vec2, f32)> = None;
    for edge in graph.edges() {
        let (Some(a), Some(b)) = (graph.position(edge.a), graph.position(edge.b)) else {
            continue;
        };
        let point = closest_point_on_segment(target, a, b);
        let d = distance(target, point);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((point, d));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_projection_inside_segment() {
        let p = closest_point_on_segment(
            Vec2::new(5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
        );
        assert!(approx(p, Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_projection_clamps_to_endpoints() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!(approx(closest_point_on_segment(Vec2::new(-5.0, 5.0), a, b), a));
        assert!(approx(closest_point_on_segment(Vec2::new(25.0, -3.0), a, b), b));
    }

    #[test]
    fn test_degenerate_segment() {
        let a = Vec2::new(3.0, 4.0);
        let p = closest_point_on_segment(Vec2::new(100.0, 100.0), a, a);
        assert_eq!(p, a);
        assert!(p.is_finite());
    }

    #[test]
    fn test_closest_node() {
        let mut graph = NavGraph::new();
        assert!(closest_node(&graph, Vec2::ZERO).is_none());

        graph.add_node(Vec2::new(0.0, 0.0)).unwrap();
        let far = graph.add_node(Vec2::new(50.0, 0.0)).unwrap();
        let near = closest_node(&graph, Vec2::new(40.0, 3.0)).unwrap();
        assert_eq!(near.id, far);
    }

    #[test]
    fn test_closest_point_on_any_path() {
        let mut graph = NavGraph::new();
        assert!(closest_point_on_any_path(&graph, Vec2::ZERO).is_none());

        let a = graph.add_node(Vec2::new(0.0, 0.0)).unwrap();
        let b = graph.add_node(Vec2::new(10.0, 0.0)).unwrap();
        let c = graph.add_node(Vec2::new(10.0, 10.0)).unwrap();
        graph.add_edge_euclidean(a, b).unwrap();
        graph.add_edge_euclidean(b, c).unwrap();

        let (point, d) = closest_point_on_any_path(&graph, Vec2::new(14.0, 6.0)).unwrap();
        assert!(approx(point, Vec2::new(10.0, 6.0)));
        assert!((d - 4.0).abs() < 1e-5);
    }
}
