//! Navigation module
//!
//! Waypoint graph storage, geometric queries, hop-bounded range queries and
//! shortest-path search.

mod geometry;
mod graph;
mod pathfinding;
mod range;

pub use geometry::{closest_node, closest_point_on_any_path, closest_point_on_segment, distance};
pub use graph::{Edge, GraphError, LoadSummary, NavGraph, Node, NodeId};
pub use pathfinding::{Route, find_route, find_route_within};
pub use range::{leash_region, random_reachable_point, random_reachable_point_within, reachable_nodes};
