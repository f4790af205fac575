//! Map data
//!
//! In-memory form of a persisted map: waypoint nodes, the paths joining them
//! and enemy spawners. Maps are exchanged as RON or JSON text; reading and
//! writing files is left to the host.

use std::fmt;

use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::nav::{NavGraph, NodeId};
use crate::sim::SpawnerDef;

/// A persisted waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Authored node ID
    pub id: u32,
    /// World position
    pub position: Vec2,
}

/// A persisted path between two waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    /// First endpoint ID
    pub a: u32,
    /// Second endpoint ID
    pub b: u32,
    /// Traversal cost; the distance between the endpoints when omitted
    #[serde(default)]
    pub cost: Option<f32>,
}

/// A complete map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    /// Map name
    pub name: String,
    /// Format version
    pub version: u32,
    /// Waypoint nodes
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Paths between nodes
    #[serde(default)]
    pub paths: Vec<PathRecord>,
    /// Enemy spawners
    #[serde(default)]
    pub spawners: Vec<SpawnerDef>,
}

impl MapData {
    /// Create an empty map
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            nodes: Vec::new(),
            paths: Vec::new(),
            spawners: Vec::new(),
        }
    }

    /// Snapshot a graph and spawner list into map records
    #[must_use]
    pub fn from_graph(
        name: impl Into<String>,
        graph: &NavGraph,
        spawners: impl IntoIterator<Item = SpawnerDef>,
    ) -> Self {
        let mut map = Self::new(name);
        map.nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                id: node.id.raw(),
                position: node.position,
            })
            .collect();
        map.paths = graph
            .edges()
            .iter()
            .map(|edge| PathRecord {
                a: edge.a.raw(),
                b: edge.b.raw(),
                cost: Some(edge.cost),
            })
            .collect();
        map.spawners = spawners.into_iter().collect();
        map
    }

    /// Node records as graph input
    pub fn node_entries(&self) -> impl Iterator<Item = (NodeId, Vec2)> + '_ {
        self.nodes.iter().map(|n| (NodeId(n.id), n.position))
    }

    /// Path records as graph input, with omitted costs filled in from the
    /// endpoint positions
    pub fn path_entries(&self) -> impl Iterator<Item = (NodeId, NodeId, f32)> + '_ {
        let positions: FxHashMap<u32, Vec2> =
            self.nodes.iter().map(|n| (n.id, n.position)).collect();
        self.paths.iter().map(move |path| {
            let cost = path.cost.unwrap_or_else(|| {
                match (positions.get(&path.a), positions.get(&path.b)) {
                    (Some(a), Some(b)) => a.distance(*b),
                    // Dangling; the graph rejects it by ID
                    _ => 0.0,
                }
            });
            (NodeId(path.a), NodeId(path.b), cost)
        })
    }

    /// Encode as pretty RON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_ron_string(&self) -> Result<String, MapError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| MapError::Serialize(e.to_string()))
    }

    /// Decode from RON
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid map
    pub fn from_ron_str(text: &str) -> Result<Self, MapError> {
        ron::from_str(text).map_err(|e| MapError::Deserialize(e.to_string()))
    }

    /// Encode as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_json_string(&self) -> Result<String, MapError> {
        serde_json::to_string_pretty(self).map_err(|e| MapError::Serialize(e.to_string()))
    }

    /// Decode from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid map
    pub fn from_json_str(text: &str) -> Result<Self, MapError> {
        serde_json::from_str(text).map_err(|e| MapError::Deserialize(e.to_string()))
    }

    /// Check if the map has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for MapData {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Errors that can occur while encoding or decoding a map
#[derive(Debug, Clone)]
pub enum MapError {
    /// Serialization error
    Serialize(String),
    /// Deserialization error
    Deserialize(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialize(e) => write!(f, "Map serialization error: {e}"),
            Self::Deserialize(e) => write!(f, "Map deserialization error: {e}"),
        }
    }
}

impl std::error::Error for MapError {}
