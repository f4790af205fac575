//! Waypoint Graph Store
//!
//! Holds the hand-placed waypoint nodes and the undirected, weighted paths
//! connecting them. The store is pure data plus lookup: queries never mutate
//! it, and every mutation goes through an explicit add/remove call.
//!
//! # Invariants
//!
//! - Node IDs are assigned monotonically and never reused within a session
//! - No edge ever references a node that is not in the store
//! - No self loops, and at most one edge per unordered node pair
//!
//! # Example
//!
//! ```ignore
//! let mut graph = NavGraph::new();
//! let a = graph.add_node(Vec2::new(0.0, 0.0))?;
//! let b = graph.add_node(Vec2::new(10.0, 0.0))?;
//! graph.add_edge_euclidean(a, b)?;
//!
//! graph.remove_node(a); // also prunes a-b
//! assert_eq!(graph.edge_count(), 0);
//! ```

use std::fmt;

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ============================================================================
// Identifiers and Records
// ============================================================================

/// Stable identifier of a waypoint node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Get the raw identifier value.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A waypoint in the navigation graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Identifier assigned by the store
    pub id: NodeId,
    /// World position
    pub position: Vec2,
}

/// An undirected, weighted connection between two nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// First endpoint
    pub a: NodeId,
    /// Second endpoint
    pub b: NodeId,
    /// Traversal cost (non-negative)
    pub cost: f32,
}

impl Edge {
    /// Check whether this edge touches the given node.
    #[must_use]
    #[inline]
    pub fn touches(&self, id: NodeId) -> bool {
        self.a == id || self.b == id
    }

    /// Check whether this edge joins the given unordered pair.
    #[must_use]
    #[inline]
    pub fn joins(&self, x: NodeId, y: NodeId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint.
    #[must_use]
    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by fallible graph mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Referenced node does not exist
    UnknownNode(NodeId),
    /// Both endpoints of an edge are the same node
    SelfLoop(NodeId),
    /// Edge cost is negative or not finite
    InvalidCost(f32),
    /// A node with this ID already exists
    DuplicateNode(NodeId),
    /// The ID belonged to a node removed earlier in this session
    RetiredNode(NodeId),
    /// Every node ID has been handed out
    IdsExhausted,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node {id}"),
            Self::SelfLoop(id) => write!(f, "self loop on node {id}"),
            Self::InvalidCost(cost) => write!(f, "invalid edge cost {cost}"),
            Self::DuplicateNode(id) => write!(f, "duplicate node {id}"),
            Self::RetiredNode(id) => write!(f, "node {id} was removed and cannot be reused"),
            Self::IdsExhausted => write!(f, "node ID space exhausted"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Outcome of a bulk [`NavGraph::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Nodes accepted
    pub nodes: usize,
    /// Edges accepted
    pub edges: usize,
    /// Node records rejected (duplicate IDs)
    pub skipped_nodes: usize,
    /// Edge records rejected (dangling, self loop, bad cost, duplicate pair)
    pub skipped_edges: usize,
}

// ============================================================================
// Graph Store
// ============================================================================

/// Adjacency entry: neighbor and the cost of the edge leading to it.
type Adjacency = SmallVec<[(NodeId, f32); 4]>;

/// The static, author-placed waypoint graph.
///
/// Nodes and edges are kept in insertion order so that linear scans (closest
/// node, closest path point, random edge choice) are deterministic.
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    /// Nodes in insertion order
    nodes: Vec<Node>,
    /// Node ID to index into `nodes`
    index: FxHashMap<NodeId, usize>,
    /// Edges in insertion order
    edges: Vec<Edge>,
    /// Per-node neighbor lists
    adjacency: FxHashMap<NodeId, Adjacency>,
    /// Next ID handed out by `add_node`; past `u32::MAX` once exhausted
    next_id: u64,
    /// IDs removed during this session
    retired: FxHashSet<NodeId>,
}

impl NavGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Add a node at `position` and return its freshly assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::IdsExhausted` once `u32::MAX` has been used.
    pub fn add_node(&mut self, position: Vec2) -> Result<NodeId, GraphError> {
        let raw = u32::try_from(self.next_id).map_err(|_| GraphError::IdsExhausted)?;
        let id = NodeId(raw);
        self.next_id += 1;
        self.push_node(id, position);
        Ok(id)
    }

    /// Insert a node with an authored ID (used when loading persisted maps).
    ///
    /// Later `add_node` calls continue after the highest ID seen.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateNode` if the ID is present and
    /// `GraphError::RetiredNode` if it was removed earlier in the session.
    pub fn insert_node(&mut self, id: NodeId, position: Vec2) -> Result<(), GraphError> {
        if self.index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if self.retired.contains(&id) {
            return Err(GraphError::RetiredNode(id));
        }
        self.next_id = self.next_id.max(u64::from(id.0) + 1);
        self.push_node(id, position);
        Ok(())
    }

    fn push_node(&mut self, id: NodeId, position: Vec2) {
        self.index.insert(id, self.nodes.len());
        self.nodes.push(Node { id, position });
        self.adjacency.insert(id, Adjacency::new());
    }

    /// Remove a node and every edge referencing it.
    ///
    /// Returns `false` if the node did not exist.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.index.remove(&id) else {
            return false;
        };
        self.retired.insert(id);

        self.nodes.remove(idx);
        for (i, node) in self.nodes.iter().enumerate().skip(idx) {
            self.index.insert(node.id, i);
        }

        if let Some(neighbors) = self.adjacency.remove(&id) {
            for (neighbor, _) in neighbors {
                if let Some(list) = self.adjacency.get_mut(&neighbor) {
                    list.retain(|(n, _)| *n != id);
                }
            }
        }

        let before = self.edges.len();
        self.edges.retain(|edge| !edge.touches(id));
        log::debug!(
            "Removed node {id} and {} incident edge(s)",
            before - self.edges.len()
        );
        true
    }

    /// Look up a node by ID.
    #[must_use]
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Position of a node, if it exists.
    #[must_use]
    #[inline]
    pub fn position(&self, id: NodeId) -> Option<Vec2> {
        self.find_node(id).map(|node| node.position)
    }

    /// Check if a node exists.
    #[must_use]
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    // -------------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------------

    /// Connect two nodes with an undirected edge of the given cost.
    ///
    /// Returns `Ok(false)` without changes if the pair is already connected.
    ///
    /// # Errors
    ///
    /// Fails on unknown endpoints, self loops and negative or non-finite costs.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, cost: f32) -> Result<bool, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(GraphError::InvalidCost(cost));
        }
        for id in [a, b] {
            if !self.contains(id) {
                return Err(GraphError::UnknownNode(id));
            }
        }
        if self.has_edge(a, b) {
            return Ok(false);
        }

        self.edges.push(Edge { a, b, cost });
        self.adjacency.entry(a).or_default().push((b, cost));
        self.adjacency.entry(b).or_default().push((a, cost));
        Ok(true)
    }

    /// Connect two nodes with the straight-line distance as cost.
    ///
    /// # Errors
    ///
    /// Same as [`NavGraph::add_edge`].
    pub fn add_edge_euclidean(&mut self, a: NodeId, b: NodeId) -> Result<bool, GraphError> {
        let pa = self.position(a).ok_or(GraphError::UnknownNode(a))?;
        let pb = self.position(b).ok_or(GraphError::UnknownNode(b))?;
        self.add_edge(a, b, pa.distance(pb))
    }

    /// Remove the edge between two nodes. Returns `false` if none existed.
    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|edge| !edge.joins(a, b));
        if self.edges.len() == before {
            return false;
        }
        if let Some(list) = self.adjacency.get_mut(&a) {
            list.retain(|(n, _)| *n != b);
        }
        if let Some(list) = self.adjacency.get_mut(&b) {
            list.retain(|(n, _)| *n != a);
        }
        true
    }

    /// Check if two nodes are directly connected.
    #[must_use]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|list| list.iter().any(|(n, _)| *n == b))
    }

    /// Iterate over the neighbors of a node with the connecting edge cost.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|list| list.iter().copied())
    }

    // -------------------------------------------------------------------------
    // Bulk access
    // -------------------------------------------------------------------------

    /// All nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The ID the next `add_node` call will hand out, if any are left.
    #[must_use]
    pub fn next_id(&self) -> Option<NodeId> {
        u32::try_from(self.next_id).ok().map(NodeId)
    }

    /// Remove every node and edge. ID assignment keeps counting upwards and
    /// the removed IDs stay retired.
    pub fn clear(&mut self) {
        self.retired.extend(self.nodes.iter().map(|node| node.id));
        self.nodes.clear();
        self.index.clear();
        self.edges.clear();
        self.adjacency.clear();
    }

    /// Replace the graph contents with persisted nodes and edges.
    ///
    /// Loading starts a new ID session, so authored IDs are taken as they
    /// are. Bad records are skipped with a warning instead of failing the
    /// load.
    pub fn load(
        &mut self,
        nodes: impl IntoIterator<Item = (NodeId, Vec2)>,
        edges: impl IntoIterator<Item = (NodeId, NodeId, f32)>,
    ) -> LoadSummary {
        *self = Self::default();
        let mut summary = LoadSummary::default();

        for (id, position) in nodes {
            match self.insert_node(id, position) {
                Ok(()) => summary.nodes += 1,
                Err(err) => {
                    log::warn!("Skipping node record: {err}");
                    summary.skipped_nodes += 1;
                }
            }
        }

        for (a, b, cost) in edges {
            match self.add_edge(a, b, cost) {
                Ok(true) => summary.edges += 1,
                Ok(false) => {
                    log::warn!("Skipping duplicate path {a}-{b}");
                    summary.skipped_edges += 1;
                }
                Err(err) => {
                    log::warn!("Skipping path record {a}-{b}: {err}");
                    summary.skipped_edges += 1;
                }
            }
        }

        log::info!(
            "Loaded navigation graph: {} nodes, {} paths ({} node / {} path records skipped)",
            summary.nodes,
            summary.edges,
            summary.skipped_nodes,
            summary.skipped_edges
        );
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================
