//! Undirected planar road graph
//!
//! Nodes are [`Point`]s compared exactly, edges are unordered node pairs.
//! Parallel edges and self-loops are not representable.

pub mod cycle_basis;

pub use cycle_basis::{extract_primitives, planar_graph_cycles, Primitive, PrimitiveKind};

use petgraph::graphmap::UnGraphMap;

use crate::geometry::{segment_intersection, EdgeKey, Point, Segment};

/// Distance on both axes under which a split point is merged with an
/// existing node
pub const NODE_MERGE_TOLERANCE: f64 = 1e-6;

/// Planar graph embedded in the city plane
///
/// Adjacency order is the insertion order of edges, which keeps every
/// traversal deterministic.
#[derive(Debug, Clone, Default)]
pub struct PlanarGraph {
    inner: UnGraphMap<Point, ()>,
}

impl PlanarGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a list of segments
    pub fn from_edges<I: IntoIterator<Item = Segment>>(edges: I) -> Self {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(a, b);
        }
        graph
    }

    /// Add a node without edges
    pub fn add_node(&mut self, p: Point) {
        self.inner.add_node(p);
    }

    /// Add an undirected edge, inserting missing endpoints
    ///
    /// Returns `false` for self-loops and for edges that already exist.
    pub fn add_edge(&mut self, a: Point, b: Point) -> bool {
        if a == b || self.inner.contains_edge(a, b) {
            return false;
        }
        self.inner.add_edge(a, b, ());
        true
    }

    /// Remove an edge, keeping its endpoints
    pub fn remove_edge(&mut self, a: Point, b: Point) -> bool {
        self.inner.remove_edge(a, b).is_some()
    }

    /// Remove a node and all its edges
    pub fn remove_node(&mut self, p: Point) -> bool {
        self.inner.remove_node(p)
    }

    /// Replace edge `a–b` by `a–p` and `p–b`
    ///
    /// Returns `false` (leaving the graph untouched) when the edge does not
    /// exist or `p` is one of its endpoints.
    pub fn split_edge(&mut self, a: Point, b: Point, p: Point) -> bool {
        if p == a || p == b || !self.inner.contains_edge(a, b) {
            return false;
        }
        self.inner.remove_edge(a, b);
        self.add_edge(a, p);
        self.add_edge(p, b);
        true
    }

    /// Split edge `a–b` near `p`, reusing a node that is already there
    ///
    /// An endpoint within [`NODE_MERGE_TOLERANCE`] of `p` is returned as is
    /// and the edge is kept. Another node within tolerance becomes the split
    /// point instead of `p`. Returns the node to connect to, or `None` if the
    /// edge does not exist.
    pub fn split_edge_merging(&mut self, a: Point, b: Point, p: Point) -> Option<Point> {
        if !self.inner.contains_edge(a, b) {
            return None;
        }
        for endpoint in [a, b] {
            if endpoint.approx_eq(p, NODE_MERGE_TOLERANCE) {
                return Some(endpoint);
            }
        }
        let split = self.node_near(p, NODE_MERGE_TOLERANCE).unwrap_or(p);
        self.split_edge(a, b, split);
        Some(split)
    }

    /// Some node within `tolerance` of `p` on both axes
    pub fn node_near(&self, p: Point, tolerance: f64) -> Option<Point> {
        self.inner.nodes().find(|n| n.approx_eq(p, tolerance))
    }

    /// First pair of edges that properly cross each other
    ///
    /// Edges sharing an endpoint are skipped. `None` means the node
    /// coordinates embed the graph without crossings.
    pub fn find_crossing(&self) -> Option<(Segment, Segment)> {
        let edges: Vec<Segment> = self.edges().collect();
        for (i, e1) in edges.iter().enumerate() {
            for e2 in &edges[i + 1..] {
                let shares_endpoint = e1.0 == e2.0 || e1.0 == e2.1 || e1.1 == e2.0 || e1.1 == e2.1;
                if !shares_endpoint && segment_intersection(*e1, *e2) {
                    return Some((*e1, *e2));
                }
            }
        }
        None
    }

    /// Check if the node exists
    #[inline]
    pub fn contains_node(&self, p: Point) -> bool {
        self.inner.contains_node(p)
    }

    /// Check if the edge exists
    #[inline]
    pub fn contains_edge(&self, a: Point, b: Point) -> bool {
        self.inner.contains_edge(a, b)
    }

    /// Neighbors of `p` (empty if `p` is not in the graph)
    pub fn neighbors(&self, p: Point) -> impl Iterator<Item = Point> + '_ {
        self.inner.neighbors(p)
    }

    /// Number of edges incident to `p`
    pub fn degree(&self, p: Point) -> usize {
        self.inner.neighbors(p).count()
    }

    /// Number of nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of edges
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over nodes
    pub fn nodes(&self) -> impl Iterator<Item = Point> + '_ {
        self.inner.nodes()
    }

    /// Iterate over edges as segments
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        self.inner.all_edges().map(|(a, b, _)| (a, b))
    }

    /// Iterate over edges as canonical keys
    pub fn edge_keys(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        self.edges().map(EdgeKey::from)
    }
}
