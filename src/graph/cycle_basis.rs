//! Minimal cycle basis of a planar graph
//!
//! Eberly's primitive extraction ("The Minimal Cycle Basis for a Planar
//! Graph"). Vertices are processed from the smallest `(x, y)`; at each step
//! the graph loses an isolated vertex, a filament (dangling chain) or a
//! minimal cycle (an enclosed face). Extraction runs until the graph is
//! empty.
//!
//! The walk picks the clockwise-most neighbor once from the start vertex and
//! then the counterclockwise-most neighbor relative to the incoming
//! direction, which traces the boundary of the smallest face incident to the
//! extremal vertex.

use std::collections::BTreeSet;

use glam::DVec2;
use petgraph::graphmap::UnGraphMap;
use tracing::debug;

use super::PlanarGraph;
use crate::error::{CityError, Result};
use crate::geometry::{cycle_pairs, Point};

/// Kind of primitive removed from the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Vertex without edges
    IsolatedVertex,
    /// Dangling chain of edges not enclosing a face
    Filament,
    /// Smallest cycle around a face
    MinimalCycle,
}

/// A primitive extracted from a planar graph
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// What the vertices describe
    pub kind: PrimitiveKind,
    /// Vertex sequence; cycles do not repeat their first vertex
    pub vertices: Vec<Point>,
}

/// Working state of one extraction
///
/// Edge weights flag edges that already belong to an extracted cycle.
struct Extractor {
    graph: UnGraphMap<Point, bool>,
    heap: BTreeSet<Point>,
    primitives: Vec<Primitive>,
}

impl Extractor {
    fn new(source: PlanarGraph) -> Self {
        let mut graph = UnGraphMap::with_capacity(source.node_count(), source.edge_count());
        for node in source.nodes() {
            graph.add_node(node);
        }
        for (a, b) in source.edges() {
            graph.add_edge(a, b, false);
        }
        let heap = graph.nodes().collect();
        Self {
            graph,
            heap,
            primitives: Vec::new(),
        }
    }

    fn adjacent(&self, v: Point) -> Vec<Point> {
        self.graph.neighbors(v).collect()
    }

    fn first_adjacent(&self, v: Point) -> Option<Point> {
        self.graph.neighbors(v).next()
    }

    fn degree(&self, v: Point) -> usize {
        self.graph.neighbors(v).count()
    }

    fn is_cycle_edge(&self, a: Point, b: Point) -> bool {
        self.graph.edge_weight(a, b).copied().unwrap_or(false)
    }

    fn remove_vertex(&mut self, v: Point) {
        self.heap.remove(&v);
        self.graph.remove_node(v);
    }

    fn extract_isolated_vertex(&mut self, v0: Point) {
        self.remove_vertex(v0);
        self.primitives.push(Primitive {
            kind: PrimitiveKind::IsolatedVertex,
            vertices: vec![v0],
        });
    }

    fn extract_filament(&mut self, mut v0: Point, v1: Point) {
        if self.is_cycle_edge(v0, v1) {
            // Filament hanging inside an extracted cycle: remove it silently
            if self.degree(v0) >= 3 {
                self.graph.remove_edge(v0, v1);
                v0 = v1;
            }

            while self.degree(v0) == 1 {
                let Some(next) = self.first_adjacent(v0) else { break };
                if !self.is_cycle_edge(v0, next) {
                    break;
                }
                self.remove_vertex(v0);
                v0 = next;
            }

            if self.degree(v0) == 0 {
                self.remove_vertex(v0);
            }
        } else {
            let mut vertices = Vec::new();

            if self.degree(v0) >= 3 {
                vertices.push(v0);
                self.graph.remove_edge(v0, v1);
                v0 = v1;
            }

            while self.degree(v0) == 1 {
                vertices.push(v0);
                let Some(next) = self.first_adjacent(v0) else { break };
                self.remove_vertex(v0);
                v0 = next;
            }

            vertices.push(v0);
            if self.degree(v0) == 0 {
                self.remove_vertex(v0);
            }

            self.primitives.push(Primitive {
                kind: PrimitiveKind::Filament,
                vertices,
            });
        }
    }

    /// First neighbor of `vcurr` other than `vprev`, with the traversal directions
    fn turn_setup(&self, vprev: Option<Point>, vcurr: Point) -> Option<(Vec<Point>, Point, DVec2, DVec2)> {
        let adj = self.adjacent(vcurr);
        let vnext = adj.iter().copied().find(|&v| Some(v) != vprev)?;
        let dcurr = match vprev {
            Some(prev) => vcurr.vec() - prev.vec(),
            None => DVec2::new(0.0, -1.0),
        };
        let dnext = vnext.vec() - vcurr.vec();
        Some((adj, vnext, dcurr, dnext))
    }

    fn clockwise_most(&self, vprev: Option<Point>, vcurr: Point) -> Option<Point> {
        let (adj, mut vnext, dcurr, mut dnext) = self.turn_setup(vprev, vcurr)?;
        let mut convex = dnext.perp_dot(dcurr) <= 0.0;

        for vadj in adj {
            if vadj == vnext || Some(vadj) == vprev {
                continue;
            }
            let dadj = vadj.vec() - vcurr.vec();
            let replace = if convex {
                dcurr.perp_dot(dadj) < 0.0 || dnext.perp_dot(dadj) < 0.0
            } else {
                dcurr.perp_dot(dadj) < 0.0 && dnext.perp_dot(dadj) < 0.0
            };
            if replace {
                vnext = vadj;
                dnext = dadj;
                convex = dnext.perp_dot(dcurr) <= 0.0;
            }
        }
        Some(vnext)
    }

    fn counterclockwise_most(&self, vprev: Option<Point>, vcurr: Point) -> Option<Point> {
        let (adj, mut vnext, dcurr, mut dnext) = self.turn_setup(vprev, vcurr)?;
        let mut convex = dnext.perp_dot(dcurr) <= 0.0;

        for vadj in adj {
            if vadj == vnext || Some(vadj) == vprev {
                continue;
            }
            let dadj = vadj.vec() - vcurr.vec();
            let replace = if convex {
                dcurr.perp_dot(dadj) > 0.0 && dnext.perp_dot(dadj) > 0.0
            } else {
                dcurr.perp_dot(dadj) > 0.0 || dnext.perp_dot(dadj) > 0.0
            };
            if replace {
                vnext = vadj;
                dnext = dadj;
                convex = dnext.perp_dot(dcurr) <= 0.0;
            }
        }
        Some(vnext)
    }

    fn extract_primitive(&mut self, v0: Point) {
        let Some(v1) = self.clockwise_most(None, v0) else {
            return;
        };

        let mut visited = BTreeSet::new();
        let mut sequence = vec![v0];
        let mut vprev = v0;
        let mut vcurr = Some(v1);

        while let Some(current) = vcurr {
            if current == v0 || visited.contains(&current) {
                break;
            }
            sequence.push(current);
            visited.insert(current);
            vcurr = self.counterclockwise_most(Some(vprev), current);
            vprev = current;
        }

        match vcurr {
            None => {
                // Dead end: the walk ran into the tip of a filament
                if let Some(next) = self.first_adjacent(vprev) {
                    self.extract_filament(vprev, next);
                }
            }
            Some(current) if current == v0 => {
                for (a, b) in cycle_pairs(&sequence) {
                    if let Some(flag) = self.graph.edge_weight_mut(a, b) {
                        *flag = true;
                    }
                }
                self.primitives.push(Primitive {
                    kind: PrimitiveKind::MinimalCycle,
                    vertices: sequence,
                });

                self.graph.remove_edge(v0, v1);
                if self.degree(v0) == 1 {
                    if let Some(next) = self.first_adjacent(v0) {
                        self.extract_filament(v0, next);
                    }
                }
                if self.degree(v1) == 1 {
                    if let Some(next) = self.first_adjacent(v1) {
                        self.extract_filament(v1, next);
                    }
                }
            }
            Some(_) => {
                // Revisited a vertex without closing: walk to the end of the
                // chain of degree-2 vertices and remove it as a filament
                let (mut start, mut from) = (v0, v1);
                let mut steps = 0;
                while self.degree(start) == 2 && steps <= self.graph.node_count() {
                    let adj = self.adjacent(start);
                    let next = if adj[0] != from { adj[0] } else { adj[1] };
                    from = start;
                    start = next;
                    steps += 1;
                }
                self.extract_filament(start, from);
            }
        }
    }

    fn run(mut self) -> Result<Vec<Primitive>> {
        while let Some(&vertex) = self.heap.first() {
            let before = (self.graph.node_count(), self.graph.edge_count());

            match self.degree(vertex) {
                0 => self.extract_isolated_vertex(vertex),
                1 => {
                    if let Some(next) = self.first_adjacent(vertex) {
                        self.extract_filament(vertex, next);
                    }
                }
                _ => self.extract_primitive(vertex),
            }

            if (self.graph.node_count(), self.graph.edge_count()) == before {
                return Err(CityError::InconsistentEmbedding(format!(
                    "extraction made no progress at ({}, {}) with {} nodes and {} edges left",
                    vertex.x, vertex.y, before.0, before.1
                )));
            }
        }

        Ok(self.primitives)
    }
}

/// Extract every primitive of a planar graph
///
/// The graph is consumed: extraction removes its nodes and edges as it runs.
/// Pass a clone to keep the original.
///
/// # Errors
///
/// Returns `InconsistentEmbedding` when two edges cross, or when extraction
/// stops making progress.
pub fn extract_primitives(graph: PlanarGraph) -> Result<Vec<Primitive>> {
    if let Some(((a, b), (c, d))) = graph.find_crossing() {
        return Err(CityError::InconsistentEmbedding(format!(
            "edge ({}, {})-({}, {}) crosses edge ({}, {})-({}, {})",
            a.x, a.y, b.x, b.y, c.x, c.y, d.x, d.y
        )));
    }
    Extractor::new(graph).run()
}

/// Minimal cycles of a planar graph
///
/// Returns the vertex ring of every enclosed face. Orientation is not
/// normalized. See [`extract_primitives`] for ownership and errors.
pub fn planar_graph_cycles(graph: PlanarGraph) -> Result<Vec<Vec<Point>>> {
    let primitives = extract_primitives(graph)?;
    let cycles: Vec<Vec<Point>> = primitives
        .into_iter()
        .filter(|p| p.kind == PrimitiveKind::MinimalCycle)
        .map(|p| p.vertices)
        .collect();
    debug!(cycles = cycles.len(), "extracted minimal cycles");
    Ok(cycles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn grid_graph(n: usize) -> PlanarGraph {
        let mut graph = PlanarGraph::new();
        for i in 0..n {
            for j in 0..n {
                let here = p(i as f64, j as f64);
                if i + 1 < n {
                    graph.add_edge(here, p((i + 1) as f64, j as f64));
                }
                if j + 1 < n {
                    graph.add_edge(here, p(i as f64, (j + 1) as f64));
                }
            }
        }
        graph
    }

    #[test]
    fn test_grid_faces() {
        let cycles = planar_graph_cycles(grid_graph(3)).unwrap();
        assert_eq!(cycles.len(), 4);
        for cycle in &cycles {
            assert_eq!(cycle.len(), 4);
            assert!((Polygon::new(cycle.clone()).area() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cycles_have_no_repeated_vertices() {
        for cycle in planar_graph_cycles(grid_graph(4)).unwrap() {
            let unique: BTreeSet<Point> = cycle.iter().copied().collect();
            assert_eq!(unique.len(), cycle.len());
        }
    }

    #[test]
    fn test_larger_grid_face_count() {
        assert_eq!(planar_graph_cycles(grid_graph(5)).unwrap().len(), 16);
    }

    #[test]
    fn test_filaments_and_isolated_vertices() {
        // Triangle with a dangling tail and a lone vertex
        let mut graph = PlanarGraph::from_edges([
            (p(0.0, 0.0), p(4.0, 0.0)),
            (p(4.0, 0.0), p(2.0, 3.0)),
            (p(2.0, 3.0), p(0.0, 0.0)),
            (p(4.0, 0.0), p(7.0, 1.0)),
            (p(7.0, 1.0), p(9.0, 4.0)),
        ]);
        graph.add_node(p(20.0, 20.0));

        let primitives = extract_primitives(graph).unwrap();
        let count = |kind| primitives.iter().filter(|p| p.kind == kind).count();
        assert_eq!(count(PrimitiveKind::MinimalCycle), 1);
        assert_eq!(count(PrimitiveKind::IsolatedVertex), 1);
        assert!(count(PrimitiveKind::Filament) >= 1);

        let cycle = primitives
            .iter()
            .find(|p| p.kind == PrimitiveKind::MinimalCycle)
            .unwrap();
        assert_eq!(cycle.vertices.len(), 3);
    }

    #[test]
    fn test_face_with_interior_filament() {
        // Square with a spur pointing inward from one corner
        let graph = PlanarGraph::from_edges([
            (p(0.0, 0.0), p(10.0, 0.0)),
            (p(10.0, 0.0), p(10.0, 10.0)),
            (p(10.0, 10.0), p(0.0, 10.0)),
            (p(0.0, 10.0), p(0.0, 0.0)),
            (p(10.0, 10.0), p(6.0, 6.0)),
        ]);
        let cycles = planar_graph_cycles(graph).unwrap();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 4);
    }

    #[test]
    fn test_two_faces_sharing_an_edge() {
        let mut split = PlanarGraph::new();
        for (a, b) in [
            (p(0.0, 0.0), p(1.0, 0.0)),
            (p(1.0, 0.0), p(2.0, 0.0)),
            (p(2.0, 0.0), p(2.0, 1.0)),
            (p(2.0, 1.0), p(1.0, 1.0)),
            (p(1.0, 1.0), p(0.0, 1.0)),
            (p(0.0, 1.0), p(0.0, 0.0)),
            (p(1.0, 0.0), p(1.0, 1.0)),
        ] {
            split.add_edge(a, b);
        }
        let cycles = planar_graph_cycles(split).unwrap();
        assert_eq!(cycles.len(), 2);
        for cycle in cycles {
            assert!((Polygon::new(cycle).area() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_graph() {
        assert!(planar_graph_cycles(PlanarGraph::new()).unwrap().is_empty());
    }

    #[test]
    fn test_crossing_edges_rejected() {
        let mut graph = PlanarGraph::new();
        for (a, b) in [
            (p(0.0, 0.0), p(1.0, 0.0)),
            (p(1.0, 0.0), p(1.0, 1.0)),
            (p(1.0, 1.0), p(0.0, 1.0)),
            (p(0.0, 1.0), p(0.0, 0.0)),
            (p(0.0, 0.0), p(1.0, 1.0)),
            (p(1.0, 0.0), p(0.0, 1.0)),
        ] {
            graph.add_edge(a, b);
        }
        assert!(matches!(
            planar_graph_cycles(graph),
            Err(CityError::InconsistentEmbedding(_))
        ));
    }
}
