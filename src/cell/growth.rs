//! Secondary road growth inside a cell
//!
//! Roads start as short perpendicular spurs off the longest boundary roads
//! and branch outward round by round. Every candidate segment runs through
//! four snap tests in order; the first one that fires rejects the segment
//! and, when the attempt joins, connects its start to the nearby geometry
//! instead.

use std::collections::BTreeSet;

use glam::DVec2;
use rand::Rng;
use tracing::{debug, trace};

use super::{CellBoundary, CellProfile, ControlProfile};
use crate::geometry::{
    distance_squared, line_intersection_point, line_to_point_distance_squared, project_on_line,
    projection_is_on_segment, segment_intersection, Point,
};
use crate::graph::PlanarGraph;
use crate::sampling::gaussian;
use crate::terrain::HeightField;

/// Lifecycle of a [`RoadsCell`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthState {
    /// No secondary roads yet
    Uninitialized,
    /// Growth rounds in progress
    Growing,
    /// Growth finished and terrain flattened under the roads
    Done,
}

/// Land cell with a secondary road network
#[derive(Debug, Clone)]
pub struct RoadsCell {
    boundary: CellBoundary,
    profile: CellProfile,
    control: ControlProfile,
    graph: PlanarGraph,
    /// Boundary road samples that secondary roads connect to
    joined: BTreeSet<Point>,
    state: GrowthState,
    rounds: usize,
}

impl RoadsCell {
    /// Create an empty cell with the given control parameters
    pub fn new(boundary: CellBoundary, profile: CellProfile, control: ControlProfile) -> Self {
        Self {
            boundary,
            profile,
            control,
            graph: PlanarGraph::new(),
            joined: BTreeSet::new(),
            state: GrowthState::Uninitialized,
            rounds: 0,
        }
    }

    /// Cell boundary
    #[inline]
    pub fn boundary(&self) -> &CellBoundary {
        &self.boundary
    }

    /// Classification of the cell
    #[inline]
    pub fn profile(&self) -> CellProfile {
        self.profile
    }

    /// Growth parameters
    #[inline]
    pub fn control(&self) -> &ControlProfile {
        &self.control
    }

    /// Secondary road graph
    #[inline]
    pub fn graph(&self) -> &PlanarGraph {
        &self.graph
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> GrowthState {
        self.state
    }

    /// Number of growth rounds run
    #[inline]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Low-level boundary reduced to the corners and the samples where
    /// secondary roads join it
    pub fn med_cycle(&self) -> Vec<Point> {
        let corners: BTreeSet<Point> = self.boundary.high().vertices().iter().copied().collect();
        self.boundary
            .low_cycle()
            .into_iter()
            .filter(|p| corners.contains(p) || self.joined.contains(p))
            .collect()
    }

    /// Grow the secondary network, then level the terrain under every road
    pub fn generate<R: Rng + ?Sized>(&mut self, terrain: &mut HeightField, rng: &mut R) {
        self.grow(rng);
        for (a, b) in self.graph.edges().collect::<Vec<_>>() {
            terrain.flatten_segment(a, b, None, None);
        }
        self.state = GrowthState::Done;
        debug!(
            profile = %self.profile,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            rounds = self.rounds,
            "grew secondary roads"
        );
    }

    /// Run the growth rounds without touching the terrain
    pub fn grow<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state = GrowthState::Growing;
        let mut extremities = self.seed_extremities(rng);

        while !extremities.is_empty() && self.rounds < self.control.max_rounds {
            let mut next = Vec::new();
            for pt in extremities {
                next.extend(self.grow_from(pt, rng));
            }
            self.rounds += 1;
            trace!(round = self.rounds, extremities = next.len(), "growth round");
            extremities = next;
        }
    }

    /// Spurs grown perpendicular to the longest boundary roads
    fn seed_extremities<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Point> {
        let mut order: Vec<usize> = (0..self.boundary.edge_roads().len()).collect();
        let lengths: Vec<f64> = self
            .boundary
            .high()
            .edges()
            .map(|(a, b)| distance_squared(a, b))
            .collect();
        // Stable sort keeps the ring order among equal lengths
        order.sort_by(|&i, &j| lengths[j].total_cmp(&lengths[i]));

        let mut extremities = Vec::new();
        for &edge in order.iter().take(self.control.starting_points) {
            let road = &self.boundary.edge_roads()[edge];
            if road.len() < 2 {
                continue;
            }
            let r = gaussian(rng, 0.5, 0.2).clamp(0.0, 0.95);
            let i = ((road.len() - 1) as f64 * r).floor() as usize;
            let (s, t) = (road[i], road[(i + 1).min(road.len() - 1)]);

            let direction = t.vec() - s.vec();
            let length = direction.length();
            if length == 0.0 {
                continue;
            }
            // Right-hand normal points into a clockwise cell
            let inward = DVec2::new(direction.y, -direction.x) * (self.control.segment_size / length);
            let p = Point::from(s.vec() + inward);
            if self.graph.add_edge(s, p) {
                self.joined.insert(s);
                extremities.push(p);
            }
        }
        extremities
    }

    fn grow_from<R: Rng + ?Sized>(&mut self, pt: Point, rng: &mut R) -> Vec<Point> {
        let Some(prev) = self.graph.neighbors(pt).next() else {
            return Vec::new();
        };
        let control = self.control;
        let edge_angle = (pt.y - prev.y).atan2(pt.x - prev.x);
        let region = control.span_angle / control.degree as f64;

        let mut new_extremities = Vec::new();
        for i in 0..control.degree {
            let r = gaussian(rng, 0.5, control.angle_deviation).clamp(0.0, 1.0);
            let angle = edge_angle - control.span_angle / 2.0 + region * (i as f64 + r);
            let new_pt = Point::new(
                pt.x + control.segment_size * angle.cos(),
                pt.y + control.segment_size * angle.sin(),
            );
            let join = rng.gen::<f64>() < control.join_probability;
            if !self.snap(pt, new_pt, join) && self.graph.add_edge(pt, new_pt) {
                new_extremities.push(new_pt);
            }
        }
        new_extremities
    }

    /// Run the snap tests in order; `true` means the segment is rejected
    pub fn snap(&mut self, a: Point, b: Point, join: bool) -> bool {
        !self.inside_cycle_test(a, b, join)
            || !self.edge_intersection_test(a, b, join)
            || !self.node_distance_test(a, b, join)
            || !self.edge_distance_test(a, b, join)
    }

    /// Keep `a → b` only if `b` stays inside the cell and away from its border
    ///
    /// On join, `a` connects to the closest sample of the boundary road.
    pub fn inside_cycle_test(&mut self, a: Point, b: Point, join: bool) -> bool {
        let snap_sq = self.control.snap_size.powi(2);
        let edges: Vec<(Point, Point)> = self.boundary.high().edges().collect();

        for (index, (e0, e1)) in edges.into_iter().enumerate() {
            let u = e1.vec() - e0.vec();
            let v = b.vec() - e0.vec();
            let outside = u.perp_dot(v) > 0.0;
            if outside || line_to_point_distance_squared((e0, e1), b) < snap_sq {
                if join {
                    let nearest = self.boundary.edge_roads()[index]
                        .iter()
                        .copied()
                        .min_by(|p, q| distance_squared(*p, a).total_cmp(&distance_squared(*q, a)));
                    if let Some(p) = nearest {
                        if self.connect(a, p) {
                            self.joined.insert(p);
                        }
                    }
                }
                return false;
            }
        }
        true
    }

    /// Keep `a → b` only if it crosses no existing road
    ///
    /// On join, the crossed road closest to `a` is split at the crossing and
    /// `a` connects there, unless that road already touches `a`'s neighbors.
    pub fn edge_intersection_test(&mut self, a: Point, b: Point, join: bool) -> bool {
        let crossing = self
            .graph
            .edges()
            .filter(|&edge| segment_intersection(edge, (a, b)))
            .map(|edge| (edge, line_intersection_point(edge, (a, b))))
            .min_by(|(_, x), (_, y)| {
                let dx = x.map_or(f64::INFINITY, |x| distance_squared(a, x));
                let dy = y.map_or(f64::INFINITY, |y| distance_squared(a, y));
                dx.total_cmp(&dy)
            });
        let Some(((c, d), point)) = crossing else {
            return true;
        };

        let near_a = |p: Point| p == a || self.graph.contains_edge(a, p);
        if join && !near_a(c) && !near_a(d) {
            if let Some(x) = point {
                if let Some(q) = self.graph.split_edge_merging(c, d, x) {
                    self.connect(a, q);
                }
            }
        }
        false
    }

    /// Keep `a → b` only if no existing node lies within snap distance of it
    /// (ahead of `a`)
    ///
    /// On join, `a` connects directly to that node.
    pub fn node_distance_test(&mut self, a: Point, b: Point, join: bool) -> bool {
        let snap_sq = self.control.snap_size.powi(2);
        let ab = b.vec() - a.vec();
        let length_sq = ab.length_squared();
        if length_sq == 0.0 {
            return true;
        }

        let nodes: Vec<Point> = self.graph.nodes().collect();
        for c in nodes {
            if c == a {
                continue;
            }
            let r = (c.vec() - a.vec()).dot(ab) / length_sq;
            if r < 0.0 {
                continue;
            }
            let dist_sq = if r < 1.0 {
                line_to_point_distance_squared((a, b), c)
            } else {
                distance_squared(b, c)
            };
            if dist_sq < snap_sq {
                if join && !self.graph.contains_edge(a, c) {
                    self.connect(a, c);
                }
                return false;
            }
        }
        true
    }

    /// Keep `a → b` only if `b` is not within snap distance of an existing road
    ///
    /// On join, that road is split at the projection of `b` and `a` connects
    /// there, unless the road starts or ends at `a`.
    pub fn edge_distance_test(&mut self, a: Point, b: Point, join: bool) -> bool {
        let snap_sq = self.control.snap_size.powi(2);
        let edges: Vec<(Point, Point)> = self.graph.edges().collect();
        for (c, d) in edges {
            if !projection_is_on_segment((c, d), b) {
                continue;
            }
            if line_to_point_distance_squared((c, d), b) < snap_sq {
                if join && a != c && a != d {
                    let proj = project_on_line((c, d), b);
                    if let Some(q) = self.graph.split_edge_merging(c, d, proj) {
                        self.connect(a, q);
                    }
                }
                return false;
            }
        }
        true
    }

    /// Add the joining edge `a–q` unless it would cross an existing road
    fn connect(&mut self, a: Point, q: Point) -> bool {
        if self.graph.edges().any(|edge| segment_intersection(edge, (a, q))) {
            return false;
        }
        self.graph.add_edge(a, q)
    }

    #[cfg(test)]
    pub(crate) fn graph_mut(&mut self) -> &mut PlanarGraph {
        &mut self.graph
    }
}
