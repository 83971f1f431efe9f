//! Polygon type and derived operations
//!
//! Orientation follows y-up coordinates: a polygon is clockwise when its
//! signed shoelace sum `Σ (bx - ax)(by + ay)` is positive.

use super::{
    cycle_pairs, distance, line_intersection_point, segment_intersection,
    segment_to_point_distance, CyclePairs, Point, Segment,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Point,
    /// Maximum corner
    pub max: Point,
}

impl BoundingBox {
    /// Width along x
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along y
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center of the box
    #[inline]
    pub fn center(&self) -> Point {
        Point::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    /// Check if a point lies inside the box (borders included)
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point::new(self.min.x - margin, self.min.y - margin),
            max: Point::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Bounding box of a point sequence, or `None` if it is empty
    pub fn of_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self { min: first, max: first };
        for p in iter {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }
}

/// 2D polygon given by an ordered vertex ring
///
/// The closing edge from the last vertex back to the first is implicit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from its vertex ring
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Vertices in ring order
    #[inline]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Consume the polygon and return its vertices
    #[inline]
    pub fn into_vertices(self) -> Vec<Point> {
        self.vertices
    }

    /// Number of vertices
    #[inline]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the polygon has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges as directed vertex pairs, including the closing edge
    #[inline]
    pub fn edges(&self) -> CyclePairs<'_, Point> {
        cycle_pairs(&self.vertices)
    }

    fn shoelace_sum(&self) -> f64 {
        self.edges()
            .map(|(a, b)| (b.x - a.x) * (b.y + a.y))
            .sum()
    }

    /// Enclosed area (absolute value of the shoelace formula)
    pub fn area(&self) -> f64 {
        (self.shoelace_sum() / 2.0).abs()
    }

    /// Check if the vertices run clockwise
    pub fn is_clockwise(&self) -> bool {
        self.shoelace_sum() > 0.0
    }

    /// Check if the vertices do not run clockwise
    #[inline]
    pub fn is_counterclockwise(&self) -> bool {
        !self.is_clockwise()
    }

    /// Reverse the ring if it is not clockwise
    pub fn make_clockwise(&mut self) {
        if !self.is_clockwise() {
            self.vertices.reverse();
        }
    }

    /// Reverse the ring if it is not counterclockwise
    pub fn make_counterclockwise(&mut self) {
        if !self.is_counterclockwise() {
            self.vertices.reverse();
        }
    }

    /// Check that no two non-adjacent edges cross
    ///
    /// O(n²) pairwise test; edge pairs sharing an endpoint are skipped.
    pub fn is_simple(&self) -> bool {
        let edges: Vec<Segment> = self.edges().collect();
        for (i, e1) in edges.iter().enumerate() {
            for e2 in &edges[i + 1..] {
                let shares_endpoint =
                    e1.0 == e2.0 || e1.0 == e2.1 || e1.1 == e2.0 || e1.1 == e2.1;
                if shares_endpoint {
                    continue;
                }
                if segment_intersection(*e1, *e2) {
                    return false;
                }
            }
        }
        true
    }

    /// Offset every edge by `dist` to its right and rebuild the ring
    ///
    /// For a clockwise polygon this moves every edge inward. Vertex `i` of
    /// the result is the intersection of the offset edges `i - 1` and `i`; it
    /// is omitted when those edges are parallel. Concave polygons or large
    /// offsets can produce self-intersecting output, so callers check
    /// [`Polygon::is_simple`] afterwards.
    pub fn contract(&mut self, dist: f64) {
        let offset: Vec<Segment> = self
            .edges()
            .filter_map(|(a, b)| {
                let ab = b.vec() - a.vec();
                let length = ab.length();
                if length == 0.0 {
                    return None;
                }
                let normal = glam::DVec2::new(ab.y, -ab.x) * (dist / length);
                Some((Point::from(a.vec() + normal), Point::from(b.vec() + normal)))
            })
            .collect();

        let n = offset.len();
        self.vertices = (0..n)
            .filter_map(|i| line_intersection_point(offset[(i + n - 1) % n], offset[i]))
            .collect();
    }

    /// Offset every edge by `dist` to its left (outward for clockwise polygons)
    #[inline]
    pub fn expand(&mut self, dist: f64) {
        self.contract(-dist);
    }

    /// Contracted copy of this polygon
    pub fn contracted(&self, dist: f64) -> Polygon {
        let mut copy = self.clone();
        copy.contract(dist);
        copy
    }

    /// Expanded copy of this polygon
    pub fn expanded(&self, dist: f64) -> Polygon {
        let mut copy = self.clone();
        copy.expand(dist);
        copy
    }

    /// Vertex centroid (mean of the vertices, not the area centroid)
    pub fn center(&self) -> Point {
        if self.vertices.is_empty() {
            return Point::default();
        }
        let n = self.vertices.len() as f64;
        let sum = self
            .vertices
            .iter()
            .fold(glam::DVec2::ZERO, |acc, p| acc + p.vec());
        Point::from(sum / n)
    }

    /// Same as [`Polygon::center`]
    #[inline]
    pub fn centroid(&self) -> Point {
        self.center()
    }

    /// Axis-aligned bounding box, or `None` for an empty polygon
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.vertices.iter().copied())
    }

    /// Distance from `p` to the closest edge
    ///
    /// Returns infinity for polygons with fewer than two vertices.
    pub fn point_distance(&self, p: Point) -> f64 {
        self.edges()
            .map(|edge| segment_to_point_distance(edge, p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Even-odd ray casting containment test
    pub fn contains_point(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (b.y > p.y) != (a.y > p.y) {
                let x_cross = (a.x - b.x) * (p.y - b.y) / (a.y - b.y) + b.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Total length of the boundary
    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| distance(a, b)).sum()
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(vertices: Vec<Point>) -> Self {
        Self::new(vertices)
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
