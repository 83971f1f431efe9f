//! 2D geometry kernel
//!
//! Stateless point, segment and line operations shared by every generation
//! stage. Points are compared exactly so they can be used as graph keys;
//! approximate comparisons are done explicitly with a tolerance where needed.

mod hull;
pub mod polygon;

pub use hull::convex_hull;
pub use polygon::{BoundingBox, Polygon};

use glam::DVec2;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sine of the angle below which two lines are treated as parallel
const PARALLEL_SINE_EPSILON: f64 = 1e-3;

/// A point in city-plane coordinates
///
/// Equality, ordering and hashing are exact and total (`f64::total_cmp` on
/// `(x, y)`), which makes points usable as graph node keys.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert to a glam vector for arithmetic
    #[inline]
    pub fn vec(self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Approximate equality within `tolerance` on both axes
    #[inline]
    pub fn approx_eq(self, other: Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl From<DVec2> for Point {
    #[inline]
    fn from(v: DVec2) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<Point> for DVec2 {
    #[inline]
    fn from(p: Point) -> Self {
        p.vec()
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Point {}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

/// A segment or infinite line given by two points
pub type Segment = (Point, Point);

/// Canonical key for an undirected edge
///
/// The two endpoints are stored in ascending point order, so `(a, b)` and
/// `(b, a)` produce the same key.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(Point, Point);

impl EdgeKey {
    /// Build the canonical key for the edge between `a` and `b`
    pub fn new(a: Point, b: Point) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// The smaller endpoint
    #[inline]
    pub fn first(&self) -> Point {
        self.0
    }

    /// The larger endpoint
    #[inline]
    pub fn second(&self) -> Point {
        self.1
    }

    /// Check if `p` is one of the endpoints
    #[inline]
    pub fn touches(&self, p: Point) -> bool {
        self.0 == p || self.1 == p
    }
}

impl From<Segment> for EdgeKey {
    fn from((a, b): Segment) -> Self {
        Self::new(a, b)
    }
}

/// Euclidean distance
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    a.vec().distance(b.vec())
}

/// Squared Euclidean distance
#[inline]
pub fn distance_squared(a: Point, b: Point) -> f64 {
    a.vec().distance_squared(b.vec())
}

/// Squared perpendicular distance from `p` to the infinite line through `line`
///
/// The two points of `line` must be distinct.
pub fn line_to_point_distance_squared(line: Segment, p: Point) -> f64 {
    let (a, b) = line;
    let num = (b.y - a.y) * p.x - (b.x - a.x) * p.y + b.x * a.y - b.y * a.x;
    let den = (b.y - a.y).powi(2) + (b.x - a.x).powi(2);
    num * num / den
}

/// Perpendicular distance from `p` to the infinite line through `line`
#[inline]
pub fn line_to_point_distance(line: Segment, p: Point) -> f64 {
    line_to_point_distance_squared(line, p).sqrt()
}

/// Distance from `p` to the closest point of the segment (clamped to its ends)
pub fn segment_to_point_distance(seg: Segment, p: Point) -> f64 {
    let (a, b) = (seg.0.vec(), seg.1.vec());
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return a.distance(p.vec());
    }
    let t = ((p.vec() - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance(p.vec())
}

fn scalar_projection(seg: Segment, p: Point, seg_length: f64) -> f64 {
    let (a, b) = (seg.0.vec(), seg.1.vec());
    let dir = (b - a) / seg_length;
    dir.dot(p.vec() - a)
}

/// Check if the projection of `p` falls strictly inside the segment
///
/// Points projecting exactly onto an endpoint are not on the segment.
pub fn projection_is_on_segment(seg: Segment, p: Point) -> bool {
    let length = distance(seg.0, seg.1);
    if length == 0.0 {
        return false;
    }
    let dot = scalar_projection(seg, p, length);
    dot > 0.0 && dot < length
}

/// Foot of the perpendicular from `p` onto the infinite line through `line`
pub fn project_on_line(line: Segment, p: Point) -> Point {
    let length = distance(line.0, line.1);
    if length == 0.0 {
        return line.0;
    }
    let a = line.0.vec();
    let dir = (line.1.vec() - a) / length;
    Point::from(a + dir * dir.dot(p.vec() - a))
}

/// Same as [`project_on_line`]; the result may lie outside the segment
#[inline]
pub fn project_on_segment(seg: Segment, p: Point) -> Point {
    project_on_line(seg, p)
}

/// Signed area of the triangle `(a, b, c)` times two (positive when counterclockwise)
#[inline]
pub fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.vec() - a.vec()).perp_dot(c.vec() - a.vec())
}

/// Test whether two segments properly cross
///
/// Endpoints are exclusive: segments that only touch, share an endpoint or
/// overlap collinearly do not intersect.
pub fn segment_intersection(seg1: Segment, seg2: Segment) -> bool {
    let d1 = orientation(seg1.0, seg1.1, seg2.0);
    let d2 = orientation(seg1.0, seg1.1, seg2.1);
    let d3 = orientation(seg2.0, seg2.1, seg1.0);
    let d4 = orientation(seg2.0, seg2.1, seg1.1);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Intersection point of two infinite lines
///
/// Returns `None` when the lines are (nearly) parallel. The parallel test is
/// relative to the lengths of the defining segments, so it behaves the same at
/// any coordinate scale.
pub fn line_intersection_point(l1: Segment, l2: Segment) -> Option<Point> {
    let (p, q) = l1;
    let a1 = q.y - p.y;
    let b1 = p.x - q.x;
    let c1 = a1 * p.x + b1 * p.y;

    let (p, q) = l2;
    let a2 = q.y - p.y;
    let b2 = p.x - q.x;
    let c2 = a2 * p.x + b2 * p.y;

    let det = a1 * b2 - a2 * b1;
    let scale = a1.hypot(b1) * a2.hypot(b2);
    if scale == 0.0 || det.abs() < PARALLEL_SINE_EPSILON * scale {
        return None;
    }

    Some(Point::new((b2 * c1 - b1 * c2) / det, (a1 * c2 - a2 * c1) / det))
}

/// Iterator over adjacent pairs of a slice, wrapping from the last item back to the first
///
/// Created by [`cycle_pairs`]. Call `cycle_pairs` again to iterate the same
/// slice from the beginning.
#[derive(Debug, Clone)]
pub struct CyclePairs<'a, T> {
    items: &'a [T],
    index: usize,
}

impl<'a, T: Copy> Iterator for CyclePairs<'a, T> {
    type Item = (T, T);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.items.len();
        if n < 2 || self.index >= n {
            return None;
        }
        let pair = (self.items[self.index], self.items[(self.index + 1) % n]);
        self.index += 1;
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.items.len();
        let remaining = if n < 2 { 0 } else { n - self.index };
        (remaining, Some(remaining))
    }
}

impl<'a, T: Copy> ExactSizeIterator for CyclePairs<'a, T> {}

/// Adjacent pairs of `items`, followed by the pair from the last item to the first
///
/// Slices with fewer than two items yield nothing.
pub fn cycle_pairs<T: Copy>(items: &[T]) -> CyclePairs<'_, T> {
    CyclePairs { items, index: 0 }
}

/// Adjacent pairs of `items` without the wrap-around pair
pub fn list_pairs<T: Copy>(items: &[T]) -> impl Iterator<Item = (T, T)> + Clone + '_ {
    items.windows(2).map(|w| (w[0], w[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_distances() {
        assert_eq!(distance(p(0.0, 0.0), p(3.0, 4.0)), 5.0);
        assert_eq!(distance_squared(p(1.0, 1.0), p(4.0, 5.0)), 25.0);
    }

    #[test]
    fn test_line_to_point_distance() {
        let line = (p(0.0, 0.0), p(10.0, 0.0));
        assert!((line_to_point_distance_squared(line, p(5.0, 3.0)) - 9.0).abs() < 1e-12);
        // Infinite line: points beyond the ends still measure perpendicular distance
        assert!((line_to_point_distance(line, p(20.0, -2.0)) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_projection_is_on_segment_excludes_endpoints() {
        let seg = (p(0.0, 0.0), p(10.0, 0.0));
        assert!(projection_is_on_segment(seg, p(5.0, 7.0)));
        assert!(!projection_is_on_segment(seg, p(0.0, 3.0)));
        assert!(!projection_is_on_segment(seg, p(10.0, 3.0)));
        assert!(!projection_is_on_segment(seg, p(-1.0, 0.0)));
        assert!(!projection_is_on_segment(seg, p(12.0, 0.0)));
    }

    #[test]
    fn test_project_on_line_is_unclamped() {
        let line = (p(0.0, 0.0), p(10.0, 10.0));
        let foot = project_on_line(line, p(0.0, 10.0));
        assert!(foot.approx_eq(p(5.0, 5.0), 1e-12));

        let beyond = project_on_line(line, p(30.0, 10.0));
        assert!(beyond.approx_eq(p(20.0, 20.0), 1e-12));
    }

    #[test]
    fn test_segment_intersection() {
        let a = (p(0.0, 0.0), p(10.0, 0.0));
        assert!(segment_intersection(a, (p(5.0, -3.0), p(5.0, 3.0))));
        assert!(segment_intersection(a, (p(2.0, -1.0), p(12.0, 1.0))));
        // Disjoint
        assert!(!segment_intersection(a, (p(5.0, 1.0), p(5.0, 3.0))));
        // Shared endpoint
        assert!(!segment_intersection(a, (p(10.0, 0.0), p(10.0, 5.0))));
        // Endpoint touching the interior
        assert!(!segment_intersection(a, (p(5.0, 0.0), p(5.0, 5.0))));
        // Collinear overlap
        assert!(!segment_intersection(a, (p(3.0, 0.0), p(13.0, 0.0))));
        // Parallel side by side
        assert!(!segment_intersection(a, (p(2.0, 1.0), p(8.0, 1.0))));
    }

    #[test]
    fn test_line_intersection_point() {
        let l1 = (p(0.0, 0.0), p(10.0, 0.0));
        let l2 = (p(3.0, -5.0), p(3.0, 5.0));
        let x = line_intersection_point(l1, l2).unwrap();
        assert!(x.approx_eq(p(3.0, 0.0), 1e-12));

        // Parallel lines
        assert!(line_intersection_point(l1, (p(0.0, 1.0), p(10.0, 1.0))).is_none());
        // Degenerate line
        assert!(line_intersection_point(l1, (p(1.0, 1.0), p(1.0, 1.0))).is_none());
    }

    #[test]
    fn test_line_intersection_is_scale_invariant() {
        for scale in [1e-3, 1.0, 1e4] {
            let l1 = (p(0.0, 0.0), p(scale, 0.0));
            let l2 = (p(0.5 * scale, -scale), p(0.5 * scale, scale));
            let x = line_intersection_point(l1, l2).expect("perpendicular lines must meet");
            assert!(x.approx_eq(p(0.5 * scale, 0.0), 1e-9 * scale.max(1.0)));
        }
    }

    #[test]
    fn test_cycle_pairs() {
        let items = [1, 2, 3];
        let pairs: Vec<_> = cycle_pairs(&items).collect();
        assert_eq!(pairs, vec![(1, 2), (2, 3), (3, 1)]);

        // Re-iterable on the same input
        assert_eq!(cycle_pairs(&items).count(), 3);

        assert_eq!(cycle_pairs(&[7]).count(), 0);
        assert_eq!(cycle_pairs::<i32>(&[]).count(), 0);
    }

    #[test]
    fn test_list_pairs() {
        let items = [1, 2, 3];
        let pairs: Vec<_> = list_pairs(&items).collect();
        assert_eq!(pairs, vec![(1, 2), (2, 3)]);
    }

    #[test]
    fn test_edge_key_is_canonical() {
        let a = p(3.0, 1.0);
        let b = p(1.0, 5.0);
        assert_eq!(EdgeKey::new(a, b), EdgeKey::new(b, a));
        assert_eq!(EdgeKey::new(a, b).first(), b);
        assert!(EdgeKey::new(a, b).touches(a));
    }

    #[test]
    fn test_point_ordering() {
        assert!(p(0.0, 5.0) < p(1.0, 0.0));
        assert!(p(1.0, 0.0) < p(1.0, 2.0));
        assert_eq!(p(2.0, 2.0), p(2.0, 2.0));
    }
}
