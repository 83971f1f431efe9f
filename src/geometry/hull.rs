//! Monotone-chain convex hull

use super::{orientation, Point};

/// Convex hull of a point set (Andrew's monotone chain)
///
/// Points are sorted by `(x, y)`; one chain is built in ascending order and the
/// other in descending order, each popping while the last three points do not
/// make a counterclockwise turn. The result is counterclockwise, starts at the
/// smallest point and contains no collinear or duplicate vertices. Inputs with
/// fewer than three distinct points are returned deduplicated and sorted.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort();
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && orientation(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && orientation(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }

    // Last point of each chain is the first point of the other
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    #[test]
    fn test_hull_of_square_with_interior_points() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
            Point::new(2.0, 2.0),
            Point::new(1.0, 3.0),
            Point::new(2.0, 0.0), // collinear on an edge
        ];
        let hull = convex_hull(&points);
        assert_eq!(hull.len(), 4);
        assert_eq!(hull[0], Point::new(0.0, 0.0));

        let polygon = Polygon::new(hull);
        assert!(!polygon.is_clockwise());
        assert!((polygon.area() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_hull_degenerate_inputs() {
        assert!(convex_hull(&[]).is_empty());
        let two = convex_hull(&[Point::new(1.0, 1.0), Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert_eq!(two, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
    }
}
