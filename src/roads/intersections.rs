//! Primary intersection placement and lattice graph
//!
//! The terrain is divided into an `nx × ny` grid with at least as many cells
//! as requested intersections. Each cell receives one point, jittered around a
//! center that is pushed away from the terrain center, so intersections get
//! denser toward the borders. Neighboring cells are then connected into a
//! deformed rectangular lattice.

use rand::Rng;

use crate::config::RoadNetworkConfig;
use crate::geometry::{Point, Segment};
use crate::sampling::gaussian;

/// Fraction by which cell centers are pushed away from the terrain center
const CENTER_BIAS: f64 = 0.35;

/// Grid dimensions `(nx, ny)` for `n` requested intersections
///
/// `nx = ceil(√n)` and `ny = floor(√n)`, incremented if needed so that
/// `nx · ny >= n`.
pub fn grid_dimensions(n: usize) -> (usize, usize) {
    let root = (n as f64).sqrt();
    let nx = (root.ceil() as usize).max(1);
    let mut ny = (root.floor() as usize).max(1);
    if nx * ny < n {
        ny += 1;
    }
    (nx, ny)
}

/// Clamp without panicking when the bounds cross; the lower bound wins
#[inline]
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Intersection points laid out on a logical grid
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionGrid {
    nx: usize,
    ny: usize,
    /// Points indexed by `x * ny + y`
    points: Vec<Point>,
}

impl IntersectionGrid {
    /// Place one intersection per grid cell over a square terrain
    pub fn place<R: Rng + ?Sized>(side_length: f64, config: &RoadNetworkConfig, rng: &mut R) -> Self {
        let (nx, ny) = grid_dimensions(config.approximate_intersections);
        let cell_x = side_length / nx as f64;
        let cell_y = side_length / ny as f64;
        let padding = config.intersection_padding;

        let mut points = Vec::with_capacity(nx * ny);
        for x in 0..nx {
            for y in 0..ny {
                let center_x = cell_x / 2.0 + x as f64 * cell_x;
                let center_y = cell_y / 2.0 + y as f64 * cell_y;
                let biased_x = center_x + center_x * CENTER_BIAS - side_length * CENTER_BIAS / 2.0;
                let biased_y = center_y + center_y * CENTER_BIAS - side_length * CENTER_BIAS / 2.0;

                let px = clamp(
                    gaussian(rng, biased_x, cell_x / config.edges_deviation),
                    center_x - cell_x / 2.0 + padding,
                    center_x + cell_x / 2.0 - padding,
                );
                let py = clamp(
                    gaussian(rng, biased_y, cell_y / config.edges_deviation),
                    center_y - cell_y / 2.0 + padding,
                    center_y + cell_y / 2.0 - padding,
                );
                points.push(Point::new(px, py));
            }
        }

        Self { nx, ny, points }
    }

    /// Number of columns
    #[inline]
    pub fn columns(&self) -> usize {
        self.nx
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.ny
    }

    /// Intersection of grid cell `(x, y)`
    pub fn get(&self, x: usize, y: usize) -> Option<Point> {
        if x >= self.nx || y >= self.ny {
            return None;
        }
        self.points.get(x * self.ny + y).copied()
    }

    /// All intersections
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Lattice edges: every point to its successor along y, then along x
    pub fn lattice_edges(&self) -> Vec<Segment> {
        let mut edges = Vec::new();
        for x in 0..self.nx {
            for y in 1..self.ny {
                if let (Some(a), Some(b)) = (self.get(x, y - 1), self.get(x, y)) {
                    edges.push((a, b));
                }
            }
        }
        for y in 0..self.ny {
            for x in 1..self.nx {
                if let (Some(a), Some(b)) = (self.get(x - 1, y), self.get(x, y)) {
                    edges.push((a, b));
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(grid_dimensions(9), (3, 3));
        assert_eq!(grid_dimensions(30), (6, 5));
        assert_eq!(grid_dimensions(4), (2, 2));
        // ceil·floor alone would give 3·2 = 6 < 7
        assert_eq!(grid_dimensions(7), (3, 3));
        for n in 1..=200 {
            let (nx, ny) = grid_dimensions(n);
            assert!(nx * ny >= n, "n = {}", n);
        }
    }

    #[test]
    fn test_points_stay_inside_padded_cells() {
        let config = RoadNetworkConfig {
            approximate_intersections: 16,
            edges_deviation: 1.0,
            intersection_padding: 20.0,
            ..RoadNetworkConfig::default()
        };
        let grid = IntersectionGrid::place(800.0, &config, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(grid.points().len(), 16);

        let cell = 800.0 / 4.0;
        for x in 0..4 {
            for y in 0..4 {
                let p = grid.get(x, y).unwrap();
                let min_x = x as f64 * cell + 20.0;
                let min_y = y as f64 * cell + 20.0;
                assert!(p.x >= min_x - 1e-9 && p.x <= min_x + cell - 40.0 + 1e-9);
                assert!(p.y >= min_y - 1e-9 && p.y <= min_y + cell - 40.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_crossed_bounds_do_not_panic() {
        let config = RoadNetworkConfig {
            approximate_intersections: 4,
            intersection_padding: 1000.0,
            ..RoadNetworkConfig::default()
        };
        let grid = IntersectionGrid::place(100.0, &config, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(grid.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn test_lattice_edge_count() {
        let config = RoadNetworkConfig {
            approximate_intersections: 12,
            ..RoadNetworkConfig::default()
        };
        let grid = IntersectionGrid::place(1000.0, &config, &mut ChaCha8Rng::seed_from_u64(2));
        let (nx, ny) = (grid.columns(), grid.rows());
        assert_eq!((nx, ny), (4, 3));
        assert_eq!(grid.lattice_edges().len(), nx * (ny - 1) + ny * (nx - 1));
    }
}
