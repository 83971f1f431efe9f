//! Diamond-square fractal height map
//!
//! Fills a `(2^resolution + 1)²` grid, row-major with index `y * size + x`.
//!
//! # Algorithm
//! 1. Seed the four corners with uniform values from the initial range
//! 2. Square pass: center of every `full × full` cell = mean of its corners + noise
//! 3. Diamond pass: every edge midpoint = mean of its existing neighbors + noise
//! 4. Halve the step and the noise amplitude, repeat until the half step is 0

use rand::Rng;

use crate::sampling::uniform;

struct Grid {
    size: usize,
    cells: Vec<Option<f64>>,
}

impl Grid {
    fn get(&self, x: i64, y: i64) -> Option<f64> {
        let size = self.size as i64;
        if x < 0 || y < 0 || x >= size || y >= size {
            return None;
        }
        self.cells[(y * size + x) as usize]
    }

    /// Mean of the existing values among `positions`, ignoring points off the grid
    fn average(&self, positions: &[(i64, i64)]) -> f64 {
        let (sum, count) = positions
            .iter()
            .filter_map(|&(x, y)| self.get(x, y))
            .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    fn set_if_unset(&mut self, x: usize, y: usize, value: f64) {
        let cell = &mut self.cells[y * self.size + x];
        if cell.is_none() {
            *cell = Some(value);
        }
    }
}

/// Generate a diamond-square height map
///
/// # Arguments
/// * `resolution` - Grid side is `2^resolution + 1`
/// * `roughness` - Initial noise amplitude, halved at every level
/// * `initial_range` - Range of the four corner values
/// * `rng` - Random source
///
/// # Returns
/// Row-major grid values; every value is finite.
pub fn diamond_square<R: Rng + ?Sized>(
    resolution: u32,
    roughness: f64,
    initial_range: (f64, f64),
    rng: &mut R,
) -> Vec<f64> {
    let size = (1usize << resolution) + 1;
    let mut grid = Grid {
        size,
        cells: vec![None; size * size],
    };

    let (low, high) = initial_range;
    let last = size - 1;
    for &(x, y) in &[(0, 0), (last, 0), (0, last), (last, last)] {
        let value = uniform(rng, low, high);
        grid.set_if_unset(x, y, value);
    }

    let mut full = last;
    let mut displacement = roughness;
    loop {
        let half = full / 2;
        if half < 1 {
            break;
        }

        // Square pass
        for y in (half..size).step_by(full) {
            for x in (half..size).step_by(full) {
                let (xi, yi, r) = (x as i64, y as i64, half as i64);
                let mean = grid.average(&[
                    (xi - r, yi - r),
                    (xi + r, yi - r),
                    (xi - r, yi + r),
                    (xi + r, yi + r),
                ]);
                let noise = uniform(rng, -displacement, displacement);
                grid.set_if_unset(x, y, mean + noise);
            }
        }

        // Diamond pass
        for y in (0..size).step_by(half) {
            for x in (((y + half) % full)..size).step_by(full) {
                let (xi, yi, r) = (x as i64, y as i64, half as i64);
                let mean = grid.average(&[
                    (xi, yi - r),
                    (xi - r, yi),
                    (xi + r, yi),
                    (xi, yi + r),
                ]);
                let noise = uniform(rng, -displacement, displacement);
                grid.set_if_unset(x, y, mean + noise);
            }
        }

        full = half;
        displacement /= 2.0;
    }

    grid.cells.into_iter().map(|v| v.unwrap_or(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_grid_size_and_finiteness() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let values = diamond_square(5, 1.0, (0.0, 1.0), &mut rng);
        assert_eq!(values.len(), 33 * 33);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_values_within_noise_budget() {
        let roughness = 0.8;
        let range = (-1.0, 2.0);
        let resolution = 6;
        // Diamond midpoints average square-pass values of the same level,
        // so each level can contribute its amplitude twice
        let budget: f64 = 2.0 * (0..resolution).map(|i| roughness / 2f64.powi(i)).sum::<f64>();

        for seed in 0..5 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let values = diamond_square(resolution as u32, roughness, range, &mut rng);
            for v in values {
                assert!(v >= range.0 - budget && v <= range.1 + budget, "{} out of bounds", v);
            }
        }
    }

    #[test]
    fn test_flat_without_noise() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let values = diamond_square(4, 0.0, (3.0, 3.0), &mut rng);
        assert!(values.iter().all(|&v| (v - 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_deterministic() {
        let a = diamond_square(5, 1.0, (0.0, 1.0), &mut ChaCha8Rng::seed_from_u64(42));
        let b = diamond_square(5, 1.0, (0.0, 1.0), &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
