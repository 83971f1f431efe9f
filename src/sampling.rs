//! Random draws shared by the generation stages

use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Uniform draw in `[low, high]`, returning `low` for an empty range
#[inline]
pub(crate) fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        low
    }
}

/// Gaussian draw; a non-positive or non-finite deviation yields the mean
#[inline]
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    match Normal::new(mean, std_dev) {
        Ok(normal) if std_dev > 0.0 => normal.sample(rng),
        _ => mean,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(uniform(&mut rng, 2.0, 2.0), 2.0);
        assert_eq!(uniform(&mut rng, 3.0, 1.0), 3.0);
        assert_eq!(gaussian(&mut rng, 5.0, 0.0), 5.0);
        assert_eq!(gaussian(&mut rng, 5.0, -1.0), 5.0);
    }

    #[test]
    fn test_gaussian_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let n = 4000;
        let mean = (0..n).map(|_| gaussian(&mut rng, 0.5, 0.2)).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "{}", mean);
    }
}
