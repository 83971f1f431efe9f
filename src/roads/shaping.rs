//! Terrain-following road shaping
//!
//! A greedy walk from source to destination. Every step samples candidate
//! positions on an arc around the straight bearing and keeps the one whose
//! grade from the source best matches the grade still needed to reach the
//! destination.

use tracing::warn;

use crate::config::RoadNetworkConfig;
use crate::geometry::{distance, Point};
use crate::terrain::HeightField;

/// Step cap of a single road walk
pub const MAX_SHAPING_STEPS: usize = 1000;

/// Deviation angle reduced so the arc stays consistent with the snap radius
///
/// When the snap distance is shorter than a step, the deviation is capped to
/// `acos(snap / step)`.
pub fn effective_deviation(config: &RoadNetworkConfig) -> f64 {
    let (snap, step) = (config.snap_distance, config.step_distance);
    if snap < step && step > 0.0 {
        config.deviation_angle.min((snap / step).acos())
    } else {
        config.deviation_angle
    }
}

/// Candidate positions one step from `pos`, spread over `bearing ± deviation`
fn arc_samples(pos: Point, bearing: f64, deviation: f64, step: f64, count: usize) -> impl Iterator<Item = Point> {
    let (start, spacing) = if count > 1 {
        (bearing - deviation, 2.0 * deviation / (count - 1) as f64)
    } else {
        (bearing, 0.0)
    };
    (0..count).map(move |i| {
        let angle = start + i as f64 * spacing;
        Point::new(pos.x + angle.cos() * step, pos.y + angle.sin() * step)
    })
}

/// Shape the road between two intersections
///
/// The returned polyline starts at `src` and always ends at `dst`. If the
/// walk does not get within snap distance of `dst` in
/// [`MAX_SHAPING_STEPS`] steps, the destination is appended anyway.
pub fn create_road(terrain: &HeightField, src: Point, dst: Point, config: &RoadNetworkConfig) -> Vec<Point> {
    let step = config.step_distance;
    let deviation = effective_deviation(config);
    let dst_height = terrain.elevation_at(dst.x, dst.y);

    let mut road = vec![src];
    let mut pos = src;
    let mut steps = 0;

    while distance(pos, dst) > config.snap_distance {
        if steps >= MAX_SHAPING_STEPS {
            warn!(
                src = ?src,
                dst = ?dst,
                remaining = distance(pos, dst),
                "road shaping hit the step cap"
            );
            break;
        }

        let bearing = (dst.y - pos.y).atan2(dst.x - pos.x);
        let mut best: Option<(f64, Point)> = None;
        for sample in arc_samples(pos, bearing, deviation, step, config.number_of_samples) {
            let covered = distance(src, sample).max(f64::EPSILON);
            let remaining = distance(sample, dst).max(f64::EPSILON);
            let height = terrain.elevation_at(sample.x, sample.y);
            let score = (height / covered - dst_height / remaining).abs();
            if best.map_or(true, |(min, _)| score < min) {
                best = Some((score, sample));
            }
        }

        let Some((_, next)) = best else { break };
        road.push(next);
        pos = next;
        steps += 1;
    }

    road.push(dst);
    road
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn terrain() -> HeightField {
        let mut field = HeightField::new(TerrainConfig {
            resolution: 5,
            roughness: 1.0,
            initial_height_range: (0.0, 1.0),
            side_length: 500.0,
            elevation: 30.0,
        });
        field.generate(&mut ChaCha8Rng::seed_from_u64(11));
        field
    }

    #[test]
    fn test_effective_deviation_capped_by_snap() {
        let config = RoadNetworkConfig {
            step_distance: 10.0,
            snap_distance: 5.0,
            deviation_angle: 1.5,
            ..RoadNetworkConfig::default()
        };
        assert!((effective_deviation(&config) - 0.5f64.acos()).abs() < 1e-12);

        let defaults = RoadNetworkConfig::default();
        assert_eq!(effective_deviation(&defaults), defaults.deviation_angle);
    }

    #[test]
    fn test_arc_samples_symmetric() {
        let samples: Vec<Point> = arc_samples(Point::new(0.0, 0.0), 0.0, 0.5, 10.0, 3).collect();
        assert_eq!(samples.len(), 3);
        assert!((samples[0].y + samples[2].y).abs() < 1e-12);
        assert!(samples[1].approx_eq(Point::new(10.0, 0.0), 1e-12));

        let single: Vec<Point> = arc_samples(Point::new(0.0, 0.0), 0.0, 0.5, 10.0, 1).collect();
        assert!(single[0].approx_eq(Point::new(10.0, 0.0), 1e-12));
    }

    #[test]
    fn test_road_endpoints_and_steps() {
        let field = terrain();
        let config = RoadNetworkConfig::default();
        let src = Point::new(60.0, 70.0);
        let dst = Point::new(400.0, 350.0);
        let road = create_road(&field, src, dst, &config);

        assert_eq!(road[0], src);
        assert_eq!(*road.last().unwrap(), dst);
        // Every intermediate step has the configured length
        for pair in road[..road.len() - 1].windows(2) {
            assert!((distance(pair[0], pair[1]) - config.step_distance).abs() < 1e-9);
        }
        // Last real sample is within snap distance of the destination
        let last_sample = road[road.len() - 2];
        assert!(distance(last_sample, dst) <= config.snap_distance);
    }

    #[test]
    fn test_short_road_is_straight() {
        let field = terrain();
        let config = RoadNetworkConfig::default();
        let src = Point::new(100.0, 100.0);
        let dst = Point::new(110.0, 100.0);
        assert_eq!(create_road(&field, src, dst, &config), vec![src, dst]);
    }

    #[test]
    fn test_flat_terrain_walks_straight() {
        let field = HeightField::new(TerrainConfig::default());
        let config = RoadNetworkConfig {
            number_of_samples: 5,
            ..RoadNetworkConfig::default()
        };
        let road = create_road(&field, Point::new(0.0, 0.0), Point::new(100.0, 0.0), &config);
        // All scores tie at zero, so the first (most clockwise) sample wins
        // every step; the walk still converges within the step cap
        assert!(road.len() < MAX_SHAPING_STEPS);
        assert_eq!(*road.last().unwrap(), Point::new(100.0, 0.0));
    }
}
