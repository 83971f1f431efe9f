//! Primary road network
//!
//! Jittered lattice of intersections whose edges are shaped into
//! terrain-following polylines. The primary graph's minimal cycles become the
//! city cells.

pub mod intersections;
pub mod shaping;

pub use intersections::{grid_dimensions, IntersectionGrid};
pub use shaping::{create_road, effective_deviation, MAX_SHAPING_STEPS};

use std::collections::BTreeMap;

use rand::Rng;
use tracing::debug;

use crate::config::RoadNetworkConfig;
use crate::error::{CityError, Result};
use crate::geometry::{cycle_pairs, distance, EdgeKey, Point, Polygon};
use crate::graph::{planar_graph_cycles, PlanarGraph};
use crate::sampling::gaussian;
use crate::terrain::HeightField;

/// Standard deviation of the city center around the terrain center, relative
/// to half the terrain side
const CITY_CENTER_SPREAD: f64 = 0.3;

/// Primary intersections, lattice graph and shaped roads
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    config: RoadNetworkConfig,
    intersections: IntersectionGrid,
    graph: PlanarGraph,
    roads: BTreeMap<EdgeKey, Vec<Point>>,
    city_center: Point,
    side_length: f64,
}

impl RoadNetwork {
    /// Place intersections, connect them and shape every road over the terrain
    ///
    /// # Errors
    ///
    /// Returns `GenerationFailed` if the terrain has not been generated.
    pub fn generate<R: Rng + ?Sized>(config: RoadNetworkConfig, terrain: &HeightField, rng: &mut R) -> Result<Self> {
        if !terrain.is_generated() {
            return Err(CityError::GenerationFailed(
                "primary roads need a generated terrain".to_string(),
            ));
        }

        let side_length = terrain.side_length();
        let intersections = IntersectionGrid::place(side_length, &config, rng);
        let graph = PlanarGraph::from_edges(intersections.lattice_edges());
        debug!(
            intersections = intersections.points().len(),
            edges = graph.edge_count(),
            "placed primary intersections"
        );

        let roads: BTreeMap<EdgeKey, Vec<Point>> = graph
            .edges()
            .map(|(a, b)| (EdgeKey::new(a, b), create_road(terrain, a, b, &config)))
            .collect();
        debug!(
            roads = roads.len(),
            samples = roads.values().map(Vec::len).sum::<usize>(),
            "shaped primary roads"
        );

        // Randomly perturbed point standing for the city center
        let half = side_length / 2.0;
        let city_center = Point::new(
            half + half * gaussian(rng, 0.0, CITY_CENTER_SPREAD),
            half + half * gaussian(rng, 0.0, CITY_CENTER_SPREAD),
        );

        Ok(Self {
            config,
            intersections,
            graph,
            roads,
            city_center,
            side_length,
        })
    }

    /// Configuration used to build the network
    #[inline]
    pub fn config(&self) -> &RoadNetworkConfig {
        &self.config
    }

    /// Intersection lattice
    #[inline]
    pub fn intersections(&self) -> &IntersectionGrid {
        &self.intersections
    }

    /// High-level graph joining intersections by straight edges
    #[inline]
    pub fn graph(&self) -> &PlanarGraph {
        &self.graph
    }

    /// Shaped roads keyed by their canonical edge
    #[inline]
    pub fn roads(&self) -> &BTreeMap<EdgeKey, Vec<Point>> {
        &self.roads
    }

    /// Point cells are classified against
    #[inline]
    pub fn city_center(&self) -> Point {
        self.city_center
    }

    /// Road polyline of edge `a–b` in its stored direction
    pub fn road_for_edge(&self, a: Point, b: Point) -> Option<&[Point]> {
        self.roads.get(&EdgeKey::new(a, b)).map(Vec::as_slice)
    }

    /// Road polyline of edge `a–b` running from `a` to `b`
    pub fn oriented_road_for_edge(&self, a: Point, b: Point) -> Option<Vec<Point>> {
        let road = self.road_for_edge(a, b)?;
        let mut road = road.to_vec();
        if road.first() != Some(&a) {
            road.reverse();
        }
        Some(road)
    }

    /// Boundary of a high-level cycle traced along the actual roads
    ///
    /// Every oriented road contributes all samples but its last, which is the
    /// first sample of the next road. Edges without a road contribute their
    /// start point only.
    pub fn low_level_cycle(&self, cycle: &[Point]) -> Vec<Point> {
        let mut points = Vec::new();
        for (a, b) in cycle_pairs(cycle) {
            match self.oriented_road_for_edge(a, b) {
                Some(mut road) => {
                    road.pop();
                    points.extend(road);
                }
                None => points.push(a),
            }
        }
        points
    }

    /// Minimal cycles of the primary graph
    ///
    /// # Errors
    ///
    /// Propagates `InconsistentEmbedding` from the cycle basis extraction.
    pub fn cycles(&self) -> Result<Vec<Vec<Point>>> {
        planar_graph_cycles(self.graph.clone())
    }

    /// Distance of a cycle's vertex centroid to the city center, normalized by
    /// the terrain diagonal and divided by the urbanization factor
    pub fn remoteness(&self, cycle: &[Point], urbanization: f64) -> f64 {
        let centroid = Polygon::new(cycle.to_vec()).center();
        let diagonal = self.side_length * std::f64::consts::SQRT_2;
        distance(centroid, self.city_center) / diagonal / urbanization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn network(seed: u64) -> (HeightField, RoadNetwork) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut terrain = HeightField::new(TerrainConfig {
            resolution: 5,
            ..TerrainConfig::default()
        });
        terrain.generate(&mut rng);
        let config = RoadNetworkConfig {
            approximate_intersections: 9,
            edges_deviation: 4.0,
            step_distance: 10.0,
            snap_distance: 15.0,
            ..RoadNetworkConfig::default()
        };
        let network = RoadNetwork::generate(config, &terrain, &mut rng).unwrap();
        (terrain, network)
    }

    #[test]
    fn test_requires_generated_terrain() {
        let terrain = HeightField::new(TerrainConfig::default());
        let result = RoadNetwork::generate(RoadNetworkConfig::default(), &terrain, &mut ChaCha8Rng::seed_from_u64(0));
        assert!(matches!(result, Err(CityError::GenerationFailed(_))));
    }

    #[test]
    fn test_lattice_network() {
        let (_, network) = network(7);
        assert_eq!(network.intersections().points().len(), 9);
        assert_eq!(network.graph().node_count(), 9);
        assert_eq!(network.graph().edge_count(), 12);
        assert_eq!(network.roads().len(), 12);

        for (a, b) in network.graph().edges() {
            let road = network.road_for_edge(a, b).unwrap();
            assert!(road.len() >= 2);
            assert!(distance(road[0], a) <= 15.0 || distance(road[0], b) <= 15.0);
        }
        assert_eq!(network.cycles().unwrap().len(), 4);
    }

    #[test]
    fn test_oriented_road() {
        let (_, network) = network(3);
        let (a, b) = network.graph().edges().next().unwrap();
        let forward = network.oriented_road_for_edge(a, b).unwrap();
        let backward = network.oriented_road_for_edge(b, a).unwrap();
        assert_eq!(forward[0], a);
        assert_eq!(*forward.last().unwrap(), b);
        assert_eq!(backward[0], b);
        let mut reversed = backward.clone();
        reversed.reverse();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_low_level_cycle_runs_along_roads() {
        let (_, network) = network(5);
        let cycle = network.cycles().unwrap().remove(0);
        let low = network.low_level_cycle(&cycle);
        let expected: usize = cycle_pairs(&cycle)
            .map(|(a, b)| network.road_for_edge(a, b).unwrap().len() - 1)
            .sum();
        assert_eq!(low.len(), expected);
        for corner in &cycle {
            assert!(low.contains(corner));
        }
    }

    #[test]
    fn test_deterministic() {
        let (_, a) = network(42);
        let (_, b) = network(42);
        assert_eq!(a.intersections(), b.intersections());
        assert_eq!(a.roads(), b.roads());
        assert_eq!(a.city_center(), b.city_center());
    }

    #[test]
    fn test_remoteness_scaled_by_urbanization() {
        let (_, network) = network(1);
        let cycle = network.cycles().unwrap().remove(0);
        let base = network.remoteness(&cycle, 1.0);
        assert!((network.remoteness(&cycle, 2.0) - base / 2.0).abs() < 1e-12);
    }
}
