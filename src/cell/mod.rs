//! City cells
//!
//! A cell is the region enclosed by one minimal cycle of the primary road
//! network. Its profile, derived from the distance to the city center,
//! decides what fills it: a lake, secondary roads only, or secondary roads
//! split into blocks and lots.

pub mod growth;
pub mod lake;

pub use growth::{GrowthState, RoadsCell};
pub use lake::{Basin, LakeCell};

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::block::{Block, Lot};
use crate::error::CityError;
use crate::geometry::{cycle_pairs, Point, Polygon};
use crate::graph::{planar_graph_cycles, PlanarGraph};
use crate::roads::RoadNetwork;
use crate::terrain::HeightField;

/// Classification of a cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellProfile {
    /// Dense downtown grid
    Urban,
    /// Looser residential network
    Suburban,
    /// Sparse roads without blocks
    Rural,
    /// Water body, no roads
    Lake,
}

impl CellProfile {
    /// Profile for a remoteness value (distance to the city center over the
    /// terrain diagonal)
    pub fn from_remoteness(remoteness: f64) -> Self {
        if remoteness >= 0.7 {
            Self::Lake
        } else if remoteness >= 0.4 {
            Self::Rural
        } else if remoteness >= 0.2 {
            Self::Suburban
        } else {
            Self::Urban
        }
    }

    /// Name used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urban => "urban",
            Self::Suburban => "suburban",
            Self::Rural => "rural",
            Self::Lake => "lake",
        }
    }

    /// Secondary growth parameters, or `None` for lakes
    pub fn control(&self) -> Option<ControlProfile> {
        use std::f64::consts::PI;

        match self {
            Self::Urban => Some(ControlProfile {
                segment_size: 30.0,
                snap_size: 20.0,
                degree: 3,
                span_angle: 3.0 * PI / 2.0,
                angle_deviation: 0.0,
                join_probability: 1.0,
                starting_points: 4,
                max_rounds: 40,
            }),
            Self::Suburban => Some(ControlProfile {
                segment_size: 45.0,
                snap_size: 25.0,
                degree: 2,
                span_angle: PI,
                angle_deviation: 0.2,
                join_probability: 0.6,
                starting_points: 3,
                max_rounds: 25,
            }),
            Self::Rural => Some(ControlProfile {
                segment_size: 70.0,
                snap_size: 30.0,
                degree: 2,
                span_angle: PI,
                angle_deviation: 0.4,
                join_probability: 0.3,
                starting_points: 2,
                max_rounds: 15,
            }),
            Self::Lake => None,
        }
    }
}

impl fmt::Display for CellProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellProfile {
    type Err = CityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "urban" => Ok(Self::Urban),
            "suburban" => Ok(Self::Suburban),
            "rural" => Ok(Self::Rural),
            "lake" => Ok(Self::Lake),
            _ => Err(CityError::UnknownProfile(s.to_string())),
        }
    }
}

/// Parameters of secondary road growth
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlProfile {
    /// Length of every grown segment
    pub segment_size: f64,
    /// Distance under which a candidate snaps onto existing geometry
    pub snap_size: f64,
    /// Branches attempted per extremity
    pub degree: usize,
    /// Angular span shared by the branches (radians)
    pub span_angle: f64,
    /// Standard deviation of the branch position within its sector
    pub angle_deviation: f64,
    /// Probability that a rejected candidate joins the geometry it hit
    pub join_probability: f64,
    /// Number of boundary roads seeding the growth
    pub starting_points: usize,
    /// Growth round cap
    pub max_rounds: usize,
}

/// Boundary of a cell at two levels of detail
///
/// The high-level polygon joins the intersections by straight edges and is
/// always clockwise. `edge_roads[i]` is the road polyline along high-level
/// edge `i`, running in the same direction.
#[derive(Debug, Clone, PartialEq)]
pub struct CellBoundary {
    high: Polygon,
    edge_roads: Vec<Vec<Point>>,
}

impl CellBoundary {
    /// Boundary of a primary cycle, traced along the network's roads
    pub fn from_network(cycle: &[Point], network: &RoadNetwork) -> Self {
        let mut high = Polygon::new(cycle.to_vec());
        high.make_clockwise();
        let edge_roads = high
            .edges()
            .map(|(a, b)| network.oriented_road_for_edge(a, b).unwrap_or_else(|| vec![a, b]))
            .collect();
        Self { high, edge_roads }
    }

    /// Boundary whose roads are the straight edges cut into `pieces` samples
    pub fn straight(polygon: Polygon, pieces: usize) -> Self {
        let mut high = polygon;
        high.make_clockwise();
        let pieces = pieces.max(1);
        let edge_roads = high
            .edges()
            .map(|(a, b)| {
                (0..=pieces)
                    .map(|i| {
                        let t = i as f64 / pieces as f64;
                        Point::from(a.vec().lerp(b.vec(), t))
                    })
                    .collect()
            })
            .collect();
        Self { high, edge_roads }
    }

    /// Clockwise polygon through the intersections
    #[inline]
    pub fn high(&self) -> &Polygon {
        &self.high
    }

    /// Road polylines along the high-level edges
    #[inline]
    pub fn edge_roads(&self) -> &[Vec<Point>] {
        &self.edge_roads
    }

    /// Closed ring of all road samples around the cell
    pub fn low_cycle(&self) -> Vec<Point> {
        self.edge_roads
            .iter()
            .flat_map(|road| road.iter().take(road.len().saturating_sub(1)).copied())
            .collect()
    }
}

/// Land cell whose secondary roads enclose blocks
#[derive(Debug, Clone)]
pub struct BlocksCell {
    roads: RoadsCell,
    blocks: Vec<Block>,
}

impl BlocksCell {
    /// Extract blocks from grown roads and subdivide them into lots
    ///
    /// Blocks are the minimal cycles of the secondary roads together with the
    /// med-cycle. If extraction fails on this cell the cell keeps its roads
    /// but has no blocks.
    pub fn generate<R: Rng + ?Sized>(roads: RoadsCell, rng: &mut R) -> Self {
        let mut graph: PlanarGraph = roads.graph().clone();
        for (a, b) in cycle_pairs(&roads.med_cycle()) {
            graph.add_edge(a, b);
        }

        let cycles = match planar_graph_cycles(graph) {
            Ok(cycles) => cycles,
            Err(err) => {
                warn!(profile = %roads.profile(), error = %err, "skipping block extraction");
                Vec::new()
            }
        };

        let blocks: Vec<Block> = cycles
            .into_iter()
            .map(|cycle| {
                let mut block = Block::new(cycle);
                block.generate(roads.profile(), rng);
                block
            })
            .collect();

        debug!(
            blocks = blocks.len(),
            valid = blocks.iter().filter(|b| b.is_valid()).count(),
            lots = blocks.iter().map(|b| b.lots().len()).sum::<usize>(),
            "subdivided cell"
        );

        Self { roads, blocks }
    }

    /// Secondary roads
    #[inline]
    pub fn roads(&self) -> &RoadsCell {
        &self.roads
    }

    /// All extracted blocks, valid or not
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}

/// Generated content of a cell
#[derive(Debug, Clone)]
pub enum Cell {
    /// Carved lake
    Lake(LakeCell),
    /// Secondary roads only
    Roads(RoadsCell),
    /// Secondary roads, blocks and lots
    Blocks(BlocksCell),
}

impl Cell {
    /// Fill a cell according to its profile
    ///
    /// Lakes and secondary roads rewrite the terrain locally.
    pub fn generate<R: Rng + ?Sized>(
        boundary: CellBoundary,
        profile: CellProfile,
        terrain: &mut HeightField,
        rng: &mut R,
    ) -> Self {
        let Some(control) = profile.control() else {
            return Self::Lake(LakeCell::generate(boundary, terrain, rng));
        };

        let mut roads = RoadsCell::new(boundary, profile, control);
        roads.generate(terrain, rng);

        match profile {
            CellProfile::Urban | CellProfile::Suburban => Self::Blocks(BlocksCell::generate(roads, rng)),
            _ => Self::Roads(roads),
        }
    }

    /// Classification of the cell
    pub fn profile(&self) -> CellProfile {
        match self {
            Self::Lake(_) => CellProfile::Lake,
            Self::Roads(roads) => roads.profile(),
            Self::Blocks(blocks) => blocks.roads().profile(),
        }
    }

    /// Cell boundary
    pub fn boundary(&self) -> &CellBoundary {
        match self {
            Self::Lake(lake) => lake.boundary(),
            Self::Roads(roads) => roads.boundary(),
            Self::Blocks(blocks) => blocks.roads().boundary(),
        }
    }

    /// Secondary road graph, if the cell has roads
    pub fn secondary_roads(&self) -> Option<&PlanarGraph> {
        match self {
            Self::Lake(_) => None,
            Self::Roads(roads) => Some(roads.graph()),
            Self::Blocks(blocks) => Some(blocks.roads().graph()),
        }
    }

    /// Blocks of the cell (empty for lakes and road-only cells)
    pub fn blocks(&self) -> &[Block] {
        match self {
            Self::Blocks(blocks) => blocks.blocks(),
            _ => &[],
        }
    }

    /// Lots of every valid block
    pub fn lots(&self) -> impl Iterator<Item = &Lot> + '_ {
        self.blocks().iter().flat_map(|block| block.lots().iter())
    }

    /// Lake data, if this is a lake cell
    pub fn lake(&self) -> Option<&LakeCell> {
        match self {
            Self::Lake(lake) => Some(lake),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square(size: f64) -> Polygon {
        // Counterclockwise on purpose
        Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ])
    }

    #[test]
    fn test_profile_from_remoteness() {
        assert_eq!(CellProfile::from_remoteness(0.0), CellProfile::Urban);
        assert_eq!(CellProfile::from_remoteness(0.2), CellProfile::Suburban);
        assert_eq!(CellProfile::from_remoteness(0.39), CellProfile::Suburban);
        assert_eq!(CellProfile::from_remoteness(0.4), CellProfile::Rural);
        assert_eq!(CellProfile::from_remoteness(0.7), CellProfile::Lake);
        assert_eq!(CellProfile::from_remoteness(2.0), CellProfile::Lake);
    }

    #[test]
    fn test_profile_parsing() {
        assert_eq!("Urban".parse::<CellProfile>().unwrap(), CellProfile::Urban);
        assert_eq!("lake".parse::<CellProfile>().unwrap(), CellProfile::Lake);
        assert_eq!(
            "downtown".parse::<CellProfile>(),
            Err(CityError::UnknownProfile("downtown".to_string()))
        );
        for profile in [CellProfile::Urban, CellProfile::Suburban, CellProfile::Rural, CellProfile::Lake] {
            assert_eq!(profile.to_string().parse::<CellProfile>().unwrap(), profile);
        }
    }

    #[test]
    fn test_control_profiles() {
        let urban = CellProfile::Urban.control().unwrap();
        assert_eq!(urban.segment_size, 30.0);
        assert_eq!(urban.snap_size, 20.0);
        assert_eq!(urban.degree, 3);
        assert_eq!(urban.join_probability, 1.0);
        assert!(CellProfile::Lake.control().is_none());

        let suburban = CellProfile::Suburban.control().unwrap();
        let rural = CellProfile::Rural.control().unwrap();
        assert!(suburban.segment_size > urban.segment_size);
        assert!(rural.segment_size > suburban.segment_size);
    }

    #[test]
    fn test_straight_boundary_is_clockwise() {
        let boundary = CellBoundary::straight(square(100.0), 4);
        assert!(boundary.high().is_clockwise());
        assert_eq!(boundary.edge_roads().len(), 4);
        for ((a, b), road) in boundary.high().edges().zip(boundary.edge_roads()) {
            assert_eq!(road.first(), Some(&a));
            assert_eq!(road.last(), Some(&b));
        }
        assert_eq!(boundary.low_cycle().len(), 16);
    }

    #[test]
    fn test_cell_variants_follow_profile() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut terrain = HeightField::new(TerrainConfig {
            resolution: 5,
            side_length: 400.0,
            ..TerrainConfig::default()
        });
        terrain.generate(&mut rng);

        let boundary = || CellBoundary::straight(square(300.0), 10);

        let lake = Cell::generate(boundary(), CellProfile::Lake, &mut terrain, &mut rng);
        assert!(matches!(lake, Cell::Lake(_)));
        assert!(lake.secondary_roads().is_none());

        let rural = Cell::generate(boundary(), CellProfile::Rural, &mut terrain, &mut rng);
        assert!(matches!(rural, Cell::Roads(_)));
        assert!(rural.blocks().is_empty());

        let urban = Cell::generate(boundary(), CellProfile::Urban, &mut terrain, &mut rng);
        assert!(matches!(urban, Cell::Blocks(_)));
        assert_eq!(urban.profile(), CellProfile::Urban);
        assert!(urban.secondary_roads().unwrap().edge_count() > 0);
    }

    #[test]
    fn test_urban_cell_produces_lots() {
        let mut total_lots = 0;
        for seed in 0..4 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut terrain = HeightField::new(TerrainConfig {
                resolution: 5,
                side_length: 400.0,
                ..TerrainConfig::default()
            });
            terrain.generate(&mut rng);

            let cell = Cell::generate(
                CellBoundary::straight(square(300.0), 10),
                CellProfile::Urban,
                &mut terrain,
                &mut rng,
            );
            assert!(!cell.blocks().is_empty(), "seed {}", seed);
            for block in cell.blocks() {
                assert!(block.polygon().is_clockwise());
                assert_eq!(block.is_valid(), block.contracted().is_some());
                if !block.is_valid() {
                    assert!(block.lots().is_empty());
                }
            }
            for lot in cell.lots() {
                assert!(lot.polygon().area() > 0.0);
                assert!(lot.archetype().is_some());
                assert!(lot.outer_edges().iter().any(|&o| o));
            }
            total_lots += cell.lots().count();
        }
        assert!(total_lots > 0);
    }
}
