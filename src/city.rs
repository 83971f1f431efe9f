//! City main structure

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::block::Lot;
use crate::cell::{Cell, CellBoundary, CellProfile};
use crate::config::CityConfig;
use crate::error::Result;
use crate::roads::RoadNetwork;
use crate::terrain::HeightField;

#[cfg(feature = "spatial-index")]
use crate::geometry::Point;
#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;

/// A complete generated city
///
/// Holds the terrain (including the flattening done under secondary roads and
/// the carved lakes), the primary road network and one cell per primary
/// cycle.
///
/// # Examples
///
/// ```no_run
/// use rust_city_generator::*;
///
/// let config = CityConfigBuilder::new()
///     .seed(42)
///     .terrain_resolution(5)
///     .unwrap()
///     .approximate_intersections(9)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let city = City::generate(config).unwrap();
/// println!("Generated {} cells and {} lots", city.cell_count(), city.lots().count());
/// ```
#[derive(Debug, Clone)]
pub struct City {
    /// Configuration used to generate this city
    config: CityConfig,

    terrain: HeightField,

    network: RoadNetwork,

    /// One entry per primary cycle, in extraction order
    cells: Vec<Cell>,

    /// Nearest-point lookups over intersections and cell centers
    #[cfg(feature = "spatial-index")]
    intersection_index: SpatialIndex,
    #[cfg(feature = "spatial-index")]
    cell_index: SpatialIndex,
}

impl City {
    /// Run the whole pipeline
    ///
    /// Terrain, primary roads, cells, secondary roads, blocks and lots are
    /// generated in that order from a single generator seeded with
    /// `config.seed`, so equal configurations give equal cities.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentEmbedding` if the primary graph's cycles cannot be
    /// extracted.
    pub fn generate(config: CityConfig) -> Result<Self> {
        info!(name = %config.name, seed = config.seed, "generating city");
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut terrain = HeightField::new(config.terrain);
        terrain.generate(&mut rng);
        debug!(grid_size = terrain.grid_size(), "generated terrain");

        let network = RoadNetwork::generate(config.roads, &terrain, &mut rng)?;
        let cycles = network.cycles()?;
        debug!(cycles = cycles.len(), "extracted primary cycles");

        let cells: Vec<Cell> = cycles
            .iter()
            .map(|cycle| {
                let profile = CellProfile::from_remoteness(network.remoteness(cycle, config.urbanization));
                let boundary = CellBoundary::from_network(cycle, &network);
                Cell::generate(boundary, profile, &mut terrain, &mut rng)
            })
            .collect();

        #[cfg(feature = "spatial-index")]
        let (intersection_index, cell_index) = {
            let centers: Vec<Point> = cells.iter().map(|c| c.boundary().high().center()).collect();
            (SpatialIndex::new(network.intersections().points()), SpatialIndex::new(&centers))
        };

        let city = Self {
            config,
            terrain,
            network,
            cells,
            #[cfg(feature = "spatial-index")]
            intersection_index,
            #[cfg(feature = "spatial-index")]
            cell_index,
        };
        info!(
            cells = city.cell_count(),
            blocks = city.cells.iter().map(|c| c.blocks().len()).sum::<usize>(),
            lots = city.lots().count(),
            "generated city"
        );
        Ok(city)
    }

    /// Get the configuration used to generate this city
    #[inline]
    pub fn config(&self) -> &CityConfig {
        &self.config
    }

    /// Terrain after every cell has rewritten it
    #[inline]
    pub fn terrain(&self) -> &HeightField {
        &self.terrain
    }

    /// Primary road network
    #[inline]
    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Get the number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get a cell by index
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn get_cell(&self, id: usize) -> Option<&Cell> {
        self.cells.get(id)
    }

    /// Get all cells as a slice
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Cells of the given profile
    pub fn cells_with_profile(&self, profile: CellProfile) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(move |c| c.profile() == profile)
    }

    /// Every lot of every cell
    pub fn lots(&self) -> impl Iterator<Item = &Lot> + '_ {
        self.cells.iter().flat_map(|c| c.lots())
    }

    /// Primary intersection closest to `position` (requires spatial-index feature)
    #[cfg(feature = "spatial-index")]
    pub fn nearest_intersection(&self, position: Point) -> Option<Point> {
        let id = self.intersection_index.find_nearest(position)?;
        self.network.intersections().points().get(id).copied()
    }

    /// Index of the cell whose high-level boundary contains `position`
    /// (requires spatial-index feature)
    ///
    /// The cell with the nearest center is tried first; positions outside
    /// every cell return `None`.
    #[cfg(feature = "spatial-index")]
    pub fn find_cell_at(&self, position: Point) -> Option<usize> {
        if let Some(id) = self.cell_index.find_nearest(position) {
            if self.cells[id].boundary().high().contains_point(position) {
                return Some(id);
            }
        }
        self.cells
            .iter()
            .position(|c| c.boundary().high().contains_point(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CityConfigBuilder;
    use crate::geometry::distance;

    fn small_config(seed: u64) -> CityConfig {
        CityConfigBuilder::new()
            .seed(seed)
            .terrain_resolution(5)
            .unwrap()
            .approximate_intersections(9)
            .unwrap()
            .intersection_deviation(4.0)
            .unwrap()
            .road_step_distance(10.0)
            .unwrap()
            .road_snap_distance(15.0)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_city_generation() {
        let city = City::generate(small_config(42)).unwrap();

        assert_eq!(city.terrain().grid_size(), 33);
        assert!(city.terrain().grid().iter().all(|h| h.is_finite()));

        let network = city.network();
        assert_eq!(network.intersections().points().len(), 9);
        assert_eq!(network.graph().edge_count(), 12);
        assert_eq!(network.roads().len(), 12);
        for (key, road) in network.roads() {
            let (a, b) = (key.first(), key.second());
            let start = road[0];
            let end = road[road.len() - 1];
            assert!(distance(start, a).min(distance(start, b)) <= 15.0);
            assert!(distance(end, a).min(distance(end, b)) <= 15.0);
        }

        assert_eq!(city.cell_count(), 4);
        for cell in city.cells() {
            assert!(cell.boundary().high().is_clockwise());
            assert_eq!(cell.boundary().high().number_of_vertices(), 4);
        }
    }

    #[test]
    fn test_deterministic() {
        let a = City::generate(small_config(7)).unwrap();
        let b = City::generate(small_config(7)).unwrap();

        assert_eq!(a.network().roads(), b.network().roads());
        assert_eq!(a.terrain().grid(), b.terrain().grid());
        let profiles = |c: &City| c.cells().iter().map(Cell::profile).collect::<Vec<_>>();
        assert_eq!(profiles(&a), profiles(&b));
        let lots_a: Vec<&Lot> = a.lots().collect();
        let lots_b: Vec<&Lot> = b.lots().collect();
        assert_eq!(lots_a, lots_b);
    }

    #[test]
    fn test_urbanization_makes_cells_urban() {
        let mut config = small_config(3);
        config.urbanization = 1000.0;
        let city = City::generate(config).unwrap();
        assert_eq!(city.cells_with_profile(CellProfile::Urban).count(), city.cell_count());
        assert!(city.cells().iter().all(|c| matches!(c, Cell::Blocks(_))));
    }

    #[cfg(feature = "spatial-index")]
    #[test]
    fn test_spatial_queries() {
        let city = City::generate(small_config(11)).unwrap();

        let corner = city.network().intersections().points()[0];
        let probe = Point::new(corner.x + 1.0, corner.y + 1.0);
        assert_eq!(city.nearest_intersection(probe), Some(corner));

        for (id, cell) in city.cells().iter().enumerate() {
            let center = cell.boundary().high().center();
            assert_eq!(city.find_cell_at(center), Some(id));
        }
        assert_eq!(city.find_cell_at(Point::new(-10.0, -10.0)), None);
    }
}
