//! City blocks
//!
//! A block is a minimal cycle of a cell's secondary road graph. It is shrunk
//! by the sidewalk width and, when the result is still a usable polygon, cut
//! into lots that each receive a building archetype.

pub mod lot;

pub use lot::{min_vertex_angle, BuildingArchetype, Lot, LotSubdivider, RectanglePose, Subdivision};

use std::collections::BTreeSet;

use rand::Rng;
use tracing::trace;

use crate::cell::CellProfile;
use crate::geometry::{EdgeKey, Point, Polygon};

/// Blocks (and their contracted outlines) must enclose more than this area
pub const MINIMAL_BLOCK_AREA: f64 = 30.0;

/// Width of the sidewalk between the road and the lots
pub const SIDEWALK_WIDTH: f64 = 5.0;

/// Area enclosed by secondary roads
#[derive(Debug, Clone)]
pub struct Block {
    polygon: Polygon,
    contracted: Option<Polygon>,
    lots: Vec<Lot>,
    subdivision_depth: usize,
}

impl Block {
    /// Create a block from a road cycle
    ///
    /// The outline is made clockwise so that contracting moves it inward.
    pub fn new(cycle: Vec<Point>) -> Self {
        let mut polygon = Polygon::new(cycle);
        polygon.make_clockwise();
        Self {
            polygon,
            contracted: None,
            lots: Vec::new(),
            subdivision_depth: 0,
        }
    }

    /// Contract the block by the sidewalk and subdivide it into lots
    ///
    /// Invalid blocks keep no lots. Archetypes follow the cell profile.
    pub fn generate<R: Rng + ?Sized>(&mut self, profile: CellProfile, rng: &mut R) {
        self.generate_with(&LotSubdivider::default(), profile, rng);
    }

    /// Same as [`Block::generate`] with a custom subdivider
    pub fn generate_with<R: Rng + ?Sized>(&mut self, subdivider: &LotSubdivider, profile: CellProfile, rng: &mut R) {
        self.lots.clear();
        self.subdivision_depth = 0;
        self.contracted = None;

        if self.polygon.area() <= MINIMAL_BLOCK_AREA {
            trace!(area = self.polygon.area(), "block too small");
            return;
        }

        let contracted = self.polygon.contracted(SIDEWALK_WIDTH);
        let usable = contracted.number_of_vertices() >= 3
            && contracted.is_simple()
            && contracted.is_clockwise()
            && contracted.area() > MINIMAL_BLOCK_AREA;
        if !usable {
            trace!(area = self.polygon.area(), "block degenerates under sidewalk");
            return;
        }

        // Every contracted edge runs along the sidewalk
        let outer: BTreeSet<EdgeKey> = contracted.edges().map(EdgeKey::from).collect();
        let Subdivision {
            mut lots,
            max_depth_reached,
        } = subdivider.subdivide(&contracted, outer);

        for lot in &mut lots {
            let archetype = BuildingArchetype::choose(profile, lot.is_near_rectangular(), rng);
            lot.set_archetype(archetype);
        }

        self.lots = lots;
        self.subdivision_depth = max_depth_reached;
        self.contracted = Some(contracted);
    }

    /// Clockwise outline along the road axis
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// Outline after removing the sidewalk, if the block is valid
    #[inline]
    pub fn contracted(&self) -> Option<&Polygon> {
        self.contracted.as_ref()
    }

    /// Check if the block survived contraction
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.contracted.is_some()
    }

    /// Lots accepted by the subdivision
    #[inline]
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Deepest recursion level reached while subdividing
    #[inline]
    pub fn subdivision_depth(&self) -> usize {
        self.subdivision_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square_cycle(size: f64) -> Vec<Point> {
        // Counterclockwise on purpose
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ]
    }

    #[test]
    fn test_block_made_clockwise() {
        let block = Block::new(square_cycle(10.0));
        assert!(block.polygon().is_clockwise());
        assert!(!block.is_valid());
    }

    #[test]
    fn test_small_block_invalid() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut block = Block::new(square_cycle(5.0));
        block.generate(CellProfile::Urban, &mut rng);
        assert!(!block.is_valid());
        assert!(block.lots().is_empty());

        // Large enough before contraction, gone after it
        let mut block = Block::new(square_cycle(12.0));
        block.generate(CellProfile::Urban, &mut rng);
        assert!(!block.is_valid());
        assert!(block.lots().is_empty());
    }

    #[test]
    fn test_urban_block_lots() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut block = Block::new(square_cycle(60.0));
        block.generate(CellProfile::Urban, &mut rng);

        assert!(block.is_valid());
        let contracted = block.contracted().unwrap();
        assert!((contracted.area() - 2500.0).abs() < 1e-6);
        assert!(!block.lots().is_empty());
        assert!(block.subdivision_depth() <= LotSubdivider::default().max_depth + 1);

        for lot in block.lots() {
            // Axis-aligned halving of a square only yields rectangles
            assert_eq!(lot.archetype(), Some(BuildingArchetype::Skyscraper));
            assert!(lot.outer_edges().iter().any(|&o| o));
            let c = lot.polygon().center();
            assert!(c.x > 5.0 && c.x < 55.0 && c.y > 5.0 && c.y < 55.0);
        }
    }

    #[test]
    fn test_regenerate_is_idempotent() {
        let mut block = Block::new(square_cycle(60.0));
        block.generate(CellProfile::Rural, &mut ChaCha8Rng::seed_from_u64(2));
        let first = block.lots().to_vec();
        block.generate(CellProfile::Rural, &mut ChaCha8Rng::seed_from_u64(2));
        assert_eq!(block.lots(), first.as_slice());
        assert!(first.iter().all(|l| l.archetype() == Some(BuildingArchetype::House)));
    }
}
