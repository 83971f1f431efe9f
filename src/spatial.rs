//! Spatial indexing for fast point queries on a finished city
//!
//! This module is only available with the `spatial-index` feature.

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

use crate::geometry::Point;

/// Wrapper around a 2D KD-tree over city-plane points
///
/// Used to find the nearest primary intersection and the candidate cell for a
/// query position. An index built from no points answers every query with
/// `None`.
#[derive(Clone)]
pub struct SpatialIndex {
    tree: Option<ImmutableKdTree<f64, usize, 2, 32>>,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over `points`; query results are indices into it
    ///
    /// # Example
    ///
    /// ```
    /// use rust_city_generator::*;
    ///
    /// let points = [Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(0.0, 100.0)];
    /// let index = SpatialIndex::new(&points);
    /// assert_eq!(index.find_nearest(Point::new(90.0, 5.0)), Some(1));
    /// ```
    pub fn new(points: &[Point]) -> Self {
        let coords: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
        let tree = (!coords.is_empty()).then(|| ImmutableKdTree::new_from_slice(&coords));
        Self {
            tree,
            len: coords.len(),
        }
    }

    /// Number of indexed points
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the index holds no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the point closest to `position`
    pub fn find_nearest(&self, position: Point) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let result = tree.nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        Some(result.item)
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex").field("len", &self.len).finish()
    }
}
