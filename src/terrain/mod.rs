//! Terrain height field
//!
//! A square grid of elevations generated once by diamond-square, then read
//! pointwise by road shaping and locally rewritten by lake carving and by
//! flattening under secondary roads.

mod diamond_square;

pub use diamond_square::diamond_square;

use rand::Rng;
use tracing::debug;

use crate::config::TerrainConfig;
use crate::geometry::{BoundingBox, Point};

/// Half-width of the flattened corridor around a road, in pixels
pub const FLATTEN_HALF_WIDTH_PIXELS: f64 = 4.0;

/// Depth by which flattened roads sink below the interpolated grade (world units)
pub const ROAD_EMBOSS_DEPTH: f64 = 0.05;

/// Lifecycle of a [`HeightField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightFieldState {
    /// No grid allocated yet
    Uninitialized,
    /// Grid filled by diamond-square
    Generated,
}

/// Diamond-square terrain mapped onto a square of world coordinates
///
/// World `(0, 0)` maps to pixel `(0, 0)`; world `(side_length, side_length)`
/// maps (after clamping) to the last pixel. Stored values are raw, and
/// [`HeightField::elevation_at`] scales them by the elevation multiplier.
#[derive(Debug, Clone)]
pub struct HeightField {
    config: TerrainConfig,
    size: usize,
    grid: Vec<f64>,
    state: HeightFieldState,
}

impl HeightField {
    /// Create an uninitialized height field
    pub fn new(config: TerrainConfig) -> Self {
        Self {
            size: (1usize << config.resolution) + 1,
            config,
            grid: Vec::new(),
            state: HeightFieldState::Uninitialized,
        }
    }

    /// Allocate and fill the grid
    ///
    /// Calling this again regenerates the terrain from the current RNG state.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.grid = diamond_square(
            self.config.resolution,
            self.config.roughness,
            self.config.initial_height_range,
            rng,
        );
        self.state = HeightFieldState::Generated;
        debug!(size = self.size, "generated height field");
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> HeightFieldState {
        self.state
    }

    /// Check if the grid has been generated
    #[inline]
    pub fn is_generated(&self) -> bool {
        self.state == HeightFieldState::Generated
    }

    /// Configuration this field was created with
    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Number of pixels along one side (`2^resolution + 1`)
    #[inline]
    pub fn grid_size(&self) -> usize {
        self.size
    }

    /// World side length of the terrain square
    #[inline]
    pub fn side_length(&self) -> f64 {
        self.config.side_length
    }

    /// World extent of one pixel
    #[inline]
    pub fn pixel_size(&self) -> f64 {
        self.config.side_length / self.size as f64
    }

    /// Raw grid values, row-major (empty before generation)
    #[inline]
    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    /// World bounds of the terrain
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            min: Point::new(0.0, 0.0),
            max: Point::new(self.config.side_length, self.config.side_length),
        }
    }

    fn to_index(&self, coord: f64) -> usize {
        let index = (coord / self.pixel_size()).floor();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(self.size - 1)
        }
    }

    /// Map world coordinates to the nearest pixel, clamped to the grid
    pub fn to_image_coords(&self, x: f64, y: f64) -> (usize, usize) {
        (self.to_index(x), self.to_index(y))
    }

    /// World coordinates of a pixel's corner
    pub fn to_world_coords(&self, ix: usize, iy: usize) -> Point {
        let pixel = self.pixel_size();
        Point::new(ix as f64 * pixel, iy as f64 * pixel)
    }

    fn raw(&self, ix: usize, iy: usize) -> f64 {
        self.grid.get(iy * self.size + ix).copied().unwrap_or(0.0)
    }

    /// Elevation at a world position
    ///
    /// Returns 0 before the field is generated.
    pub fn elevation_at(&self, x: f64, y: f64) -> f64 {
        let (ix, iy) = self.to_image_coords(x, y);
        self.config.elevation * self.raw(ix, iy)
    }

    /// Elevation at a pixel
    pub fn pixel_elevation(&self, ix: usize, iy: usize) -> f64 {
        self.config.elevation * self.raw(ix, iy)
    }

    /// Overwrite the elevation of a pixel (world units)
    pub fn set_pixel_elevation(&mut self, ix: usize, iy: usize, elevation: f64) {
        if !self.is_generated() || self.config.elevation == 0.0 {
            return;
        }
        let index = iy * self.size + ix;
        if let Some(cell) = self.grid.get_mut(index) {
            *cell = elevation / self.config.elevation;
        }
    }

    /// Pixel ranges covering a world bounding box, clamped to the grid
    pub fn pixel_range(&self, bbox: &BoundingBox) -> (std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>) {
        let (x0, y0) = self.to_image_coords(bbox.min.x, bbox.min.y);
        let (x1, y1) = self.to_image_coords(bbox.max.x, bbox.max.y);
        (x0..=x1, y0..=y1)
    }

    /// Level the terrain in a corridor around segment `a → b`
    ///
    /// Each pixel within [`FLATTEN_HALF_WIDTH_PIXELS`] of the segment is blended
    /// toward a grade interpolated between `elev_a` and `elev_b` (sunk by
    /// [`ROAD_EMBOSS_DEPTH`]). The blend weight of the original elevation is
    /// `(distance / width)²`, so pixels on the segment are flat and pixels at
    /// the corridor border are untouched. Missing elevations default to the
    /// current terrain at the endpoints.
    pub fn flatten_segment(&mut self, a: Point, b: Point, elev_a: Option<f64>, elev_b: Option<f64>) {
        if !self.is_generated() {
            return;
        }

        let elev_a = elev_a.unwrap_or_else(|| self.elevation_at(a.x, a.y));
        let elev_b = elev_b.unwrap_or_else(|| self.elevation_at(b.x, b.y));

        let pixel = self.pixel_size();
        let width = FLATTEN_HALF_WIDTH_PIXELS;
        let Some(bbox) = BoundingBox::of_points([a, b]) else {
            return;
        };
        let (xs, ys) = self.pixel_range(&bbox.expanded(width * pixel));

        let av = a.vec();
        let ab = b.vec() - av;
        let len_sq = ab.length_squared();

        for iy in ys {
            for ix in xs.clone() {
                // Pixel center in world space
                let p = self.to_world_coords(ix, iy).vec() + glam::DVec2::splat(pixel / 2.0);
                let t = if len_sq > 0.0 {
                    ((p - av).dot(ab) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let flat = elev_a + (elev_b - elev_a) * t - ROAD_EMBOSS_DEPTH;
                let dist_pixels = (av + ab * t).distance(p) / pixel;
                let weight = (dist_pixels / width).powi(2).clamp(0.0, 1.0);
                if weight >= 1.0 {
                    continue;
                }
                let real = self.pixel_elevation(ix, iy);
                self.set_pixel_elevation(ix, iy, weight * real + (1.0 - weight) * flat);
            }
        }
    }
}
