//! Lake cells
//!
//! A lake is carved into the terrain as a few overlapping cosine basins. Its
//! outline is the convex hull of the basin rims and its surface sits just
//! below the lowest rim sample.

use rand::Rng;
use tracing::debug;

use super::CellBoundary;
use crate::geometry::{convex_hull, distance, Point, Polygon};
use crate::sampling::uniform;
use crate::terrain::HeightField;

/// Number of samples on each basin rim
const RIM_SAMPLES: usize = 16;

/// Water surface offset below the lowest rim sample
const WATER_LEVEL_OFFSET: f64 = 0.5;

/// Amplitude of the carving noise relative to the carved depth
const NOISE_AMPLITUDE: f64 = 0.05;

/// One cosine-shaped depression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basin {
    /// Deepest point
    pub center: Point,
    /// Distance from the center at which the depression ends
    pub radius: f64,
    /// Depth at the center
    pub depth: f64,
}

impl Basin {
    /// Height offset of the basin at distance `d` from its center
    ///
    /// `-depth` at the center, rising to 0 at the rim and beyond.
    pub fn offset_at(&self, d: f64) -> f64 {
        if d >= self.radius || self.radius <= 0.0 {
            return 0.0;
        }
        let falloff = (1.0 - (d * std::f64::consts::PI / self.radius).cos()) / 2.0;
        self.depth * (falloff - 1.0)
    }

    fn rim(&self) -> impl Iterator<Item = Point> + '_ {
        (0..RIM_SAMPLES).map(move |i| {
            let angle = i as f64 * std::f64::consts::TAU / RIM_SAMPLES as f64;
            Point::new(
                self.center.x + self.radius * angle.cos(),
                self.center.y + self.radius * angle.sin(),
            )
        })
    }
}

/// Cell filled by a lake instead of roads
#[derive(Debug, Clone)]
pub struct LakeCell {
    boundary: CellBoundary,
    basins: Vec<Basin>,
    outline: Polygon,
    water_level: f64,
}

impl LakeCell {
    /// Carve the lake into the terrain
    pub fn generate<R: Rng + ?Sized>(boundary: CellBoundary, terrain: &mut HeightField, rng: &mut R) -> Self {
        let high = boundary.high();
        let center = high.center();
        let to_boundary = high.point_distance(center);

        let count = rng.gen_range(1..=4usize);
        let basins: Vec<Basin> = (0..count)
            .map(|_| {
                let angle = uniform(rng, 0.0, std::f64::consts::TAU);
                let offset = uniform(rng, 0.0, 0.7 * to_boundary);
                let position = Point::new(center.x + offset * angle.cos(), center.y + offset * angle.sin());
                let radius = high.point_distance(position) * uniform(rng, 0.6, 1.6);
                Basin {
                    center: position,
                    radius,
                    depth: 0.15 * radius / count as f64,
                }
            })
            .collect();

        if let Some(bbox) = high.bounding_box() {
            let (xs, ys) = terrain.pixel_range(&bbox);
            let half_pixel = terrain.pixel_size() / 2.0;
            for iy in ys {
                for ix in xs.clone() {
                    let corner = terrain.to_world_coords(ix, iy);
                    let p = Point::new(corner.x + half_pixel, corner.y + half_pixel);

                    let mut carved = 0.0;
                    let mut noise_weight = 0.0;
                    for basin in &basins {
                        let d = distance(p, basin.center);
                        if d < basin.radius {
                            carved += basin.offset_at(d);
                            noise_weight += basin.depth * d / basin.radius;
                        }
                    }
                    if carved == 0.0 {
                        continue;
                    }

                    let noise = uniform(rng, -1.0, 1.0) * NOISE_AMPLITUDE * noise_weight;
                    let elevation = terrain.pixel_elevation(ix, iy) + carved + noise;
                    terrain.set_pixel_elevation(ix, iy, elevation);
                }
            }
        }

        let rim: Vec<Point> = basins.iter().flat_map(|b| b.rim()).collect();
        let outline = Polygon::new(convex_hull(&rim));
        let water_level = rim
            .iter()
            .map(|p| terrain.elevation_at(p.x, p.y))
            .fold(f64::INFINITY, f64::min)
            - WATER_LEVEL_OFFSET;

        debug!(basins = basins.len(), water_level, "carved lake");

        Self {
            boundary,
            basins,
            outline,
            water_level,
        }
    }

    /// Cell boundary
    #[inline]
    pub fn boundary(&self) -> &CellBoundary {
        &self.boundary
    }

    /// Carved basins
    #[inline]
    pub fn basins(&self) -> &[Basin] {
        &self.basins
    }

    /// Convex outline of the water surface (counterclockwise)
    #[inline]
    pub fn outline(&self) -> &Polygon {
        &self.outline
    }

    /// Height of the flat water surface
    #[inline]
    pub fn water_level(&self) -> f64 {
        self.water_level
    }
}
