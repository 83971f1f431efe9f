//! City Configuration and Builder
//!
//! This module provides configuration types for deterministic city generation.
//! Defaults follow the property defaults of the city generator panel.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CityError, Result};

/// Terrain parameters for the diamond-square height field
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainConfig {
    /// Grid side is `2^resolution + 1` pixels (4..=9)
    pub resolution: u32,
    /// Initial noise amplitude, halved at every subdivision level (0..=4)
    pub roughness: f64,
    /// Range of the random corner values
    pub initial_height_range: (f64, f64),
    /// World side length of the square terrain
    pub side_length: f64,
    /// Multiplier applied to raw grid values when sampling elevation
    pub elevation: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            resolution: 7,
            roughness: 0.6,
            initial_height_range: (0.0, 0.0),
            // Square root of the default 1,000,000 m² area
            side_length: 1000.0,
            elevation: 50.0,
        }
    }
}

/// Primary road network parameters
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadNetworkConfig {
    /// Requested number of intersection points; the lattice has at least this many
    pub approximate_intersections: usize,
    /// Divisor of the cell size giving the Gaussian jitter of intersections.
    /// Smaller values deviate more from the regular grid.
    pub edges_deviation: f64,
    /// Distance covered by each road shaping step
    pub step_distance: f64,
    /// Number of candidate directions per shaping step
    pub number_of_samples: usize,
    /// Distance to the destination at which a road snaps onto it
    pub snap_distance: f64,
    /// Maximal deviation from the straight bearing per step (radians)
    pub deviation_angle: f64,
    /// Margin keeping intersection points away from their grid cell border
    pub intersection_padding: f64,
}

impl Default for RoadNetworkConfig {
    fn default() -> Self {
        Self {
            approximate_intersections: 30,
            edges_deviation: 4.0,
            step_distance: 10.0,
            number_of_samples: 15,
            snap_distance: 15.0,
            deviation_angle: 8f64.to_radians(),
            intersection_padding: 30.0,
        }
    }
}

/// Configuration for deterministic city generation
///
/// The same configuration will always produce the identical city.
///
/// # Example
///
/// ```rust
/// use rust_city_generator::*;
///
/// let config = CityConfigBuilder::new()
///     .seed(42)
///     .terrain_resolution(5)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.seed, 42);
/// assert_eq!(config.terrain.resolution, 5);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    /// Name of the generated city (labels the root object downstream)
    pub name: String,
    /// Random seed driving every generation stage
    pub seed: u64,
    /// Terrain parameters
    pub terrain: TerrainConfig,
    /// Primary road parameters
    pub roads: RoadNetworkConfig,
    /// Remoteness of every cell is divided by this factor before
    /// classification; larger values make more of the city urban
    pub urbanization: f64,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            name: "City".to_string(),
            seed: rand::random(),
            terrain: TerrainConfig::default(),
            roads: RoadNetworkConfig::default(),
            urbanization: 1.0,
        }
    }
}

/// Builder for creating CityConfig with validation
///
/// # Example
///
/// ```rust
/// use rust_city_generator::*;
///
/// let config = CityConfigBuilder::new()
///     .name("Springfield")
///     .seed(12345)
///     .approximate_intersections(16)
///     .unwrap()
///     .road_snap_distance(12.0)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// assert_eq!(config.roads.approximate_intersections, 16);
/// ```
#[derive(Debug, Clone)]
pub struct CityConfigBuilder {
    name: String,
    seed: Option<u64>,
    terrain: TerrainConfig,
    roads: RoadNetworkConfig,
    urbanization: f64,
}

impl CityConfigBuilder {
    /// Create a new builder with default values
    ///
    /// The seed is random unless set explicitly.
    pub fn new() -> Self {
        Self {
            name: "City".to_string(),
            seed: None,
            terrain: TerrainConfig::default(),
            roads: RoadNetworkConfig::default(),
            urbanization: 1.0,
        }
    }

    /// Set the city name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the terrain roughness
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if roughness is outside 0..=4
    pub fn terrain_roughness(mut self, roughness: f64) -> Result<Self> {
        if !(0.0..=4.0).contains(&roughness) {
            return Err(CityError::InvalidConfig(format!(
                "terrain roughness must be in [0, 4] (got {})",
                roughness
            )));
        }
        self.terrain.roughness = roughness;
        Ok(self)
    }

    /// Set the terrain resolution (grid side is `2^resolution + 1`)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if resolution is outside 4..=9
    pub fn terrain_resolution(mut self, resolution: u32) -> Result<Self> {
        if !(4..=9).contains(&resolution) {
            return Err(CityError::InvalidConfig(format!(
                "terrain resolution must be in [4, 9] (got {})",
                resolution
            )));
        }
        self.terrain.resolution = resolution;
        Ok(self)
    }

    /// Set the range of the random corner elevations
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `min > max`
    pub fn corner_elevation_range(mut self, min: f64, max: f64) -> Result<Self> {
        if min > max {
            return Err(CityError::InvalidConfig(format!(
                "corner elevation min must be <= max (got {} > {})",
                min, max
            )));
        }
        self.terrain.initial_height_range = (min, max);
        Ok(self)
    }

    /// Set the world side length of the terrain
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the side length is not positive
    pub fn terrain_side_length(mut self, side_length: f64) -> Result<Self> {
        if side_length <= 0.0 {
            return Err(CityError::InvalidConfig(format!(
                "terrain side length must be positive (got {})",
                side_length
            )));
        }
        self.terrain.side_length = side_length;
        Ok(self)
    }

    /// Set the terrain side length from its area
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the area is not positive
    pub fn terrain_area(self, area: f64) -> Result<Self> {
        if area <= 0.0 {
            return Err(CityError::InvalidConfig(format!(
                "terrain area must be positive (got {})",
                area
            )));
        }
        self.terrain_side_length(area.sqrt())
    }

    /// Set the terrain elevation multiplier
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the multiplier is not positive
    pub fn terrain_elevation(mut self, elevation: f64) -> Result<Self> {
        if elevation <= 0.0 {
            return Err(CityError::InvalidConfig(format!(
                "terrain elevation must be positive (got {})",
                elevation
            )));
        }
        self.terrain.elevation = elevation;
        Ok(self)
    }

    /// Set the approximate number of primary intersections
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the count is outside 5..=200
    pub fn approximate_intersections(mut self, count: usize) -> Result<Self> {
        if !(5..=200).contains(&count) {
            return Err(CityError::InvalidConfig(format!(
                "approximate intersections must be in [5, 200] (got {})",
                count
            )));
        }
        self.roads.approximate_intersections = count;
        Ok(self)
    }

    /// Set the intersection deviation factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the factor is outside 1..=30
    pub fn intersection_deviation(mut self, deviation: f64) -> Result<Self> {
        if !(1.0..=30.0).contains(&deviation) {
            return Err(CityError::InvalidConfig(format!(
                "intersection deviation must be in [1, 30] (got {})",
                deviation
            )));
        }
        self.roads.edges_deviation = deviation;
        Ok(self)
    }

    /// Set the road shaping step distance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the distance is outside 1..=30
    pub fn road_step_distance(mut self, distance: f64) -> Result<Self> {
        if !(1.0..=30.0).contains(&distance) {
            return Err(CityError::InvalidConfig(format!(
                "road step distance must be in [1, 30] (got {})",
                distance
            )));
        }
        self.roads.step_distance = distance;
        Ok(self)
    }

    /// Set the number of candidate directions per shaping step
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the count is zero
    pub fn road_samples(mut self, samples: usize) -> Result<Self> {
        if samples == 0 {
            return Err(CityError::InvalidConfig(
                "road samples must be at least 1".to_string(),
            ));
        }
        self.roads.number_of_samples = samples;
        Ok(self)
    }

    /// Set the road snap distance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the distance is outside 1..=30
    pub fn road_snap_distance(mut self, distance: f64) -> Result<Self> {
        if !(1.0..=30.0).contains(&distance) {
            return Err(CityError::InvalidConfig(format!(
                "road snap distance must be in [1, 30] (got {})",
                distance
            )));
        }
        self.roads.snap_distance = distance;
        Ok(self)
    }

    /// Set the maximal road deviation angle per step (radians)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the angle is outside 0..=45°
    pub fn road_deviation_angle(mut self, angle: f64) -> Result<Self> {
        if !(0.0..=45f64.to_radians()).contains(&angle) {
            return Err(CityError::InvalidConfig(format!(
                "road deviation angle must be in [0, 45] degrees (got {})",
                angle.to_degrees()
            )));
        }
        self.roads.deviation_angle = angle;
        Ok(self)
    }

    /// Set the margin between intersections and their grid cell border
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the padding is negative
    pub fn intersection_padding(mut self, padding: f64) -> Result<Self> {
        if padding < 0.0 {
            return Err(CityError::InvalidConfig(format!(
                "intersection padding must be >= 0 (got {})",
                padding
            )));
        }
        self.roads.intersection_padding = padding;
        Ok(self)
    }

    /// Set the urbanization factor
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the factor is not positive
    pub fn urbanization(mut self, factor: f64) -> Result<Self> {
        if factor <= 0.0 {
            return Err(CityError::InvalidConfig(format!(
                "urbanization must be positive (got {})",
                factor
            )));
        }
        self.urbanization = factor;
        Ok(self)
    }

    /// Build the configuration
    ///
    /// If no seed was provided, generates a random seed.
    pub fn build(self) -> Result<CityConfig> {
        let seed = self.seed.unwrap_or_else(rand::random);

        Ok(CityConfig {
            name: self.name,
            seed,
            terrain: self.terrain,
            roads: self.roads,
            urbanization: self.urbanization,
        })
    }
}

impl Default for CityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
