//! Procedural city generation
//!
//! A standalone library that grows a stylized city over a fractal terrain:
//! primary roads between jittered intersections, secondary roads inside every
//! cell, and blocks cut into building lots. The output is plain geometry,
//! suitable for any mesh builder or game engine.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rust_city_generator::*;
//!
//! // Generate a city
//! let config = CityConfigBuilder::new()
//!     .name("Springfield")
//!     .seed(42)
//!     .approximate_intersections(16).unwrap()
//!     .urbanization(1.5).unwrap()
//!     .build().unwrap();
//!
//! let city = City::generate(config).unwrap();
//!
//! for cell in city.cells() {
//!     println!("{} cell with {} lots", cell.profile(), cell.lots().count());
//! }
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): Enables O(log n) nearest-intersection and cell lookups using KD-tree
//! - `serde`: Enables serialization support for configuration and geometry

// Modules
pub mod error;
pub mod config;
pub mod geometry;
pub mod terrain;
pub mod graph;
pub mod roads;
pub mod cell;
pub mod block;
pub mod city;

mod sampling;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{CityError, Result};
pub use config::{CityConfig, CityConfigBuilder, RoadNetworkConfig, TerrainConfig};
pub use geometry::{BoundingBox, EdgeKey, Point, Polygon, Segment};
pub use terrain::{HeightField, HeightFieldState};
pub use graph::{extract_primitives, planar_graph_cycles, PlanarGraph, Primitive, PrimitiveKind};
pub use roads::{IntersectionGrid, RoadNetwork};
pub use cell::{Cell, CellBoundary, CellProfile, ControlProfile};
pub use block::{Block, BuildingArchetype, Lot, LotSubdivider, RectanglePose};
pub use city::City;

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
