//! Lot subdivision and building data
//!
//! A block is cut recursively between the midpoints of its longest edge and
//! the edge most parallel to it. Pieces that no longer touch a road are
//! dropped; pieces below the minimal area become lots when they are simple
//! and have no needle-sharp vertex.

use std::collections::BTreeSet;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::CellProfile;
use crate::geometry::{cycle_pairs, distance_squared, EdgeKey, Point, Polygon};

/// Fill ratio above which a lot counts as rectangular
pub const NEAR_RECTANGULAR_RATIO: f64 = 0.85;

/// Kind of building placed on a lot
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildingArchetype {
    /// Fractal tower on a rectangular base
    Skyscraper,
    /// Extruded tower following the lot outline
    Office,
    /// Low house following the lot outline
    House,
}

impl BuildingArchetype {
    /// Archetype allowed for a lot in a cell of the given profile
    ///
    /// Skyscrapers need a near-rectangular lot.
    pub fn choose<R: Rng + ?Sized>(profile: CellProfile, near_rectangular: bool, rng: &mut R) -> Option<Self> {
        match profile {
            CellProfile::Urban if near_rectangular => Some(Self::Skyscraper),
            CellProfile::Urban => Some(Self::Office),
            CellProfile::Suburban => {
                if rng.gen_bool(0.5) {
                    Some(Self::House)
                } else {
                    Some(Self::Office)
                }
            }
            CellProfile::Rural => Some(Self::House),
            CellProfile::Lake => None,
        }
    }
}

/// Oriented bounding rectangle of a lot
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectanglePose {
    /// Extent along the longest edge, then across it
    pub dimensions: (f64, f64),
    /// Rectangle center in world coordinates
    pub center: Point,
    /// Angle of the longest edge (radians, counterclockwise from +x)
    pub rotation: f64,
}

/// Road-fronting piece of a block
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    polygon: Polygon,
    outer: Vec<bool>,
    archetype: Option<BuildingArchetype>,
}

impl Lot {
    /// Create a lot from its outline and per-edge road adjacency
    pub fn new(polygon: Polygon, outer: Vec<bool>) -> Self {
        Self {
            polygon,
            outer,
            archetype: None,
        }
    }

    /// Outline of the lot
    #[inline]
    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    /// `outer_edges()[i]` tells whether edge `i` fronts a road
    #[inline]
    pub fn outer_edges(&self) -> &[bool] {
        &self.outer
    }

    /// Building kind placed on this lot
    #[inline]
    pub fn archetype(&self) -> Option<BuildingArchetype> {
        self.archetype
    }

    /// Assign the building kind
    pub fn set_archetype(&mut self, archetype: Option<BuildingArchetype>) {
        self.archetype = archetype;
    }

    /// Outline shrunk by `setback`, or `None` if that degenerates it
    pub fn footprint(&self, setback: f64) -> Option<Polygon> {
        let footprint = self.polygon.contracted(setback);
        if footprint.number_of_vertices() != self.polygon.number_of_vertices() || footprint.number_of_vertices() < 3 {
            return None;
        }
        // An over-contracted ring keeps its orientation but flips its edges
        let edges_kept = self.polygon.edges().zip(footprint.edges()).all(|((a, b), (c, d))| {
            (b.vec() - a.vec()).dot(d.vec() - c.vec()) > 0.0
        });
        let valid = edges_kept
            && footprint.is_simple()
            && footprint.is_clockwise() == self.polygon.is_clockwise()
            && footprint.area() < self.polygon.area();
        valid.then_some(footprint)
    }

    /// Bounding rectangle aligned with the longest edge
    pub fn rectangle_pose(&self) -> Option<RectanglePose> {
        let (a, b) = self
            .polygon
            .edges()
            .fold(None, |best: Option<(Point, Point)>, edge| match best {
                Some(best) if distance_squared(best.0, best.1) >= distance_squared(edge.0, edge.1) => Some(best),
                _ => Some(edge),
            })?;
        let rotation = (b.y - a.y).atan2(b.x - a.x);
        let (sin, cos) = rotation.sin_cos();

        // Vertices in the frame of the longest edge
        let local: Vec<(f64, f64)> = self
            .polygon
            .vertices()
            .iter()
            .map(|p| (p.x * cos + p.y * sin, -p.x * sin + p.y * cos))
            .collect();
        let (min_u, max_u, min_v, max_v) = local.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
            |(a, b, c, d), &(u, v)| (a.min(u), b.max(u), c.min(v), d.max(v)),
        );

        let (cu, cv) = ((min_u + max_u) / 2.0, (min_v + max_v) / 2.0);
        Some(RectanglePose {
            dimensions: (max_u - min_u, max_v - min_v),
            center: Point::new(cu * cos - cv * sin, cu * sin + cv * cos),
            rotation,
        })
    }

    /// Check if the lot fills at least [`NEAR_RECTANGULAR_RATIO`] of its
    /// bounding rectangle
    pub fn is_near_rectangular(&self) -> bool {
        match self.rectangle_pose() {
            Some(pose) => {
                let rect_area = pose.dimensions.0 * pose.dimensions.1;
                rect_area > 0.0 && self.polygon.area() / rect_area >= NEAR_RECTANGULAR_RATIO
            }
            None => false,
        }
    }
}

/// Result of subdividing one block
#[derive(Debug, Clone, Default)]
pub struct Subdivision {
    /// Accepted lots, without archetypes
    pub lots: Vec<Lot>,
    /// Deepest recursion level reached
    pub max_depth_reached: usize,
}

/// Recursive lot splitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LotSubdivider {
    /// Pieces below this area stop being cut
    pub minimal_area: f64,
    /// Smallest angle allowed between the two edges at a lot vertex
    pub minimal_angle: f64,
    /// Recursion depth cap
    pub max_depth: usize,
}

impl Default for LotSubdivider {
    fn default() -> Self {
        Self {
            minimal_area: 100.0,
            minimal_angle: 0.3 * std::f64::consts::PI,
            max_depth: 20,
        }
    }
}

impl LotSubdivider {
    /// Split a block outline into lots
    ///
    /// `outer_edges` holds the edges adjacent to a road.
    pub fn subdivide(&self, outline: &Polygon, outer_edges: BTreeSet<EdgeKey>) -> Subdivision {
        let mut result = Subdivision::default();
        self.split(outline.vertices().to_vec(), outer_edges, 1, &mut result);
        result
    }

    fn split(&self, lot: Vec<Point>, mut outer: BTreeSet<EdgeKey>, depth: usize, result: &mut Subdivision) {
        result.max_depth_reached = result.max_depth_reached.max(depth);

        let edges: Vec<(Point, Point)> = cycle_pairs(&lot).collect();
        if !edges.iter().any(|&e| outer.contains(&EdgeKey::from(e))) {
            // Locked in: no road access
            return;
        }

        let polygon = Polygon::new(lot);
        if polygon.area() < self.minimal_area {
            if polygon.is_simple() && min_vertex_angle(polygon.vertices()) > self.minimal_angle {
                let flags = edges.iter().map(|&e| outer.contains(&EdgeKey::from(e))).collect();
                result.lots.push(Lot::new(polygon, flags));
            }
            return;
        }

        let n = polygon.number_of_vertices();
        if n < 3 || depth > self.max_depth {
            return;
        }

        let lengths: Vec<f64> = edges.iter().map(|&(a, b)| distance_squared(a, b)).collect();
        let mut longest = 0;
        for (i, &length) in lengths.iter().enumerate() {
            if length > lengths[longest] {
                longest = i;
            }
        }

        let longest_vec = edges[longest].1.vec() - edges[longest].0.vec();
        let parallelity = |i: usize| {
            let v = edges[i].1.vec() - edges[i].0.vec();
            let norm = v.length() * longest_vec.length();
            if norm == 0.0 {
                0.0
            } else {
                (v.dot(longest_vec) / norm).abs()
            }
        };
        let mut opposed = None;
        for i in (0..n).filter(|&i| i != longest) {
            match opposed {
                Some(best) if parallelity(i) <= parallelity(best) => {}
                _ => opposed = Some(i),
            }
        }
        let Some(opposed) = opposed else { return };

        let midpoint = |(a, b): (Point, Point)| Point::from(a.vec().lerp(b.vec(), 0.5));
        let longest_p = midpoint(edges[longest]);
        let opposed_p = midpoint(edges[opposed]);

        for (i, p) in [(longest, longest_p), (opposed, opposed_p)] {
            let (a, b) = edges[i];
            if outer.remove(&EdgeKey::new(a, b)) {
                outer.insert(EdgeKey::new(a, p));
                outer.insert(EdgeKey::new(p, b));
            }
        }

        let ((first_i, first_p), (second_i, second_p)) = if longest < opposed {
            ((longest, longest_p), (opposed, opposed_p))
        } else {
            ((opposed, opposed_p), (longest, longest_p))
        };

        let vertices = polygon.into_vertices();
        let mut sublot1 = vec![second_p];
        sublot1.extend_from_slice(&vertices[second_i + 1..]);
        sublot1.extend_from_slice(&vertices[..=first_i]);
        sublot1.push(first_p);

        let mut sublot2 = vec![first_p];
        sublot2.extend_from_slice(&vertices[first_i + 1..=second_i]);
        sublot2.push(second_p);

        self.split(sublot1, outer.clone(), depth + 1, result);
        self.split(sublot2, outer, depth + 1, result);
    }
}

/// Smallest angle between the two edges meeting at any vertex
///
/// Zero-length edges count as a zero angle.
pub fn min_vertex_angle(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let here = vertices[i].vec();
            let to_prev = vertices[(i + n - 1) % n].vec() - here;
            let to_next = vertices[(i + 1) % n].vec() - here;
            let norm = to_prev.length() * to_next.length();
            if norm == 0.0 {
                0.0
            } else {
                (to_prev.dot(to_next) / norm).clamp(-1.0, 1.0).acos()
            }
        })
        .fold(f64::INFINITY, f64::min)
}
