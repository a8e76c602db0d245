//! Region footprint geometry and the oracle interface used by the
//! cluster scheduler.
//!
//! The scheduler itself never touches polygons: it asks a
//! [`GeometryOracle`] for areas, perimeters and pairwise overlap areas
//! and compares the answers against configured thresholds. The concrete
//! [`RegionFootprint`] here wraps a `geo` multipolygon in print-space
//! millimeters and supplies those measures; test doubles can implement
//! the oracle directly from tables.

use crate::CoordF;
use geo::{Area, BooleanOps, EuclideanLength, LineString, MultiPolygon, Polygon};

/// Answers the geometric queries the scheduler needs about per-layer,
/// per-region printable footprints.
///
/// Degenerate answers are fine: a zero overlap simply means "no
/// constraint" and never blocks scheduling, and a missing (layer,
/// region) pair reports zero for all three measures.
pub trait GeometryOracle {
    /// Printable area of `region` at `layer`, in mm².
    fn area(&self, layer: usize, region: u32) -> CoordF;

    /// Total contour length of `region` at `layer`, in mm.
    fn perimeter(&self, layer: usize, region: u32) -> CoordF;

    /// Overlap area between the footprint of `(layer_a, region_a)` and
    /// the footprint of `(layer_b, region_b)`, in mm².
    fn overlap_area(
        &self,
        layer_a: usize,
        region_a: u32,
        layer_b: usize,
        region_b: u32,
    ) -> CoordF;
}

/// The printable footprint of one color region within one physical
/// layer, as a set of polygons in millimeters.
#[derive(Debug, Clone)]
pub struct RegionFootprint {
    polygons: MultiPolygon<f64>,
}

impl Default for RegionFootprint {
    fn default() -> Self {
        Self::empty()
    }
}

impl RegionFootprint {
    /// Create a footprint from a multipolygon.
    pub fn new(polygons: MultiPolygon<f64>) -> Self {
        Self { polygons }
    }

    /// Create an empty footprint (no printable geometry).
    pub fn empty() -> Self {
        Self::new(MultiPolygon::new(Vec::new()))
    }

    /// Create an axis-aligned rectangular footprint.
    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let ring = LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
        Self::new(MultiPolygon::new(vec![Polygon::new(ring, vec![])]))
    }

    /// Access the underlying polygons.
    pub fn polygons(&self) -> &MultiPolygon<f64> {
        &self.polygons
    }

    /// Check if the footprint contains no geometry.
    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty()
    }

    /// Total enclosed area in mm².
    pub fn area(&self) -> CoordF {
        self.polygons.unsigned_area()
    }

    /// Total contour length (outer rings plus holes) in mm.
    pub fn perimeter(&self) -> CoordF {
        self.polygons
            .0
            .iter()
            .map(|poly| {
                poly.exterior().euclidean_length()
                    + poly
                        .interiors()
                        .iter()
                        .map(|ring| ring.euclidean_length())
                        .sum::<f64>()
            })
            .sum()
    }

    /// Area of the boolean intersection with another footprint, in mm².
    pub fn overlap_area(&self, other: &Self) -> CoordF {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        self.polygons.intersection(&other.polygons).unsigned_area()
    }
}
