//! Input model for the cluster scheduler.
//!
//! The surrounding slicing system hands us a stack of physical layers,
//! each already split into disjoint per-color region slices, plus a
//! separately sliced support stack. These types carry only what the
//! scheduler needs: layer ordering, heights, region identities and
//! their printable footprints.

use crate::geometry::{GeometryOracle, RegionFootprint};
use crate::CoordF;

/// One color region's printable slice within one physical layer.
#[derive(Debug, Clone)]
pub struct RegionSlice {
    /// Color/tool identity (0-based).
    pub region: u32,
    /// Printable footprint of this region at this layer.
    pub footprint: RegionFootprint,
}

impl RegionSlice {
    /// Create a region slice with a footprint.
    pub fn new(region: u32, footprint: RegionFootprint) -> Self {
        Self { region, footprint }
    }

    /// Create a region slice without geometry.
    ///
    /// Useful when geometric measures come from a [`GeometryOracle`]
    /// that is not footprint-backed.
    pub fn bare(region: u32) -> Self {
        Self {
            region,
            footprint: RegionFootprint::empty(),
        }
    }
}

/// One physical layer of the object stack.
#[derive(Debug, Clone)]
pub struct SlicedLayer {
    /// Ordinal in the physical layer stack.
    pub layer_index: usize,
    /// Absolute print height of this layer (mm).
    pub print_z: CoordF,
    /// Layer height (mm).
    pub height: CoordF,
    /// Region slices present at this layer.
    pub regions: Vec<RegionSlice>,
}

impl SlicedLayer {
    /// Create a layer with the given regions.
    pub fn new(layer_index: usize, print_z: CoordF, height: CoordF, regions: Vec<RegionSlice>) -> Self {
        Self {
            layer_index,
            print_z,
            height,
            regions,
        }
    }

    /// Look up a region slice by region index.
    pub fn region(&self, region: u32) -> Option<&RegionSlice> {
        self.regions.iter().find(|slice| slice.region == region)
    }
}

/// One layer of the support stack.
#[derive(Debug, Clone)]
pub struct SupportLayer {
    /// Ordinal in the physical layer stack this support rests at.
    pub layer_index: usize,
    /// Absolute print height (mm).
    pub print_z: CoordF,
    /// Layer height (mm).
    pub height: CoordF,
}

impl SupportLayer {
    /// Create a support layer.
    pub fn new(layer_index: usize, print_z: CoordF, height: CoordF) -> Self {
        Self {
            layer_index,
            print_z,
            height,
        }
    }
}

/// [`GeometryOracle`] backed by the sliced layer stack's footprints.
#[derive(Debug)]
pub struct FootprintOracle<'a> {
    layers: &'a [SlicedLayer],
}

impl<'a> FootprintOracle<'a> {
    /// Create an oracle over a layer stack.
    pub fn new(layers: &'a [SlicedLayer]) -> Self {
        Self { layers }
    }

    fn footprint(&self, layer: usize, region: u32) -> Option<&RegionFootprint> {
        self.layers
            .iter()
            .find(|l| l.layer_index == layer)
            .and_then(|l| l.region(region))
            .map(|slice| &slice.footprint)
    }
}

impl GeometryOracle for FootprintOracle<'_> {
    fn area(&self, layer: usize, region: u32) -> CoordF {
        self.footprint(layer, region).map_or(0.0, |f| f.area())
    }

    fn perimeter(&self, layer: usize, region: u32) -> CoordF {
        self.footprint(layer, region).map_or(0.0, |f| f.perimeter())
    }

    fn overlap_area(
        &self,
        layer_a: usize,
        region_a: u32,
        layer_b: usize,
        region_b: u32,
    ) -> CoordF {
        match (
            self.footprint(layer_a, region_a),
            self.footprint(layer_b, region_b),
        ) {
            (Some(a), Some(b)) => a.overlap_area(b),
            _ => 0.0,
        }
    }
}
