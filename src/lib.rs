//! Interlayer tool-clustering scheduler for multi-color, layer-by-layer
//! 3D printing.
//!
//! A multi-color print is sliced into physical layers, each split into
//! disjoint per-color regions. Printing every region of a layer before
//! moving to the next layer forces a tool change on nearly every layer.
//! This crate computes a printing order that groups same-color region
//! slices from consecutive layers into contiguous batches, so each tool
//! runs for a longer uninterrupted stretch before a change.
//!
//! ## Pipeline
//!
//! 1. [`schedule::NodeStore`] - one node per printable (layer, region) unit
//! 2. [`schedule::schedule_clusters`] - the greedy batching traversal
//! 3. [`schedule::merge_support`] - interleaves support layers by proximity
//! 4. [`gcode::WipeTowerPlanner`] - turns batch boundaries into purge events
//! 5. [`gcode::EmissionDriver`] - sequential walk producing the final G-code
//!
//! The clustered emission path is strictly sequential by design: the
//! schedule revisits earlier physical layers within neighboring batches,
//! so the per-layer pipeline parallelism used by an ordinary slicing
//! pass (whose filter stages assume monotonically increasing layer
//! order) cannot be applied here.

pub mod config;
pub mod gcode;
pub mod geometry;
pub mod schedule;
pub mod slice;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Floating point coordinate type (millimeters).
pub type CoordF = f64;

/// Error type for scheduling and export operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("region index {region} outside configured color count {colors}")]
    RegionOutOfRange { region: i32, colors: usize },

    #[error("export cancelled")]
    Cancelled,

    #[error("code generation failed: {0}")]
    CodeGen(String),

    #[error("wipe tower planning failed: {0}")]
    WipeTower(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Cooperative cancellation flag shared between a caller and the
/// scheduling/emission loops.
///
/// The loops poll the token between steps; a cancelled run returns
/// [`Error::Cancelled`] and yields no partial schedule or G-code.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

pub use config::ClusterConfig;
pub use gcode::{GCode, GCodeStats};
pub use geometry::{GeometryOracle, RegionFootprint};
pub use schedule::{
    merge_support, schedule_clusters, NodeKind, NodeState, NodeStore, ScheduleNode,
    SupportMergePolicy, SOLUBLE_SUPPORT_REGION, SUPPORT_REGION,
};
pub use slice::{FootprintOracle, RegionSlice, SlicedLayer, SupportLayer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let shared = token.clone();
        shared.cancel();
        assert!(token.is_cancelled());
    }
}
