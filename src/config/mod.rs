//! Configuration for cluster scheduling and wipe planning.
//!
//! All thresholds are fixed external configuration: the scheduler does
//! not adapt them at runtime. Values load from and save to JSON with
//! per-field defaults, so partial config files work.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{CoordF, Error, Result};

fn default_safe_batch_height() -> CoordF {
    1.0
}

fn default_critical_intersection_area() -> CoordF {
    1.0
}

fn default_wiping_layer_height() -> CoordF {
    0.2
}

fn default_purge_volume() -> CoordF {
    140.0
}

/// Fixed configuration consumed by the scheduler, wipe planner and
/// emission driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of colors/tools in the print.
    pub color_count: usize,

    /// Maximum cumulative height (mm) one tool may build before a
    /// batch break is forced even when a legal continuation exists.
    #[serde(default = "default_safe_batch_height")]
    pub safe_batch_height: CoordF,

    /// Overlap area (mm²) above which printing a region ahead of an
    /// unprinted neighboring region is considered unsafe.
    #[serde(default = "default_critical_intersection_area")]
    pub critical_intersection_area: CoordF,

    /// Layer height of the wipe tower (mm).
    #[serde(default = "default_wiping_layer_height")]
    pub wiping_layer_height: CoordF,

    /// Purge volume per tool change (mm³).
    #[serde(default = "default_purge_volume")]
    pub purge_volume: CoordF,

    /// Tool used for support material. When unset, support units are
    /// printed with whatever tool is active and never force a change.
    #[serde(default)]
    pub support_tool: Option<u32>,
}

impl ClusterConfig {
    /// Create a configuration for the given color count with default
    /// thresholds.
    pub fn new(color_count: usize) -> Self {
        Self {
            color_count,
            safe_batch_height: default_safe_batch_height(),
            critical_intersection_area: default_critical_intersection_area(),
            wiping_layer_height: default_wiping_layer_height(),
            purge_volume: default_purge_volume(),
            support_tool: None,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.color_count == 0 {
            return Err(Error::InvalidConfig("color_count must be at least 1".into()));
        }
        if self.safe_batch_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "safe_batch_height must be positive".into(),
            ));
        }
        if self.critical_intersection_area < 0.0 {
            return Err(Error::InvalidConfig(
                "critical_intersection_area must not be negative".into(),
            ));
        }
        if self.wiping_layer_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "wiping_layer_height must be positive".into(),
            ));
        }
        if let Some(tool) = self.support_tool {
            if tool as usize >= self.color_count {
                return Err(Error::RegionOutOfRange {
                    region: tool as i32,
                    colors: self.color_count,
                });
            }
        }
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
