//! Clustered emission: a strictly sequential walk of the final
//! schedule.
//!
//! Ordinary export pipelines stream layers through parallel filter
//! stages, which is sound because each stage sees monotonically
//! increasing layer indices. A clustered schedule revisits earlier
//! physical layers between batches, so that assumption does not hold
//! and emission here is single-pass sequential by construction.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::config::ClusterConfig;
use crate::schedule::ScheduleNode;
use crate::{CancelToken, Error, Result};

use super::wipe_plan::{unit_tool, WipeFragment};
use super::{GCode, GCodeStats};

/// Produces the actual extrusion code for schedule units.
///
/// Implementations hold the per-region toolpaths computed by the
/// slicing stages; the driver only decides order and tool changes.
pub trait RegionCodeGenerator {
    /// Emit the change from `from` to tool `to`, after any purge code
    /// has already been appended.
    fn tool_change(&mut self, from: Option<u32>, to: u32, out: &mut GCode) -> Result<()>;

    /// Emit one object region slice.
    fn emit_region(&mut self, layer_index: usize, region: u32, out: &mut GCode) -> Result<()>;

    /// Emit one support layer.
    fn emit_support(&mut self, layer_index: usize, out: &mut GCode) -> Result<()>;
}

/// Walks the final schedule in order, interleaving purge fragments at
/// tool changes.
#[derive(Debug)]
pub struct EmissionDriver<'a> {
    config: &'a ClusterConfig,
}

impl<'a> EmissionDriver<'a> {
    pub fn new(config: &'a ClusterConfig) -> Self {
        Self { config }
    }

    /// Emit the whole schedule into one G-code buffer.
    ///
    /// `fragments` is the wipe planner's output; one fragment is
    /// consumed per tool change, in planning order. A change with no
    /// fragment left, or leftover fragments at the end, means the
    /// schedule was modified between planning and emission and is
    /// reported as an error.
    pub fn emit(
        &self,
        schedule: &[ScheduleNode],
        fragments: Vec<Vec<WipeFragment>>,
        generator: &mut dyn RegionCodeGenerator,
        stats: &mut GCodeStats,
        cancel: Option<&CancelToken>,
    ) -> Result<GCode> {
        let mut fragments: VecDeque<WipeFragment> =
            fragments.into_iter().flatten().collect();
        let mut gcode = GCode::new();
        let mut active: Option<u32> = None;

        for node in schedule {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(Error::Cancelled);
            }

            if let Some(tool) = unit_tool(self.config, node)? {
                if active != Some(tool) {
                    if active.is_some() {
                        let fragment = fragments.pop_front().ok_or_else(|| {
                            Error::WipeTower(format!(
                                "no purge fragment planned for change to tool {tool}"
                            ))
                        })?;
                        gcode.append(&fragment.gcode);
                    }
                    generator.tool_change(active, tool, &mut gcode)?;
                    active = Some(tool);
                }
            }

            trace!(
                "emit layer {} region {} z {:.3}",
                node.layer_index,
                node.region,
                node.print_z
            );
            if node.is_support() {
                generator.emit_support(node.layer_index, &mut gcode)?;
            } else {
                generator.emit_region(node.layer_index, node.region as u32, &mut gcode)?;
            }
            stats.emitted_units += 1;
        }

        if !fragments.is_empty() {
            return Err(Error::WipeTower(format!(
                "{} planned purge fragments were never reached",
                fragments.len()
            )));
        }

        debug!(
            "emitted {} units, {} lines of G-code",
            stats.emitted_units,
            gcode.line_count()
        );
        Ok(gcode)
    }
}
