//! Wipe tower planning over a clustered schedule.
//!
//! Clustering makes tool changes rare, so the wipe tower is no longer
//! built one purge per physical layer. Instead every tool change in
//! the final schedule gets one purge brick, and bricks are packed onto
//! tower layers: a tower layer holds at most `color_count - 1` bricks,
//! matching the worst per-layer change count of an unclustered print.
//! Tower heights therefore advance with the change count, not with the
//! object height.

use log::debug;

use crate::config::ClusterConfig;
use crate::schedule::ScheduleNode;
use crate::{CoordF, Error, Result};

use super::GCodeStats;

/// One planned purge on the wipe tower.
#[derive(Debug, Clone)]
pub struct WipeFragment {
    /// Tower layer this purge is printed on.
    pub tower_layer: usize,
    /// Brick slot within the tower layer.
    pub brick: usize,
    /// Absolute z of the tower layer (mm).
    pub print_z: CoordF,
    /// Tool being retired.
    pub from_tool: u32,
    /// Tool being loaded.
    pub to_tool: u32,
    /// Purge volume (mm³).
    pub purge_volume: CoordF,
    /// Generated purge G-code.
    pub gcode: String,
}

/// Generates purge moves for planned tool changes.
///
/// The planner decides where each change lands on the tower; the
/// engine turns that placement into G-code.
pub trait WipeTowerEngine {
    /// Record one tool change at the given tower position.
    fn plan_tool_change(
        &mut self,
        tower_layer: usize,
        brick: usize,
        print_z: CoordF,
        layer_height: CoordF,
        from_tool: u32,
        to_tool: u32,
        purge_volume: CoordF,
    );

    /// Produce the planned fragments, grouped by tower layer.
    fn generate(&mut self) -> Vec<Vec<WipeFragment>>;
}

/// Walks the final schedule, marks the units after which a purge
/// happens and plans one brick per tool change.
#[derive(Debug)]
pub struct WipeTowerPlanner<'a> {
    config: &'a ClusterConfig,
}

/// The tool a schedule unit prints with, if it forces one.
///
/// Support units inherit the active tool unless a dedicated support
/// tool is configured.
pub(crate) fn unit_tool(config: &ClusterConfig, node: &ScheduleNode) -> Result<Option<u32>> {
    if node.is_support() {
        return Ok(config.support_tool);
    }
    if node.region < 0 || node.region as usize >= config.color_count {
        return Err(Error::RegionOutOfRange {
            region: node.region,
            colors: config.color_count,
        });
    }
    Ok(Some(node.region as u32))
}

impl<'a> WipeTowerPlanner<'a> {
    pub fn new(config: &'a ClusterConfig) -> Self {
        Self { config }
    }

    /// Plan all tool changes of `schedule`, setting `needs_wipe` on the
    /// unit printed right before each change.
    ///
    /// Returns the planning counters; `emitted_units` is left for the
    /// emission driver to fill in.
    pub fn plan(
        &self,
        schedule: &mut [ScheduleNode],
        engine: &mut dyn WipeTowerEngine,
    ) -> Result<GCodeStats> {
        let bricks_per_layer = (self.config.color_count.saturating_sub(1)).max(1);
        let mut active: Option<u32> = None;
        let mut tower_layer = 0usize;
        let mut brick = 0usize;
        let mut stats = GCodeStats::default();

        for i in 0..schedule.len() {
            let Some(tool) = unit_tool(self.config, &schedule[i])? else {
                continue;
            };
            let from = match active {
                // First unit loads its tool without a purge.
                None => {
                    active = Some(tool);
                    continue;
                }
                Some(from) if from == tool => continue,
                Some(from) => from,
            };

            schedule[i - 1].needs_wipe = true;
            let print_z = self.config.wiping_layer_height * (tower_layer as CoordF + 1.0);
            engine.plan_tool_change(
                tower_layer,
                brick,
                print_z,
                self.config.wiping_layer_height,
                from,
                tool,
                self.config.purge_volume,
            );
            stats.tool_change_count += 1;
            stats.purge_volume_mm3 += self.config.purge_volume;

            brick += 1;
            if brick == bricks_per_layer {
                brick = 0;
                tower_layer += 1;
            }
            active = Some(tool);
        }

        stats.batch_count = schedule
            .iter()
            .filter_map(|n| n.batch_id)
            .max()
            .map_or(0, |b| b + 1);

        debug!(
            "wipe plan: {} tool changes on {} tower layers, {} batches",
            stats.tool_change_count,
            tower_layer + usize::from(brick > 0),
            stats.batch_count
        );
        Ok(stats)
    }
}

/// Wipe tower engine that prints rectangular purge blocks.
#[derive(Debug, Default)]
pub struct PurgeBlockEngine {
    planned: Vec<WipeFragment>,
}

impl PurgeBlockEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WipeTowerEngine for PurgeBlockEngine {
    fn plan_tool_change(
        &mut self,
        tower_layer: usize,
        brick: usize,
        print_z: CoordF,
        _layer_height: CoordF,
        from_tool: u32,
        to_tool: u32,
        purge_volume: CoordF,
    ) {
        let gcode = format!(
            "; purge block, tower layer {tower_layer} brick {brick}\n\
             G1 Z{print_z:.3} F600\n\
             T{to_tool}\n\
             ; purge {purge_volume:.1} mm3 of T{from_tool}\n"
        );
        self.planned.push(WipeFragment {
            tower_layer,
            brick,
            print_z,
            from_tool,
            to_tool,
            purge_volume,
            gcode,
        });
    }

    fn generate(&mut self) -> Vec<Vec<WipeFragment>> {
        let planned = std::mem::take(&mut self.planned);
        let mut layers: Vec<Vec<WipeFragment>> = Vec::new();
        for fragment in planned {
            if layers.len() <= fragment.tower_layer {
                layers.resize_with(fragment.tower_layer + 1, Vec::new);
            }
            layers[fragment.tower_layer].push(fragment);
        }
        layers
    }
}
