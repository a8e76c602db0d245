//! Cluster scheduling: node store, greedy batching traversal and the
//! support merger.
//!
//! The schedule produced here is an ordering of every printable unit of
//! the print. It is intentionally non-monotonic in physical layer
//! index: the whole point of clustering is to let a later layer of one
//! color print before an earlier layer of another.

pub mod merge;
pub mod node;
pub mod scheduler;
pub mod store;

use std::io::Write;

use serde::Serialize;

use crate::{CoordF, Result};

pub use merge::{merge_support, SupportMergePolicy};
pub use node::{NodeKind, NodeState, ScheduleNode, SOLUBLE_SUPPORT_REGION, SUPPORT_REGION};
pub use scheduler::schedule_clusters;
pub use store::{support_nodes, NodeStore};

/// One row of the flat schedule diagnostics table.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleRow {
    pub position: usize,
    pub layer: usize,
    pub region: i32,
    pub batch: Option<usize>,
    pub needs_wipe: bool,
    pub print_z: CoordF,
    pub area: CoordF,
    pub perimeter: CoordF,
    pub self_intersection: CoordF,
}

/// Flatten a final schedule into diagnostics rows, in schedule order.
pub fn schedule_rows(schedule: &[ScheduleNode]) -> Vec<ScheduleRow> {
    schedule
        .iter()
        .enumerate()
        .map(|(position, node)| ScheduleRow {
            position,
            layer: node.layer_index,
            region: node.region,
            batch: node.batch_id,
            needs_wipe: node.needs_wipe,
            print_z: node.print_z,
            area: node.area,
            perimeter: node.perimeter,
            self_intersection: node.self_intersection,
        })
        .collect()
}

/// Write the schedule as CSV for offline inspection.
pub fn write_csv<W: Write>(schedule: &[ScheduleNode], out: &mut W) -> Result<()> {
    writeln!(
        out,
        "position,layer,region,batch,needs_wipe,print_z,area,perimeter,self_intersection"
    )?;
    for row in schedule_rows(schedule) {
        writeln!(
            out,
            "{},{},{},{},{},{:.4},{:.4},{:.4},{:.4}",
            row.position,
            row.layer,
            row.region,
            row.batch.map_or_else(|| "-".to_string(), |b| b.to_string()),
            row.needs_wipe,
            row.print_z,
            row.area,
            row.perimeter,
            row.self_intersection,
        )?;
    }
    Ok(())
}
