//! Schedule nodes: the atomic units the cluster scheduler orders.
//!
//! One node exists per (physical layer, region) pair that has printable
//! geometry, plus one per support layer. Nodes are created once per
//! export and never destroyed; the scheduler, merger and wipe planner
//! mutate them in place (state, batch id, wipe flag) in that order.

use crate::CoordF;

/// Region marker for standard support material nodes.
pub const SUPPORT_REGION: i32 = -1;

/// Region marker for soluble-interface support material nodes.
pub const SOLUBLE_SUPPORT_REGION: i32 = -2;

/// What a schedule node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// One color region of one object layer.
    ObjectRegion,
    /// One support layer.
    Support,
}

/// Scheduling state of a node. Transitions `Unprocessed` to `Scheduled`
/// exactly once and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unprocessed,
    Scheduled,
}

/// The atomic schedule entity: one region slice of one physical layer
/// (or one support layer).
#[derive(Debug, Clone)]
pub struct ScheduleNode {
    /// Creation order, informational only.
    pub sequence: usize,
    /// Absolute print height of the physical layer (mm).
    pub print_z: CoordF,
    /// Layer height (mm); feeds the batch height accumulator.
    pub height: CoordF,
    /// Node kind.
    pub kind: NodeKind,
    /// Physical layer ordinal in the original stack.
    pub layer_index: usize,
    /// Ordinal among layers that contain printable object geometry
    /// (support-only layers are excluded from this numbering).
    pub track_index: usize,
    /// Color/tool identity; negative markers for support material.
    pub region: i32,
    /// Printable footprint area (mm²).
    pub area: CoordF,
    /// Printable footprint contour length (mm).
    pub perimeter: CoordF,
    /// Scheduling state.
    pub state: NodeState,
    /// Batch id, assigned by the post-scheduling tagging pass.
    pub batch_id: Option<usize>,
    /// True iff the next unit in final schedule order uses a different
    /// tool; set by the wipe tower planner.
    pub needs_wipe: bool,
    /// The overlap value measured when this unit was accepted as a
    /// batch continuation (0 for batch heads and at the build plate).
    pub self_intersection: CoordF,
}

impl ScheduleNode {
    /// Create an object-region node.
    pub fn object(
        sequence: usize,
        layer_index: usize,
        track_index: usize,
        region: u32,
        print_z: CoordF,
        height: CoordF,
        area: CoordF,
        perimeter: CoordF,
    ) -> Self {
        Self {
            sequence,
            print_z,
            height,
            kind: NodeKind::ObjectRegion,
            layer_index,
            track_index,
            region: region as i32,
            area,
            perimeter,
            state: NodeState::Unprocessed,
            batch_id: None,
            needs_wipe: false,
            self_intersection: 0.0,
        }
    }

    /// Create a support node.
    pub fn support(sequence: usize, layer_index: usize, print_z: CoordF, height: CoordF) -> Self {
        Self {
            sequence,
            print_z,
            height,
            kind: NodeKind::Support,
            layer_index,
            track_index: 0,
            region: SUPPORT_REGION,
            area: 0.0,
            perimeter: 0.0,
            state: NodeState::Unprocessed,
            batch_id: None,
            needs_wipe: false,
            self_intersection: 0.0,
        }
    }

    /// Check if this is a support node.
    pub fn is_support(&self) -> bool {
        self.kind == NodeKind::Support
    }

    /// Check if this node is still waiting to be scheduled.
    pub fn is_unprocessed(&self) -> bool {
        self.state == NodeState::Unprocessed
    }

    /// Mark the node scheduled. The transition is one-way; marking an
    /// already scheduled node is a logic error.
    pub fn mark_scheduled(&mut self) {
        debug_assert_eq!(self.state, NodeState::Unprocessed);
        self.state = NodeState::Scheduled;
    }
}
