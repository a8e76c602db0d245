//! Node store: creation-ordered arena of schedule nodes.
//!
//! The store is populated once per export by scanning the physical
//! layer stack, layer-major then region-minor. Lookups are linear
//! scans; store sizes are bounded by layers x colors, not by geometry
//! complexity, so there is nothing to win by indexing. No removal
//! operation exists; nodes are mutated in place through indices.

use super::node::{NodeState, ScheduleNode};
use crate::geometry::GeometryOracle;
use crate::slice::{SlicedLayer, SupportLayer};

/// Creation-ordered store of object-region schedule nodes.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<ScheduleNode>,
    track_count: usize,
}

impl NodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the store from the object layer stack.
    ///
    /// Track indices number only the layers that contain at least one
    /// printable region; a region with zero perimeter at a layer
    /// produces no node at all. Regions within a layer are appended in
    /// ascending region order, so creation order is layer-major,
    /// region-minor.
    pub fn populate(layers: &[SlicedLayer], oracle: &impl GeometryOracle) -> Self {
        let mut store = Self::new();

        for layer in layers {
            let mut regions: Vec<u32> = layer
                .regions
                .iter()
                .map(|slice| slice.region)
                .filter(|&region| oracle.perimeter(layer.layer_index, region) > 0.0)
                .collect();
            regions.sort_unstable();
            regions.dedup();

            if regions.is_empty() {
                continue;
            }

            let track = store.track_count;
            for region in regions {
                let sequence = store.nodes.len();
                store.nodes.push(ScheduleNode::object(
                    sequence,
                    layer.layer_index,
                    track,
                    region,
                    layer.print_z,
                    layer.height,
                    oracle.area(layer.layer_index, region),
                    oracle.perimeter(layer.layer_index, region),
                ));
            }
            store.track_count += 1;
        }

        store
    }

    /// Append a node, assigning its creation sequence number.
    pub fn push(&mut self, mut node: ScheduleNode) -> usize {
        let idx = self.nodes.len();
        node.sequence = idx;
        self.track_count = self.track_count.max(node.track_index + 1);
        self.nodes.push(node);
        idx
    }

    /// Find the node with the given (track, region) key.
    pub fn find(&self, track: usize, region: i32) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.track_index == track && node.region == region)
    }

    /// The earliest-created node that is still unprocessed.
    pub fn first_unprocessed(&self) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.state == NodeState::Unprocessed)
    }

    /// Iterate over the nodes at one track index.
    pub fn nodes_at_track(&self, track: usize) -> impl Iterator<Item = &ScheduleNode> {
        self.nodes
            .iter()
            .filter(move |node| node.track_index == track)
    }

    /// Number of object-bearing layers.
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&ScheduleNode> {
        self.nodes.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut ScheduleNode> {
        self.nodes.get_mut(idx)
    }

    /// Iterate over all nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ScheduleNode> {
        self.nodes.iter()
    }
}

impl std::ops::Index<usize> for NodeStore {
    type Output = ScheduleNode;

    fn index(&self, idx: usize) -> &ScheduleNode {
        &self.nodes[idx]
    }
}

impl std::ops::IndexMut<usize> for NodeStore {
    fn index_mut(&mut self, idx: usize) -> &mut ScheduleNode {
        &mut self.nodes[idx]
    }
}

/// Build support nodes from the support layer stack, in stack order.
///
/// Support nodes live outside the [`NodeStore`]: they never participate
/// in clustering and are interleaved into the schedule afterwards by
/// the merger.
pub fn support_nodes(supports: &[SupportLayer]) -> Vec<ScheduleNode> {
    supports
        .iter()
        .enumerate()
        .map(|(sequence, layer)| {
            ScheduleNode::support(sequence, layer.layer_index, layer.print_z, layer.height)
        })
        .collect()
}
