//! Support merger: interleaves support layers into the clustered
//! object schedule.
//!
//! Support is sliced as its own layer stack and never takes part in
//! clustering. After the object schedule exists, each support layer is
//! placed right after the first scheduled object unit that reaches its
//! layer, so support is printed close to the object height it braces
//! without breaking any batch.

use super::node::{ScheduleNode, SOLUBLE_SUPPORT_REGION, SUPPORT_REGION};
use super::store::NodeStore;

/// How support layers anchor into the object schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportMergePolicy {
    /// Standard support: may trail the object front by one layer, so a
    /// support layer at index `n` is placed after the first object unit
    /// at layer `n - 1` or later.
    Standard,
    /// Soluble-interface support: must never lag the object front, so a
    /// support layer at index `n` waits for an object unit at layer `n`
    /// or later.
    Soluble,
}

impl SupportMergePolicy {
    /// How many layers the object front may run ahead of a support
    /// layer before that support layer has to be emitted.
    fn anchor_slack(self) -> usize {
        match self {
            SupportMergePolicy::Standard => 1,
            SupportMergePolicy::Soluble => 0,
        }
    }

    /// Region marker stamped onto merged support nodes.
    fn region_tag(self) -> i32 {
        match self {
            SupportMergePolicy::Standard => SUPPORT_REGION,
            SupportMergePolicy::Soluble => SOLUBLE_SUPPORT_REGION,
        }
    }
}

/// Merge support nodes into a scheduled object order.
///
/// `order` is the index sequence produced by the scheduler. Each
/// support node is inserted after the first object unit whose layer
/// index plus the policy slack reaches the support layer, inheriting
/// that unit's batch id so the wipe planner treats it as part of the
/// running batch. Support layers above every object layer are appended
/// at the end in stack order.
pub fn merge_support(
    store: &NodeStore,
    order: &[usize],
    supports: Vec<ScheduleNode>,
    policy: SupportMergePolicy,
) -> Vec<ScheduleNode> {
    let mut supports = supports;
    for node in &mut supports {
        node.region = policy.region_tag();
    }

    let mut placed = vec![false; supports.len()];
    let mut merged = Vec::with_capacity(order.len() + supports.len());

    for &idx in order {
        let object = store[idx].clone();
        let reach = object.layer_index + policy.anchor_slack();
        let batch = object.batch_id;
        merged.push(object);

        for (i, support) in supports.iter().enumerate() {
            if !placed[i] && support.layer_index <= reach {
                placed[i] = true;
                let mut support = support.clone();
                support.batch_id = batch;
                merged.push(support);
                break;
            }
        }
    }

    // Support extending above the last object layer
    for (i, support) in supports.into_iter().enumerate() {
        if !placed[i] {
            merged.push(support);
        }
    }

    merged
}
