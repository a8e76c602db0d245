//! The cluster scheduler: a greedy traversal that orders object units
//! into per-tool batches.
//!
//! The traversal holds a single cursor and never backtracks. It grows
//! the active batch upward, one same-region unit per object layer, as
//! long as two constraints allow it:
//!
//! - the accumulated batch height stays below the configured safe batch
//!   height (one tool must not build arbitrarily far ahead of its
//!   neighbors), and
//! - the candidate's footprint does not overlap any still-unprinted
//!   neighboring region on the layer below by more than the critical
//!   intersection area (material must not be deposited over a region
//!   that has not been printed yet).
//!
//! When a continuation is refused the cursor clears and the next batch
//! head is the earliest-created unprocessed unit, which is layer-major,
//! region-minor order. A refused candidate stays unprocessed and is
//! picked up later as a head of its own, so every unit is scheduled
//! exactly once: each loop pass either commits a unit or clears the
//! cursor, and a cleared cursor always commits on its next pass, which
//! bounds the loop at two passes per unit.
//!
//! This traversal must run single threaded; the order it produces is
//! not monotonic in physical layer index and cannot feed a pipelined
//! consumer.

use log::{debug, trace};

use super::store::NodeStore;
use crate::config::ClusterConfig;
use crate::geometry::GeometryOracle;
use crate::{CancelToken, CoordF, Error, Result};

/// Compute the batched printing order over all object units in the
/// store.
///
/// Returns indices into the store, in printing order, with batch ids
/// assigned. The store's nodes transition to `Scheduled` as they are
/// placed; running on a fully processed store is a no-op returning an
/// empty order.
pub fn schedule_clusters(
    store: &mut NodeStore,
    oracle: &impl GeometryOracle,
    config: &ClusterConfig,
    cancel: Option<&CancelToken>,
) -> Result<Vec<usize>> {
    let mut order: Vec<usize> = Vec::with_capacity(store.len());
    let mut current: Option<usize> = None;
    let mut batch_height = 0.0;

    loop {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
        }

        // Pick a fresh batch head if no cursor is held.
        let cur = match current {
            Some(idx) => idx,
            None => match store.first_unprocessed() {
                // The cursor is reassigned on every path below, so the
                // fresh head is only bound locally.
                Some(idx) => {
                    batch_height = 0.0;
                    trace!(
                        "batch head: layer {} region {}",
                        store[idx].layer_index,
                        store[idx].region
                    );
                    idx
                }
                None => break,
            },
        };

        // Commit the cursor if it has not been placed yet (fresh heads
        // only; accepted continuations arrive here already scheduled).
        if store[cur].is_unprocessed() {
            store[cur].mark_scheduled();
            batch_height += store[cur].height;
            order.push(cur);
            if batch_height >= config.safe_batch_height {
                debug!(
                    "forced batch break after layer {} region {} (height {:.3})",
                    store[cur].layer_index, store[cur].region, batch_height
                );
                batch_height = 0.0;
                current = None;
                continue;
            }
        }

        // The continuation candidate is the same-region unit one object
        // layer above.
        let track = store[cur].track_index;
        let region = store[cur].region;
        let next_track = track + 1;
        if next_track >= store.track_count() {
            current = None;
            continue;
        }
        let Some(cand) = store.find(next_track, region) else {
            current = None;
            continue;
        };

        // Safety check: the candidate must not cover any still-unprinted
        // neighboring region on the current layer beyond the critical
        // area. The build-plate layer never constrains.
        let mut blocked = false;
        let mut worst_overlap: CoordF = 0.0;
        if track > 0 {
            let cand_layer = store[cand].layer_index;
            debug_assert!(region >= 0);
            for other in store.nodes_at_track(track) {
                if other.region == region || !other.is_unprocessed() {
                    continue;
                }
                let overlap = oracle.overlap_area(
                    cand_layer,
                    region as u32,
                    other.layer_index,
                    other.region as u32,
                );
                if overlap > config.critical_intersection_area {
                    debug!(
                        "continuation blocked: layer {} region {} overlaps unprinted region {} by {:.3}",
                        cand_layer, region, other.region, overlap
                    );
                    blocked = true;
                    break;
                }
                worst_overlap = worst_overlap.max(overlap);
            }
        }
        if blocked {
            current = None;
            continue;
        }

        // Accept the continuation.
        store[cand].mark_scheduled();
        store[cand].self_intersection = worst_overlap;
        batch_height += store[cand].height;
        order.push(cand);
        current = Some(cand);
        if batch_height >= config.safe_batch_height {
            debug!(
                "forced batch break after layer {} region {} (height {:.3})",
                store[cand].layer_index, store[cand].region, batch_height
            );
            batch_height = 0.0;
            current = None;
        }
    }

    let changes = tag_batches(store, &order);
    debug!(
        "scheduled {} units in {} batches ({} tool changes in the object schedule)",
        order.len(),
        changes + usize::from(!order.is_empty()),
        changes
    );
    Ok(order)
}

/// Assign batch ids over a computed order: the id increments whenever
/// the region changes between consecutive entries. Returns the number
/// of increments, which is the tool-change count of the object portion.
fn tag_batches(store: &mut NodeStore, order: &[usize]) -> usize {
    let mut batch = 0;
    for i in 0..order.len() {
        if i > 0 && store[order[i]].region != store[order[i - 1]].region {
            batch += 1;
        }
        store[order[i]].batch_id = Some(batch);
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::{RegionSlice, SlicedLayer};
    use crate::CoordF;
    use std::collections::HashMap;

    /// Oracle with unit perimeters for the listed pairs and an explicit
    /// cross-layer overlap table keyed by
    /// (candidate layer, candidate region, other layer, other region).
    struct TableOracle {
        printable: Vec<(usize, u32)>,
        overlaps: HashMap<(usize, u32, usize, u32), CoordF>,
    }

    impl TableOracle {
        fn new(printable: Vec<(usize, u32)>) -> Self {
            Self {
                printable,
                overlaps: HashMap::new(),
            }
        }

        fn with_overlap(mut self, key: (usize, u32, usize, u32), value: CoordF) -> Self {
            self.overlaps.insert(key, value);
            self
        }
    }

    impl GeometryOracle for TableOracle {
        fn area(&self, layer: usize, region: u32) -> CoordF {
            if self.printable.contains(&(layer, region)) {
                25.0
            } else {
                0.0
            }
        }

        fn perimeter(&self, layer: usize, region: u32) -> CoordF {
            if self.printable.contains(&(layer, region)) {
                1.0
            } else {
                0.0
            }
        }

        fn overlap_area(
            &self,
            layer_a: usize,
            region_a: u32,
            layer_b: usize,
            region_b: u32,
        ) -> CoordF {
            self.overlaps
                .get(&(layer_a, region_a, layer_b, region_b))
                .copied()
                .unwrap_or(0.0)
        }
    }

    fn stack(layer_regions: &[&[u32]]) -> Vec<SlicedLayer> {
        layer_regions
            .iter()
            .enumerate()
            .map(|(idx, regions)| {
                SlicedLayer::new(
                    idx,
                    0.2 * (idx as f64 + 1.0),
                    0.2,
                    regions.iter().map(|&r| RegionSlice::bare(r)).collect(),
                )
            })
            .collect()
    }

    fn printable_pairs(layer_regions: &[&[u32]]) -> Vec<(usize, u32)> {
        layer_regions
            .iter()
            .enumerate()
            .flat_map(|(idx, regions)| regions.iter().map(move |&r| (idx, r)))
            .collect()
    }

    fn keys(store: &NodeStore, order: &[usize]) -> Vec<(usize, i32)> {
        order
            .iter()
            .map(|&idx| (store[idx].layer_index, store[idx].region))
            .collect()
    }

    #[test]
    fn test_single_region_stays_in_order() {
        let layers = stack(&[&[0], &[0], &[0]]);
        let oracle = TableOracle::new(printable_pairs(&[&[0], &[0], &[0]]));
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(1);
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        assert_eq!(keys(&store, &order), vec![(0, 0), (1, 0), (2, 0)]);
        assert!(order.iter().all(|&i| store[i].batch_id == Some(0)));
    }

    #[test]
    fn test_forced_break_at_safe_height() {
        // Two colors over four layers, no geometric constraints; with a
        // 0.35 mm cap and 0.2 mm layers each run breaks after two units
        // and the next head comes from creation order.
        let regions: &[&[u32]] = &[&[0, 1], &[0, 1], &[0, 1], &[0, 1]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions));
        let mut store = NodeStore::populate(&layers, &oracle);

        let mut config = ClusterConfig::new(2);
        config.safe_batch_height = 0.35;
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        assert_eq!(
            keys(&store, &order),
            vec![
                (0, 0),
                (1, 0),
                (0, 1),
                (1, 1),
                (2, 0),
                (3, 0),
                (2, 1),
                (3, 1),
            ]
        );
        let batches: Vec<usize> = order.iter().map(|&i| store[i].batch_id.unwrap()).collect();
        assert_eq!(batches, vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_height_cap_exceeded_by_at_most_one_layer() {
        let regions: &[&[u32]] = &[&[0], &[0], &[0], &[0], &[0]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions));
        let mut store = NodeStore::populate(&layers, &oracle);

        let mut config = ClusterConfig::new(1);
        config.safe_batch_height = 0.5;
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();
        assert_eq!(order.len(), 5);

        // Runs between forced breaks: 0.6 = cap 0.5 exceeded by less
        // than one 0.2 mm layer, never more.
        let mut run_height = 0.0;
        for &idx in &order {
            run_height += store[idx].height;
            assert!(run_height < config.safe_batch_height + store[idx].height + 1e-9);
            if run_height >= config.safe_batch_height {
                run_height = 0.0;
            }
        }
    }

    #[test]
    fn test_overlap_blocks_continuation() {
        // Region 0 would climb to layer 2, but its layer-2 footprint
        // covers region 1's unprinted layer-1 footprint.
        let regions: &[&[u32]] = &[&[0, 1], &[0, 1], &[0, 1]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions))
            .with_overlap((2, 0, 1, 1), 5.0);
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(2); // critical area 1.0
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        assert_eq!(
            keys(&store, &order),
            vec![(0, 0), (1, 0), (0, 1), (1, 1), (2, 1), (2, 0)]
        );
    }

    #[test]
    fn test_build_plate_layer_never_blocks() {
        // The same overlap that blocks at higher layers is ignored when
        // the cursor sits on the build-plate layer.
        let regions: &[&[u32]] = &[&[0, 1], &[0, 1]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions))
            .with_overlap((1, 0, 0, 1), 5.0);
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(2);
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        assert_eq!(
            keys(&store, &order),
            vec![(0, 0), (1, 0), (0, 1), (1, 1)]
        );
    }

    #[test]
    fn test_sub_threshold_overlap_recorded() {
        // Region 0 is blocked from climbing past layer 1, so region 0's
        // layer-2 unit is still unprocessed when region 1 climbs from
        // layer 2 to layer 3; that continuation measures a 0.3 overlap
        // below the threshold and records it.
        let regions: &[&[u32]] = &[&[0, 1], &[0, 1], &[0, 1], &[0, 1]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions))
            .with_overlap((2, 0, 1, 1), 5.0)
            .with_overlap((3, 1, 2, 0), 0.3);
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(2);
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        assert_eq!(
            keys(&store, &order),
            vec![
                (0, 0),
                (1, 0),
                (0, 1),
                (1, 1),
                (2, 1),
                (3, 1),
                (2, 0),
                (3, 0),
            ]
        );
        let accepted = store.find(3, 1).unwrap();
        assert!((store[accepted].self_intersection - 0.3).abs() < 1e-12);
        // Batch heads carry zero
        let head = store.find(2, 0).unwrap();
        assert_eq!(store[head].self_intersection, 0.0);
    }

    #[test]
    fn test_completeness_and_monotonic_state() {
        let regions: &[&[u32]] = &[&[0, 1, 2], &[0, 1, 2], &[0, 1, 2], &[0, 1, 2]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions));
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(3);
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        // Every unit exactly once
        assert_eq!(order.len(), store.len());
        let mut seen = vec![false; store.len()];
        for &idx in &order {
            assert!(!seen[idx], "unit scheduled twice");
            seen[idx] = true;
        }
        assert!(store.iter().all(|n| !n.is_unprocessed()));
    }

    #[test]
    fn test_idempotent_on_processed_store() {
        let regions: &[&[u32]] = &[&[0, 1], &[0, 1]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions));
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(2);
        let first = schedule_clusters(&mut store, &oracle, &config, None).unwrap();
        assert_eq!(first.len(), 4);

        let second = schedule_clusters(&mut store, &oracle, &config, None).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_cancellation() {
        let regions: &[&[u32]] = &[&[0], &[0]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions));
        let mut store = NodeStore::populate(&layers, &oracle);

        let token = CancelToken::new();
        token.cancel();
        let config = ClusterConfig::new(1);
        let result = schedule_clusters(&mut store, &oracle, &config, Some(&token));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_tag_batches_counts_region_changes() {
        let regions: &[&[u32]] = &[&[0, 1], &[0, 1]];
        let layers = stack(regions);
        let oracle = TableOracle::new(printable_pairs(regions));
        let mut store = NodeStore::populate(&layers, &oracle);

        let config = ClusterConfig::new(2);
        let order = schedule_clusters(&mut store, &oracle, &config, None).unwrap();

        // Recompute: tag_batches already ran inside schedule_clusters.
        let changes = tag_batches(&mut store, &order);
        assert_eq!(changes, 1); // region 0 run, then region 1 run
        assert_eq!(store[*order.last().unwrap()].batch_id, Some(1));
    }
}
