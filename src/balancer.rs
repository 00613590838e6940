//! AZ balancer.
//!
//! Spreads a universe's node count across its zones so that no two zones differ by more than one
//! node. Balancing always starts from the previous allocation and moves one node at a time, so
//! zones which are already where they need to be are left alone.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PlannerError, PlannerResult};

/// Distribute `total_nodes` across `zones`, starting from the `existing` allocation.
///
/// Growth goes to the smallest zone first and shrinkage comes from the largest zone first. Ties
/// are broken by the order of `zones`. Entries of `existing` for zones not in `zones` are ignored.
pub fn balance(zones: &[String], total_nodes: u32, existing: &BTreeMap<String, u32>) -> PlannerResult<BTreeMap<String, u32>> {
    if zones.is_empty() {
        if total_nodes > 0 {
            return Err(PlannerError::invalid(format!("no availability zones to place {} nodes in", total_nodes)));
        }
        return Ok(BTreeMap::new());
    }
    let mut seen = BTreeSet::new();
    if let Some(dup) = zones.iter().find(|zone| !seen.insert(zone.as_str())) {
        return Err(PlannerError::invalid(format!("availability zone {} is listed more than once", dup)));
    }

    let mut counts: Vec<u32> = zones.iter().map(|zone| existing.get(zone).copied().unwrap_or(0)).collect();
    let mut sum: u32 = counts.iter().sum();

    while sum < total_nodes {
        let idx = first_min(&counts);
        counts[idx] += 1;
        sum += 1;
    }
    while sum > total_nodes {
        let idx = first_max(&counts);
        counts[idx] -= 1;
        sum -= 1;
    }
    // The sum is right, but a previous allocation may still be lopsided, e.g. when a zone was
    // just introduced. Move single nodes from the largest to the smallest zone.
    loop {
        let (max, min) = (first_max(&counts), first_min(&counts));
        if counts[max] - counts[min] <= 1 {
            break;
        }
        counts[max] -= 1;
        counts[min] += 1;
    }

    tracing::trace!(?zones, total_nodes, ?counts, "balanced zones");
    Ok(zones.iter().cloned().zip(counts).collect())
}

/// Index of the first smallest count.
fn first_min(counts: &[u32]) -> usize {
    let mut idx = 0;
    for (i, count) in counts.iter().enumerate() {
        if *count < counts[idx] {
            idx = i;
        }
    }
    idx
}

/// Index of the first largest count.
fn first_max(counts: &[u32]) -> usize {
    let mut idx = 0;
    for (i, count) in counts.iter().enumerate() {
        if *count > counts[idx] {
            idx = i;
        }
    }
    idx
}
