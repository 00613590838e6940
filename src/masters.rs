//! Master selection.
//!
//! Masters are spread across zones round-robin: every zone contributes one master per round
//! until the replication factor is met. Only once every zone has a master may a zone receive a
//! second one. Nodes which already hold the master role are preferred, both when ordering zones
//! and within a zone, so re-running selection over an unchanged node set changes nothing.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::models::{NodeDetails, NodeSet};

/// Mark exactly `replication_factor` active nodes as masters, or every active node if there are
/// fewer than that. Every other node has its master role cleared.
pub fn select_masters(nodes: &mut NodeSet, replication_factor: u32) {
    select_masters_preferring(nodes, replication_factor, None)
}

/// Same as `select_masters`, but zones of `preferred_region` come first among zones with the same
/// number of existing masters.
pub fn select_masters_preferring(nodes: &mut NodeSet, replication_factor: u32, preferred_region: Option<&str>) {
    let selected = choose(nodes, replication_factor as usize, preferred_region);
    for node in nodes.iter_mut() {
        node.is_master = selected.iter().any(|name| name == &node.node_name);
    }
    tracing::debug!(replication_factor, masters = ?selected, "selected masters");
}

/// Choose the names of the nodes which are to hold the master role.
fn choose(nodes: &NodeSet, replication_factor: usize, preferred_region: Option<&str>) -> Vec<String> {
    // Group active nodes by zone.
    let mut by_zone: BTreeMap<&str, Vec<&NodeDetails>> = BTreeMap::new();
    for node in nodes.active() {
        by_zone.entry(node.cloud_info.az.as_str()).or_default().push(node);
    }
    for candidates in by_zone.values_mut() {
        candidates.sort_by_cached_key(|node| (!node.is_master, node.node_idx, node.node_name.clone()));
    }

    let mut zones: Vec<(&str, Vec<&NodeDetails>)> = by_zone.into_iter().collect();
    zones.sort_by_key(|(zone, candidates)| {
        let masters = candidates.iter().filter(|node| node.is_master).count();
        let preferred = preferred_region.map(|region| candidates.iter().any(|node| node.cloud_info.region == region)).unwrap_or(false);
        (Reverse(masters), !preferred, *zone)
    });

    let mut selected = Vec::with_capacity(replication_factor);
    let mut round = 0;
    while selected.len() < replication_factor {
        let mut picked_any = false;
        for (_, candidates) in zones.iter() {
            if selected.len() == replication_factor {
                break;
            }
            if let Some(node) = candidates.get(round) {
                selected.push(node.node_name.clone());
                picked_any = true;
            }
        }
        // Every active node has been selected.
        if !picked_any {
            break;
        }
        round += 1;
    }
    selected
}
