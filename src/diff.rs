//! Topology diff engine.
//!
//! ## Overview
//! A planning pass takes a universe's current nodes, its previous placement and a (possibly
//! edited) operator intent, and produces the universe's new node set along with the actions the
//! provisioning layer needs to take to get there. A pass is pure: it works on a copy of the
//! node set, and only commits the result into the caller's params once every invariant holds.
//!
//! ## Classification
//! - If the set of zones changed relative to the previous placement, every active node is
//!   replaced.
//! - Nodes whose instance type differs from the intent are replaced, as instance types can not be
//!   changed on a live node.
//! - Nodes in zones which left the placement are retired.
//! - Per zone, excess nodes are retired and shortfalls are filled with new `ToBeAdded` nodes.
//!
//! Retiring a node which was never provisioned (`ToBeAdded`) simply drops it from the set.
//! Retiring any other node marks it `ToBeDecommissioned` and strips its master role.
//!
//! ## Action Sets
//! Action sets are the delta of a single pass, computed by comparing the node set before and
//! after the pass. Running the same pass twice yields empty action sets the second time.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::inventory::ZoneInventory;
use crate::masters;
use crate::models::{NodeDetails, NodeSet, NodeState, PlacementInfo, UniverseDefinitionTaskParams, UserIntent};
use crate::planner::Planner;

/// The actions produced by a single planning pass, as sets of node names.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionSets {
    /// Nodes which now hold the master role, but did not before.
    pub masters_to_provision: BTreeSet<String>,
    /// Nodes which held the master role before, but no longer do.
    pub masters_to_be_removed: BTreeSet<String>,
    /// Nodes which are to be created.
    pub tservers_to_provision: BTreeSet<String>,
    /// Nodes which are to be decommissioned.
    pub tservers_to_be_removed: BTreeSet<String>,
}

impl ActionSets {
    /// Compute the actions needed to move from `before` to `after`.
    pub fn between(before: &NodeSet, after: &NodeSet) -> Self {
        let mut actions = Self::default();
        for node in after.iter() {
            let prev = before.get(&node.node_name);
            if node.state == NodeState::ToBeAdded && prev.is_none() {
                actions.tservers_to_provision.insert(node.node_name.clone());
            }
            if node.state == NodeState::ToBeDecommissioned && prev.map(|prev| prev.state != NodeState::ToBeDecommissioned).unwrap_or(false) {
                actions.tservers_to_be_removed.insert(node.node_name.clone());
            }
            if node.is_master && !prev.map(|prev| prev.is_master).unwrap_or(false) {
                actions.masters_to_provision.insert(node.node_name.clone());
            }
        }
        for prev in before.masters() {
            match after.get(&prev.node_name) {
                Some(node) if !node.is_master => {
                    actions.masters_to_be_removed.insert(prev.node_name.clone());
                }
                // A placeholder dropped before it was ever provisioned has nothing to demote.
                None if prev.state != NodeState::ToBeAdded => {
                    actions.masters_to_be_removed.insert(prev.node_name.clone());
                }
                _ => (),
            }
        }
        actions
    }

    /// True if the pass requires no action at all.
    pub fn is_empty(&self) -> bool {
        self.masters_to_provision.is_empty()
            && self.masters_to_be_removed.is_empty()
            && self.tservers_to_provision.is_empty()
            && self.tservers_to_be_removed.is_empty()
    }
}

/// Remove a node from the set by name, returning true if it was present.
///
/// Removing a name which is not in the set is a no-op.
pub fn remove_node_by_name(name: &str, nodes: &mut NodeSet) -> bool {
    let removed = nodes.remove(name).is_some();
    if removed {
        tracing::debug!(node = name, "removed node from node set");
    }
    removed
}

/// Outstanding masters to start: nodes awaiting provisioning which are to run a master.
pub fn masters_to_provision(nodes: &NodeSet) -> Vec<&NodeDetails> {
    nodes.iter().filter(|node| node.state == NodeState::ToBeAdded && node.is_master).collect()
}

/// Outstanding tservers to start: every node awaiting provisioning.
pub fn tservers_to_provision(nodes: &NodeSet) -> Vec<&NodeDetails> {
    nodes.iter().filter(|node| node.state == NodeState::ToBeAdded && node.is_tserver).collect()
}

/// Outstanding tservers to stop: every node awaiting decommission.
pub fn tservers_to_be_removed(nodes: &NodeSet) -> Vec<&NodeDetails> {
    nodes.iter().filter(|node| node.state == NodeState::ToBeDecommissioned && node.is_tserver).collect()
}

/// The topology diff engine.
pub struct DiffEngine<I> {
    planner: Planner<I>,
}

impl<I: ZoneInventory> DiffEngine<I> {
    /// Create a new instance.
    pub fn new(planner: Planner<I>) -> Self {
        Self { planner }
    }

    /// The engine's placement planner.
    pub fn planner(&self) -> &Planner<I> {
        &self.planner
    }

    /// Run a planning pass over the given params.
    ///
    /// On success, the params' placement and node set are replaced with the planned ones and the
    /// actions of this pass are returned. On error, the params are left untouched.
    #[tracing::instrument(level = "debug", skip(self, params), fields(universe = %params.universe_uuid))]
    pub fn update_universe_definition(&self, params: &mut UniverseDefinitionTaskParams) -> PlannerResult<ActionSets> {
        let intent = &params.user_intent;
        self.planner.validate(intent)?;
        let previous = params.placement_info.as_ref();
        check_consistency(&params.node_details_set, previous)?;

        let placement = self.planner.plan(intent, previous)?;
        let full_replacement = match previous {
            Some(prev) => zone_set(prev) != zone_set(&placement),
            None => false,
        };

        let before = &params.node_details_set;
        let mut nodes = before.clone();
        self.classify(&mut nodes, intent, &placement, full_replacement)?;
        masters::select_masters_preferring(&mut nodes, intent.replication_factor, intent.preferred_region.as_deref());
        verify(&nodes, intent, &placement)?;

        let actions = ActionSets::between(before, &nodes);
        tracing::debug!(
            full_replacement,
            masters_to_provision = actions.masters_to_provision.len(),
            masters_to_be_removed = actions.masters_to_be_removed.len(),
            tservers_to_provision = actions.tservers_to_provision.len(),
            tservers_to_be_removed = actions.tservers_to_be_removed.len(),
            "planned universe definition",
        );
        params.placement_info = Some(placement);
        params.node_details_set = nodes;
        Ok(actions)
    }

    /// Retire and add nodes until every zone of the placement holds its target count.
    fn classify(&self, nodes: &mut NodeSet, intent: &UserIntent, placement: &PlacementInfo, full_replacement: bool) -> PlannerResult<()> {
        // Nodes which can not stay where they are, regardless of per-zone targets.
        let replace: Vec<String> = nodes
            .active()
            .filter(|node| full_replacement || node.cloud_info.instance_type != intent.instance_type || placement.find_az(&node.cloud_info.az).is_none())
            .map(|node| node.node_name.clone())
            .collect();
        for name in replace.iter() {
            retire(nodes, name);
        }

        let mut next_idx = nodes.next_node_idx();
        for zone in placement.zones() {
            let target = zone.az.num_nodes_in_az as usize;
            let mut in_zone: Vec<&NodeDetails> = nodes.active().filter(|node| node.cloud_info.az == zone.az.code).collect();

            if in_zone.len() > target {
                // Cheapest to retire first: placeholders, then non-masters, then masters. Newest first.
                in_zone.sort_by_key(|node| (node.state != NodeState::ToBeAdded, node.is_master, std::cmp::Reverse(node.node_idx)));
                let excess: Vec<String> = in_zone.iter().take(in_zone.len() - target).map(|node| node.node_name.clone()).collect();
                for name in excess.iter() {
                    retire(nodes, name);
                }
                continue;
            }

            for _ in in_zone.len()..target {
                let node_name = self.node_name(nodes, intent, &mut next_idx);
                let node = NodeDetails::new_placeholder(node_name, next_idx, zone.cloud, zone.region, &zone.az.code, &intent.instance_type);
                next_idx += 1;
                nodes.try_insert(node)?;
            }
        }
        Ok(())
    }

    /// Produce a node name which is not yet taken, advancing `next_idx` past any collisions.
    fn node_name(&self, nodes: &NodeSet, intent: &UserIntent, next_idx: &mut u32) -> String {
        loop {
            let name = format!("{}-{}-n{}", self.planner.config().node_name_prefix, intent.universe_name, next_idx);
            if !nodes.contains(&name) {
                return name;
            }
            *next_idx += 1;
        }
    }
}

/// Retire the named node.
fn retire(nodes: &mut NodeSet, name: &str) {
    let placeholder = matches!(nodes.get(name), Some(node) if node.state == NodeState::ToBeAdded);
    if placeholder {
        remove_node_by_name(name, nodes);
        return;
    }
    if let Some(node) = nodes.get_mut(name) {
        tracing::trace!(node = name, was_master = node.is_master, "marking node to be decommissioned");
        node.state = NodeState::ToBeDecommissioned;
        node.is_master = false;
    }
}

/// The codes of every zone in the placement.
fn zone_set(placement: &PlacementInfo) -> BTreeSet<String> {
    placement.zone_codes().into_iter().collect()
}

/// Ensure the node set agrees with the placement it was planned against.
fn check_consistency(nodes: &NodeSet, placement: Option<&PlacementInfo>) -> PlannerResult<()> {
    let placement = match placement {
        Some(placement) => placement,
        None => {
            return match nodes.active().next() {
                Some(node) => Err(PlannerError::inconsistent(format!("node {} exists but the universe has no placement", node.node_name))),
                None => Ok(()),
            }
        }
    };
    for node in nodes.active() {
        let zone = placement.find_az(&node.cloud_info.az).ok_or_else(|| {
            PlannerError::inconsistent(format!("node {} is placed in zone {} which is not part of the placement", node.node_name, node.cloud_info.az))
        })?;
        if zone.cloud != node.cloud_info.cloud || zone.region != node.cloud_info.region {
            return Err(PlannerError::inconsistent(format!(
                "node {} claims {}/{} for zone {}, but the placement has {}/{}",
                node.node_name, node.cloud_info.cloud, node.cloud_info.region, node.cloud_info.az, zone.cloud, zone.region
            )));
        }
    }
    Ok(())
}

/// Check the invariants every successful pass must uphold.
fn verify(nodes: &NodeSet, intent: &UserIntent, placement: &PlacementInfo) -> PlannerResult<()> {
    let active = nodes.active().count();
    if active != intent.num_nodes as usize {
        return Err(PlannerError::inconsistent(format!("planned {} active nodes, expected {}", active, intent.num_nodes)));
    }
    let expected_masters = std::cmp::min(intent.replication_factor as usize, active);
    if nodes.num_masters() != expected_masters {
        return Err(PlannerError::inconsistent(format!("planned {} masters, expected {}", nodes.num_masters(), expected_masters)));
    }
    let per_zone = nodes.az_to_num_nodes();
    let mismatch: BTreeMap<&str, (u32, u32)> = placement
        .zones()
        .map(|zone| (zone.az.code.as_str(), (per_zone.get(&zone.az.code).copied().unwrap_or(0), zone.az.num_nodes_in_az)))
        .filter(|(_, (actual, target))| actual != target)
        .collect();
    if !mismatch.is_empty() {
        return Err(PlannerError::inconsistent(format!("zones do not match their targets (actual, target): {:?}", mismatch)));
    }
    Ok(())
}
