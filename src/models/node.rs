//! Universe nodes and their lifecycle.

use std::collections::btree_map::{BTreeMap, Entry};

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};

/// The lifecycle state of a node.
///
/// The diff engine only ever assigns `ToBeAdded` and `ToBeDecommissioned`. Every other state is
/// reported by the provisioning layer as it makes progress.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum NodeState {
    ToBeAdded,
    Provisioning,
    SoftwareInstalled,
    UpgradeSoftware,
    Running,
    ToBeDecommissioned,
    BeingDecommissioned,
    Decommissioned,
    Unreachable,
    Stopped,
}

impl NodeState {
    /// True if the node is on its way out of the universe, or already gone.
    pub fn is_decommissioning(&self) -> bool {
        matches!(self, Self::ToBeDecommissioned | Self::BeingDecommissioned | Self::Decommissioned)
    }

    /// True if the node counts towards the universe's placement.
    pub fn is_active(&self) -> bool {
        !self.is_decommissioning()
    }

    /// Check whether the provisioning layer may move a node from this state to `next`.
    pub fn can_transition_to(&self, next: NodeState) -> bool {
        use NodeState::*;
        if *self == next {
            return true;
        }
        match (*self, next) {
            (ToBeAdded, Provisioning) | (Provisioning, SoftwareInstalled) | (SoftwareInstalled, Running) => true,
            (Running, UpgradeSoftware) | (UpgradeSoftware, Running) => true,
            (Running, Unreachable) | (Unreachable, Running) => true,
            (Running, Stopped) | (Stopped, Running) => true,
            (Unreachable, Stopped) | (Stopped, Unreachable) => true,
            (ToBeDecommissioned, BeingDecommissioned) | (BeingDecommissioned, Decommissioned) => true,
            (from, ToBeDecommissioned) => from.is_active(),
            _ => false,
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Cloud specific details of a node.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CloudSpecificInfo {
    /// The provider code of the cloud.
    pub cloud: String,
    /// The region code.
    pub region: String,
    /// The zone code.
    pub az: String,
    /// The instance type code the node runs on.
    pub instance_type: String,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub private_dns: Option<String>,
    #[serde(default)]
    pub public_dns: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
}

/// A member of a universe.
///
/// The cloud, region & zone of a node are fixed at creation. A node which must move is removed
/// and replaced by a new node.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetails {
    /// The name of the node, unique within its universe.
    pub node_name: String,
    /// The index of the node within its universe, monotonically assigned.
    pub node_idx: u32,
    pub cloud_info: CloudSpecificInfo,
    pub is_master: bool,
    pub is_tserver: bool,
    pub state: NodeState,
}

impl NodeDetails {
    /// Create a new placeholder node which is yet to be provisioned.
    pub fn new_placeholder(node_name: String, node_idx: u32, cloud: &str, region: &str, az: &str, instance_type: &str) -> Self {
        Self {
            node_name,
            node_idx,
            cloud_info: CloudSpecificInfo {
                cloud: cloud.into(),
                region: region.into(),
                az: az.into(),
                instance_type: instance_type.into(),
                ..Default::default()
            },
            is_master: false,
            is_tserver: true,
            state: NodeState::ToBeAdded,
        }
    }

    /// True if the node counts towards the universe's placement.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Move this node into the given state, as reported by the provisioning layer.
    pub fn transition(&mut self, next: NodeState) -> PlannerResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(PlannerError::inconsistent(format!(
                "node {} can not transition from {} to {}",
                self.node_name, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }
}

/// The nodes of a universe, keyed uniquely by node name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct NodeSet {
    nodes: BTreeMap<String, NodeDetails>,
}

impl NodeSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing and returning any node with the same name.
    pub fn insert(&mut self, node: NodeDetails) -> Option<NodeDetails> {
        self.nodes.insert(node.node_name.clone(), node)
    }

    /// Insert a node only if its name is not yet taken.
    pub fn try_insert(&mut self, node: NodeDetails) -> PlannerResult<()> {
        match self.nodes.entry(node.node_name.clone()) {
            Entry::Occupied(_) => Err(PlannerError::inconsistent(format!("duplicate node name {}", node.node_name))),
            Entry::Vacant(entry) => {
                entry.insert(node);
                Ok(())
            }
        }
    }

    /// Remove a node by name.
    pub fn remove(&mut self, name: &str) -> Option<NodeDetails> {
        self.nodes.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&NodeDetails> {
        self.nodes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NodeDetails> {
        self.nodes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &NodeDetails> {
        self.nodes.values()
    }

    /// Iterate mutably over all nodes, ordered by name.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeDetails> {
        self.nodes.values_mut()
    }

    /// Iterate over the nodes which count towards the universe's placement.
    pub fn active(&self) -> impl Iterator<Item = &NodeDetails> {
        self.iter().filter(|node| node.is_active())
    }

    /// Iterate over all nodes holding the master role.
    pub fn masters(&self) -> impl Iterator<Item = &NodeDetails> {
        self.iter().filter(|node| node.is_master)
    }

    /// The number of nodes holding the master role.
    pub fn num_masters(&self) -> usize {
        self.masters().count()
    }

    /// The number of active nodes in each zone.
    pub fn az_to_num_nodes(&self) -> BTreeMap<String, u32> {
        self.active().fold(BTreeMap::new(), |mut acc, node| {
            *acc.entry(node.cloud_info.az.clone()).or_insert(0) += 1;
            acc
        })
    }

    /// The index to assign to the next node created in this universe.
    pub fn next_node_idx(&self) -> u32 {
        self.iter().map(|node| node.node_idx).max().map(|idx| idx + 1).unwrap_or(1)
    }
}

impl FromIterator<NodeDetails> for NodeSet {
    fn from_iter<T: IntoIterator<Item = NodeDetails>>(iter: T) -> Self {
        let mut set = Self::new();
        for node in iter {
            set.insert(node);
        }
        set
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a NodeDetails;
    type IntoIter = std::collections::btree_map::Values<'a, String, NodeDetails>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.values()
    }
}
