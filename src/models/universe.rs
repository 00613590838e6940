//! The universe aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::{ActionSets, DiffEngine};
use crate::error::{PlannerError, PlannerResult};
use crate::inventory::ZoneInventory;
use crate::models::{NodeSet, PlacementInfo, UserIntent};
use crate::node_info::{self, NodeInfoUpdate};

/// Everything a planning pass reads and writes: intent, placement & nodes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UniverseDefinitionTaskParams {
    pub universe_uuid: Uuid,
    pub user_intent: UserIntent,
    /// The placement computed by the last committed pass, if any.
    #[serde(default)]
    pub placement_info: Option<PlacementInfo>,
    #[serde(default)]
    pub node_details_set: NodeSet,
}

impl UniverseDefinitionTaskParams {
    /// Create params for a universe which has never been planned.
    pub fn new(universe_uuid: Uuid, user_intent: UserIntent) -> Self {
        Self {
            universe_uuid,
            user_intent,
            placement_info: None,
            node_details_set: NodeSet::new(),
        }
    }
}

/// One managed database cluster.
///
/// Snapshots are never mutated in place across planning passes. Every pass reads a snapshot and
/// produces a new one, which the persistence layer then commits.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Universe {
    pub universe_uuid: Uuid,
    /// The version of this snapshot, bumped by the store on every commit.
    pub version: u64,
    pub universe_details: UniverseDefinitionTaskParams,
}

impl Universe {
    /// Create a new universe which has not yet been planned.
    pub fn new(universe_uuid: Uuid, user_intent: UserIntent) -> Self {
        Self {
            universe_uuid,
            version: 0,
            universe_details: UniverseDefinitionTaskParams::new(universe_uuid, user_intent),
        }
    }

    /// The nodes currently holding the master role.
    pub fn masters(&self) -> impl Iterator<Item = &crate::models::NodeDetails> {
        self.universe_details.node_details_set.masters()
    }

    /// Run a planning pass for the given intent, producing a new snapshot.
    ///
    /// On error, `self` is left as it was.
    pub fn plan<I: ZoneInventory>(&self, engine: &DiffEngine<I>, intent: UserIntent) -> PlannerResult<(Universe, ActionSets)> {
        let mut details = self.universe_details.clone();
        details.user_intent = intent;
        let actions = engine.update_universe_definition(&mut details)?;
        Ok((
            Universe {
                universe_uuid: self.universe_uuid,
                version: self.version,
                universe_details: details,
            },
            actions,
        ))
    }

    /// Apply node info reported by the provisioning layer, producing a new snapshot.
    pub fn update_node_info(&self, node_name: &str, info: &serde_json::Map<String, serde_json::Value>) -> PlannerResult<(Universe, NodeInfoUpdate)> {
        let mut next = self.clone();
        let node = next
            .universe_details
            .node_details_set
            .get_mut(node_name)
            .ok_or_else(|| PlannerError::inconsistent(format!("node {} is not part of universe {}", node_name, self.universe_uuid)))?;
        let update = node_info::apply_node_info(node, info)?;
        Ok((next, update))
    }
}
