//! Shared builders for unit tests.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::diff::DiffEngine;
use crate::inventory::MemoryInventory;
use crate::models::{NodeState, UniverseDefinitionTaskParams, UserIntent};
use crate::planner::Planner;

pub const PROVIDER: &str = "aws";
pub const INSTANCE_TYPE: &str = "c5.large";

/// An inventory of four regions.
///
/// `r-1` spans `az-1` & `az-2`, `r-2` spans `az-3`, `r-3` spans `az-4` and `r-onprem` only has
/// free instances in `op-3`.
pub fn inventory() -> MemoryInventory {
    let mut inventory = MemoryInventory::new();
    inventory
        .add_zone("r-1", "az-1")
        .add_zone("r-1", "az-2")
        .add_zone("r-2", "az-3")
        .add_zone("r-3", "az-4")
        .add_zone_with_capacity("r-onprem", "op-1", 0)
        .add_zone_with_capacity("r-onprem", "op-2", 0)
        .add_zone_with_capacity("r-onprem", "op-3", 5);
    inventory
}

pub fn engine() -> DiffEngine<MemoryInventory> {
    DiffEngine::new(Planner::new(Arc::new(Config::default()), inventory()))
}

/// An intent spread across the three zones of `r-1` & `r-2`.
pub fn intent(replication_factor: u32, num_nodes: u32) -> UserIntent {
    UserIntent::new("test", PROVIDER, replication_factor, num_nodes, vec!["r-1".into(), "r-2".into()], INSTANCE_TYPE)
}

/// Params for a universe which has not been planned yet.
pub fn new_params(intent: UserIntent) -> UniverseDefinitionTaskParams {
    UniverseDefinitionTaskParams::new(Uuid::new_v4(), intent)
}

/// Params for a universe which was created from the given intent and is fully running.
pub fn running_params(engine: &DiffEngine<MemoryInventory>, intent: UserIntent) -> anyhow::Result<UniverseDefinitionTaskParams> {
    let mut params = new_params(intent);
    engine.update_universe_definition(&mut params)?;
    mark_running(&mut params);
    Ok(params)
}

/// Mark every placeholder as running, as the provisioning layer would once done.
pub fn mark_running(params: &mut UniverseDefinitionTaskParams) {
    for node in params.node_details_set.iter_mut() {
        if node.state == NodeState::ToBeAdded {
            node.state = NodeState::Running;
        }
    }
}
