//! Placement planning, master selection and topology diffing for managed database universes.
//!
//! A planning pass turns an operator's declared intent for a universe into a concrete set of
//! nodes: the placement planner spreads the requested node count across zones, the diff engine
//! reconciles the universe's current nodes with those targets and the master selector assigns
//! the master role. The actions a pass produces are executed elsewhere, which reports node state
//! back so the next pass can reconcile from it.

pub mod balancer;
pub mod config;
pub mod diff;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod health;
pub mod inventory;
pub mod masters;
#[cfg(test)]
mod masters_test;
pub mod models;
pub mod node_info;
pub mod planner;
pub mod resources;
pub mod store;
#[cfg(test)]
mod store_test;

pub use crate::{
    config::Config,
    diff::{remove_node_by_name, ActionSets, DiffEngine},
    error::{PlannerError, PlannerResult},
    inventory::{MemoryInventory, ZoneInventory},
    planner::Planner,
    store::MemoryStore,
};
