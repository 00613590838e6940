//! In-memory universe store.
//!
//! Snapshots are stored behind `Arc`s and are never mutated in place. Every write produces a new
//! snapshot with a bumped version. Writers are exclusive per universe: `update` holds the shard
//! lock of the universe for the whole read-compute-write, so concurrent updates to the same
//! universe are serialized while updates to other universes proceed independently.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{PlannerError, PlannerResult};
use crate::models::Universe;

/// A versioned in-memory store of universe snapshots.
#[derive(Default)]
pub struct MemoryStore {
    universes: DashMap<Uuid, Arc<Universe>>,
}

impl MemoryStore {
    /// Create a new instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new universe at version 1.
    pub fn insert(&self, mut universe: Universe) -> PlannerResult<Arc<Universe>> {
        universe.version = 1;
        let universe = Arc::new(universe);
        match self.universes.entry(universe.universe_uuid) {
            Entry::Occupied(_) => return Err(PlannerError::inconsistent(format!("universe {} already exists", universe.universe_uuid))),
            Entry::Vacant(entry) => {
                entry.insert(universe.clone());
            }
        }
        tracing::debug!(universe = %universe.universe_uuid, "inserted universe");
        Ok(universe)
    }

    /// Get the latest snapshot of a universe.
    pub fn get(&self, universe_uuid: &Uuid) -> Option<Arc<Universe>> {
        self.universes.get(universe_uuid).map(|entry| entry.value().clone())
    }

    /// Compute and commit a new snapshot of a universe from its latest one.
    ///
    /// If `f` fails, the stored snapshot is left untouched and the error is returned.
    pub fn update<F>(&self, universe_uuid: &Uuid, f: F) -> PlannerResult<Arc<Universe>>
    where
        F: FnOnce(&Universe) -> PlannerResult<Universe>,
    {
        let mut entry = self
            .universes
            .get_mut(universe_uuid)
            .ok_or_else(|| PlannerError::inconsistent(format!("universe {} not found", universe_uuid)))?;
        let current: &Universe = entry.value();
        let mut next = f(current)?;
        if next.universe_uuid != *universe_uuid {
            return Err(PlannerError::inconsistent(format!(
                "update of universe {} produced universe {}",
                universe_uuid, next.universe_uuid
            )));
        }
        next.version = current.version + 1;
        let next = Arc::new(next);
        *entry.value_mut() = next.clone();
        tracing::debug!(universe = %universe_uuid, version = next.version, "updated universe");
        Ok(next)
    }

    /// Commit the given snapshot, but only if the stored one is still at `expected_version`.
    pub fn save_if_version(&self, mut universe: Universe, expected_version: u64) -> PlannerResult<Arc<Universe>> {
        let universe_uuid = universe.universe_uuid;
        let mut entry = self
            .universes
            .get_mut(&universe_uuid)
            .ok_or_else(|| PlannerError::inconsistent(format!("universe {} not found", universe_uuid)))?;
        let stored_version = entry.value().version;
        if stored_version != expected_version {
            return Err(PlannerError::inconsistent(format!(
                "universe {} is at version {}, expected version {}",
                universe_uuid, stored_version, expected_version
            )));
        }
        universe.version = stored_version + 1;
        let universe = Arc::new(universe);
        *entry.value_mut() = universe.clone();
        tracing::debug!(universe = %universe_uuid, version = universe.version, "saved universe");
        Ok(universe)
    }
}
