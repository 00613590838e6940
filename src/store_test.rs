use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::error::PlannerError;
use crate::fixtures;
use crate::models::Universe;
use crate::store::MemoryStore;

fn universe(num_nodes: u32) -> Universe {
    Universe::new(Uuid::new_v4(), fixtures::intent(3, num_nodes))
}

#[test]
fn insert_and_get() -> Result<()> {
    let store = MemoryStore::new();
    let universe = universe(3);
    let uuid = universe.universe_uuid;

    let inserted = store.insert(universe.clone())?;

    assert!(inserted.version == 1, "expected version 1 got {}", inserted.version);
    let stored = store.get(&uuid).context("universe missing from store")?;
    assert!(stored.universe_details == universe.universe_details, "expected stored details to match");
    let res = store.insert(universe);
    assert!(matches!(res, Err(PlannerError::InconsistentState(_))), "expected InconsistentState got {:?}", res);
    assert!(store.get(&Uuid::new_v4()).is_none(), "expected unknown universe to be absent");
    Ok(())
}

#[test]
fn update_plans_and_bumps_version() -> Result<()> {
    let store = MemoryStore::new();
    let engine = fixtures::engine();
    let uuid = store.insert(universe(3))?.universe_uuid;

    let updated = store.update(&uuid, |current| current.plan(&engine, fixtures::intent(3, 6)).map(|(next, _)| next))?;

    assert!(updated.version == 2, "expected version 2 got {}", updated.version);
    let nodes = &updated.universe_details.node_details_set;
    assert!(nodes.len() == 6, "expected 6 nodes got {}", nodes.len());
    let stored = store.get(&uuid).context("universe missing from store")?;
    assert!(Arc::ptr_eq(&stored, &updated), "expected the stored snapshot to be the updated one");
    Ok(())
}

#[test]
fn failed_update_leaves_the_snapshot_untouched() -> Result<()> {
    let store = MemoryStore::new();
    let engine = fixtures::engine();
    let uuid = store.insert(universe(3))?.universe_uuid;
    let before = store.get(&uuid).context("universe missing from store")?;

    let res = store.update(&uuid, |current| current.plan(&engine, fixtures::intent(4, 6)).map(|(next, _)| next));

    assert!(matches!(res, Err(PlannerError::InvalidIntent(_))), "expected InvalidIntent got {:?}", res);
    let after = store.get(&uuid).context("universe missing from store")?;
    assert!(Arc::ptr_eq(&before, &after), "expected the stored snapshot to be untouched");
    assert!(after.version == 1, "expected version 1 got {}", after.version);
    Ok(())
}

#[test]
fn save_if_version_detects_stale_writes() -> Result<()> {
    let store = MemoryStore::new();
    let uuid = store.insert(universe(3))?.universe_uuid;
    let snapshot = store.get(&uuid).context("universe missing from store")?;

    let mut first = (*snapshot).clone();
    first.universe_details.user_intent.num_nodes = 5;
    let saved = store.save_if_version(first, snapshot.version)?;
    assert!(saved.version == 2, "expected version 2 got {}", saved.version);

    let mut stale = (*snapshot).clone();
    stale.universe_details.user_intent.num_nodes = 7;
    let res = store.save_if_version(stale, snapshot.version);

    assert!(matches!(res, Err(PlannerError::InconsistentState(_))), "expected InconsistentState got {:?}", res);
    let stored = store.get(&uuid).context("universe missing from store")?;
    assert!(stored.universe_details.user_intent.num_nodes == 5, "expected the first write to win");
    Ok(())
}

#[test]
fn concurrent_updates_are_serialized() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let uuid = store.insert(universe(3))?.universe_uuid;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    store.update(&uuid, |current| {
                        let mut next = current.clone();
                        next.universe_details.user_intent.num_nodes += 1;
                        Ok(next)
                    })?;
                }
                Ok::<_, PlannerError>(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| anyhow::anyhow!("update thread panicked"))??;
    }

    let stored = store.get(&uuid).context("universe missing from store")?;
    assert!(stored.version == 201, "expected version 201 got {}", stored.version);
    assert!(
        stored.universe_details.user_intent.num_nodes == 203,
        "expected 203 nodes got {}",
        stored.universe_details.user_intent.num_nodes
    );
    Ok(())
}
