use std::collections::BTreeMap;

use anyhow::Result;

use crate::masters::{select_masters, select_masters_preferring};
use crate::models::{NodeDetails, NodeSet, NodeState};

fn node(idx: u32, region: &str, az: &str) -> NodeDetails {
    NodeDetails::new_placeholder(format!("n{:02}", idx), idx, "aws", region, az, "c5.large")
}

/// Three zones with `per_zone` nodes each, `az-1` & `az-2` in `r-1` and `az-3` in `r-2`.
fn nodes(per_zone: u32) -> NodeSet {
    let mut idx = 0;
    let mut set = NodeSet::new();
    for (region, az) in [("r-1", "az-1"), ("r-1", "az-2"), ("r-2", "az-3")] {
        for _ in 0..per_zone {
            idx += 1;
            set.insert(node(idx, region, az));
        }
    }
    set
}

fn masters_per_zone(nodes: &NodeSet) -> BTreeMap<String, usize> {
    nodes.masters().fold(BTreeMap::new(), |mut acc, node| {
        *acc.entry(node.cloud_info.az.clone()).or_insert(0) += 1;
        acc
    })
}

#[test]
fn select_masters_spreads_across_zones() -> Result<()> {
    let mut nodes = nodes(3);

    select_masters(&mut nodes, 3);

    let per_zone = masters_per_zone(&nodes);
    assert!(nodes.num_masters() == 3, "expected 3 masters got {}", nodes.num_masters());
    assert!(per_zone.values().all(|count| *count == 1), "expected one master per zone got {:?}", per_zone);
    Ok(())
}

#[test]
fn select_masters_wraps_around_when_rf_exceeds_zones() -> Result<()> {
    let mut nodes = nodes(4);

    select_masters(&mut nodes, 5);

    let per_zone = masters_per_zone(&nodes);
    assert!(nodes.num_masters() == 5, "expected 5 masters got {}", nodes.num_masters());
    let counts: Vec<usize> = per_zone.values().copied().collect();
    assert!(counts == vec![2, 2, 1], "expected masters per zone [2, 2, 1] got {:?}", counts);
    Ok(())
}

#[test]
fn select_masters_takes_every_node_when_fewer_than_rf() -> Result<()> {
    let mut nodes = nodes(1);

    select_masters(&mut nodes, 5);

    assert!(nodes.num_masters() == 3, "expected 3 masters got {}", nodes.num_masters());
    Ok(())
}

#[test]
fn select_masters_keeps_existing_masters() -> Result<()> {
    let mut nodes = nodes(3);
    for name in ["n03", "n05", "n09"] {
        if let Some(node) = nodes.get_mut(name) {
            node.is_master = true;
        }
    }

    select_masters(&mut nodes, 3);

    let masters: Vec<&str> = nodes.masters().map(|node| node.node_name.as_str()).collect();
    assert!(masters == vec!["n03", "n05", "n09"], "expected masters to be untouched got {:?}", masters);
    Ok(())
}

#[test]
fn select_masters_shrinks_existing_masters_evenly() -> Result<()> {
    let mut nodes = nodes(3);
    for name in ["n01", "n02", "n04", "n05", "n07"] {
        if let Some(node) = nodes.get_mut(name) {
            node.is_master = true;
        }
    }

    select_masters(&mut nodes, 3);

    let per_zone = masters_per_zone(&nodes);
    assert!(nodes.num_masters() == 3, "expected 3 masters got {}", nodes.num_masters());
    assert!(per_zone.values().all(|count| *count == 1), "expected one master per zone got {:?}", per_zone);
    let kept = nodes.masters().filter(|node| ["n01", "n02", "n04", "n05", "n07"].contains(&node.node_name.as_str())).count();
    assert!(kept == 3, "expected every master to be an existing one got {}", kept);
    Ok(())
}

#[test]
fn select_masters_ignores_inactive_nodes() -> Result<()> {
    let mut nodes = nodes(2);
    for name in ["n01", "n02"] {
        if let Some(node) = nodes.get_mut(name) {
            node.state = NodeState::ToBeDecommissioned;
            node.is_master = true;
        }
    }

    select_masters(&mut nodes, 3);

    let per_zone = masters_per_zone(&nodes);
    assert!(nodes.num_masters() == 3, "expected 3 masters got {}", nodes.num_masters());
    assert!(!per_zone.contains_key("az-1"), "expected no masters in the retired zone got {:?}", per_zone);
    assert!(nodes.masters().all(|node| node.is_active()), "expected only active masters");
    Ok(())
}

#[test]
fn select_masters_single_master() -> Result<()> {
    let mut nodes = nodes(3);

    select_masters(&mut nodes, 1);

    let masters: Vec<&str> = nodes.masters().map(|node| node.node_name.as_str()).collect();
    assert!(masters == vec!["n01"], "expected n01 as the only master got {:?}", masters);
    Ok(())
}

#[test]
fn select_masters_prefers_the_preferred_region() -> Result<()> {
    let mut nodes = nodes(3);

    select_masters_preferring(&mut nodes, 1, Some("r-2"));

    let masters: Vec<&str> = nodes.masters().map(|node| node.cloud_info.az.as_str()).collect();
    assert!(masters == vec!["az-3"], "expected the master in az-3 got {:?}", masters);
    Ok(())
}
