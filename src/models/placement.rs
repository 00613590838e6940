//! The placement tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target node counts for a universe, as a cloud → region → zone tree.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementInfo {
    pub cloud_list: Vec<PlacementCloud>,
}

/// A cloud of the placement tree.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementCloud {
    /// The provider code of this cloud.
    pub code: String,
    pub region_list: Vec<PlacementRegion>,
}

/// A region of the placement tree.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRegion {
    /// The region code.
    pub code: String,
    pub az_list: Vec<PlacementAz>,
}

/// An availability zone of the placement tree, along with its target node count.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlacementAz {
    /// The zone code.
    pub code: String,
    /// The number of nodes which should live in this zone.
    pub num_nodes_in_az: u32,
}

/// A flattened view of one zone of the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneRef<'a> {
    pub cloud: &'a str,
    pub region: &'a str,
    pub az: &'a PlacementAz,
}

impl PlacementInfo {
    /// Iterate over every zone of the tree, in tree order.
    pub fn zones(&self) -> impl Iterator<Item = ZoneRef<'_>> {
        self.cloud_list.iter().flat_map(|cloud| {
            cloud.region_list.iter().flat_map(move |region| {
                region.az_list.iter().map(move |az| ZoneRef {
                    cloud: &cloud.code,
                    region: &region.code,
                    az,
                })
            })
        })
    }

    /// The codes of every zone of the tree, in tree order.
    pub fn zone_codes(&self) -> Vec<String> {
        self.zones().map(|zone| zone.az.code.clone()).collect()
    }

    /// The target node count of every zone, keyed by zone code.
    pub fn zone_counts(&self) -> BTreeMap<String, u32> {
        self.zones().map(|zone| (zone.az.code.clone(), zone.az.num_nodes_in_az)).collect()
    }

    /// The total number of nodes targeted by this tree.
    pub fn node_count(&self) -> u32 {
        self.zones().map(|zone| zone.az.num_nodes_in_az).sum()
    }

    /// Find a zone by its code.
    pub fn find_az(&self, code: &str) -> Option<ZoneRef<'_>> {
        self.zones().find(|zone| zone.az.code == code)
    }

    /// Find a cloud by its code, mutably.
    pub(crate) fn cloud_mut(&mut self, code: &str) -> Option<&mut PlacementCloud> {
        self.cloud_list.iter_mut().find(|cloud| cloud.code == code)
    }

    /// Set the target count of every zone found in `counts`.
    pub(crate) fn set_zone_counts(&mut self, counts: &BTreeMap<String, u32>) {
        let azs = self.cloud_list.iter_mut().flat_map(|cloud| cloud.region_list.iter_mut()).flat_map(|region| region.az_list.iter_mut());
        for az in azs {
            if let Some(count) = counts.get(&az.code) {
                az.num_nodes_in_az = *count;
            }
        }
    }
}

impl PlacementCloud {
    /// Create a new cloud with no regions.
    pub fn new(code: &str) -> Self {
        Self {
            code: code.into(),
            region_list: vec![],
        }
    }
}

impl PlacementRegion {
    /// Create a new region with the given zones, each targeting zero nodes.
    pub fn new<S: AsRef<str>>(code: &str, zones: &[S]) -> Self {
        Self {
            code: code.into(),
            az_list: zones.iter().map(|zone| PlacementAz::new(zone.as_ref(), 0)).collect(),
        }
    }
}

impl PlacementAz {
    /// Create a new instance.
    pub fn new(code: &str, num_nodes_in_az: u32) -> Self {
        Self {
            code: code.into(),
            num_nodes_in_az,
        }
    }
}
