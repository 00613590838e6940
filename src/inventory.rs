//! Zone inventory.
//!
//! The planner never discovers zones on its own. When a region is first introduced into a
//! universe, the zones it is spread across come from the registered inventory.

use std::collections::BTreeMap;
use std::sync::Arc;

/// A lookup of the availability zones registered for a region.
pub trait ZoneInventory {
    /// List the zones of the given region which may receive new nodes, in a stable order.
    fn list_zones(&self, region: &str) -> Vec<String>;
}

impl<T: ZoneInventory + ?Sized> ZoneInventory for &T {
    fn list_zones(&self, region: &str) -> Vec<String> {
        (**self).list_zones(region)
    }
}

impl<T: ZoneInventory + ?Sized> ZoneInventory for Arc<T> {
    fn list_zones(&self, region: &str) -> Vec<String> {
        (**self).list_zones(region)
    }
}

/// An in-memory zone inventory.
///
/// Zones may optionally carry a count of free instances, as on-prem providers do. A zone with a
/// declared capacity of zero is not offered for placement.
#[derive(Clone, Debug, Default)]
pub struct MemoryInventory {
    regions: BTreeMap<String, Vec<InventoryZone>>,
}

#[derive(Clone, Debug)]
struct InventoryZone {
    code: String,
    free_instances: Option<u32>,
}

impl MemoryInventory {
    /// Create a new empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone under a region, with unbounded capacity.
    pub fn add_zone(&mut self, region: &str, zone: &str) -> &mut Self {
        self.upsert_zone(region, zone, None)
    }

    /// Register a zone under a region with the given number of free instances.
    pub fn add_zone_with_capacity(&mut self, region: &str, zone: &str, free_instances: u32) -> &mut Self {
        self.upsert_zone(region, zone, Some(free_instances))
    }

    fn upsert_zone(&mut self, region: &str, zone: &str, free_instances: Option<u32>) -> &mut Self {
        let zones = self.regions.entry(region.into()).or_default();
        match zones.iter_mut().find(|existing| existing.code == zone) {
            Some(existing) => existing.free_instances = free_instances,
            None => zones.push(InventoryZone {
                code: zone.into(),
                free_instances,
            }),
        }
        self
    }
}

impl ZoneInventory for MemoryInventory {
    fn list_zones(&self, region: &str) -> Vec<String> {
        self.regions
            .get(region)
            .map(|zones| {
                zones
                    .iter()
                    .filter(|zone| zone.free_instances != Some(0))
                    .map(|zone| zone.code.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
