//! Placement planner.
//!
//! Builds and incrementally updates the cloud → region → zone target-count tree of a universe
//! from its operator intent. On create, the tree is built from the zone inventory. On edit, every
//! zone entry already in the tree is preserved, regions which the intent no longer lists are
//! dropped and newly listed regions are pulled from the inventory. Per-zone targets are then
//! balanced starting from the previous counts, so that unaffected zones keep their targets.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::balancer;
use crate::config::Config;
use crate::error::{PlannerError, PlannerResult};
use crate::inventory::ZoneInventory;
use crate::models::{PlacementCloud, PlacementInfo, PlacementRegion, UserIntent};

/// The placement planner.
pub struct Planner<I> {
    config: Arc<Config>,
    inventory: I,
}

impl<I: ZoneInventory> Planner<I> {
    /// Create a new instance.
    pub fn new(config: Arc<Config>, inventory: I) -> Self {
        Self { config, inventory }
    }

    /// The planner's config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate the given intent, independently of any previous placement.
    pub fn validate(&self, intent: &UserIntent) -> PlannerResult<()> {
        let rf = intent.replication_factor;
        if !self.config.allowed_replication_factors.contains(&rf) {
            return Err(PlannerError::invalid(format!(
                "replication factor {} not allowed, must be one of {:?}",
                rf, self.config.allowed_replication_factors
            )));
        }
        if intent.num_nodes < rf {
            return Err(PlannerError::invalid(format!(
                "number of nodes cannot be less than the replication factor, got {} nodes for replication factor {}",
                intent.num_nodes, rf
            )));
        }
        if intent.region_list.is_empty() {
            return Err(PlannerError::invalid("at least one region is required"));
        }
        let mut seen = BTreeSet::new();
        if let Some(region) = intent.region_list.iter().find(|region| !seen.insert(region.as_str())) {
            return Err(PlannerError::invalid(format!("region {} is listed more than once", region)));
        }
        if intent.instance_type.is_empty() {
            return Err(PlannerError::invalid("an instance type is required"));
        }
        if intent.provider.is_empty() {
            return Err(PlannerError::invalid("a provider is required"));
        }
        if intent.universe_name.is_empty() {
            return Err(PlannerError::invalid("a universe name is required"));
        }
        Ok(())
    }

    /// Compute the placement for the given intent.
    ///
    /// When `previous` is given, it is used as the baseline and is never mutated.
    #[tracing::instrument(level = "debug", skip(self, intent, previous), fields(universe = %intent.universe_name))]
    pub fn plan(&self, intent: &UserIntent, previous: Option<&PlacementInfo>) -> PlannerResult<PlacementInfo> {
        self.validate(intent)?;
        let baseline = previous.map(|prev| prev.zone_counts()).unwrap_or_default();
        let mut placement = match previous {
            Some(prev) => self.update_tree(intent, prev)?,
            None => self.build_tree(intent)?,
        };

        let zones = placement.zone_codes();
        let counts = balancer::balance(&zones, intent.num_nodes, &baseline)?;
        placement.set_zone_counts(&counts);

        tracing::debug!(num_nodes = intent.num_nodes, zones = ?counts, "computed placement");
        Ok(placement)
    }

    /// Build a fresh tree from the inventory.
    fn build_tree(&self, intent: &UserIntent) -> PlannerResult<PlacementInfo> {
        let mut cloud = PlacementCloud::new(&intent.provider);
        let mut known = BTreeSet::new();
        for region in intent.region_list.iter() {
            cloud.region_list.push(self.new_region(intent, region, &mut known)?);
        }
        Ok(PlacementInfo { cloud_list: vec![cloud] })
    }

    /// Update a copy of the previous tree to match the intent's region list.
    fn update_tree(&self, intent: &UserIntent, previous: &PlacementInfo) -> PlannerResult<PlacementInfo> {
        if let Some(cloud) = previous.cloud_list.iter().find(|cloud| cloud.code != intent.provider) {
            return Err(PlannerError::invalid(format!(
                "changing the provider of a universe is not supported, placed on {} but intent declares {}",
                cloud.code, intent.provider
            )));
        }
        let mut placement = previous.clone();
        if placement.cloud_mut(&intent.provider).is_none() {
            placement.cloud_list.push(PlacementCloud::new(&intent.provider));
        }

        // Drop regions the intent no longer lists, keeping the order of the ones which remain.
        let wanted: BTreeSet<&str> = intent.region_list.iter().map(|region| region.as_str()).collect();
        for cloud in placement.cloud_list.iter_mut() {
            cloud.region_list.retain(|region| wanted.contains(region.code.as_str()));
        }

        let mut known: BTreeSet<String> = placement.zone_codes().into_iter().collect();
        for region in intent.region_list.iter() {
            let exists = placement.cloud_list.iter().any(|cloud| cloud.region_list.iter().any(|r| &r.code == region));
            if exists {
                continue;
            }
            let new_region = self.new_region(intent, region, &mut known)?;
            if let Some(cloud) = placement.cloud_mut(&intent.provider) {
                cloud.region_list.push(new_region);
            }
        }
        Ok(placement)
    }

    /// Build a newly introduced region from the inventory.
    ///
    /// Zones already known elsewhere in the tree are skipped.
    fn new_region(&self, intent: &UserIntent, region: &str, known: &mut BTreeSet<String>) -> PlannerResult<PlacementRegion> {
        let mut zones: Vec<String> = self.inventory.list_zones(region).into_iter().filter(|zone| known.insert(zone.clone())).collect();
        if !intent.is_multi_az {
            zones.truncate(1);
        }
        if zones.is_empty() {
            return Err(PlannerError::invalid(format!("region {} has no availability zones to place nodes in", region)));
        }
        tracing::debug!(region, ?zones, "introducing region");
        Ok(PlacementRegion::new(region, &zones))
    }
}
