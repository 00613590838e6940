//! Universe resource accounting.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, PlannerResult};
use crate::models::{NodeSet, UserIntent};

/// The hardware of an instance type offered by a provider.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub provider: String,
    pub code: String,
    pub num_cores: f64,
    pub mem_size_gb: f64,
}

/// A lookup of instance types by provider.
pub trait InstanceTypeCatalog {
    /// Look up an instance type by provider and code, if it is offered.
    fn instance_type(&self, provider: &str, code: &str) -> Option<InstanceType>;
}

/// An in-memory instance type catalog.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    types: BTreeMap<(String, String), InstanceType>,
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance type, replacing any previous registration of the same code.
    pub fn add(&mut self, instance_type: InstanceType) -> &mut Self {
        self.types.insert((instance_type.provider.clone(), instance_type.code.clone()), instance_type);
        self
    }
}

impl InstanceTypeCatalog for MemoryCatalog {
    fn instance_type(&self, provider: &str, code: &str) -> Option<InstanceType> {
        self.types.get(&(provider.to_string(), code.to_string())).cloned()
    }
}

/// The resources consumed by the active nodes of a universe.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UniverseResourceDetails {
    pub num_cores: f64,
    pub mem_size_gb: f64,
    pub volume_count: u32,
    pub volume_size_gb: u32,
    pub azs: BTreeSet<String>,
}

/// Sum up the resources of every active node, using the intent's device info for storage.
pub fn universe_resources(intent: &UserIntent, nodes: &NodeSet, catalog: &impl InstanceTypeCatalog) -> PlannerResult<UniverseResourceDetails> {
    let device = &intent.device_info;
    let mut details = UniverseResourceDetails::default();
    for node in nodes.active() {
        let code = &node.cloud_info.instance_type;
        let instance_type = catalog
            .instance_type(&intent.provider, code)
            .ok_or_else(|| PlannerError::invalid(format!("couldn't find instance type {} for provider {}", code, intent.provider)))?;
        details.num_cores += instance_type.num_cores;
        details.mem_size_gb += instance_type.mem_size_gb;
        details.volume_count += device.num_volumes;
        details.volume_size_gb += device.num_volumes * device.volume_size_gb;
        details.azs.insert(node.cloud_info.az.clone());
    }
    Ok(details)
}
