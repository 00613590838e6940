//! Operator intent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The cloud provider family of a universe.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CloudType {
    Aws,
    Gcp,
    Azu,
    Docker,
    Onprem,
    Kubernetes,
    Unknown,
}

impl Default for CloudType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for CloudType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Aws => "aws",
                Self::Gcp => "gcp",
                Self::Azu => "azu",
                Self::Docker => "docker",
                Self::Onprem => "onprem",
                Self::Kubernetes => "kubernetes",
                Self::Unknown => "unknown",
            }
        )
    }
}

/// The storage devices attached to each node of a universe.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// The number of volumes attached to each node.
    pub num_volumes: u32,
    /// The size in GB of each volume.
    pub volume_size_gb: u32,
}

/// The operator's declared target for a universe.
///
/// `Clone` produces a fully independent copy, flag maps included, so a planning pass may work on
/// a copy without disturbing the intent recorded on the universe.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIntent {
    /// The name of the universe, used when naming nodes.
    pub universe_name: String,
    /// The number of replicas of each tablet, which is also the number of masters.
    pub replication_factor: u32,
    /// The total number of nodes requested.
    pub num_nodes: u32,
    /// The ordered list of region codes to place nodes in.
    pub region_list: Vec<String>,
    /// The instance type code every node must run on.
    pub instance_type: String,
    /// The code of the cloud provider.
    pub provider: String,
    /// The cloud provider family.
    #[serde(default)]
    pub provider_type: CloudType,
    /// A region whose zones should be favored when choosing masters.
    #[serde(default)]
    pub preferred_region: Option<String>,
    /// Spread each newly introduced region across all of its zones, or use only its first zone.
    #[serde(default = "UserIntent::default_is_multi_az")]
    pub is_multi_az: bool,
    /// The storage attached to each node.
    #[serde(default)]
    pub device_info: DeviceInfo,
    /// Flag overrides for the master processes.
    #[serde(default)]
    pub master_gflags: BTreeMap<String, String>,
    /// Flag overrides for the tserver processes.
    #[serde(default)]
    pub tserver_gflags: BTreeMap<String, String>,
}

impl UserIntent {
    /// Create a new multi-AZ intent with no flag overrides.
    pub fn new(universe_name: &str, provider: &str, replication_factor: u32, num_nodes: u32, region_list: Vec<String>, instance_type: &str) -> Self {
        Self {
            universe_name: universe_name.into(),
            replication_factor,
            num_nodes,
            region_list,
            instance_type: instance_type.into(),
            provider: provider.into(),
            provider_type: CloudType::default(),
            preferred_region: None,
            is_multi_az: true,
            device_info: DeviceInfo::default(),
            master_gflags: Default::default(),
            tserver_gflags: Default::default(),
        }
    }

    fn default_is_multi_az() -> bool {
        true
    }
}
