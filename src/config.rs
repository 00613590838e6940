//! Runtime configuration.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Planner configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The prefix used when naming newly planned nodes.
    ///
    /// Nodes are named `{node_name_prefix}-{universe_name}-n{node_idx}`.
    #[serde(default = "Config::default_node_name_prefix")]
    pub node_name_prefix: String,
    /// The replication factors which an intent is allowed to declare.
    #[serde(default = "Config::default_allowed_replication_factors")]
    pub allowed_replication_factors: Vec<u32>,

    /// The port of the master RPC server, used to key master liveness series.
    #[serde(default = "Config::default_master_rpc_port")]
    pub master_rpc_port: u16,
    /// The port of the tserver RPC server, used to key tserver liveness series.
    #[serde(default = "Config::default_tserver_rpc_port")]
    pub tserver_rpc_port: u16,
    /// The port of the node exporter, used to key node liveness series.
    #[serde(default = "Config::default_node_exporter_port")]
    pub node_exporter_port: u16,
    /// The name of the metric carrying per-node liveness series.
    #[serde(default = "Config::default_universe_alive_metric")]
    pub universe_alive_metric: String,
}

impl Config {
    /// Create a new config instance.
    ///
    /// Currently this routine just parses the runtime environment and builds the planner config
    /// from that, falling back to defaults for anything unset.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        let config: Config = envy::from_env().context("error building config from env")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config values which can not be expressed by the type system.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_replication_factors.is_empty() {
            bail!("ALLOWED_REPLICATION_FACTORS must contain at least one value");
        }
        if let Some(rf) = self.allowed_replication_factors.iter().find(|rf| **rf == 0 || **rf % 2 == 0) {
            bail!("invalid value {} in ALLOWED_REPLICATION_FACTORS, replication factors must be odd", rf);
        }
        if self.node_name_prefix.is_empty() {
            bail!("NODE_NAME_PREFIX must not be empty");
        }
        Ok(())
    }

    fn default_node_name_prefix() -> String {
        "yb".into()
    }

    fn default_allowed_replication_factors() -> Vec<u32> {
        vec![1, 3, 5, 7]
    }

    fn default_master_rpc_port() -> u16 {
        7000
    }

    fn default_tserver_rpc_port() -> u16 {
        9000
    }

    fn default_node_exporter_port() -> u16 {
        9300
    }

    fn default_universe_alive_metric() -> String {
        "universe_node_function".into()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_name_prefix: Self::default_node_name_prefix(),
            allowed_replication_factors: Self::default_allowed_replication_factors(),
            master_rpc_port: Self::default_master_rpc_port(),
            tserver_rpc_port: Self::default_tserver_rpc_port(),
            node_exporter_port: Self::default_node_exporter_port(),
            universe_alive_metric: Self::default_universe_alive_metric(),
        }
    }
}
