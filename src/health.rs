//! Health status aggregation.
//!
//! Liveness is reported by the metrics layer as one series per process, keyed by the process's
//! `<private_ip>:<port>`. A process is alive when the latest sample of its series is nonzero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{PlannerError, PlannerResult};
use crate::models::{NodeDetails, NodeSet, NodeState};

/// A snapshot of metrics query results, keyed by metric name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MetricsSnapshot {
    /// An error reported by the metrics layer instead of results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, MetricData>,
}

/// The results of a single metric.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct MetricData {
    #[serde(default)]
    pub data: Vec<SeriesData>,
}

/// One series of a metric, in sample order.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SeriesData {
    pub name: String,
    #[serde(default)]
    pub y: Vec<SampleValue>,
}

/// A single sample, which the metrics layer may render as text or as a number, or leave null
/// for a gap.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Text(String),
    Null,
}

impl SampleValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(val) => Some(*val),
            Self::Text(val) => val.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

/// The health of a single node.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NodeStatus {
    pub tserver_alive: bool,
    pub master_alive: bool,
    /// `Running` when the node itself is reachable, `Unreachable` otherwise.
    pub node_status: NodeState,
}

/// The health of a universe and each of its non-retiring nodes.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UniverseStatus {
    pub universe_uuid: Uuid,
    pub universe_alive: bool,
    /// Per-node health keyed by node name. Nodes on their way out of the universe are omitted.
    pub nodes: BTreeMap<String, NodeStatus>,
}

/// Aggregate the given metrics snapshot into the health of the universe.
///
/// A snapshot carrying an error yields that error verbatim. Decommissioning nodes expect no
/// series, so they are neither reported nor counted against the universe.
#[tracing::instrument(level = "debug", skip(config, nodes, snapshot))]
pub fn aggregate(config: &Config, universe_uuid: Uuid, nodes: &NodeSet, snapshot: &MetricsSnapshot) -> PlannerResult<UniverseStatus> {
    if let Some(err) = &snapshot.error {
        tracing::debug!(error = %err, "metrics snapshot carries an upstream error");
        return Err(PlannerError::UpstreamQuery(err.clone()));
    }

    let liveness = match snapshot.metrics.get(&config.universe_alive_metric) {
        Some(metric) => latest_samples(metric),
        None => {
            tracing::debug!(metric = %config.universe_alive_metric, "liveness metric missing from snapshot");
            BTreeMap::new()
        }
    };

    let mut universe_alive = true;
    let mut statuses = BTreeMap::new();
    for node in nodes.iter().filter(|node| !node.state.is_decommissioning()) {
        let ip = node.cloud_info.private_ip.as_deref().unwrap_or_default();
        let alive = |port: u16| liveness.get(&format!("{}:{}", ip, port)).copied().unwrap_or(false);
        let status = NodeStatus {
            tserver_alive: alive(config.tserver_rpc_port),
            master_alive: alive(config.master_rpc_port),
            node_status: if alive(config.node_exporter_port) {
                NodeState::Running
            } else {
                NodeState::Unreachable
            },
        };
        if !node_alive(node, &status) {
            universe_alive = false;
        }
        statuses.insert(node.node_name.clone(), status);
    }

    Ok(UniverseStatus {
        universe_uuid,
        universe_alive,
        nodes: statuses,
    })
}

/// True if every process the node is expected to run is alive.
fn node_alive(node: &NodeDetails, status: &NodeStatus) -> bool {
    (!node.is_tserver || status.tserver_alive) && (!node.is_master || status.master_alive) && status.node_status == NodeState::Running
}

/// Whether the latest sample of each series is alive, keyed by series name.
fn latest_samples(metric: &MetricData) -> BTreeMap<String, bool> {
    metric
        .data
        .iter()
        .map(|series| {
            let alive = match series.y.last() {
                Some(sample) => match sample.as_f64() {
                    Some(val) => val != 0.0 && !val.is_nan(),
                    None => {
                        tracing::warn!(series = %series.name, ?sample, "unparseable liveness sample");
                        false
                    }
                },
                None => false,
            };
            (series.name.clone(), alive)
        })
        .collect()
}
