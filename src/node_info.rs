//! Node info updates.
//!
//! Once the provisioning layer has created a host, it reports what it learned about it as a flat
//! JSON object. Known keys are mapped onto the node's cloud info, anything else is skipped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{PlannerError, PlannerResult};
use crate::models::NodeDetails;

/// The key the provisioning layer uses to report whether the host exists at all.
const HOST_FOUND: &str = "host_found";

/// The outcome of applying node info to a node.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct NodeInfoUpdate {
    /// The keys which were mapped onto the node, in key order.
    pub applied: Vec<String>,
    /// The keys which are not known and were skipped, in key order.
    pub skipped: Vec<String>,
}

/// Apply the given node info to the node.
///
/// Fails without touching the node if the info reports that the host was not found.
pub fn apply_node_info(node: &mut NodeDetails, info: &Map<String, Value>) -> PlannerResult<NodeInfoUpdate> {
    if let Some(found) = info.get(HOST_FOUND) {
        if !is_truthy(found) {
            return Err(PlannerError::inconsistent(format!("host {} not found", node.node_name)));
        }
    }

    let mut update = NodeInfoUpdate::default();
    for (key, val) in info.iter().filter(|(key, _)| key.as_str() != HOST_FOUND) {
        let text = as_text(val);
        let cloud_info = &mut node.cloud_info;
        let field = match key.as_str() {
            "private_ip" => &mut cloud_info.private_ip,
            "public_ip" => &mut cloud_info.public_ip,
            "private_dns" => &mut cloud_info.private_dns,
            "public_dns" => &mut cloud_info.public_dns,
            "subnet_id" => &mut cloud_info.subnet_id,
            "instance_type" => {
                cloud_info.instance_type = text;
                update.applied.push(key.clone());
                continue;
            }
            _ => {
                tracing::warn!(node = %node.node_name, key = %key, value = %val, "skipping unknown node info field");
                update.skipped.push(key.clone());
                continue;
            }
        };
        *field = Some(text);
        update.applied.push(key.clone());
    }
    tracing::debug!(node = %node.node_name, applied = ?update.applied, "applied node info");
    Ok(update)
}

/// Render a value as text, without quoting strings.
fn as_text(val: &Value) -> String {
    match val {
        Value::String(val) => val.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(val: &Value) -> bool {
    match val {
        Value::Bool(val) => *val,
        Value::String(val) => !val.eq_ignore_ascii_case("false"),
        Value::Null => false,
        _ => true,
    }
}
