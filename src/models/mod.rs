//! Planner data models.

mod intent;
mod node;
mod placement;
mod universe;

pub use intent::{CloudType, DeviceInfo, UserIntent};
pub use node::{CloudSpecificInfo, NodeDetails, NodeSet, NodeState};
pub use placement::{PlacementAz, PlacementCloud, PlacementInfo, PlacementRegion, ZoneRef};
pub use universe::{Universe, UniverseDefinitionTaskParams};
