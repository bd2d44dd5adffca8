use serde::{Deserialize, Serialize};

use super::mission::MissionId;
use super::value_objects::{FormationType, MissionType};

/// Domain events emitted by the mission lifecycle
///
/// The ledger attaches these to transaction receipts, the way a contract
/// emits logs, so agents can learn e.g. the id of a mission they created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum MissionEvent {
    /// Fired when a mission is created
    Created {
        mission_id: MissionId,
        name: String,
        mission_type: MissionType,
        formation_type: FormationType,
    },
    /// Fired when a mission's fields are overwritten
    Updated {
        mission_id: MissionId,
        name: String,
        mission_type: MissionType,
        formation_type: FormationType,
    },
    Activated {
        mission_id: MissionId,
    },
    Deactivated {
        mission_id: MissionId,
    },
}

impl MissionEvent {
    /// Returns the mission_id for this event
    pub fn mission_id(&self) -> MissionId {
        match self {
            MissionEvent::Created { mission_id, .. } => *mission_id,
            MissionEvent::Updated { mission_id, .. } => *mission_id,
            MissionEvent::Activated { mission_id } => *mission_id,
            MissionEvent::Deactivated { mission_id } => *mission_id,
        }
    }
}
