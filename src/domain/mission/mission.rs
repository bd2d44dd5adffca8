use serde::{Deserialize, Serialize};

use super::events::MissionEvent;
use super::value_objects::{FormationType, MissionStatus, MissionType};

/// Ledger-assigned mission identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(pub u64);

impl std::fmt::Display for MissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mission entity
///
/// Missions are owned by the ledger: the reference contract holds the
/// authoritative copy and agents only ever see snapshots returned by
/// `getMission`. All mutation goes through the methods below so every
/// ledger implementation enforces the same lifecycle.
///
/// # Invariants
/// - Name cannot be empty
/// - Status transitions follow [`MissionStatus::can_transition_to`]
/// - Missions are never deleted
///
/// # Example
/// ```
/// use swarm_formation::domain::mission::{Mission, MissionId, MissionStatus, MissionType};
///
/// let (mut mission, _event) = Mission::new(
///     MissionId(0),
///     "Sweep sector 7".to_string(),
///     MissionType::Search,
///     MissionType::Search.formation(),
/// ).expect("valid mission");
///
/// mission.activate().expect("created missions can be activated");
/// assert_eq!(mission.status(), MissionStatus::Active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    id: MissionId,
    name: String,
    mission_type: MissionType,
    formation_type: FormationType,
    status: MissionStatus,
}

impl Mission {
    /// Creates a new mission in the Created state
    ///
    /// # Returns
    /// * `Ok((Mission, MissionEvent))` - New mission and its Created event
    /// * `Err(String)` - If the name is empty
    pub fn new(
        id: MissionId,
        name: String,
        mission_type: MissionType,
        formation_type: FormationType,
    ) -> Result<(Self, MissionEvent), String> {
        if name.trim().is_empty() {
            return Err("Mission name cannot be empty".to_string());
        }

        let mission = Self {
            id,
            name,
            mission_type,
            formation_type,
            status: MissionStatus::Created,
        };

        let event = MissionEvent::Created {
            mission_id: id,
            name: mission.name.clone(),
            mission_type,
            formation_type,
        };

        Ok((mission, event))
    }

    /// Overwrites name, type and formation; status is left untouched
    pub fn update(
        &mut self,
        name: String,
        mission_type: MissionType,
        formation_type: FormationType,
    ) -> Result<MissionEvent, String> {
        if name.trim().is_empty() {
            return Err("Mission name cannot be empty".to_string());
        }

        self.name = name;
        self.mission_type = mission_type;
        self.formation_type = formation_type;

        Ok(MissionEvent::Updated {
            mission_id: self.id,
            name: self.name.clone(),
            mission_type,
            formation_type,
        })
    }

    /// Activates the mission (Created or Inactive -> Active)
    pub fn activate(&mut self) -> Result<MissionEvent, String> {
        self.transition(MissionStatus::Active)?;
        Ok(MissionEvent::Activated { mission_id: self.id })
    }

    /// Deactivates the mission (Active -> Inactive)
    pub fn deactivate(&mut self) -> Result<MissionEvent, String> {
        self.transition(MissionStatus::Inactive)?;
        Ok(MissionEvent::Deactivated { mission_id: self.id })
    }

    fn transition(&mut self, next: MissionStatus) -> Result<(), String> {
        if !self.status.can_transition_to(next) {
            return Err(format!(
                "Mission {} cannot move from {} to {}",
                self.id, self.status, next
            ));
        }
        self.status = next;
        Ok(())
    }

    // ===== Getters =====

    pub fn id(&self) -> MissionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mission_type(&self) -> MissionType {
        self.mission_type
    }

    pub fn formation_type(&self) -> FormationType {
        self.formation_type
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == MissionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created() -> Mission {
        Mission::new(
            MissionId(0),
            "Recon".to_string(),
            MissionType::Surveillance,
            FormationType::Line,
        )
        .unwrap()
        .0
    }

    #[test]
    fn new_mission_starts_created() {
        let (mission, event) = Mission::new(
            MissionId(4),
            "Recon".to_string(),
            MissionType::Search,
            FormationType::Ring,
        )
        .unwrap();

        assert_eq!(mission.status(), MissionStatus::Created);
        assert_eq!(event.mission_id(), MissionId(4));
        assert!(matches!(event, MissionEvent::Created { .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = Mission::new(
            MissionId(0),
            "  ".to_string(),
            MissionType::Search,
            FormationType::Ring,
        );
        assert!(result.unwrap_err().contains("cannot be empty"));
    }

    #[test]
    fn deactivate_created_is_rejected() {
        let mut mission = created();
        let err = mission.deactivate().unwrap_err();
        assert!(err.contains("cannot move from created to inactive"));
        assert_eq!(mission.status(), MissionStatus::Created);
    }

    #[test]
    fn reactivate_after_deactivate() {
        let mut mission = created();
        mission.activate().unwrap();
        mission.deactivate().unwrap();
        assert_eq!(mission.status(), MissionStatus::Inactive);
        mission.activate().unwrap();
        assert!(mission.is_active());
    }

    #[test]
    fn activate_twice_is_rejected() {
        let mut mission = created();
        mission.activate().unwrap();
        assert!(mission.activate().is_err());
    }

    #[test]
    fn update_preserves_status() {
        let mut mission = created();
        mission.activate().unwrap();
        mission
            .update("Strike".to_string(), MissionType::DiveAttack, FormationType::Vee)
            .unwrap();

        assert_eq!(mission.name(), "Strike");
        assert_eq!(mission.formation_type(), FormationType::Vee);
        assert_eq!(mission.status(), MissionStatus::Active);
    }
}
