use serde::{Deserialize, Serialize};

/// Kind of task a mission performs
///
/// Encoded on the ledger by index: Search = 0, DiveAttack = 1,
/// Surveillance = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MissionType {
    Search,
    DiveAttack,
    Surveillance,
}

impl MissionType {
    /// Formation the leader assigns to this kind of mission
    ///
    /// Applied identically on create and on update.
    ///
    /// # Example
    /// ```
    /// use swarm_formation::domain::mission::{FormationType, MissionType};
    ///
    /// assert_eq!(MissionType::Search.formation(), FormationType::Ring);
    /// assert_eq!(MissionType::DiveAttack.formation(), FormationType::Vee);
    /// assert_eq!(MissionType::Surveillance.formation(), FormationType::Line);
    /// ```
    pub fn formation(&self) -> FormationType {
        match self {
            MissionType::Search => FormationType::Ring,
            MissionType::DiveAttack => FormationType::Vee,
            MissionType::Surveillance => FormationType::Line,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            MissionType::Search => 0,
            MissionType::DiveAttack => 1,
            MissionType::Surveillance => 2,
        }
    }
}

impl TryFrom<u8> for MissionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MissionType::Search),
            1 => Ok(MissionType::DiveAttack),
            2 => Ok(MissionType::Surveillance),
            other => Err(format!("Unknown mission type index: {}", other)),
        }
    }
}

impl From<MissionType> for u8 {
    fn from(value: MissionType) -> Self {
        value.index()
    }
}

impl std::fmt::Display for MissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionType::Search => write!(f, "search"),
            MissionType::DiveAttack => write!(f, "dive-attack"),
            MissionType::Surveillance => write!(f, "surveillance"),
        }
    }
}

/// Shape the swarm takes for a mission
///
/// Encoded on the ledger by index: Line = 0, Vee = 1, Ring = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FormationType {
    Line,
    Vee,
    Ring,
}

impl FormationType {
    pub fn index(&self) -> u8 {
        match self {
            FormationType::Line => 0,
            FormationType::Vee => 1,
            FormationType::Ring => 2,
        }
    }
}

impl TryFrom<u8> for FormationType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FormationType::Line),
            1 => Ok(FormationType::Vee),
            2 => Ok(FormationType::Ring),
            other => Err(format!("Unknown formation type index: {}", other)),
        }
    }
}

impl From<FormationType> for u8 {
    fn from(value: FormationType) -> Self {
        value.index()
    }
}

impl std::fmt::Display for FormationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormationType::Line => write!(f, "line"),
            FormationType::Vee => write!(f, "vee"),
            FormationType::Ring => write!(f, "ring"),
        }
    }
}

/// Lifecycle status of a mission
///
/// # Status Transitions
/// ```text
/// Created --activate--> Active <--activate-- Inactive
///                         |                     ^
///                         +-----deactivate------+
/// ```
/// There is no terminal state; missions are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    /// Mission exists but has never been started
    Created,
    /// Mission is running
    Active,
    /// Mission was stopped and may be reactivated
    Inactive,
}

impl MissionStatus {
    /// Checks if a transition from current status to next status is valid
    ///
    /// # Valid Transitions
    /// - Created -> Active
    /// - Inactive -> Active
    /// - Active -> Inactive
    ///
    /// # Example
    /// ```
    /// use swarm_formation::domain::mission::MissionStatus;
    ///
    /// assert!(MissionStatus::Inactive.can_transition_to(MissionStatus::Active));
    /// assert!(!MissionStatus::Created.can_transition_to(MissionStatus::Inactive));
    /// ```
    pub fn can_transition_to(&self, next: MissionStatus) -> bool {
        use MissionStatus::*;
        matches!(
            (self, next),
            (Created, Active) | (Inactive, Active) | (Active, Inactive)
        )
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionStatus::Created => write!(f, "created"),
            MissionStatus::Active => write!(f, "active"),
            MissionStatus::Inactive => write!(f, "inactive"),
        }
    }
}
