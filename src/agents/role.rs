use serde::{Deserialize, Serialize};

use super::follower::FollowerOps;
use super::leader::LeaderOps;

/// Role as read from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

/// Monitor state
///
/// `ElectedLeader` is a leader that got there through an election rather
/// than by deploying the contract; it behaves exactly like `Leader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleState {
    Unknown,
    Follower,
    Leader,
    ElectedLeader,
}

impl RoleState {
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Unknown => None,
            RoleState::Follower => Some(Role::Follower),
            RoleState::Leader | RoleState::ElectedLeader => Some(Role::Leader),
        }
    }

    pub fn is_leader(&self) -> bool {
        self.role() == Some(Role::Leader)
    }
}

impl std::fmt::Display for RoleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleState::Unknown => write!(f, "unknown"),
            RoleState::Follower => write!(f, "follower"),
            RoleState::Leader => write!(f, "leader"),
            RoleState::ElectedLeader => write!(f, "elected leader"),
        }
    }
}

/// Operations available to a drone in its current role
pub enum Capabilities {
    Leader(LeaderOps),
    Follower(FollowerOps),
}
