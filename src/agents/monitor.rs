//! Role and liveness monitor
//!
//! Each drone drives one [`RoleMonitor`] per poll cycle. Role is always
//! re-derived from the ledger's `leader` value; the local state only decides
//! which duties (heartbeat or leader checks) the cycle performs.

use std::sync::Arc;

use crate::domain::drone::{Drone, DroneId};
use crate::domain::ledger::{LedgerGateway, LedgerReads};

use super::errors::{AgentError, AgentResult};
use super::follower::FollowerOps;
use super::leader::LeaderOps;
use super::role::{Capabilities, Role, RoleState};

/// Resolves a drone's role from a single ledger read
pub async fn current_role(ledger: &dyn LedgerGateway, id: DroneId) -> AgentResult<Role> {
    let leader = ledger.leader().await?;
    Ok(if leader == id {
        Role::Leader
    } else {
        Role::Follower
    })
}

/// What one monitor cycle did
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub state: RoleState,
    pub transition: Option<(RoleState, RoleState)>,
    /// Submissions that failed this cycle; each is retried next cycle
    pub errors: Vec<AgentError>,
}

pub struct RoleMonitor {
    drone: Drone,
    state: RoleState,
    ledger: Arc<dyn LedgerGateway>,
}

impl RoleMonitor {
    pub fn new(drone: Drone, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self {
            drone,
            state: RoleState::Unknown,
            ledger,
        }
    }

    pub fn state(&self) -> RoleState {
        self.state
    }

    pub fn drone(&self) -> &Drone {
        &self.drone
    }

    /// Operations matching the current state, `None` until the role is known
    pub fn capabilities(&self) -> Option<Capabilities> {
        let id = self.drone.id();
        match self.state.role()? {
            Role::Leader => Some(Capabilities::Leader(LeaderOps::new(id, self.ledger.clone()))),
            Role::Follower => Some(Capabilities::Follower(FollowerOps::new(
                id,
                self.ledger.clone(),
            ))),
        }
    }

    /// Runs one poll cycle
    pub async fn step(&mut self) -> CycleReport {
        let before = self.state;
        let mut errors = Vec::new();

        let next = match before {
            RoleState::Unknown => self.resolve_initial(&mut errors).await,
            RoleState::Follower => self.follower_cycle(&mut errors).await,
            RoleState::Leader | RoleState::ElectedLeader => self.leader_cycle(&mut errors).await,
        };

        for error in &errors {
            tracing::warn!(drone_id = %self.drone.id(), state = %before, "Cycle error: {}", error);
        }

        let transition = (next != before).then_some((before, next));
        if let Some((from, to)) = transition {
            tracing::info!(drone_id = %self.drone.id(), "Role changed: {} -> {}", from, to);
        }
        self.state = next;

        CycleReport {
            state: next,
            transition,
            errors,
        }
    }

    async fn resolve_initial(&mut self, errors: &mut Vec<AgentError>) -> RoleState {
        match current_role(self.ledger.as_ref(), self.drone.id()).await {
            Ok(Role::Leader) => RoleState::Leader,
            Ok(Role::Follower) => RoleState::Follower,
            Err(e) => {
                errors.push(e);
                RoleState::Unknown
            }
        }
    }

    async fn follower_cycle(&mut self, errors: &mut Vec<AgentError>) -> RoleState {
        let ops = FollowerOps::new(self.drone.id(), self.ledger.clone());

        let battery = self.drone.drain_battery();
        if let Err(e) = ops.submit_battery_level(battery).await {
            errors.push(e);
        }
        if let Err(e) = ops.check_leader_status().await {
            errors.push(e);
        }

        match current_role(self.ledger.as_ref(), self.drone.id()).await {
            Ok(Role::Leader) => RoleState::ElectedLeader,
            Ok(Role::Follower) => RoleState::Follower,
            Err(e) => {
                errors.push(e);
                RoleState::Follower
            }
        }
    }

    async fn leader_cycle(&mut self, errors: &mut Vec<AgentError>) -> RoleState {
        let ops = LeaderOps::new(self.drone.id(), self.ledger.clone());

        if let Err(e) = ops.send_heartbeat().await {
            errors.push(e);
        }
        let battery = self.drone.drain_battery();
        if let Err(e) = ops.submit_battery_level(battery).await {
            errors.push(e);
        }

        // The ledger may have re-elected while our heartbeats were failing
        match current_role(self.ledger.as_ref(), self.drone.id()).await {
            Ok(Role::Leader) => self.state,
            Ok(Role::Follower) => RoleState::Follower,
            Err(e) => {
                errors.push(e);
                self.state
            }
        }
    }
}
