use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::drone::{Drone, DroneId};
use crate::domain::flight::FlightController;
use crate::domain::ledger::LedgerGateway;
use crate::domain::mission::{MissionId, MissionType};

use super::errors::{AgentError, AgentResult};
use super::follower::FollowerOps;
use super::leader::LeaderOps;
use super::monitor::{CycleReport, RoleMonitor};
use super::pilot;
use super::resolver::{PositionResolver, SlotAssignment};
use super::role::{Capabilities, RoleState};

/// Mission the leader creates and activates when it first takes charge
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchMission {
    pub name: String,
    pub mission_type: MissionType,
}

/// Leader duties already carried out
#[derive(Debug, Default)]
struct LeaderDuties {
    location_published: bool,
    swarm_registered: bool,
    launched: Option<MissionId>,
    launch_active: bool,
}

/// Follower progress towards its formation slot
#[derive(Debug, Default)]
struct FollowerDuties {
    assignment: Option<SlotAssignment>,
    airborne: bool,
    gave_up: bool,
}

/// A drone's control loop
///
/// Every tick runs one monitor cycle and then the duties of the resolved
/// role. Failed duties are reported in the tick's [`CycleReport`] and
/// retried on the next tick.
pub struct SwarmAgent {
    monitor: RoleMonitor,
    flight: Arc<dyn FlightController>,
    resolver: PositionResolver,
    swarm_size: u32,
    mission_id: Option<MissionId>,
    launch: Option<LaunchMission>,
    leader_duties: LeaderDuties,
    follower_duties: FollowerDuties,
}

impl SwarmAgent {
    pub fn new(
        drone: Drone,
        ledger: Arc<dyn LedgerGateway>,
        flight: Arc<dyn FlightController>,
        swarm_size: u32,
        spacing: f64,
    ) -> Self {
        Self {
            monitor: RoleMonitor::new(drone, ledger),
            flight,
            resolver: PositionResolver::new(swarm_size as usize, spacing),
            swarm_size,
            mission_id: None,
            launch: None,
            leader_duties: LeaderDuties::default(),
            follower_duties: FollowerDuties::default(),
        }
    }

    /// Mission whose formation this drone joins while following
    pub fn with_mission(mut self, mission_id: MissionId) -> Self {
        self.mission_id = Some(mission_id);
        self
    }

    /// Mission to create and activate on taking leadership
    pub fn with_launch_mission(mut self, launch: LaunchMission) -> Self {
        self.launch = Some(launch);
        self
    }

    pub fn state(&self) -> RoleState {
        self.monitor.state()
    }

    pub fn drone(&self) -> &Drone {
        self.monitor.drone()
    }

    /// Slot this drone holds, once resolved
    pub fn assignment(&self) -> Option<SlotAssignment> {
        self.follower_duties.assignment
    }

    /// Mission created by this drone's launch duty
    pub fn launched_mission(&self) -> Option<MissionId> {
        self.leader_duties.launched
    }

    /// Runs one monitor cycle followed by the role's duties
    pub async fn tick(&mut self) -> CycleReport {
        let mut report = self.monitor.step().await;

        if let Some((from, to)) = report.transition {
            if to.is_leader() {
                // A new term republishes location and re-registers; the
                // launch mission is only ever created once
                self.leader_duties.location_published = false;
                self.leader_duties.swarm_registered = false;
            }
            if to.is_leader() || from.is_leader() {
                // Election frees the winner's slot on the ledger
                self.follower_duties = FollowerDuties::default();
            }
        }

        let result = match self.monitor.capabilities() {
            Some(Capabilities::Leader(ops)) => self.lead(&ops, &mut report.errors).await,
            Some(Capabilities::Follower(ops)) => self.follow(&ops).await,
            None => Ok(()),
        };

        if let Err(e) = result {
            tracing::warn!(drone_id = %self.drone().id(), "Duty failed: {}", e);
            report.errors.push(e);
        }

        report
    }

    /// Ticks every `interval` until `shutdown` resolves
    pub async fn run(&mut self, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        tokio::pin!(shutdown);

        tracing::info!(drone_id = %self.drone().id(), "Agent started: {}", self.drone());

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(drone_id = %self.drone().id(), "Shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    tracing::debug!(
                        drone_id = %self.drone().id(),
                        state = %report.state,
                        errors = report.errors.len(),
                        "Cycle complete"
                    );
                }
            }
        }
    }

    async fn lead(&mut self, ops: &LeaderOps, errors: &mut Vec<AgentError>) -> AgentResult<()> {
        let id = ops.id();

        if !self.leader_duties.location_published {
            let location = self.monitor.drone().location();
            ops.submit_data(&location, "Hello from Leader!").await?;
            self.leader_duties.location_published = true;
        }

        if !self.leader_duties.swarm_registered {
            let mut registered = true;
            for member in (0..self.swarm_size).map(DroneId).filter(|member| *member != id) {
                match ops.add_agent(member).await {
                    Ok(_) => {}
                    Err(AgentError::Ledger(e)) if e.is_rejection() => {
                        tracing::debug!(drone_id = %id, "Skipping {}: {}", member, e);
                    }
                    Err(e) => {
                        registered = false;
                        errors.push(e);
                    }
                }
            }
            self.leader_duties.swarm_registered = registered;
        }

        if let Some(launch) = &self.launch {
            let mission_id = match self.leader_duties.launched {
                Some(mission_id) => mission_id,
                None => {
                    let (mission_id, _) = ops
                        .create_mission_for(&launch.name, launch.mission_type)
                        .await?;
                    self.leader_duties.launched = Some(mission_id);
                    mission_id
                }
            };

            if !self.leader_duties.launch_active {
                ops.activate_mission(mission_id).await?;
                self.leader_duties.launch_active = true;
                tracing::info!(drone_id = %id, mission_id = %mission_id, "Mission active");
            }
        }

        Ok(())
    }

    async fn follow(&mut self, ops: &FollowerOps) -> AgentResult<()> {
        let Some(mission_id) = self.mission_id else {
            return Ok(());
        };
        if self.follower_duties.gave_up {
            return Ok(());
        }

        let assignment = match self.follower_duties.assignment {
            Some(assignment) => assignment,
            None => {
                let mission = ops.get_mission(mission_id).await?;
                if !mission.is_active() {
                    tracing::debug!(mission_id = %mission_id, "Waiting for mission to activate");
                    return Ok(());
                }

                let own = self.monitor.drone();
                match self.resolver.resolve_for_mission(ops, &mission, own).await {
                    Ok(assignment) => {
                        self.follower_duties.assignment = Some(assignment);
                        assignment
                    }
                    Err(e) => {
                        self.follower_duties.gave_up = !e.is_recoverable();
                        return Err(e);
                    }
                }
            }
        };

        if !self.follower_duties.airborne {
            let leader_location = ops.leader_location().await?;
            pilot::fly_to_slot(self.flight.as_ref(), &leader_location, assignment.point).await?;
            self.follower_duties.airborne = true;
        }

        Ok(())
    }
}
