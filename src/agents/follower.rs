use std::sync::Arc;

use crate::domain::drone::{BatteryLevel, DroneId, Location};
use crate::domain::ledger::{
    DroneRecord, LedgerError, LedgerGateway, LedgerReads, Receipt, Transaction,
};
use crate::domain::mission::{Mission, MissionId};

use super::errors::{AgentError, AgentResult};

/// Result of a single slot claim
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    Claimed(Receipt),
    /// The ledger refused the claim, usually because another drone holds it
    Rejected { reason: String },
}

/// Operations a drone performs while following
#[derive(Clone)]
pub struct FollowerOps {
    id: DroneId,
    ledger: Arc<dyn LedgerGateway>,
}

impl FollowerOps {
    pub fn new(id: DroneId, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self { id, ledger }
    }

    pub fn id(&self) -> DroneId {
        self.id
    }

    /// Claims a 1-based slot
    ///
    /// A ledger rejection is an expected outcome of racing other followers
    /// and comes back as [`ClaimOutcome::Rejected`]; every other failure is
    /// returned as an error.
    pub async fn try_claim(&self, position: u32) -> AgentResult<ClaimOutcome> {
        match self
            .ledger
            .submit_transaction(self.id, Transaction::AssignPosition { position })
            .await
        {
            Ok(receipt) => {
                tracing::info!(drone_id = %self.id, slot = position, "Slot claimed");
                Ok(ClaimOutcome::Claimed(receipt))
            }
            Err(LedgerError::Rejected { reason, .. }) => {
                tracing::warn!(drone_id = %self.id, slot = position, "Claim rejected: {}", reason);
                Ok(ClaimOutcome::Rejected { reason })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Claims a slot; a rejection is an error here
    pub async fn select_position(&self, position: u32) -> AgentResult<Receipt> {
        Ok(self
            .ledger
            .submit_transaction(self.id, Transaction::AssignPosition { position })
            .await?)
    }

    pub async fn submit_data(&self, location: &Location, data: &str) -> AgentResult<Receipt> {
        Ok(self
            .ledger
            .submit_transaction(
                self.id,
                Transaction::SubmitData {
                    location: location.to_string(),
                    data: data.to_string(),
                },
            )
            .await?)
    }

    pub async fn get_drone_data(&self) -> AgentResult<Vec<DroneRecord>> {
        Ok(self.ledger.drone_data(self.id).await?)
    }

    pub async fn available_positions(&self) -> AgentResult<Vec<u32>> {
        Ok(self.ledger.available_positions().await?)
    }

    pub async fn get_mission(&self, mission_id: MissionId) -> AgentResult<Mission> {
        Ok(self.ledger.mission(mission_id).await?)
    }

    /// Asks the ledger to judge the leader, re-electing if it has gone quiet
    pub async fn check_leader_status(&self) -> AgentResult<Receipt> {
        let receipt = self
            .ledger
            .submit_transaction(self.id, Transaction::CheckLeaderStatus)
            .await?;

        if let Some(leader) = receipt.elected_leader() {
            tracing::info!(drone_id = %self.id, "Ledger elected {} as leader", leader);
        }
        Ok(receipt)
    }

    pub async fn leader_is_alive(&self) -> AgentResult<bool> {
        Ok(self.ledger.leader_is_alive(self.id).await?)
    }

    pub async fn leader(&self) -> AgentResult<DroneId> {
        Ok(self.ledger.leader().await?)
    }

    pub async fn submit_battery_level(&self, battery: BatteryLevel) -> AgentResult<Receipt> {
        Ok(self
            .ledger
            .submit_transaction(self.id, Transaction::SubmitBatteryLevel { battery })
            .await?)
    }

    /// Latest location the current leader submitted
    pub async fn leader_location(&self) -> AgentResult<Location> {
        let leader = self.leader().await?;
        let records = self.get_drone_data().await?;

        let record = records
            .iter()
            .rev()
            .find(|record| record.sender == leader)
            .ok_or(AgentError::MissingLeaderLocation(leader))?;

        Location::parse(&record.location).map_err(AgentError::MalformedInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ledger::InMemoryLedger;
    use chrono::Duration;

    async fn swarm() -> (Arc<InMemoryLedger>, FollowerOps) {
        let ledger = Arc::new(InMemoryLedger::deploy(DroneId(0), 2, Duration::seconds(30)));
        for id in 1..=2 {
            ledger
                .submit_transaction(DroneId(0), Transaction::AddDrone { drone: DroneId(id) })
                .await
                .unwrap();
        }
        let follower = FollowerOps::new(DroneId(1), ledger.clone());
        (ledger, follower)
    }

    #[tokio::test]
    async fn test_taken_slot_is_a_rejected_outcome() {
        let (ledger, follower) = swarm().await;
        ledger
            .submit_transaction(DroneId(2), Transaction::AssignPosition { position: 1 })
            .await
            .unwrap();

        let outcome = follower.try_claim(1).await.unwrap();
        assert!(matches!(outcome, ClaimOutcome::Rejected { .. }));
        assert!(matches!(follower.try_claim(2).await.unwrap(), ClaimOutcome::Claimed(_)));
    }

    #[tokio::test]
    async fn test_select_position_surfaces_rejection() {
        let (_ledger, follower) = swarm().await;
        follower.select_position(1).await.unwrap();
        assert!(follower.select_position(2).await.is_err());
    }

    #[tokio::test]
    async fn test_leader_location_uses_latest_leader_record() {
        let (ledger, follower) = swarm().await;
        for location in ["1.0, 2.0", "3.5, 4.5"] {
            ledger
                .submit_transaction(
                    DroneId(0),
                    Transaction::SubmitData {
                        location: location.to_string(),
                        data: "Hello from Leader!".to_string(),
                    },
                )
                .await
                .unwrap();
        }
        follower
            .submit_data(&Location::new(9.0, 9.0).unwrap(), "Hello from Follower!")
            .await
            .unwrap();

        let location = follower.leader_location().await.unwrap();
        assert_eq!(location, Location::new(3.5, 4.5).unwrap());
    }

    #[tokio::test]
    async fn test_leader_location_missing() {
        let (_ledger, follower) = swarm().await;
        let err = follower.leader_location().await.unwrap_err();
        assert_eq!(err, AgentError::MissingLeaderLocation(DroneId(0)));
    }
}
