use std::sync::Arc;

use crate::domain::drone::{BatteryLevel, DroneId, Location};
use crate::domain::ledger::{
    LedgerError, LedgerEvent, LedgerGateway, LedgerReads, Receipt, Transaction,
};
use crate::domain::mission::{FormationType, Mission, MissionEvent, MissionId, MissionType};

use super::errors::{AgentError, AgentResult};

/// Operations a drone may perform while it holds leadership
///
/// Authority is checked by the ledger, not here: every call submits a
/// transaction as `id` and surfaces the ledger's rejection unchanged.
#[derive(Clone)]
pub struct LeaderOps {
    id: DroneId,
    ledger: Arc<dyn LedgerGateway>,
}

impl LeaderOps {
    pub fn new(id: DroneId, ledger: Arc<dyn LedgerGateway>) -> Self {
        Self { id, ledger }
    }

    pub fn id(&self) -> DroneId {
        self.id
    }

    async fn submit(&self, tx: Transaction) -> AgentResult<Receipt> {
        let function = tx.function_name();
        let receipt = self.ledger.submit_transaction(self.id, tx).await?;
        tracing::info!(
            drone_id = %self.id,
            block = receipt.block_number,
            "{} confirmed",
            function
        );
        Ok(receipt)
    }

    fn mission_event(receipt: &Receipt) -> Option<MissionEvent> {
        receipt.events.iter().find_map(|event| match event {
            LedgerEvent::Mission(event) => Some(event.clone()),
            _ => None,
        })
    }

    // ===== Membership =====

    /// Registers `drone` as a swarm member
    pub async fn add_agent(&self, drone: DroneId) -> AgentResult<Receipt> {
        self.submit(Transaction::AddDrone { drone }).await
    }

    pub async fn remove_agent(&self, drone: DroneId) -> AgentResult<Receipt> {
        self.submit(Transaction::RemoveDrone { drone }).await
    }

    // ===== Missions =====

    /// Creates a mission with an explicit formation
    ///
    /// # Returns
    /// * `Ok((MissionId, MissionEvent))` - Ledger-assigned id and the Created event
    /// * `Err(AgentError)` - Rejection, gateway failure, or a receipt without the event
    pub async fn create_mission(
        &self,
        name: &str,
        mission_type: MissionType,
        formation_type: FormationType,
    ) -> AgentResult<(MissionId, MissionEvent)> {
        let receipt = self
            .submit(Transaction::CreateMission {
                name: name.to_string(),
                mission_type,
                formation_type,
            })
            .await?;

        let event = Self::mission_event(&receipt).ok_or_else(|| {
            LedgerError::MalformedResponse(
                "createMission receipt carries no mission event".to_string(),
            )
        })?;
        let mission_id = event.mission_id();
        tracing::info!(drone_id = %self.id, mission_id = %mission_id, "Mission {} created", name);

        Ok((mission_id, event))
    }

    /// Creates a mission flown in the formation its type calls for
    pub async fn create_mission_for(
        &self,
        name: &str,
        mission_type: MissionType,
    ) -> AgentResult<(MissionId, MissionEvent)> {
        self.create_mission(name, mission_type, mission_type.formation())
            .await
    }

    /// Overwrites a mission's fields; its status is kept
    pub async fn update_mission(
        &self,
        mission_id: MissionId,
        name: &str,
        mission_type: MissionType,
        formation_type: FormationType,
    ) -> AgentResult<Option<MissionEvent>> {
        let receipt = self
            .submit(Transaction::UpdateMission {
                mission_id,
                name: name.to_string(),
                mission_type,
                formation_type,
            })
            .await?;
        Ok(Self::mission_event(&receipt))
    }

    pub async fn update_mission_for(
        &self,
        mission_id: MissionId,
        name: &str,
        mission_type: MissionType,
    ) -> AgentResult<Option<MissionEvent>> {
        self.update_mission(mission_id, name, mission_type, mission_type.formation())
            .await
    }

    pub async fn activate_mission(
        &self,
        mission_id: MissionId,
    ) -> AgentResult<Option<MissionEvent>> {
        let receipt = self.submit(Transaction::ActivateMission { mission_id }).await?;
        Ok(Self::mission_event(&receipt))
    }

    pub async fn deactivate_mission(
        &self,
        mission_id: MissionId,
    ) -> AgentResult<Option<MissionEvent>> {
        let receipt = self
            .submit(Transaction::DeactivateMission { mission_id })
            .await?;
        Ok(Self::mission_event(&receipt))
    }

    pub async fn get_mission(&self, mission_id: MissionId) -> AgentResult<Mission> {
        Ok(self.ledger.mission(mission_id).await?)
    }

    // ===== Liveness & telemetry =====

    pub async fn send_heartbeat(&self) -> AgentResult<Receipt> {
        let receipt = self.ledger.submit_transaction(self.id, Transaction::SendHeartbeat).await?;
        tracing::debug!(drone_id = %self.id, block = receipt.block_number, "Heartbeat confirmed");
        Ok(receipt)
    }

    pub async fn submit_battery_level(&self, battery: BatteryLevel) -> AgentResult<Receipt> {
        let receipt = self
            .ledger
            .submit_transaction(self.id, Transaction::SubmitBatteryLevel { battery })
            .await?;
        tracing::debug!(drone_id = %self.id, battery = %battery, "Battery level confirmed");
        Ok(receipt)
    }

    /// Publishes the leader's location so followers can position around it
    pub async fn submit_data(&self, location: &Location, data: &str) -> AgentResult<Receipt> {
        self.submit(Transaction::SubmitData {
            location: location.to_string(),
            data: data.to_string(),
        })
        .await
    }

    pub async fn available_positions(&self) -> AgentResult<Vec<u32>> {
        Ok(self.ledger.available_positions().await?)
    }
}

/// Parses a wire mission type index
pub fn parse_mission_type(index: u8) -> AgentResult<MissionType> {
    MissionType::try_from(index).map_err(AgentError::MalformedInput)
}
