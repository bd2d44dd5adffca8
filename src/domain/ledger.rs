//! Ledger gateway port
//!
//! The ledger is the swarm's only shared state and its only arbiter: it
//! decides who leads and which drone holds which slot. Agents reach it
//! exclusively through [`LedgerGateway`], which mirrors a contract ABI:
//! writes are submitted as [`Transaction`]s and block until a [`Receipt`]
//! (or an error) comes back; reads are [`Query`] calls against the last
//! confirmed state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::drone::{BatteryLevel, DroneId};
use crate::domain::mission::{FormationType, Mission, MissionEvent, MissionId, MissionType};

/// State-changing contract functions
///
/// Serialized as `{"function": "<contractName>", "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", content = "args", rename_all = "camelCase")]
pub enum Transaction {
    AddDrone {
        drone: DroneId,
    },
    RemoveDrone {
        drone: DroneId,
    },
    CreateMission {
        name: String,
        mission_type: MissionType,
        formation_type: FormationType,
    },
    UpdateMission {
        mission_id: MissionId,
        name: String,
        mission_type: MissionType,
        formation_type: FormationType,
    },
    ActivateMission {
        mission_id: MissionId,
    },
    DeactivateMission {
        mission_id: MissionId,
    },
    /// Claim a 1-based formation slot
    AssignPosition {
        position: u32,
    },
    SubmitData {
        location: String,
        data: String,
    },
    SendHeartbeat,
    SubmitBatteryLevel {
        battery: BatteryLevel,
    },
    /// Liveness probe; the ledger re-elects if the leader's heartbeat is stale
    CheckLeaderStatus,
}

impl Transaction {
    /// Contract function name, as it appears on the wire
    pub fn function_name(&self) -> &'static str {
        match self {
            Transaction::AddDrone { .. } => "addDrone",
            Transaction::RemoveDrone { .. } => "removeDrone",
            Transaction::CreateMission { .. } => "createMission",
            Transaction::UpdateMission { .. } => "updateMission",
            Transaction::ActivateMission { .. } => "activateMission",
            Transaction::DeactivateMission { .. } => "deactivateMission",
            Transaction::AssignPosition { .. } => "assignPosition",
            Transaction::SubmitData { .. } => "submitData",
            Transaction::SendHeartbeat => "sendHeartbeat",
            Transaction::SubmitBatteryLevel { .. } => "submitBatteryLevel",
            Transaction::CheckLeaderStatus => "checkLeaderStatus",
        }
    }
}

/// Read-only contract functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "function", content = "args", rename_all = "camelCase")]
pub enum Query {
    Leader,
    LeaderIsAlive,
    GetAvailablePositions,
    GetDroneData,
    GetMission { mission_id: MissionId },
}

impl Query {
    pub fn function_name(&self) -> &'static str {
        match self {
            Query::Leader => "leader",
            Query::LeaderIsAlive => "leaderIsAlive",
            Query::GetAvailablePositions => "getAvailablePositions",
            Query::GetDroneData => "getDroneData",
            Query::GetMission { .. } => "getMission",
        }
    }
}

/// One `submitData` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneRecord {
    pub location: String,
    pub data: String,
    pub sender: DroneId,
    pub submitted_at: DateTime<Utc>,
}

/// Result of a [`Query`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CallResult {
    Leader(DroneId),
    LeaderIsAlive(bool),
    AvailablePositions(Vec<u32>),
    DroneData(Vec<DroneRecord>),
    Mission(Mission),
}

/// Log entries attached to a receipt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum LedgerEvent {
    DroneAdded {
        drone: DroneId,
    },
    DroneRemoved {
        drone: DroneId,
    },
    Mission(MissionEvent),
    PositionAssigned {
        drone: DroneId,
        position: u32,
    },
    DataSubmitted {
        sender: DroneId,
    },
    Heartbeat {
        leader: DroneId,
        at: DateTime<Utc>,
    },
    BatterySubmitted {
        drone: DroneId,
        battery: BatteryLevel,
    },
    LeaderElected {
        previous: DroneId,
        leader: DroneId,
        battery: BatteryLevel,
    },
}

/// Confirmation that a transaction was committed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: Uuid,
    /// Position of the transaction in the ledger's commit order
    pub block_number: u64,
    pub caller: DroneId,
    pub function: String,
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    /// Id of the mission created by this transaction, if any
    pub fn created_mission(&self) -> Option<MissionId> {
        self.events.iter().find_map(|event| match event {
            LedgerEvent::Mission(MissionEvent::Created { mission_id, .. }) => Some(*mission_id),
            _ => None,
        })
    }

    /// New leader if this transaction triggered an election
    pub fn elected_leader(&self) -> Option<DroneId> {
        self.events.iter().find_map(|event| match event {
            LedgerEvent::LeaderElected { leader, .. } => Some(*leader),
            _ => None,
        })
    }
}

/// Errors surfaced by a ledger gateway
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// The contract refused the transaction (authority check, slot taken,
    /// invalid mission transition, ...)
    #[error("Ledger rejected {function}: {reason}")]
    Rejected { function: String, reason: String },

    #[error("Ledger gateway timed out: {0}")]
    Timeout(String),

    #[error("Ledger network failure: {0}")]
    Network(String),

    #[error("Malformed ledger response: {0}")]
    MalformedResponse(String),
}

impl LedgerError {
    pub fn rejected(function: impl Into<String>, reason: impl Into<String>) -> Self {
        LedgerError::Rejected {
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// True when the ledger itself refused the request
    pub fn is_rejection(&self) -> bool {
        matches!(self, LedgerError::Rejected { .. })
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Capability to execute and read transactions against shared swarm state
///
/// Implementations must serialize writes into a single commit order and only
/// return `Ok(Receipt)` once the write is confirmed.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submit a state-changing transaction on behalf of `caller`
    async fn submit_transaction(&self, caller: DroneId, tx: Transaction) -> LedgerResult<Receipt>;

    /// Run a read-only query against the latest confirmed state
    async fn call(&self, query: Query, caller: Option<DroneId>) -> LedgerResult<CallResult>;
}

fn unexpected(query: &Query, got: &CallResult) -> LedgerError {
    LedgerError::MalformedResponse(format!(
        "{} returned unexpected result {:?}",
        query.function_name(),
        got
    ))
}

/// Typed wrappers over [`LedgerGateway::call`]
#[async_trait]
pub trait LedgerReads {
    async fn leader(&self) -> LedgerResult<DroneId>;
    async fn leader_is_alive(&self, caller: DroneId) -> LedgerResult<bool>;
    async fn available_positions(&self) -> LedgerResult<Vec<u32>>;
    async fn drone_data(&self, caller: DroneId) -> LedgerResult<Vec<DroneRecord>>;
    async fn mission(&self, mission_id: MissionId) -> LedgerResult<Mission>;
}

#[async_trait]
impl<T> LedgerReads for T
where
    T: LedgerGateway + ?Sized,
{
    async fn leader(&self) -> LedgerResult<DroneId> {
        let query = Query::Leader;
        match self.call(query.clone(), None).await? {
            CallResult::Leader(id) => Ok(id),
            other => Err(unexpected(&query, &other)),
        }
    }

    async fn leader_is_alive(&self, caller: DroneId) -> LedgerResult<bool> {
        let query = Query::LeaderIsAlive;
        match self.call(query.clone(), Some(caller)).await? {
            CallResult::LeaderIsAlive(alive) => Ok(alive),
            other => Err(unexpected(&query, &other)),
        }
    }

    async fn available_positions(&self) -> LedgerResult<Vec<u32>> {
        let query = Query::GetAvailablePositions;
        match self.call(query.clone(), None).await? {
            CallResult::AvailablePositions(positions) => Ok(positions),
            other => Err(unexpected(&query, &other)),
        }
    }

    async fn drone_data(&self, caller: DroneId) -> LedgerResult<Vec<DroneRecord>> {
        let query = Query::GetDroneData;
        match self.call(query.clone(), Some(caller)).await? {
            CallResult::DroneData(records) => Ok(records),
            other => Err(unexpected(&query, &other)),
        }
    }

    async fn mission(&self, mission_id: MissionId) -> LedgerResult<Mission> {
        let query = Query::GetMission { mission_id };
        match self.call(query.clone(), None).await? {
            CallResult::Mission(mission) => Ok(mission),
            other => Err(unexpected(&query, &other)),
        }
    }
}
