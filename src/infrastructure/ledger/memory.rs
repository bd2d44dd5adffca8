use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::drone::DroneId;
use crate::domain::ledger::{CallResult, LedgerGateway, LedgerResult, Query, Receipt, Transaction};

use super::clock::{Clock, SystemClock};
use super::contract::SwarmContract;

/// In-process ledger
///
/// Holds a single [`SwarmContract`] behind an async mutex, so concurrent
/// submissions from any number of agents are committed one at a time in
/// lock acquisition order. Used by tests and by a ledger node started
/// without a database.
pub struct InMemoryLedger {
    contract: Mutex<SwarmContract>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLedger {
    /// Deploys a contract on the wall clock
    ///
    /// # Arguments
    /// * `leader` - Drone that deploys the contract and leads initially
    /// * `position_count` - Number of follower slots
    /// * `heartbeat_timeout` - Leader silence tolerated before re-election
    pub fn deploy(leader: DroneId, position_count: u32, heartbeat_timeout: Duration) -> Self {
        Self::with_clock(leader, position_count, heartbeat_timeout, Arc::new(SystemClock))
    }

    /// Deploys a contract on a caller-supplied clock
    pub fn with_clock(
        leader: DroneId,
        position_count: u32,
        heartbeat_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let contract =
            SwarmContract::deploy(leader, position_count, heartbeat_timeout, clock.now());
        Self::from_contract(contract, clock)
    }

    /// Wraps an existing contract state
    pub fn from_contract(contract: SwarmContract, clock: Arc<dyn Clock>) -> Self {
        Self {
            contract: Mutex::new(contract),
            clock,
        }
    }

    /// Copy of the current contract state
    pub async fn snapshot(&self) -> SwarmContract {
        self.contract.lock().await.clone()
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn submit_transaction(&self, caller: DroneId, tx: Transaction) -> LedgerResult<Receipt> {
        let mut contract = self.contract.lock().await;
        let result = contract.commit(caller, &tx, self.clock.now());

        match &result {
            Ok(receipt) => tracing::debug!(
                "{} committed {} in block {}",
                caller,
                receipt.function,
                receipt.block_number
            ),
            Err(e) => tracing::debug!("{} submission refused: {}", caller, e),
        }

        result
    }

    async fn call(&self, query: Query, _caller: Option<DroneId>) -> LedgerResult<CallResult> {
        let contract = self.contract.lock().await;
        contract.answer(&query, self.clock.now())
    }
}
