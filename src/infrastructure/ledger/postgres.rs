use async_trait::async_trait;
use chrono::Duration;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::drone::DroneId;
use crate::domain::ledger::{
    CallResult, LedgerError, LedgerGateway, LedgerResult, Query, Receipt, Transaction,
};

use super::clock::{Clock, SystemClock};
use super::contract::SwarmContract;

const CREATE_LEDGERS: &str = r#"
    CREATE TABLE IF NOT EXISTS swarm_ledgers (
        address TEXT PRIMARY KEY,
        state JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

const CREATE_TRANSACTIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS ledger_transactions (
        tx_hash UUID PRIMARY KEY,
        address TEXT NOT NULL REFERENCES swarm_ledgers(address),
        block_number BIGINT NOT NULL,
        caller BIGINT NOT NULL,
        function TEXT NOT NULL,
        args JSONB NOT NULL,
        events JSONB NOT NULL,
        committed_at TIMESTAMPTZ NOT NULL,
        UNIQUE (address, block_number)
    )
"#;

/// PostgreSQL-backed ledger
///
/// Contract state lives as one JSONB row per address. Submissions lock that
/// row (`SELECT ... FOR UPDATE`), run the contract, then write the new state
/// and append the receipt to `ledger_transactions` in the same transaction,
/// so several ledger nodes can share one database and still agree on a
/// single commit order.
pub struct PostgresLedger {
    pool: PgPool,
    address: String,
    clock: Arc<dyn Clock>,
}

impl PostgresLedger {
    /// Creates a PostgresLedger for the contract at `address`
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    /// * `address` - Contract address the rows are keyed by
    pub fn new(pool: PgPool, address: impl Into<String>) -> Self {
        Self {
            pool,
            address: address.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Creates the ledger tables if they do not exist
    pub async fn migrate(&self) -> LedgerResult<()> {
        for statement in [CREATE_LEDGERS, CREATE_TRANSACTIONS] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| database_error("migrate", e))?;
        }
        Ok(())
    }

    /// Deploys the contract unless a deployment already exists at this address
    ///
    /// Returns `true` when a new contract was written.
    pub async fn deploy(
        &self,
        leader: DroneId,
        position_count: u32,
        heartbeat_timeout: Duration,
    ) -> LedgerResult<bool> {
        let contract =
            SwarmContract::deploy(leader, position_count, heartbeat_timeout, self.clock.now());

        let result = sqlx::query(
            r#"
            INSERT INTO swarm_ledgers (address, state)
            VALUES ($1, $2)
            ON CONFLICT (address) DO NOTHING
            "#,
        )
        .bind(&self.address)
        .bind(Json(&contract))
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("deploy", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn load(&self) -> LedgerResult<SwarmContract> {
        let row = sqlx::query("SELECT state FROM swarm_ledgers WHERE address = $1")
            .bind(&self.address)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database_error("load", e))?
            .ok_or_else(|| self.not_deployed())?;

        decode_state(&row)
    }

    fn not_deployed(&self) -> LedgerError {
        LedgerError::rejected("load", format!("no contract deployed at {}", self.address))
    }
}

fn decode_state(row: &sqlx::postgres::PgRow) -> LedgerResult<SwarmContract> {
    let Json(contract) = row
        .try_get::<Json<SwarmContract>, _>("state")
        .map_err(|e| LedgerError::MalformedResponse(format!("stored contract state: {}", e)))?;
    Ok(contract)
}

fn database_error(operation: &str, e: sqlx::Error) -> LedgerError {
    match e {
        sqlx::Error::PoolTimedOut => LedgerError::Timeout(format!("{}: pool timed out", operation)),
        other => LedgerError::Network(format!("{}: {}", operation, other)),
    }
}

#[async_trait]
impl LedgerGateway for PostgresLedger {
    async fn submit_transaction(&self, caller: DroneId, tx: Transaction) -> LedgerResult<Receipt> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database_error("begin", e))?;

        let row = sqlx::query("SELECT state FROM swarm_ledgers WHERE address = $1 FOR UPDATE")
            .bind(&self.address)
            .fetch_optional(&mut *db_tx)
            .await
            .map_err(|e| database_error("lock", e))?
            .ok_or_else(|| self.not_deployed())?;

        let mut contract = decode_state(&row)?;
        let now = self.clock.now();

        // Dropping db_tx on rejection rolls the lock back
        let receipt = contract.commit(caller, &tx, now)?;

        sqlx::query("UPDATE swarm_ledgers SET state = $2, updated_at = $3 WHERE address = $1")
            .bind(&self.address)
            .bind(Json(&contract))
            .bind(now)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| database_error("store", e))?;

        sqlx::query(
            r#"
            INSERT INTO ledger_transactions (
                tx_hash, address, block_number, caller, function, args, events, committed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(receipt.tx_hash)
        .bind(&self.address)
        .bind(receipt.block_number as i64)
        .bind(i64::from(caller.as_u32()))
        .bind(&receipt.function)
        .bind(Json(&tx))
        .bind(Json(&receipt.events))
        .bind(now)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| database_error("append", e))?;

        db_tx
            .commit()
            .await
            .map_err(|e| database_error("commit", e))?;

        tracing::debug!(
            "{} committed {} in block {} at {}",
            caller,
            receipt.function,
            receipt.block_number,
            self.address
        );

        Ok(receipt)
    }

    async fn call(&self, query: Query, _caller: Option<DroneId>) -> LedgerResult<CallResult> {
        let contract = self.load().await?;
        contract.answer(&query, self.clock.now())
    }
}
