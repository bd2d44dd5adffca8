use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::middleware::{CallerAuth, OptionalCallerAuth};
use crate::api::state::AppState;
use crate::domain::ledger::{CallResult, Query, Receipt, Transaction};

fn ensure_address(state: &AppState, address: &str) -> Result<(), ApiError> {
    if address != state.address {
        return Err(ApiError::not_found(format!("No contract deployed at {}", address)));
    }
    Ok(())
}

/// Submit a transaction on behalf of the authenticated drone
///
/// POST /api/ledgers/:address/transactions
pub async fn submit_transaction(
    State(state): State<AppState>,
    Path(address): Path<String>,
    CallerAuth(caller): CallerAuth,
    Json(tx): Json<Transaction>,
) -> Result<Json<Receipt>, ApiError> {
    ensure_address(&state, &address)?;

    let function = tx.function_name();
    let receipt = state.ledger.submit_transaction(caller, tx).await.map_err(|e| {
        tracing::info!("{} {} refused: {}", caller, function, e);
        ApiError::from(e)
    })?;

    Ok(Json(receipt))
}

/// Run a read-only query
///
/// POST /api/ledgers/:address/calls
pub async fn call(
    State(state): State<AppState>,
    Path(address): Path<String>,
    OptionalCallerAuth(caller): OptionalCallerAuth,
    Json(query): Json<Query>,
) -> Result<Json<CallResult>, ApiError> {
    ensure_address(&state, &address)?;

    let result = state.ledger.call(query, caller).await?;
    Ok(Json(result))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
