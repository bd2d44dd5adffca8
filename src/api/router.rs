use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::ledger;
use crate::api::state::AppState;

/// Builds the ledger node router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(ledger::health_check))
        .route(
            "/api/ledgers/:address/transactions",
            post(ledger::submit_transaction),
        )
        .route("/api/ledgers/:address/calls", post(ledger::call))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
