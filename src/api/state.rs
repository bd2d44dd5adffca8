use std::sync::Arc;

use crate::domain::ledger::LedgerGateway;

/// Shared state for ledger node handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerGateway>,
    /// Contract address this node serves
    pub address: String,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn LedgerGateway>,
        address: impl Into<String>,
        jwt_secret: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            address: address.into(),
            jwt_secret: jwt_secret.into(),
        }
    }
}
