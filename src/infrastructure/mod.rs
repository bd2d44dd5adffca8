// Infrastructure layer module
// Contains ledger adapters and external service integrations
// Follows Hexagonal Architecture

pub mod flight;
pub mod ledger;
