// API layer module (adapters for controllers)
// Exposes a ledger to remote agents over HTTP
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::router;
pub use state::AppState;
