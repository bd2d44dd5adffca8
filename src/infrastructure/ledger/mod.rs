// Ledger adapters
// Every adapter runs the same reference contract; they differ in where the
// contract state lives and how callers reach it

pub mod clock;
pub mod contract;
pub mod http;
pub mod memory;
pub mod postgres;

pub use clock::{Clock, ManualClock, SystemClock};
pub use contract::SwarmContract;
pub use http::HttpLedgerGateway;
pub use memory::InMemoryLedger;
pub use postgres::PostgresLedger;
