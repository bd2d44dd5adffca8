// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of ledger transport and flight hardware

pub mod drone;
pub mod flight;
pub mod formation;
pub mod geodesy;
pub mod ledger;
pub mod mission;
