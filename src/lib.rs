//! Swarm formation coordination
//!
//! Drones coordinate exclusively through a shared ledger: it arbitrates
//! leadership, mission lifecycle and formation slot ownership. This crate
//! provides the per-drone agent logic, the reference ledger contract, and
//! in-memory, HTTP and PostgreSQL ledger adapters.

pub mod agents;
pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
