// Authentication module
// Signs and verifies the caller identity attached to ledger requests

pub mod jwt;
