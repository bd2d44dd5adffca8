use thiserror::Error;

use crate::domain::drone::DroneId;
use crate::domain::flight::FlightError;
use crate::domain::ledger::LedgerError;

/// Errors that can occur in the agent system
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Every available slot was claimed by another drone ({attempted} attempted)")]
    ExhaustedCandidates { attempted: usize },

    #[error("No location submitted by leader {0}")]
    MissingLeaderLocation(DroneId),

    #[error(transparent)]
    Flight(#[from] FlightError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AgentError {
    /// True when the same operation may succeed on a later cycle
    pub fn is_recoverable(&self) -> bool {
        match self {
            AgentError::Ledger(_)
            | AgentError::MissingLeaderLocation(_)
            | AgentError::Flight(_) => true,
            AgentError::MalformedInput(_)
            | AgentError::ExhaustedCandidates { .. }
            | AgentError::ConfigError(_) => false,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
