use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Link state between the agent process and its autopilot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Subset of autopilot telemetry the swarm cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub global_position_ok: bool,
    pub home_position_ok: bool,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FlightError {
    #[error("Flight controller not connected")]
    NotConnected,

    #[error("Flight command {command} failed: {reason}")]
    CommandFailed { command: String, reason: String },
}

/// Autopilot interface
///
/// Flight behaviour is the controller's business; the swarm only hands it
/// a target coordinate once a slot has been resolved.
#[async_trait]
pub trait FlightController: Send + Sync {
    async fn arm(&self) -> Result<(), FlightError>;

    async fn takeoff(&self) -> Result<(), FlightError>;

    /// Fly to `lat`/`lon` at absolute altitude `altitude_m` (AMSL) facing `heading_deg`
    async fn goto_location(
        &self,
        lat: f64,
        lon: f64,
        altitude_m: f64,
        heading_deg: f64,
    ) -> Result<(), FlightError>;

    async fn connection_state(&self) -> ConnectionState;

    async fn health(&self) -> Health;

    /// Absolute altitude of the home position in metres
    async fn home(&self) -> Result<f64, FlightError>;
}
