use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::domain::flight::{ConnectionState, FlightController, FlightError, Health};

/// A command issued to the simulated autopilot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlightCommand {
    Arm,
    Takeoff,
    GotoLocation {
        lat: f64,
        lon: f64,
        altitude_m: f64,
        heading_deg: f64,
    },
}

/// Autopilot stand-in that records every command it receives
///
/// The agent binary uses it when no real autopilot link is configured;
/// tests use it to assert the exact coordinate a drone was sent to.
#[derive(Debug)]
pub struct SimulatedFlightController {
    home_altitude_m: f64,
    connected: bool,
    commands: Mutex<Vec<FlightCommand>>,
}

impl SimulatedFlightController {
    pub fn new(home_altitude_m: f64) -> Self {
        Self {
            home_altitude_m,
            connected: true,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// A controller whose link is down; every command fails
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::new(0.0)
        }
    }

    /// Commands received so far, oldest first
    pub fn commands(&self) -> Vec<FlightCommand> {
        self.commands.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, command: FlightCommand) -> Result<(), FlightError> {
        if !self.connected {
            return Err(FlightError::NotConnected);
        }
        tracing::info!("Autopilot command: {:?}", command);
        self.commands
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command);
        Ok(())
    }
}

impl Default for SimulatedFlightController {
    fn default() -> Self {
        Self::new(488.0)
    }
}

#[async_trait]
impl FlightController for SimulatedFlightController {
    async fn arm(&self) -> Result<(), FlightError> {
        self.record(FlightCommand::Arm)
    }

    async fn takeoff(&self) -> Result<(), FlightError> {
        self.record(FlightCommand::Takeoff)
    }

    async fn goto_location(
        &self,
        lat: f64,
        lon: f64,
        altitude_m: f64,
        heading_deg: f64,
    ) -> Result<(), FlightError> {
        self.record(FlightCommand::GotoLocation {
            lat,
            lon,
            altitude_m,
            heading_deg,
        })
    }

    async fn connection_state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    async fn health(&self) -> Health {
        Health {
            global_position_ok: self.connected,
            home_position_ok: self.connected,
        }
    }

    async fn home(&self) -> Result<f64, FlightError> {
        if !self.connected {
            return Err(FlightError::NotConnected);
        }
        Ok(self.home_altitude_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_commands_in_order() {
        let controller = SimulatedFlightController::new(500.0);
        controller.arm().await.unwrap();
        controller.takeoff().await.unwrap();

        assert_eq!(
            controller.commands(),
            vec![FlightCommand::Arm, FlightCommand::Takeoff]
        );
        assert_eq!(controller.home().await.unwrap(), 500.0);
    }

    #[tokio::test]
    async fn disconnected_controller_refuses_commands() {
        let controller = SimulatedFlightController::disconnected();
        assert_eq!(controller.arm().await, Err(FlightError::NotConnected));
        assert!(controller.commands().is_empty());
    }
}
