use crate::domain::drone::Location;
use crate::domain::flight::{ConnectionState, FlightController, FlightError};
use crate::domain::formation::Point;
use crate::domain::geodesy::{self, GeoPoint};

use super::errors::AgentResult;

/// Height above home at which the formation flies
pub const FLY_ALTITUDE_OFFSET_M: f64 = 20.0;

/// Sends a drone to its formation slot
///
/// `leader` is read as latitude (`x`) / longitude (`y`) in degrees and
/// `slot` as metres east (`x`) / north (`y`) of it.
///
/// # Returns
/// * `Ok(GeoPoint)` - The target handed to the autopilot
/// * `Err(AgentError::Flight(_))` - The autopilot is unreachable or refused a command
pub async fn fly_to_slot(
    controller: &dyn FlightController,
    leader: &Location,
    slot: Point,
) -> AgentResult<GeoPoint> {
    if controller.connection_state().await != ConnectionState::Connected {
        return Err(FlightError::NotConnected.into());
    }

    let health = controller.health().await;
    if !(health.global_position_ok && health.home_position_ok) {
        tracing::warn!("Autopilot position estimate not ready, flying anyway");
    }

    let altitude = controller.home().await? + FLY_ALTITUDE_OFFSET_M;
    let target = geodesy::slot_to_geodetic(
        GeoPoint {
            lat: leader.x(),
            lon: leader.y(),
        },
        slot,
    );

    controller.arm().await?;
    controller.takeoff().await?;
    controller
        .goto_location(target.lat, target.lon, altitude, 0.0)
        .await?;

    tracing::info!(
        "Heading to slot ({}, {}) at {:.7}, {:.7}, {} m",
        slot.x,
        slot.y,
        target.lat,
        target.lon,
        altitude
    );

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::errors::AgentError;
    use crate::infrastructure::flight::{FlightCommand, SimulatedFlightController};

    #[tokio::test]
    async fn test_flies_to_offset_at_home_plus_twenty() {
        let controller = SimulatedFlightController::new(488.0);
        let leader = Location::new(47.397606, 8.543060).unwrap();
        let slot = Point::new(10.0, 17.320508075688775);

        let target = fly_to_slot(&controller, &leader, slot).await.unwrap();

        assert!((target.lat - 47.397761766994634).abs() < 1e-9);
        assert!((target.lon - 8.543192857930137).abs() < 1e-9);

        let commands = controller.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0], FlightCommand::Arm);
        assert!(matches!(
            commands[2],
            FlightCommand::GotoLocation { altitude_m, .. } if altitude_m == 508.0
        ));
    }

    #[tokio::test]
    async fn test_disconnected_autopilot() {
        let controller = SimulatedFlightController::disconnected();
        let leader = Location::new(47.0, 8.0).unwrap();

        let err = fly_to_slot(&controller, &leader, Point::new(3.0, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err, AgentError::Flight(FlightError::NotConnected));
    }
}
