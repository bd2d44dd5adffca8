use super::value_objects::{BatteryLevel, DroneId, Location};
use crate::domain::formation::Point;

/// A swarm member as seen by its own process
///
/// There is one `Drone` per agent process and it lives for the whole process.
/// The record carries identity, self-reported location and battery; it does
/// not carry a role. Whether this drone currently leads is a ledger fact that
/// the role monitor re-reads every cycle.
///
/// # Example
/// ```
/// use swarm_formation::domain::drone::{BatteryLevel, Drone, DroneId, Location};
///
/// let mut drone = Drone::new(
///     DroneId(1),
///     Location::parse("31.3, 49.2").expect("valid location"),
///     BatteryLevel::new(95).expect("valid battery"),
/// );
///
/// assert_eq!(drone.drain_battery().percent(), 94);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Drone {
    id: DroneId,
    location: Location,
    battery: BatteryLevel,
}

impl Drone {
    pub fn new(id: DroneId, location: Location, battery: BatteryLevel) -> Self {
        Self {
            id,
            location,
            battery,
        }
    }

    /// Applies one step of battery degradation and returns the new level
    pub fn drain_battery(&mut self) -> BatteryLevel {
        self.battery = self.battery.drained();
        self.battery
    }

    /// Relative coordinates of this drone with respect to `reference`
    pub fn relative_position(&self, reference: &Location) -> Point {
        self.location.relative_to(reference)
    }

    // ===== Getters =====

    pub fn id(&self) -> DroneId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn battery(&self) -> BatteryLevel {
        self.battery
    }
}

impl std::fmt::Display for Drone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Drone:ID={}, Position=({})", self.id.as_u32(), self.location)
    }
}
