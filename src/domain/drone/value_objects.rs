use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::formation::Point;

/// Stable drone identity, also used as the drone's ledger identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DroneId(pub u32);

impl DroneId {
    /// Returns the raw numeric identity
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DroneId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "drone-{}", self.0)
    }
}

/// Self-reported planar location of a drone
///
/// Locations travel through the ledger as `"x, y"` text (`"lat, lon"` when
/// flying real airframes), so parsing is strict: exactly two comma-separated
/// finite floats.
///
/// # Example
/// ```
/// use swarm_formation::domain::drone::Location;
///
/// let location = Location::parse("31.3, 49.2").expect("valid location");
/// assert_eq!(location.x(), 31.3);
/// assert_eq!(location.to_string(), "31.3, 49.2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    x: f64,
    y: f64,
}

impl Location {
    /// Creates a location from already-validated coordinates
    pub fn new(x: f64, y: f64) -> Result<Self, String> {
        if !x.is_finite() || !y.is_finite() {
            return Err(format!("Location coordinates must be finite: ({}, {})", x, y));
        }
        Ok(Self { x, y })
    }

    /// Parses a `"x, y"` pair
    ///
    /// # Returns
    /// * `Ok(Location)` - If the text holds two finite floats
    /// * `Err(String)` - If the text is malformed; nothing is defaulted
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut parts = text.split(',');
        let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("Expected \"x, y\" coordinate pair, got {:?}", text));
        };

        let x = x
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid x coordinate in {:?}: {}", text, e))?;
        let y = y
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("Invalid y coordinate in {:?}: {}", text, e))?;

        Self::new(x, y)
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Coordinates of `self` relative to `reference` (self minus reference)
    pub fn relative_to(&self, reference: &Location) -> Point {
        Point::new(self.x - reference.x, self.y - reference.y)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

/// Battery charge percentage, always within 0..=100
///
/// The last submitted value is the election signal: the follower reporting
/// the highest level takes over from an unresponsive leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    pub const FULL: BatteryLevel = BatteryLevel(100);
    pub const EMPTY: BatteryLevel = BatteryLevel(0);

    /// Creates a battery level, rejecting values above 100
    pub fn new(percent: u8) -> Result<Self, String> {
        if percent > 100 {
            return Err(format!("Battery level must be within 0..=100, got {}", percent));
        }
        Ok(Self(percent))
    }

    /// Returns the level as a percentage
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// One unit of self-reported degradation, saturating at empty
    pub fn drained(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl TryFrom<u8> for BatteryLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatteryLevel> for u8 {
    fn from(level: BatteryLevel) -> Self {
        level.0
    }
}

impl fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_location_with_space() {
        let location = Location::parse("32.4, 51.2").unwrap();
        assert_eq!(location.x(), 32.4);
        assert_eq!(location.y(), 51.2);
    }

    #[test]
    fn parse_location_without_space() {
        let location = Location::parse("-1.5,2").unwrap();
        assert_eq!(location.x(), -1.5);
        assert_eq!(location.y(), 2.0);
    }

    #[test]
    fn parse_location_single_value_fails() {
        assert!(Location::parse("32.4").is_err());
    }

    #[test]
    fn parse_location_three_values_fails() {
        assert!(Location::parse("1, 2, 3").is_err());
    }

    #[test]
    fn parse_location_garbage_fails() {
        let err = Location::parse("north, 51.2").unwrap_err();
        assert!(err.contains("Invalid x coordinate"));
    }

    #[test]
    fn parse_location_empty_fails() {
        assert!(Location::parse("").is_err());
    }

    #[test]
    fn parse_location_rejects_nan() {
        assert!(Location::parse("NaN, 1").is_err());
    }

    #[test]
    fn location_display_round_trips() {
        let location = Location::new(47.397606, 8.54306).unwrap();
        assert_eq!(Location::parse(&location.to_string()).unwrap(), location);
    }

    #[test]
    fn relative_position_subtracts_reference() {
        let me = Location::parse("31.3, 49.2").unwrap();
        let leader = Location::parse("32.4, 51.2").unwrap();
        let rel = me.relative_to(&leader);
        assert!((rel.x - -1.1).abs() < 1e-9);
        assert!((rel.y - -2.0).abs() < 1e-9);
    }

    #[test]
    fn battery_bounds() {
        assert!(BatteryLevel::new(0).is_ok());
        assert!(BatteryLevel::new(100).is_ok());
        assert!(BatteryLevel::new(101).is_err());
    }

    #[test]
    fn battery_drain_saturates() {
        assert_eq!(BatteryLevel::new(95).unwrap().drained().percent(), 94);
        assert_eq!(BatteryLevel::EMPTY.drained(), BatteryLevel::EMPTY);
    }

    #[test]
    fn battery_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<BatteryLevel>("150").is_err());
        assert_eq!(serde_json::from_str::<BatteryLevel>("97").unwrap().percent(), 97);
    }

    #[test]
    fn drone_id_display() {
        assert_eq!(DroneId(3).to_string(), "drone-3");
    }
}
