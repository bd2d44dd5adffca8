// Drone domain module
// Contains the drone record and its value objects

#![allow(clippy::module_inception)]

pub mod drone;
pub mod value_objects;

// Re-export main types for convenience
pub use drone::Drone;
pub use value_objects::{BatteryLevel, DroneId, Location};
