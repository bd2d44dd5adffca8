// Mission domain module
// Contains the mission entity, its value objects, and lifecycle events

#![allow(clippy::module_inception)]

pub mod events;
pub mod mission;
pub mod value_objects;

// Re-export main types for convenience
pub use events::MissionEvent;
pub use mission::{Mission, MissionId};
pub use value_objects::{FormationType, MissionStatus, MissionType};
