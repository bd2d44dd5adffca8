// Agent system modules
//
// Per-drone coordination logic: role monitoring, leader and follower
// operations, slot resolution and the control loop tying them together.
// All shared state is reached through the ledger gateway.

pub mod errors;
pub mod follower;
pub mod leader;
pub mod monitor;
pub mod pilot;
pub mod resolver;
pub mod role;
pub mod runner;

// Re-export main types
pub use errors::{AgentError, AgentResult};
pub use follower::{ClaimOutcome, FollowerOps};
pub use leader::LeaderOps;
pub use monitor::{current_role, CycleReport, RoleMonitor};
pub use resolver::{PositionResolver, SlotAssignment};
pub use role::{Capabilities, Role, RoleState};
pub use runner::{LaunchMission, SwarmAgent};
