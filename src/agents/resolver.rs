use serde::{Deserialize, Serialize};

use crate::domain::drone::Drone;
use crate::domain::formation::{self, Point};
use crate::domain::mission::Mission;

use super::errors::{AgentError, AgentResult};
use super::follower::{ClaimOutcome, FollowerOps};

/// A slot a follower now holds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// 1-based ledger slot number
    pub position: u32,
    /// Slot coordinate relative to the leader
    pub point: Point,
    /// Distance from the follower's relative position to the slot
    pub distance: f64,
    /// Claims submitted, including the successful one
    pub attempts: usize,
}

struct Candidate {
    position: u32,
    point: Point,
    distance: f64,
}

/// Picks and claims the closest free slot, retrying on conflicts
///
/// Available positions are read once. Each rejected claim removes that slot
/// from the candidate list, so the number of claims never exceeds the size
/// of that first read.
#[derive(Debug, Clone, Copy)]
pub struct PositionResolver {
    swarm_size: usize,
    spacing: f64,
}

impl PositionResolver {
    pub fn new(swarm_size: usize, spacing: f64) -> Self {
        Self {
            swarm_size,
            spacing,
        }
    }

    /// Claims the free slot nearest to `relative`
    ///
    /// # Arguments
    /// * `follower` - Ops of the claiming drone
    /// * `relative` - The drone's position relative to the leader
    /// * `slots` - Assignable coordinates; slot `k` is `slots[k - 1]`
    ///
    /// # Returns
    /// * `Ok(SlotAssignment)` - The claim the ledger accepted
    /// * `Err(AgentError::ExhaustedCandidates)` - Every candidate was rejected
    /// * `Err(AgentError::Ledger(_))` - Timeout or network failure, aborts immediately
    pub async fn resolve(
        &self,
        follower: &FollowerOps,
        relative: Point,
        slots: &[Point],
    ) -> AgentResult<SlotAssignment> {
        let available = follower.available_positions().await?;
        let distances = formation::distances_from(&relative, slots);

        let mut candidates: Vec<Candidate> = available
            .iter()
            .filter_map(|&position| {
                let index = (position as usize).checked_sub(1)?;
                Some(Candidate {
                    position,
                    point: *slots.get(index)?,
                    distance: distances[index],
                })
            })
            .collect();

        tracing::debug!(
            drone_id = %follower.id(),
            "Resolving slot among {} candidates ({} available)",
            candidates.len(),
            available.len()
        );

        let mut attempts = 0;
        while let Some(index) = closest(&candidates) {
            let candidate = candidates.swap_remove(index);
            attempts += 1;

            match follower.try_claim(candidate.position).await? {
                ClaimOutcome::Claimed(_) => {
                    return Ok(SlotAssignment {
                        position: candidate.position,
                        point: candidate.point,
                        distance: candidate.distance,
                        attempts,
                    });
                }
                ClaimOutcome::Rejected { .. } => continue,
            }
        }

        Err(AgentError::ExhaustedCandidates {
            attempted: attempts,
        })
    }

    /// Resolves a slot in `mission`'s formation around the leader's latest
    /// submitted location
    pub async fn resolve_for_mission(
        &self,
        follower: &FollowerOps,
        mission: &Mission,
        own: &Drone,
    ) -> AgentResult<SlotAssignment> {
        let leader_location = follower.leader_location().await?;
        let relative = own.relative_position(&leader_location);
        let slots =
            formation::assignable_slots(mission.formation_type(), self.swarm_size, self.spacing);

        tracing::info!(
            drone_id = %follower.id(),
            mission_id = %mission.id(),
            "Joining {} formation from ({}, {})",
            mission.formation_type(),
            relative.x,
            relative.y
        );

        self.resolve(follower, relative, &slots).await
    }
}

/// Index of the nearest candidate; ties go to the lower slot number
fn closest(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.position.cmp(&b.position))
        })
        .map(|(index, _)| index)
}
