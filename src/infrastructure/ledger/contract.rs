//! Reference swarm contract
//!
//! The authoritative rules the coordination protocol relies on, written as a
//! deterministic state machine. Ledger adapters own one instance, serialize
//! access to it, and feed it the caller identity and the current time.
//!
//! A rejected transaction leaves the state untouched: every branch validates
//! before it mutates.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::domain::drone::{BatteryLevel, DroneId, Location};
use crate::domain::ledger::{
    CallResult, DroneRecord, LedgerError, LedgerEvent, LedgerResult, Query, Receipt, Transaction,
};
use crate::domain::mission::{Mission, MissionEvent, MissionId};

/// Contract state for one swarm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmContract {
    leader: DroneId,
    members: BTreeSet<DroneId>,
    batteries: BTreeMap<DroneId, BatteryLevel>,
    last_heartbeat: DateTime<Utc>,
    heartbeat_timeout_ms: i64,
    position_count: u32,
    positions: BTreeMap<u32, DroneId>,
    missions: Vec<Mission>,
    records: Vec<DroneRecord>,
    block_number: u64,
}

impl SwarmContract {
    /// Deploys a fresh contract with `leader` as the only member
    ///
    /// # Arguments
    /// * `leader` - Deploying drone; leads until an election replaces it
    /// * `position_count` - Number of claimable slots (swarm size minus the leader)
    /// * `heartbeat_timeout` - Silence after which the leader is judged dead
    /// * `now` - Deployment time; the leader's heartbeat clock starts here
    pub fn deploy(
        leader: DroneId,
        position_count: u32,
        heartbeat_timeout: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            leader,
            members: BTreeSet::from([leader]),
            batteries: BTreeMap::new(),
            last_heartbeat: now,
            heartbeat_timeout_ms: heartbeat_timeout.num_milliseconds(),
            position_count,
            positions: BTreeMap::new(),
            missions: Vec::new(),
            records: Vec::new(),
            block_number: 0,
        }
    }

    /// Executes a transaction and returns its receipt
    ///
    /// Rejections come back as [`LedgerError::Rejected`] and consume no block.
    pub fn commit(
        &mut self,
        caller: DroneId,
        tx: &Transaction,
        now: DateTime<Utc>,
    ) -> LedgerResult<Receipt> {
        let events = self
            .execute(caller, tx, now)
            .map_err(|reason| LedgerError::rejected(tx.function_name(), reason))?;

        self.block_number += 1;

        Ok(Receipt {
            tx_hash: Uuid::new_v4(),
            block_number: self.block_number,
            caller,
            function: tx.function_name().to_string(),
            events,
        })
    }

    /// Answers a read-only query against the current state
    pub fn answer(&self, query: &Query, now: DateTime<Utc>) -> LedgerResult<CallResult> {
        match query {
            Query::Leader => Ok(CallResult::Leader(self.leader)),
            Query::LeaderIsAlive => Ok(CallResult::LeaderIsAlive(self.leader_is_alive(now))),
            Query::GetAvailablePositions => {
                Ok(CallResult::AvailablePositions(self.available_positions()))
            }
            Query::GetDroneData => Ok(CallResult::DroneData(self.records.clone())),
            Query::GetMission { mission_id } => self
                .mission(*mission_id)
                .cloned()
                .map(CallResult::Mission)
                .map_err(|reason| LedgerError::rejected(query.function_name(), reason)),
        }
    }

    fn execute(
        &mut self,
        caller: DroneId,
        tx: &Transaction,
        now: DateTime<Utc>,
    ) -> Result<Vec<LedgerEvent>, String> {
        match tx {
            Transaction::AddDrone { drone } => {
                self.require_leader(caller)?;
                if !self.members.insert(*drone) {
                    return Err(format!("{} is already registered", drone));
                }
                Ok(vec![LedgerEvent::DroneAdded { drone: *drone }])
            }

            Transaction::RemoveDrone { drone } => {
                self.require_leader(caller)?;
                if *drone == self.leader {
                    return Err("the leader cannot be removed".to_string());
                }
                if !self.members.remove(drone) {
                    return Err(format!("{} is not registered", drone));
                }
                self.batteries.remove(drone);
                self.positions.retain(|_, holder| holder != drone);
                Ok(vec![LedgerEvent::DroneRemoved { drone: *drone }])
            }

            Transaction::CreateMission {
                name,
                mission_type,
                formation_type,
            } => {
                self.require_leader(caller)?;
                let id = MissionId(self.missions.len() as u64);
                let (mission, event) =
                    Mission::new(id, name.clone(), *mission_type, *formation_type)?;
                self.missions.push(mission);
                Ok(vec![LedgerEvent::Mission(event)])
            }

            Transaction::UpdateMission {
                mission_id,
                name,
                mission_type,
                formation_type,
            } => {
                self.require_leader(caller)?;
                let event = self.mission_mut(*mission_id)?.update(
                    name.clone(),
                    *mission_type,
                    *formation_type,
                )?;
                Ok(vec![LedgerEvent::Mission(event)])
            }

            Transaction::ActivateMission { mission_id } => {
                self.require_leader(caller)?;
                let event = self.mission_mut(*mission_id)?.activate()?;
                Ok(vec![LedgerEvent::Mission(event)])
            }

            Transaction::DeactivateMission { mission_id } => {
                self.require_leader(caller)?;
                let event = self.mission_mut(*mission_id)?.deactivate()?;
                Ok(vec![LedgerEvent::Mission(event)])
            }

            Transaction::AssignPosition { position } => {
                self.require_member(caller)?;
                if caller == self.leader {
                    return Err("the leader holds the formation origin".to_string());
                }
                if *position == 0 || *position > self.position_count {
                    return Err(format!(
                        "position {} is outside 1..={}",
                        position, self.position_count
                    ));
                }
                if let Some(held) = self.position_of(caller) {
                    return Err(format!("{} already holds position {}", caller, held));
                }
                if let Some(holder) = self.positions.get(position) {
                    return Err(format!("position {} is already taken by {}", position, holder));
                }
                self.positions.insert(*position, caller);
                Ok(vec![LedgerEvent::PositionAssigned {
                    drone: caller,
                    position: *position,
                }])
            }

            Transaction::SubmitData { location, data } => {
                self.require_member(caller)?;
                let location = Location::parse(location)?;
                self.records.push(DroneRecord {
                    location: location.to_string(),
                    data: data.clone(),
                    sender: caller,
                    submitted_at: now,
                });
                Ok(vec![LedgerEvent::DataSubmitted { sender: caller }])
            }

            Transaction::SendHeartbeat => {
                self.require_leader(caller)?;
                self.last_heartbeat = now;
                Ok(vec![LedgerEvent::Heartbeat {
                    leader: caller,
                    at: now,
                }])
            }

            Transaction::SubmitBatteryLevel { battery } => {
                self.require_member(caller)?;
                self.batteries.insert(caller, *battery);
                Ok(vec![LedgerEvent::BatterySubmitted {
                    drone: caller,
                    battery: *battery,
                }])
            }

            Transaction::CheckLeaderStatus => {
                self.require_member(caller)?;
                if self.leader_is_alive(now) {
                    return Ok(Vec::new());
                }
                Ok(self.elect(now).into_iter().collect())
            }
        }
    }

    /// Replaces a silent leader with the follower reporting the most battery
    ///
    /// Ties go to the lowest drone id. Drones that never reported count as
    /// empty. Returns `None` when no other member exists.
    fn elect(&mut self, now: DateTime<Utc>) -> Option<LedgerEvent> {
        let previous = self.leader;
        let (winner, battery) = self
            .members
            .iter()
            .filter(|id| **id != previous)
            .map(|id| (*id, self.battery_of(*id)))
            // highest battery first, then lowest id
            .max_by(|(a_id, a_bat), (b_id, b_bat)| a_bat.cmp(b_bat).then(b_id.cmp(a_id)))?;

        self.leader = winner;
        self.last_heartbeat = now;
        // The new leader moves to the origin and frees its slot
        self.positions.retain(|_, holder| *holder != winner);

        Some(LedgerEvent::LeaderElected {
            previous,
            leader: winner,
            battery,
        })
    }

    fn require_leader(&self, caller: DroneId) -> Result<(), String> {
        if caller != self.leader {
            return Err(format!("{} is not the leader", caller));
        }
        Ok(())
    }

    fn require_member(&self, caller: DroneId) -> Result<(), String> {
        if !self.members.contains(&caller) {
            return Err(format!("{} is not a registered swarm member", caller));
        }
        Ok(())
    }

    fn mission_mut(&mut self, id: MissionId) -> Result<&mut Mission, String> {
        self.missions
            .get_mut(id.0 as usize)
            .ok_or_else(|| format!("mission {} does not exist", id))
    }

    // ===== Getters =====

    pub fn leader(&self) -> DroneId {
        self.leader
    }

    pub fn is_member(&self, drone: DroneId) -> bool {
        self.members.contains(&drone)
    }

    pub fn battery_of(&self, drone: DroneId) -> BatteryLevel {
        self.batteries.get(&drone).copied().unwrap_or(BatteryLevel::EMPTY)
    }

    pub fn leader_is_alive(&self, now: DateTime<Utc>) -> bool {
        now - self.last_heartbeat <= Duration::milliseconds(self.heartbeat_timeout_ms)
    }

    pub fn available_positions(&self) -> Vec<u32> {
        (1..=self.position_count)
            .filter(|p| !self.positions.contains_key(p))
            .collect()
    }

    pub fn position_of(&self, drone: DroneId) -> Option<u32> {
        self.positions
            .iter()
            .find_map(|(position, holder)| (*holder == drone).then_some(*position))
    }

    pub fn mission(&self, id: MissionId) -> Result<&Mission, String> {
        self.missions
            .get(id.0 as usize)
            .ok_or_else(|| format!("mission {} does not exist", id))
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mission::{FormationType, MissionStatus, MissionType};

    const LEADER: DroneId = DroneId(0);

    fn deployed(positions: u32) -> (SwarmContract, DateTime<Utc>) {
        let now = Utc::now();
        let mut contract = SwarmContract::deploy(LEADER, positions, Duration::seconds(30), now);
        for id in 1..=positions {
            contract
                .commit(LEADER, &Transaction::AddDrone { drone: DroneId(id) }, now)
                .unwrap();
        }
        (contract, now)
    }

    fn battery(contract: &mut SwarmContract, drone: u32, level: u8, now: DateTime<Utc>) {
        contract
            .commit(
                DroneId(drone),
                &Transaction::SubmitBatteryLevel {
                    battery: BatteryLevel::new(level).unwrap(),
                },
                now,
            )
            .unwrap();
    }

    fn create_mission(contract: &mut SwarmContract, now: DateTime<Utc>) -> MissionId {
        contract
            .commit(
                LEADER,
                &Transaction::CreateMission {
                    name: "Search grid".to_string(),
                    mission_type: MissionType::Search,
                    formation_type: FormationType::Ring,
                },
                now,
            )
            .unwrap()
            .created_mission()
            .unwrap()
    }

    #[test]
    fn only_leader_adds_drones() {
        let (mut contract, now) = deployed(2);
        let err = contract
            .commit(DroneId(1), &Transaction::AddDrone { drone: DroneId(9) }, now)
            .unwrap_err();
        assert!(err.is_rejection());
        assert!(!contract.is_member(DroneId(9)));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let (mut contract, now) = deployed(2);
        let result = contract.commit(LEADER, &Transaction::AddDrone { drone: DroneId(1) }, now);
        assert!(result.is_err());
    }

    #[test]
    fn rejected_transactions_do_not_consume_blocks() {
        let (mut contract, now) = deployed(2);
        let before = contract.block_number();
        let _ = contract.commit(DroneId(1), &Transaction::SendHeartbeat, now);
        assert_eq!(contract.block_number(), before);
    }

    #[test]
    fn mission_ids_are_sequential() {
        let (mut contract, now) = deployed(1);
        assert_eq!(create_mission(&mut contract, now), MissionId(0));
        assert_eq!(create_mission(&mut contract, now), MissionId(1));
    }

    #[test]
    fn follower_cannot_create_mission() {
        let (mut contract, now) = deployed(1);
        let result = contract.commit(
            DroneId(1),
            &Transaction::CreateMission {
                name: "x".to_string(),
                mission_type: MissionType::Search,
                formation_type: FormationType::Ring,
            },
            now,
        );
        assert!(result.unwrap_err().is_rejection());
    }

    #[test]
    fn deactivate_created_mission_is_rejected() {
        let (mut contract, now) = deployed(1);
        let id = create_mission(&mut contract, now);
        let tx = Transaction::DeactivateMission { mission_id: id };
        let result = contract.commit(LEADER, &tx, now);
        assert!(result.unwrap_err().is_rejection());
        assert_eq!(contract.mission(id).unwrap().status(), MissionStatus::Created);
    }

    #[test]
    fn activate_inactive_mission() {
        let (mut contract, now) = deployed(1);
        let id = create_mission(&mut contract, now);
        for tx in [
            Transaction::ActivateMission { mission_id: id },
            Transaction::DeactivateMission { mission_id: id },
            Transaction::ActivateMission { mission_id: id },
        ] {
            contract.commit(LEADER, &tx, now).unwrap();
        }
        assert_eq!(contract.mission(id).unwrap().status(), MissionStatus::Active);
    }

    #[test]
    fn unknown_mission_is_rejected() {
        let (contract, now) = deployed(1);
        let result = contract.answer(&Query::GetMission { mission_id: MissionId(42) }, now);
        assert!(result.unwrap_err().is_rejection());
    }

    #[test]
    fn slot_cannot_be_assigned_twice() {
        let (mut contract, now) = deployed(3);
        contract
            .commit(DroneId(1), &Transaction::AssignPosition { position: 2 }, now)
            .unwrap();
        let err = contract
            .commit(DroneId(2), &Transaction::AssignPosition { position: 2 }, now)
            .unwrap_err();
        assert!(err.to_string().contains("already taken"));
        assert_eq!(contract.position_of(DroneId(1)), Some(2));
        assert_eq!(contract.available_positions(), vec![1, 3]);
    }

    #[test]
    fn drone_cannot_hold_two_slots() {
        let (mut contract, now) = deployed(3);
        contract
            .commit(DroneId(1), &Transaction::AssignPosition { position: 1 }, now)
            .unwrap();
        let err = contract
            .commit(DroneId(1), &Transaction::AssignPosition { position: 3 }, now)
            .unwrap_err();
        assert!(err.to_string().contains("already holds position 1"));
    }

    #[test]
    fn out_of_range_and_leader_claims_rejected() {
        let (mut contract, now) = deployed(3);
        assert!(contract
            .commit(DroneId(1), &Transaction::AssignPosition { position: 0 }, now)
            .is_err());
        assert!(contract
            .commit(DroneId(1), &Transaction::AssignPosition { position: 4 }, now)
            .is_err());
        assert!(contract
            .commit(LEADER, &Transaction::AssignPosition { position: 1 }, now)
            .is_err());
    }

    #[test]
    fn unregistered_drone_cannot_claim() {
        let (mut contract, now) = deployed(2);
        let result = contract.commit(DroneId(7), &Transaction::AssignPosition { position: 1 }, now);
        assert!(result.unwrap_err().to_string().contains("not a registered"));
    }

    #[test]
    fn submit_data_requires_well_formed_location() {
        let (mut contract, now) = deployed(1);
        let bad = Transaction::SubmitData {
            location: "up north".to_string(),
            data: "hello".to_string(),
        };
        assert!(contract.commit(LEADER, &bad, now).is_err());

        let good = Transaction::SubmitData {
            location: "47.397606, 8.54306".to_string(),
            data: "Hello from Leader!".to_string(),
        };
        contract.commit(LEADER, &good, now).unwrap();
        match contract.answer(&Query::GetDroneData, now).unwrap() {
            CallResult::DroneData(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].sender, LEADER);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn live_leader_is_not_replaced() {
        let (mut contract, now) = deployed(2);
        battery(&mut contract, 1, 90, now);
        let receipt = contract
            .commit(
                DroneId(1),
                &Transaction::CheckLeaderStatus,
                now + Duration::seconds(10),
            )
            .unwrap();
        assert!(receipt.events.is_empty());
        assert_eq!(contract.leader(), LEADER);
    }

    #[test]
    fn highest_battery_wins_election() {
        let (mut contract, now) = deployed(3);
        battery(&mut contract, 1, 70, now);
        battery(&mut contract, 2, 95, now);
        battery(&mut contract, 3, 80, now);

        let later = now + Duration::seconds(31);
        let receipt = contract
            .commit(DroneId(1), &Transaction::CheckLeaderStatus, later)
            .unwrap();

        assert_eq!(receipt.elected_leader(), Some(DroneId(2)));
        assert_eq!(contract.leader(), DroneId(2));
        assert!(contract.leader_is_alive(later));
    }

    #[test]
    fn election_is_monotone_in_battery() {
        for (low, high) in [(10u8, 11u8), (0, 100), (54, 99)] {
            let (mut contract, now) = deployed(2);
            battery(&mut contract, 1, high, now);
            battery(&mut contract, 2, low, now);
            contract
                .commit(DroneId(2), &Transaction::CheckLeaderStatus, now + Duration::minutes(5))
                .unwrap();
            assert_eq!(contract.leader(), DroneId(1));
        }
    }

    #[test]
    fn election_tie_goes_to_lowest_id() {
        let (mut contract, now) = deployed(3);
        battery(&mut contract, 3, 88, now);
        battery(&mut contract, 2, 88, now);
        contract
            .commit(DroneId(3), &Transaction::CheckLeaderStatus, now + Duration::minutes(1))
            .unwrap();
        assert_eq!(contract.leader(), DroneId(2));
    }

    #[test]
    fn elected_leader_releases_its_slot() {
        let (mut contract, now) = deployed(2);
        battery(&mut contract, 1, 99, now);
        contract
            .commit(DroneId(1), &Transaction::AssignPosition { position: 2 }, now)
            .unwrap();
        contract
            .commit(DroneId(2), &Transaction::CheckLeaderStatus, now + Duration::minutes(1))
            .unwrap();
        assert_eq!(contract.leader(), DroneId(1));
        assert_eq!(contract.available_positions(), vec![1, 2]);
    }

    #[test]
    fn old_leader_loses_authority_after_election() {
        let (mut contract, now) = deployed(1);
        let later = now + Duration::minutes(1);
        contract
            .commit(DroneId(1), &Transaction::CheckLeaderStatus, later)
            .unwrap();
        let result = contract.commit(LEADER, &Transaction::SendHeartbeat, later);
        assert!(result.unwrap_err().is_rejection());
    }

    #[test]
    fn same_battery_twice_only_sets_value() {
        let (mut contract, now) = deployed(2);
        battery(&mut contract, 1, 77, now);
        let mut once = contract.clone();
        battery(&mut contract, 1, 77, now);
        // Only the block counter moves
        once.block_number = contract.block_number;
        assert_eq!(contract, once);
    }

    #[test]
    fn state_survives_json_round_trip() {
        let (mut contract, now) = deployed(3);
        contract
            .commit(DroneId(2), &Transaction::AssignPosition { position: 3 }, now)
            .unwrap();
        let json = serde_json::to_string(&contract).unwrap();
        let restored: SwarmContract = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, contract);
    }
}
