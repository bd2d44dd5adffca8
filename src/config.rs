// Process configuration
// Read once at startup from the environment (and `.env` via dotenv)

use chrono::Duration as ChronoDuration;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::leader::parse_mission_type;
use crate::agents::runner::LaunchMission;
use crate::domain::drone::{BatteryLevel, DroneId, Location};
use crate::domain::mission::MissionId;

fn required(key: &str) -> AgentResult<String> {
    std::env::var(key).map_err(|_| AgentError::ConfigError(format!("{} must be set", key)))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse<T: FromStr>(key: &str, raw: &str) -> AgentResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AgentError::ConfigError(format!("{}={:?}: {}", key, raw, e)))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> AgentResult<T>
where
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

fn swarm_size() -> AgentResult<u32> {
    let size: u32 = parse("NUMB_DRONES", &required("NUMB_DRONES")?)?;
    if size < 2 {
        return Err(AgentError::ConfigError(format!(
            "NUMB_DRONES must be at least 2, got {}",
            size
        )));
    }
    Ok(size)
}

fn jwt_secret() -> String {
    optional("LEDGER_JWT_SECRET").unwrap_or_else(|| {
        tracing::warn!("LEDGER_JWT_SECRET not set, using default");
        "dev-ledger-secret".to_string()
    })
}

/// Settings for one drone agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub swarm_size: u32,
    pub drone_id: DroneId,
    pub location: Location,
    pub battery: BatteryLevel,
    pub poll_interval: Duration,
    pub formation_spacing: f64,
    pub jwt_secret: String,
    pub mission_id: Option<MissionId>,
    pub launch_mission: Option<LaunchMission>,
    pub ledger_timeout: Duration,
    pub home_altitude_m: f64,
}

impl AgentConfig {
    pub fn from_env() -> AgentResult<Self> {
        let location = Location::parse(&required("DRONE_LOCATION")?)
            .map_err(|e| AgentError::ConfigError(format!("DRONE_LOCATION: {}", e)))?;
        let battery = BatteryLevel::new(parse("DRONE_BATTERY", &required("DRONE_BATTERY")?)?)
            .map_err(|e| AgentError::ConfigError(format!("DRONE_BATTERY: {}", e)))?;

        let launch_mission = match (optional("MISSION_NAME"), optional("MISSION_TYPE")) {
            (Some(name), Some(raw)) => Some(LaunchMission {
                name,
                mission_type: parse_mission_type(parse("MISSION_TYPE", &raw)?)?,
            }),
            (None, None) => None,
            _ => {
                return Err(AgentError::ConfigError(
                    "MISSION_NAME and MISSION_TYPE must be set together".to_string(),
                ))
            }
        };

        Ok(Self {
            rpc_url: required("URL_RPC")?,
            contract_address: required("CONTR_ADD")?,
            swarm_size: swarm_size()?,
            drone_id: DroneId(parse("DRONE_ID", &required("DRONE_ID")?)?),
            location,
            battery,
            poll_interval: Duration::from_millis(parse_or("POLL_INTERVAL_MS", 1000)?),
            formation_spacing: parse_or("FORMATION_SPACING", 3.0)?,
            jwt_secret: jwt_secret(),
            mission_id: optional("MISSION_ID")
                .map(|raw| parse("MISSION_ID", &raw).map(MissionId))
                .transpose()?,
            launch_mission,
            ledger_timeout: Duration::from_millis(parse_or("LEDGER_TIMEOUT_MS", 5000)?),
            home_altitude_m: parse_or("HOME_ALTITUDE_M", 488.0)?,
        })
    }
}

/// Settings for a ledger node
#[derive(Debug, Clone)]
pub struct LedgerNodeConfig {
    pub bind_addr: SocketAddr,
    pub contract_address: String,
    pub swarm_size: u32,
    pub leader_id: DroneId,
    pub heartbeat_timeout: ChronoDuration,
    pub jwt_secret: String,
    pub database_url: Option<String>,
}

impl LedgerNodeConfig {
    pub fn from_env() -> AgentResult<Self> {
        let bind_addr = parse_or(
            "LEDGER_BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8545)),
        )?;

        Ok(Self {
            bind_addr,
            contract_address: required("CONTR_ADD")?,
            swarm_size: swarm_size()?,
            leader_id: DroneId(parse_or("LEADER_ID", 0)?),
            heartbeat_timeout: ChronoDuration::seconds(parse_or("HEARTBEAT_TIMEOUT_SECS", 30)?),
            jwt_secret: jwt_secret(),
            database_url: optional("DATABASE_URL"),
        })
    }

    /// Claimable slots: everyone but the leader
    pub fn position_count(&self) -> u32 {
        self.swarm_size - 1
    }
}
