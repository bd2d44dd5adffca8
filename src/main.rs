use std::sync::Arc;

use swarm_formation::agents::SwarmAgent;
use swarm_formation::config::AgentConfig;
use swarm_formation::domain::drone::Drone;
use swarm_formation::infrastructure::flight::SimulatedFlightController;
use swarm_formation::infrastructure::ledger::HttpLedgerGateway;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AgentConfig::from_env().expect("Invalid agent configuration");

    let ledger = HttpLedgerGateway::new(
        &config.rpc_url,
        &config.contract_address,
        &config.jwt_secret,
        config.ledger_timeout,
    )
    .expect("Failed to create ledger gateway");

    tracing::info!(
        "Connecting {} to ledger {} at {}",
        config.drone_id,
        config.contract_address,
        config.rpc_url
    );

    let drone = Drone::new(config.drone_id, config.location, config.battery);
    let flight = Arc::new(SimulatedFlightController::new(config.home_altitude_m));

    let mut agent = SwarmAgent::new(
        drone,
        Arc::new(ledger),
        flight,
        config.swarm_size,
        config.formation_spacing,
    );
    if let Some(mission_id) = config.mission_id {
        agent = agent.with_mission(mission_id);
    }
    if let Some(launch) = config.launch_mission {
        agent = agent.with_launch_mission(launch);
    }

    agent
        .run(config.poll_interval, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await;
}
