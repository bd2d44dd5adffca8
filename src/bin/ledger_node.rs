use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use swarm_formation::api::{router, AppState};
use swarm_formation::config::LedgerNodeConfig;
use swarm_formation::domain::ledger::LedgerGateway;
use swarm_formation::infrastructure::ledger::{InMemoryLedger, PostgresLedger};
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

    let config = LedgerNodeConfig::from_env().expect("Invalid ledger node configuration");

    let ledger: Arc<dyn LedgerGateway> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .expect("Failed to connect to database");

            let ledger = PostgresLedger::new(pool, &config.contract_address);
            ledger.migrate().await.expect("Failed to create ledger tables");
            let deployed = ledger
                .deploy(config.leader_id, config.position_count(), config.heartbeat_timeout)
                .await
                .expect("Failed to deploy contract");

            if deployed {
                tracing::info!(
                    "Deployed contract {} led by {}",
                    config.contract_address,
                    config.leader_id
                );
            } else {
                tracing::info!("Resuming contract {}", config.contract_address);
            }
            Arc::new(ledger)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, ledger state will not survive restarts");
            Arc::new(InMemoryLedger::deploy(
                config.leader_id,
                config.position_count(),
                config.heartbeat_timeout,
            ))
        }
    };

    let app = router(AppState::new(ledger, &config.contract_address, &config.jwt_secret));

    tracing::info!("Ledger node listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed");
}
