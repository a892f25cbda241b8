//! BoardVault Service Binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use boardvault_common::{AuditLogger, VERSION};
use boardvault_custody::{CustodyVault, InMemoryPayoutRail};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardvault_service::{create_router, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting BoardVault service v{}", VERSION);

    let config = ServiceConfig::load()?;
    info!("Loaded configuration: {:?}", config);

    let (members, initiator) = config.resolve_identities()?;
    let rail = Arc::new(InMemoryPayoutRail::new());

    let mut audit = AuditLogger::new();
    audit.set_min_severity(config.audit_min_severity);

    let vault = CustodyVault::open(
        members,
        initiator.clone(),
        rail.clone(),
        config.vault_options(),
        audit,
    )?;
    info!(
        "Vault opened: board_size={}, initiator={}, trigger={:?}, allow_cancel={}",
        config.board.size, initiator, config.release.trigger, config.release.allow_cancel
    );

    let app = create_router(AppState::new(vault, rail));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("REST API listening on {}", addr);

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Shutting down BoardVault service");
    Ok(())
}
