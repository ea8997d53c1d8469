mod cli;
mod error;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gateway_core::GatewayAdapter;
use gateway_core::GatewayConfig;
use gateway_core::approval::ApprovalQueue;
use gateway_core::approval::InMemoryTtlStore;
use gateway_core::audit::AuditLogger;
use gateway_core::path_validator::PathValidator;
use gateway_core::tree_index::TreeIndexer;
use tracing::info;
use tracing::warn;

use crate::cli::ServerCli;
use crate::state::AppState;

const DEFAULT_PORT: u16 = 9500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("warning: failed to load .env: {err}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = ServerCli::parse();
    let config = cli.apply_overrides(GatewayConfig::from_env());
    let port = cli.port.or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok())).unwrap_or(DEFAULT_PORT);

    info!("starting gateway-server on port {port}, workspace root {}", config.workspace_root.display());

    let validator = Arc::new(PathValidator::new(config.workspace_root.clone(), config.blocked_patterns.clone()));

    let tree = Arc::new(TreeIndexer::new(
        config.workspace_root.clone(),
        &config.index_db_path,
        config.index_debounce_ms,
    )?);
    tree.start().await?;

    let audit_dir = config
        .index_db_path
        .parent()
        .map(|p| p.join("audit"))
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp/gateway/audit"));
    let audit = Arc::new(AuditLogger::new(&audit_dir)?);

    let approvals = Arc::new(ApprovalQueue::new(
        Arc::new(InMemoryTtlStore::new()),
        Duration::from_secs(config.approval_ttl_secs),
    ));

    let adapter = Arc::new(GatewayAdapter::new(
        validator,
        Arc::clone(&tree),
        Arc::clone(&approvals),
        audit,
        config.clone(),
    ));

    let state = AppState { adapter, approvals, config: Arc::new(config) };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tree.stop().await;
    info!("gateway-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to install ctrl-c handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => warn!("failed to install SIGTERM handler: {err}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
