use std::sync::Arc;

use adctx_broker::CorrelationBroker;
use adctx_mcp::{build_orchestrator, router, AppState, McpServer, ServerConfig, SessionRegistry};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env();
    let broker = Arc::new(CorrelationBroker::new());
    let orchestrator = build_orchestrator(&config, broker.clone())
        .context("failed to build memory orchestrator")?;
    info!(
        store = orchestrator.store_mode().as_str(),
        escrow_timeout_ms = config.escrow_timeout.as_millis(),
        relevance_threshold = config.relevance_threshold,
        "memory orchestrator ready"
    );

    let server = McpServer::new(Arc::new(orchestrator), Arc::new(SessionRegistry::new()));
    let app = router(AppState::new(Arc::new(server), broker, config.sse_heartbeat));

    let listener = TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;
    info!(addr = %listener.local_addr()?, "adctxd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    info!("adctxd shutting down");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ADCTX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c"),
        () = terminate => info!("received terminate signal"),
    }
}
