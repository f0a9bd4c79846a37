use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};

use routegate::api::routes::{create_router, AppState};
use routegate::backend::OllamaModelService;
use routegate::config::Config;
use routegate::execution::ExecutionCoordinator;
use routegate::observability::{init_tracing, MetricsRegistry};
use routegate::policy::{PolicyLoader, PolicyWatcher};
use routegate::rules::WatchRuleProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting routegate query router"
    );

    let metrics = Arc::new(MetricsRegistry::new());

    // Start policy watcher
    let loader = PolicyLoader::new(config.policy_path.to_string_lossy());
    let watcher =
        PolicyWatcher::new(loader, config.policy_reload_interval()).with_metrics(metrics.clone());
    let (rule_book_rx, policy_handle) = watcher.start();

    let local = Arc::new(OllamaModelService::new(
        "local",
        &config.local_backend_url,
        config.local_model.clone(),
        config.local_timeout(),
    )?);
    info!(url = %local.chat_url(), model = %local.model(), "Local backend configured");

    let mut coordinator = ExecutionCoordinator::new(local)
        .with_rule_provider(Arc::new(WatchRuleProvider::new(rule_book_rx.clone())))
        .with_cloud_timeout(config.cloud_timeout())
        .with_metrics(metrics.clone());

    match config.cloud_backend_url {
        Some(ref url) => {
            let cloud = OllamaModelService::new(
                "cloud",
                url,
                config.cloud_model.clone(),
                config.cloud_timeout(),
            )?;
            info!(url = %cloud.chat_url(), model = %cloud.model(), "Cloud backend configured");
            coordinator = coordinator.with_cloud(Arc::new(cloud));
        }
        None => {
            warn!("No cloud backend configured, force_cloud queries will fail");
        }
    }

    // Create application state
    let state = Arc::new(AppState {
        coordinator: Arc::new(coordinator),
        rule_book_rx,
        metrics,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        let stopping = Arc::new(Notify::new());
        let signalled = stopping.clone();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal().await;
            signalled.notify_one();
        });

        let drain_timeout = config.shutdown_timeout();
        tokio::select! {
            result = async move { server.await } => result?,
            _ = async {
                stopping.notified().await;
                tokio::time::sleep(drain_timeout).await;
            } => {
                warn!(timeout_secs = drain_timeout.as_secs(), "In-flight requests did not drain in time");
            }
        }
    } else {
        axum::serve(listener, app).await?;
    }

    // Cleanup
    info!("Shutting down...");
    policy_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
