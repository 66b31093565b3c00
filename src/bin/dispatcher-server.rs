//! Dispatcher server binary
//!
//! Standalone HTTP server exposing graph submission, node control, render
//! node registration and the assignment loop driving them.

use std::sync::Arc;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::Mutex;

use octopus_dispatch::api::routes::create_router;
use octopus_dispatch::api::ws::BroadcastState;
use octopus_dispatch::assignment::{AssignmentTick, LicenceRegistry};
use octopus_dispatch::config::DispatcherConfig;
use octopus_dispatch::db::{DatabaseConnection, PersistenceMapper};
use octopus_dispatch::executor::HttpWorkerClient;
use octopus_dispatch::tree::DispatchTree;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("loading dispatcher configuration");
    let config = DispatcherConfig::load()?;
    tracing::info!(port = config.port, address = %config.address, db_url = %config.db_url, "configuration loaded");

    let db = DatabaseConnection::new(&config.db_url).await?;
    tracing::info!("running database migrations");
    db.run_migrations().await?;
    db.health_check().await?;

    if config.db_clean_data {
        tracing::warn!("db_clean_data set, starting from an empty dispatch tree");
    }
    let tree = if config.db_clean_data {
        DispatchTree::new()
    } else {
        tracing::info!("restoring dispatch tree from persistence");
        PersistenceMapper::restore(db.pool()).await?
    };
    let tree = Arc::new(Mutex::new(tree));

    let licences = Arc::new(Mutex::new(LicenceRegistry::new()));
    let broadcast = Arc::new(BroadcastState::new());
    let server_uuid = uuid::Uuid::new_v4().to_string();
    tracing::info!(server_uuid = %server_uuid, "assigned server identity");

    spawn_assignment_loop(
        tree.clone(),
        licences.clone(),
        db.clone(),
        config.render_node_timeout(),
    );

    let app = create_router(db, broadcast, tree, licences, server_uuid);

    let addr: SocketAddr = format!("{}:{}", config.address, config.port).parse()?;
    tracing::info!("starting dispatcher server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("dispatcher server shut down gracefully");
    Ok(())
}

/// Drives the assignment loop on a fixed interval against the shared tree
/// and licence registry, persisting whatever it binds.
fn spawn_assignment_loop(
    tree: Arc<Mutex<DispatchTree>>,
    licences: Arc<Mutex<LicenceRegistry>>,
    db: DatabaseConnection,
    render_node_timeout: chrono::Duration,
) {
    tokio::spawn(async move {
        let tick = AssignmentTick::new(render_node_timeout);
        let worker_client = HttpWorkerClient::new();
        let mut interval = tokio::time::interval(Duration::from_secs(2));
        loop {
            interval.tick().await;
            let mut tree_guard = tree.lock().await;
            let mut licences_guard = licences.lock().await;
            let outcome = tick.run(&mut tree_guard, &mut licences_guard, &worker_client).await;
            if !outcome.bound.is_empty() {
                if let Err(e) = PersistenceMapper::flush(db.pool(), &mut tree_guard).await {
                    tracing::error!(error = %e, "failed to persist assignment tick");
                }
                tracing::info!(bound = outcome.bound.len(), "assignment tick bound commands");
            }
            if !outcome.dispatch_failed.is_empty() {
                tracing::warn!(failed = outcome.dispatch_failed.len(), "dispatch failures this tick");
            }
        }
    });
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM signal, shutting down");
        }
    }
}
