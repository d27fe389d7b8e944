//! patient-server: FHIR Patient HTTP server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patient_server::config::{Config, StorageBackend};
use patient_server::db::{self, DynPatientStore, InMemoryPatientStore, PgPatientStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let store: DynPatientStore = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool =
                db::create_pool(&config.database_url).expect("Failed to create database pool");
            let store = PgPatientStore::new(pool);
            store
                .migrate()
                .await
                .expect("Failed to apply patients schema");
            tracing::info!("Using PostgreSQL patient store");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory patient store; data is lost on shutdown");
            Arc::new(InMemoryPatientStore::new())
        }
    };

    tracing::info!(group = %config.privileged_group, "Patient creation restricted to group");
    tracing::info!("Rate limiting: {} requests/second", config.rate_limit_rps);

    let app = patient_server::build_app(store, &config);

    let addr: SocketAddr = config.bind_address.parse().expect("Invalid bind address");
    tracing::info!("Starting FHIR Patient server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server shutdown complete");
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
