//! patient-server library crate
//!
//! Exposes `build_app`, `config` and the storage backends for integration tests.
//! The actual binary entrypoint is in `main.rs`.

pub mod auth;
pub mod config;
pub mod db;
mod error;
mod middleware;
mod routes;

use std::sync::Arc;

use axum::{Extension, Router, http::HeaderValue, middleware as axum_mw, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{ClaimsAuthorizer, GroupPolicy, JwtAuthenticator};
use config::Config;
use db::DynPatientStore;
use middleware::BearerAuth;

pub use error::AppError;

/// Build the full application router with all routes and middleware.
///
/// Extracted from `main()` so integration tests can construct the app
/// without binding to a TCP port.
pub fn build_app(store: DynPatientStore, config: &Config) -> Router {
    let auth = BearerAuth::new(Arc::new(JwtAuthenticator::new(&config.jwt_secret)));
    let policy = GroupPolicy::new(Arc::new(ClaimsAuthorizer), config.privileged_group.clone());
    let rate_limiter = middleware::create_rate_limiter(config.rate_limit_rps);

    // Every Patient interaction needs a bearer token; creation also checks the group policy.
    let protected_routes = Router::new()
        .nest("/fhir", routes::fhir_routes())
        .layer(Extension(policy))
        .layer(axum_mw::from_fn(middleware::auth_middleware))
        .layer(Extension(auth))
        .layer(axum_mw::from_fn(middleware::rate_limit_middleware))
        .layer(Extension(rate_limiter));

    // build_recorder() + set_global_recorder() tolerates repeated calls (one
    // per test app); only the first install wins but every handle renders.
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let prometheus_handle = recorder.handle();
    let _ = metrics::set_global_recorder(recorder);

    let public_routes = Router::new()
        .route("/metadata", get(routes::metadata::get))
        .route("/health", get(routes::health::check))
        .route("/metrics", get(routes::metrics::get))
        .layer(Extension(prometheus_handle));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(store)
        .layer(axum_mw::from_fn(middleware::audit_middleware))
        .layer(axum_mw::from_fn(middleware::request_id_middleware))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(axum_mw::from_fn(middleware::metrics_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
