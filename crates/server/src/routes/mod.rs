pub mod health;
pub mod metadata;
pub mod metrics;
mod patient;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::db::DynPatientStore;

/// Build FHIR routes
pub fn fhir_routes() -> Router<DynPatientStore> {
    Router::new()
        .route("/Patient", get(patient::list).post(patient::create))
        .route("/Patient/$validate", post(patient::validate))
        .route(
            "/Patient/{id}",
            get(patient::read)
                .put(patient::update)
                .delete(patient::delete),
        )
        .route("/Patient/{id}/delete", delete(patient::delete))
}
