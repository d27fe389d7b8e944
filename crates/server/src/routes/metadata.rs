//! Metadata endpoint handler

use axum::Json;
use chrono::Utc;
use patient_core::CapabilityStatement;

/// GET /metadata - Return server capability statement
pub async fn get() -> Json<CapabilityStatement> {
    let today = Utc::now().format("%Y-%m-%d").to_string();
    Json(CapabilityStatement::new(&today))
}
