//! Audit logging middleware for mutations

use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};

use super::request_id::RequestId;
use crate::auth::Principal;

/// Log every POST, PUT and DELETE under the `audit` target, with the caller and outcome.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    if !matches!(method, Method::POST | Method::PUT | Method::DELETE) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    // The principal is attached further in, so it travels back on the response.
    let subject = response
        .extensions()
        .get::<Principal>()
        .map(|p| p.subject.as_str())
        .unwrap_or("anonymous");

    tracing::info!(
        target: "audit",
        request_id = %request_id,
        subject = %subject,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Patient mutation"
    );

    response
}
