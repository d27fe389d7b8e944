//! Rate limiting middleware

use axum::{
    Json,
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

use patient_core::{IssueType, OperationOutcome};

/// Rate limiter state (shared across requests)
pub type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a global limiter allowing `requests_per_second` (at least one)
pub fn create_rate_limiter(requests_per_second: u32) -> SharedRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Reject requests over quota with 429 and a `Retry-After` hint
pub async fn rate_limit_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(limiter) = request.extensions().get::<SharedRateLimiter>().cloned() else {
        return next.run(request).await;
    };

    if let Err(not_until) = limiter.check() {
        let wait = not_until.wait_time_from(DefaultClock::default().now());
        let retry_after = wait.as_secs().max(1);
        tracing::warn!(retry_after, "Rate limit exceeded");

        let outcome = OperationOutcome::error(
            IssueType::Throttled,
            "Rate limit exceeded. Please try again later.",
        );
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(outcome)).into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        return response;
    }

    next.run(request).await
}
