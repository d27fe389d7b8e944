//! Bearer token authentication for the FHIR routes

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AuthError, Authenticator};
use crate::error::AppError;

/// Authentication state shared by every protected request
#[derive(Clone)]
pub struct BearerAuth {
    authenticator: Arc<dyn Authenticator>,
}

impl BearerAuth {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Resolve the caller and attach its [`Principal`](crate::auth::Principal) to the request.
pub async fn auth_middleware(mut request: Request<Body>, next: Next) -> Response {
    let Some(auth) = request.extensions().get::<BearerAuth>().cloned() else {
        return AppError::Internal("Authentication layer not configured".into()).into_response();
    };

    let Some(token) = bearer_token(request.headers()) else {
        return AppError::Unauthorized("Missing bearer token".into()).into_response();
    };

    match auth.authenticator.authenticate(token).await {
        Ok(principal) => {
            tracing::debug!(subject = %principal.subject, "Authenticated request");
            request.extensions_mut().insert(principal.clone());
            let mut response = next.run(request).await;
            // Surfaced to outer layers such as the audit log.
            response.extensions_mut().insert(principal);
            response
        }
        Err(err) => {
            tracing::info!(error = %err, "Rejected bearer token");
            let message = match err {
                AuthError::Expired => "Bearer token expired".to_string(),
                AuthError::InvalidToken(_) => "Invalid bearer token".to_string(),
            };
            AppError::Unauthorized(message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn ignores_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
