//! Bearer-token authentication and group-based authorization.
//!
//! Token issuance and group administration live outside this service; the
//! handlers only consume the [`Authenticator`] and [`Authorizer`] capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Claims carried by access tokens accepted by this server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub groups: Vec<String>,
}

/// Verifies a bearer token and resolves the caller it identifies.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Answers group membership questions for an authenticated principal.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn principal_in_group(&self, principal: &Principal, group: &str) -> bool;
}

/// HS256 JWT verification against a shared secret
pub struct JwtAuthenticator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        Ok(Principal {
            subject: data.claims.sub,
            groups: data.claims.groups,
        })
    }
}

/// Membership taken from the `groups` claim of the verified token
pub struct ClaimsAuthorizer;

#[async_trait]
impl Authorizer for ClaimsAuthorizer {
    async fn principal_in_group(&self, principal: &Principal, group: &str) -> bool {
        principal.groups.iter().any(|g| g == group)
    }
}

/// Authorization rule applied to privileged operations
#[derive(Clone)]
pub struct GroupPolicy {
    pub authorizer: Arc<dyn Authorizer>,
    pub group: String,
}

impl GroupPolicy {
    pub fn new(authorizer: Arc<dyn Authorizer>, group: impl Into<String>) -> Self {
        Self {
            authorizer,
            group: group.into(),
        }
    }

    /// Whether `principal` may perform privileged operations
    pub async fn permits(&self, principal: &Principal) -> bool {
        self.authorizer
            .principal_in_group(principal, &self.group)
            .await
    }
}
