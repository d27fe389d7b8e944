//! Application error handling

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use patient_core::{FhirError, IssueType, OperationOutcome};

/// Diagnostics returned for every unexpected failure; the cause is only logged
const PROCESSING_FAILURE: &str = "An unexpected error occurred while processing the request";

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Document rejected by the validator or codec
    Fhir(FhirError),
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Fhir(FhirError::NotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::Fhir(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn outcome(&self) -> OperationOutcome {
        match self {
            AppError::Fhir(err) => err.to_outcome(),
            AppError::BadRequest(msg) => OperationOutcome::invalid(msg),
            AppError::NotFound(msg) => OperationOutcome::not_found(msg),
            AppError::Unauthorized(msg) => OperationOutcome::error(IssueType::Login, msg),
            AppError::Forbidden(msg) => OperationOutcome::error(IssueType::Forbidden, msg),
            AppError::Internal(_) => OperationOutcome::processing(PROCESSING_FAILURE),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(cause) = &self {
            tracing::error!(error = %cause, "Request failed");
        }

        let mut response = (self.status(), Json(self.outcome())).into_response();
        if matches!(self, AppError::Unauthorized(_)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<FhirError> for AppError {
    fn from(err: FhirError) -> Self {
        AppError::Fhir(err)
    }
}

impl From<deadpool_postgres::PoolError> for AppError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        AppError::Internal(format!("Database pool error: {}", err))
    }
}

impl From<tokio_postgres::Error> for AppError {
    fn from(err: tokio_postgres::Error) -> Self {
        AppError::Internal(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = AppError::from(FhirError::missing("gender"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.outcome().issue[0].code, IssueType::Required);
    }

    #[test]
    fn internal_errors_hide_their_cause() {
        let err = AppError::Internal("connection refused to 10.0.0.7".into());
        let outcome = err.outcome();

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.issue[0].code, IssueType::Processing);
        assert_eq!(outcome.issue[0].diagnostics.as_deref(), Some(PROCESSING_FAILURE));
    }

    #[test]
    fn unauthorized_sets_challenge_header() {
        let response = AppError::Unauthorized("Missing bearer token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
