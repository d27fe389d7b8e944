use crate::outcome::{IssueType, OperationOutcome};
use thiserror::Error;

/// Failures raised while interpreting or validating Patient documents
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FhirError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value '{value}' for {field}")]
    InvalidEnumValue { field: String, value: String },

    #[error("Invalid FHIR resource: {0}")]
    MalformedResource(String),

    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl FhirError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid_code(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidEnumValue {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResource(message.into())
    }

    /// OperationOutcome issue code for this failure
    pub fn issue_type(&self) -> IssueType {
        match self {
            FhirError::MissingField(_) => IssueType::Required,
            FhirError::InvalidEnumValue { .. } => IssueType::CodeInvalid,
            FhirError::MalformedResource(_) => IssueType::Structure,
            FhirError::NotFound(_) => IssueType::NotFound,
        }
    }

    pub fn to_outcome(&self) -> OperationOutcome {
        OperationOutcome::error(self.issue_type(), &self.to_string())
    }
}
