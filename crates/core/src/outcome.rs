use serde::{Deserialize, Serialize};

/// Severity of an OperationOutcome issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Issue codes from the FHIR `issue-type` value set that this server emits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    CodeInvalid,
    Security,
    Login,
    Forbidden,
    Processing,
    NotFound,
    Exception,
    Throttled,
    Informational,
}

/// A single issue inside an OperationOutcome
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,
    pub code: IssueType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

/// FHIR OperationOutcome resource, used as the body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperationOutcome {
    pub resource_type: String,
    pub issue: Vec<OperationOutcomeIssue>,
}

impl OperationOutcome {
    /// Outcome carrying one issue
    pub fn new(severity: IssueSeverity, code: IssueType, diagnostics: &str) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.to_string()),
            }],
        }
    }

    /// Error-severity outcome with the given issue code
    pub fn error(code: IssueType, diagnostics: &str) -> Self {
        Self::new(IssueSeverity::Error, code, diagnostics)
    }

    pub fn invalid(diagnostics: &str) -> Self {
        Self::error(IssueType::Invalid, diagnostics)
    }

    pub fn not_found(diagnostics: &str) -> Self {
        Self::error(IssueType::NotFound, diagnostics)
    }

    pub fn processing(diagnostics: &str) -> Self {
        Self::error(IssueType::Processing, diagnostics)
    }

    /// Informational outcome, e.g. for a successful `$validate`
    pub fn success(diagnostics: &str) -> Self {
        Self::new(
            IssueSeverity::Information,
            IssueType::Informational,
            diagnostics,
        )
    }
}
