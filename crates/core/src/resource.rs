//! Wire model of the FHIR Patient subset this server understands.
//!
//! Every element is optional so the same types serve both full documents
//! (create) and partial ones (update). Elements outside the subset are
//! ignored on input and never produced on output.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::FhirError;

pub const PATIENT_RESOURCE_TYPE: &str = "Patient";

fn patient_resource_type() -> String {
    PATIENT_RESOURCE_TYPE.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientResource {
    // Whatever the caller sent, a decoded document is a Patient.
    #[serde(skip_deserializing, default = "patient_resource_type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<HumanName>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub telecom: Option<Vec<ContactPoint>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<Address>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Vec<Identifier>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HumanName {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identifier {
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl PatientResource {
    /// Interpret an arbitrary JSON document as a Patient.
    ///
    /// Fails with [`FhirError::MalformedResource`] naming the offending path
    /// (e.g. `name[0].given`) when an element has the wrong JSON type.
    pub fn from_json(document: JsonValue) -> Result<Self, FhirError> {
        if !document.is_object() {
            return Err(FhirError::malformed("Patient document must be a JSON object"));
        }

        serde_path_to_error::deserialize::<_, PatientResource>(document).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            FhirError::malformed(format!("schema mismatch at {path}: {}", err.into_inner()))
        })
    }

    pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_unknown_elements() {
        let resource = PatientResource::from_json(json!({
            "resourceType": "Patient",
            "meta": {"versionId": "3"},
            "name": [{"family": "Doe", "text": "Jane Doe"}],
            "birthDate": "1992-01-01"
        }))
        .unwrap();

        assert_eq!(resource.name.unwrap()[0].family.as_deref(), Some("Doe"));
        assert_eq!(resource.birth_date.as_deref(), Some("1992-01-01"));
    }

    #[test]
    fn missing_resource_type_defaults_to_patient() {
        let resource = PatientResource::from_json(json!({"gender": "male"})).unwrap();
        assert_eq!(resource.resource_type, PATIENT_RESOURCE_TYPE);
    }

    #[test]
    fn wrong_array_type_reports_path() {
        let err = PatientResource::from_json(json!({
            "name": [{"family": "Doe", "given": "John"}]
        }))
        .unwrap_err();

        match err {
            FhirError::MalformedResource(message) => {
                assert!(message.contains("name[0].given"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(matches!(
            PatientResource::from_json(json!(["Patient"])),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn use_keyword_is_renamed() {
        let json = serde_json::to_value(Identifier {
            use_type: Some("official".into()),
            system: None,
            value: Some("12345".into()),
        })
        .unwrap();
        assert_eq!(json, json!({"use": "official", "value": "12345"}));
    }
}
