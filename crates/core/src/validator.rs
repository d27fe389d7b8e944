//! Pre-persistence checks for inbound Patient and Bundle documents.

use serde_json::Value as JsonValue;

use crate::bundle::Bundle;
use crate::error::FhirError;
use crate::record::{
    AddressUse, ContactPointSystem, ContactPointUse, Gender, IdentifierUse, NameUse,
    parse_birth_date,
};
use crate::resource::{PATIENT_RESOURCE_TYPE, PatientResource};

/// Structural validation of FHIR documents before they are decoded and stored.
pub struct FhirValidator;

impl FhirValidator {
    /// Validate a Patient document for creation.
    ///
    /// The returned resource always has `resourceType` set to `Patient`,
    /// whatever the input carried.
    ///
    /// # Errors
    ///
    /// - [`FhirError::MalformedResource`] if the document does not have the
    ///   Patient shape or `birthDate` is not a full date.
    /// - [`FhirError::InvalidEnumValue`] for codes outside their value set.
    /// - [`FhirError::MissingField`] if `name` is absent or empty, or
    ///   `gender` or `birthDate` is absent.
    pub fn validate_patient(document: JsonValue) -> Result<PatientResource, FhirError> {
        let mut resource = PatientResource::from_json(document)?;
        resource.resource_type = PATIENT_RESOURCE_TYPE.to_string();

        check_codes(&resource)?;

        if resource.name.as_ref().is_none_or(|names| names.is_empty()) {
            return Err(FhirError::missing("name"));
        }
        let Some(gender) = resource.gender.as_deref() else {
            return Err(FhirError::missing("gender"));
        };
        Gender::parse("gender", gender)?;
        let Some(birth_date) = resource.birth_date.as_deref() else {
            return Err(FhirError::missing("birthDate"));
        };
        parse_birth_date(birth_date)?;

        Ok(resource)
    }

    /// Validate a Bundle document. No current route accepts bundles.
    pub fn validate_bundle(document: JsonValue) -> Result<Bundle, FhirError> {
        let mut bundle: Bundle = serde_path_to_error::deserialize(document).map_err(|err| {
            FhirError::malformed(format!(
                "Invalid FHIR Bundle at {}: {}",
                err.path(),
                err.inner()
            ))
        })?;
        bundle.resource_type = "Bundle".to_string();
        Ok(bundle)
    }
}

/// Every coded element must come from its value set, in every repetition.
fn check_codes(resource: &PatientResource) -> Result<(), FhirError> {
    fn check<T>(
        field: String,
        code: Option<&str>,
        parse: fn(&str, &str) -> Result<T, FhirError>,
    ) -> Result<(), FhirError> {
        match code {
            Some(code) => parse(&field, code).map(|_| ()),
            None => Ok(()),
        }
    }

    for (i, name) in resource.name.iter().flatten().enumerate() {
        check(format!("name[{i}].use"), name.use_type.as_deref(), NameUse::parse)?;
    }
    for (i, contact) in resource.telecom.iter().flatten().enumerate() {
        check(
            format!("telecom[{i}].system"),
            contact.system.as_deref(),
            ContactPointSystem::parse,
        )?;
        check(
            format!("telecom[{i}].use"),
            contact.use_type.as_deref(),
            ContactPointUse::parse,
        )?;
    }
    for (i, address) in resource.address.iter().flatten().enumerate() {
        check(format!("address[{i}].use"), address.use_type.as_deref(), AddressUse::parse)?;
    }
    for (i, identifier) in resource.identifier.iter().flatten().enumerate() {
        check(
            format!("identifier[{i}].use"),
            identifier.use_type.as_deref(),
            IdentifierUse::parse,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> JsonValue {
        json!({
            "resourceType": "Patient",
            "name": [{"family": "Doe", "given": ["John"]}],
            "gender": "male",
            "birthDate": "1990-05-15"
        })
    }

    fn without(key: &str) -> JsonValue {
        let mut doc = valid();
        doc.as_object_mut().unwrap().remove(key);
        doc
    }

    #[test]
    fn accepts_minimal_patient() {
        let resource = FhirValidator::validate_patient(valid()).unwrap();
        assert_eq!(resource.gender.as_deref(), Some("male"));
    }

    #[test]
    fn forces_resource_type() {
        let mut doc = valid();
        doc["resourceType"] = json!("Observation");
        let resource = FhirValidator::validate_patient(doc).unwrap();
        assert_eq!(resource.resource_type, "Patient");
    }

    #[test]
    fn non_string_resource_type_is_normalized() {
        for value in [json!(null), json!(5), json!({"x": 1})] {
            let mut doc = valid();
            doc["resourceType"] = value;
            let resource = FhirValidator::validate_patient(doc).unwrap();
            assert_eq!(resource.resource_type, "Patient");
        }
    }

    #[test]
    fn each_required_field_is_checked_independently() {
        assert_eq!(
            FhirValidator::validate_patient(without("name")).unwrap_err(),
            FhirError::missing("name")
        );
        assert_eq!(
            FhirValidator::validate_patient(without("gender")).unwrap_err(),
            FhirError::missing("gender")
        );
        assert_eq!(
            FhirValidator::validate_patient(without("birthDate")).unwrap_err(),
            FhirError::missing("birthDate")
        );
    }

    #[test]
    fn empty_name_array_is_missing() {
        let mut doc = valid();
        doc["name"] = json!([]);
        assert_eq!(
            FhirValidator::validate_patient(doc).unwrap_err(),
            FhirError::missing("name")
        );
    }

    #[test]
    fn invalid_gender_without_name_is_rejected() {
        let doc = json!({
            "resourceType": "Patient",
            "gender": "invalid_gender",
            "birthDate": "1990-05-15"
        });
        assert!(FhirValidator::validate_patient(doc).is_err());
    }

    #[test]
    fn rejects_codes_in_later_repetitions() {
        let mut doc = valid();
        doc["telecom"] = json!([
            {"system": "phone", "value": "1"},
            {"system": "carrier-pigeon", "value": "2"}
        ]);
        assert_eq!(
            FhirValidator::validate_patient(doc).unwrap_err(),
            FhirError::invalid_code("telecom[1].system", "carrier-pigeon")
        );
    }

    #[test]
    fn wrong_types_are_malformed() {
        let mut doc = valid();
        doc["address"] = json!({"city": "not-an-array"});
        assert!(matches!(
            FhirValidator::validate_patient(doc),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn partial_birth_date_is_malformed() {
        let mut doc = valid();
        doc["birthDate"] = json!("1990");
        assert!(matches!(
            FhirValidator::validate_patient(doc),
            Err(FhirError::MalformedResource(_))
        ));
    }

    #[test]
    fn bundle_validation_normalizes_resource_type() {
        let bundle = FhirValidator::validate_bundle(json!({
            "resourceType": "Something",
            "type": "collection",
            "entry": [{"resource": valid()}]
        }))
        .unwrap();
        assert_eq!(bundle.resource_type, "Bundle");
        assert_eq!(bundle.entry.len(), 1);

        assert!(FhirValidator::validate_bundle(json!({"resourceType": "Bundle"})).is_err());
    }
}
