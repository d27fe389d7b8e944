//! Mapping between [`PatientRecord`] and the FHIR Patient wire document.
//!
//! `encode` is total: it only checks which fields are present. `decode`
//! produces a [`PatientPatch`] so the same path serves creation and partial
//! update. Only the first entry of `name`, `address` and `identifier`, and the
//! first `phone` and `email` contact points, are honored; anything beyond that
//! is reported in [`PatientPatch::truncated`] and logged.

use crate::error::FhirError;
use crate::record::{
    AddressUse, ContactPointSystem, Gender, IdentifierUse, NameUse, Patch, PatientPatch,
    PatientRecord, Truncation, parse_birth_date,
};
use crate::resource::{
    Address, ContactPoint, HumanName, Identifier, PATIENT_RESOURCE_TYPE, PatientResource,
};

/// `use` stamped on every contact point this server emits
const TELECOM_USE: &str = "home";

/// Render a stored record as a Patient document.
pub fn encode(record: &PatientRecord) -> PatientResource {
    let name = HumanName {
        use_type: Some(record.name_use.as_str().to_string()),
        family: Some(record.family_name.clone()),
        given: Some(record.given_names.clone()),
        prefix: single(&record.prefix),
        suffix: single(&record.suffix),
    };

    let telecom = [
        (ContactPointSystem::Phone, &record.telecom_phone),
        (ContactPointSystem::Email, &record.telecom_email),
    ]
    .into_iter()
    .filter_map(|(system, value)| {
        present(value).map(|value| ContactPoint {
            system: Some(system.as_str().to_string()),
            value: Some(value.to_string()),
            use_type: Some(TELECOM_USE.to_string()),
        })
    })
    .collect();

    let address = if record.has_address() {
        vec![Address {
            use_type: record.address_use.map(|u| u.as_str().to_string()),
            line: (!record.address_line.is_empty()).then(|| record.address_line.clone()),
            city: owned(&record.address_city),
            district: owned(&record.address_district),
            state: owned(&record.address_state),
            postal_code: owned(&record.address_postal_code),
            country: owned(&record.address_country),
        }]
    } else {
        Vec::new()
    };

    let identifier = match present(&record.identifier_value) {
        Some(value) => vec![Identifier {
            use_type: record.identifier_use.map(|u| u.as_str().to_string()),
            system: owned(&record.identifier_system),
            value: Some(value.to_string()),
        }],
        None => Vec::new(),
    };

    PatientResource {
        resource_type: PATIENT_RESOURCE_TYPE.to_string(),
        id: Some(record.id.to_string()),
        active: Some(record.active),
        name: Some(vec![name]),
        telecom: Some(telecom),
        gender: Some(record.gender.as_str().to_string()),
        birth_date: Some(record.birth_date.format("%Y-%m-%d").to_string()),
        address: Some(address),
        identifier: Some(identifier),
    }
}

/// Extract the field changes a Patient document asks for.
///
/// Absent elements yield [`Patch::Keep`]. Present repeating elements
/// overwrite every field they cover, clearing sub-fields the entry omits.
pub fn decode(resource: &PatientResource) -> Result<PatientPatch, FhirError> {
    let mut patch = PatientPatch::default();

    if let Some(active) = resource.active {
        patch.active = Patch::Set(active);
    }

    // A present name replaces the whole stored name: omitted `use` and `given` reset.
    if let Some(name) = first(&resource.name, "name", &mut patch.truncated) {
        patch.name_use = Patch::Set(match present(&name.use_type) {
            Some(code) => NameUse::parse("name[0].use", code)?,
            None => NameUse::default(),
        });
        let family = present(&name.family).ok_or_else(|| FhirError::missing("name[0].family"))?;
        patch.family_name = Patch::Set(family.to_string());
        patch.given_names = Patch::Set(name.given.clone().unwrap_or_default());
        if let Some(prefix) = first(&name.prefix, "name[0].prefix", &mut patch.truncated) {
            patch.prefix = Patch::Set(non_empty(prefix));
        }
        if let Some(suffix) = first(&name.suffix, "name[0].suffix", &mut patch.truncated) {
            patch.suffix = Patch::Set(non_empty(suffix));
        }
    }

    if let Some(telecom) = resource.telecom.as_deref() {
        decode_telecom(telecom, &mut patch);
    }

    if let Some(gender) = resource.gender.as_deref() {
        patch.gender = Patch::Set(Gender::parse("gender", gender)?);
    }
    if let Some(birth_date) = resource.birth_date.as_deref() {
        patch.birth_date = Patch::Set(parse_birth_date(birth_date)?);
    }

    if let Some(address) = first(&resource.address, "address", &mut patch.truncated) {
        patch.address_use = Patch::Set(
            present(&address.use_type)
                .map(|code| AddressUse::parse("address[0].use", code))
                .transpose()?,
        );
        patch.address_line = Patch::Set(address.line.clone().unwrap_or_default());
        patch.address_city = Patch::Set(owned(&address.city));
        patch.address_district = Patch::Set(owned(&address.district));
        patch.address_state = Patch::Set(owned(&address.state));
        patch.address_postal_code = Patch::Set(owned(&address.postal_code));
        patch.address_country = Patch::Set(owned(&address.country));
    }

    if let Some(identifier) = first(&resource.identifier, "identifier", &mut patch.truncated) {
        patch.identifier_use = Patch::Set(
            present(&identifier.use_type)
                .map(|code| IdentifierUse::parse("identifier[0].use", code))
                .transpose()?,
        );
        patch.identifier_system = Patch::Set(owned(&identifier.system));
        patch.identifier_value = Patch::Set(owned(&identifier.value));
    }

    for truncation in &patch.truncated {
        tracing::warn!(
            field = %truncation.field,
            received = truncation.received,
            kept = truncation.kept,
            "Repeating element truncated while decoding Patient"
        );
    }

    Ok(patch)
}

/// Phone and email are the only contact points stored; each takes the first matching entry.
fn decode_telecom(entries: &[ContactPoint], patch: &mut PatientPatch) {
    let system_of = |entry: &ContactPoint| {
        entry
            .system
            .as_deref()
            .and_then(ContactPointSystem::from_code)
    };

    let mut kept = 0;
    for (system, target) in [
        (ContactPointSystem::Phone, &mut patch.telecom_phone),
        (ContactPointSystem::Email, &mut patch.telecom_email),
    ] {
        if let Some(entry) = entries.iter().find(|e| system_of(*e) == Some(system)) {
            *target = Patch::Set(owned(&entry.value));
            kept += 1;
        }
    }

    if entries.len() > kept {
        patch.truncated.push(Truncation {
            field: "telecom".to_string(),
            received: entries.len(),
            kept,
        });
    }
}

/// First element of a repeating field, recording a truncation when there are more.
fn first<'a, T>(
    items: &'a Option<Vec<T>>,
    field: &str,
    truncated: &mut Vec<Truncation>,
) -> Option<&'a T> {
    let items = items.as_deref()?;
    if items.len() > 1 {
        truncated.push(Truncation {
            field: field.to_string(),
            received: items.len(),
            kept: 1,
        });
    }
    items.first()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn single(value: &Option<String>) -> Option<Vec<String>> {
    present(value).map(|v| vec![v.to_string()])
}
