//! Flat internal patient record and the patch type used to merge updates into it.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::FhirError;

/// Declares a closed FHIR code set with its wire spelling.
macro_rules! code_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All codes in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// FHIR wire code
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $code),+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Parse a wire code, naming `field` in the error
            pub fn parse(field: &str, code: &str) -> Result<Self, FhirError> {
                Self::from_code(code).ok_or_else(|| FhirError::invalid_code(field, code))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

code_enum!(
    /// Purpose of a human name
    NameUse {
        Usual => "usual",
        Official => "official",
        Temp => "temp",
        Nickname => "nickname",
        Anonymous => "anonymous",
        Old => "old",
        Maiden => "maiden",
    }
);

code_enum!(
    /// Administrative gender
    Gender {
        Male => "male",
        Female => "female",
        Other => "other",
        Unknown => "unknown",
    }
);

code_enum!(
    AddressUse {
        Home => "home",
        Work => "work",
        Temp => "temp",
        Old => "old",
        Billing => "billing",
    }
);

code_enum!(
    IdentifierUse {
        Usual => "usual",
        Official => "official",
        Temp => "temp",
        Secondary => "secondary",
    }
);

code_enum!(
    ContactPointSystem {
        Phone => "phone",
        Fax => "fax",
        Email => "email",
        Pager => "pager",
        Url => "url",
        Sms => "sms",
        Other => "other",
    }
);

code_enum!(
    ContactPointUse {
        Home => "home",
        Work => "work",
        Temp => "temp",
        Old => "old",
        Mobile => "mobile",
    }
);

impl Default for NameUse {
    fn default() -> Self {
        NameUse::Usual
    }
}

/// Parse a FHIR `date` that must carry day precision.
pub fn parse_birth_date(value: &str) -> Result<NaiveDate, FhirError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        FhirError::malformed(format!(
            "birthDate '{value}' is not a full date (YYYY-MM-DD): {e}"
        ))
    })
}

/// One stored patient. Every nested FHIR structure is flattened to its first entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRecord {
    pub id: Uuid,
    pub active: bool,

    pub name_use: NameUse,
    pub family_name: String,
    pub given_names: Vec<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,

    pub telecom_phone: Option<String>,
    pub telecom_email: Option<String>,

    pub gender: Gender,
    pub birth_date: NaiveDate,

    pub address_use: Option<AddressUse>,
    pub address_line: Vec<String>,
    pub address_city: Option<String>,
    pub address_district: Option<String>,
    pub address_state: Option<String>,
    pub address_postal_code: Option<String>,
    pub address_country: Option<String>,

    pub identifier_use: Option<IdentifierUse>,
    pub identifier_system: Option<String>,
    pub identifier_value: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Whether any address component that puts an `address` entry on the wire is populated
    pub fn has_address(&self) -> bool {
        !self.address_line.is_empty()
            || [
                &self.address_city,
                &self.address_district,
                &self.address_state,
                &self.address_postal_code,
                &self.address_country,
            ]
            .iter()
            .any(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

impl fmt::Display for PatientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let given = self.given_names.join(" ");
        write!(f, "{}", format!("{given} {}", self.family_name).trim())
    }
}

/// A single field change: either leave the current value alone or overwrite it.
///
/// `Set(None)` on an optional field clears it, which is distinct from `Keep`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Patch::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Patch::Set(value) => Some(value),
            Patch::Keep => None,
        }
    }

    pub fn apply(self, target: &mut T) {
        if let Patch::Set(value) = self {
            *target = value;
        }
    }
}

/// A repeating FHIR element of which only the first entry was honored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    /// Wire path of the element, e.g. `name` or `telecom[phone]`
    pub field: String,
    /// Entries present in the input
    pub received: usize,
    /// Entries the decoder kept
    pub kept: usize,
}

/// Field changes decoded from a Patient document, to be merged onto a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientPatch {
    pub active: Patch<bool>,

    pub name_use: Patch<NameUse>,
    pub family_name: Patch<String>,
    pub given_names: Patch<Vec<String>>,
    pub prefix: Patch<Option<String>>,
    pub suffix: Patch<Option<String>>,

    pub telecom_phone: Patch<Option<String>>,
    pub telecom_email: Patch<Option<String>>,

    pub gender: Patch<Gender>,
    pub birth_date: Patch<NaiveDate>,

    pub address_use: Patch<Option<AddressUse>>,
    pub address_line: Patch<Vec<String>>,
    pub address_city: Patch<Option<String>>,
    pub address_district: Patch<Option<String>>,
    pub address_state: Patch<Option<String>>,
    pub address_postal_code: Patch<Option<String>>,
    pub address_country: Patch<Option<String>>,

    pub identifier_use: Patch<Option<IdentifierUse>>,
    pub identifier_system: Patch<Option<String>>,
    pub identifier_value: Patch<Option<String>>,

    /// Repeating elements cut down to a single entry while decoding
    pub truncated: Vec<Truncation>,
}

impl PatientPatch {
    /// Merge onto an existing record; `Keep` fields retain their value.
    pub fn apply_to(self, record: &mut PatientRecord) {
        self.active.apply(&mut record.active);

        self.name_use.apply(&mut record.name_use);
        self.family_name.apply(&mut record.family_name);
        self.given_names.apply(&mut record.given_names);
        self.prefix.apply(&mut record.prefix);
        self.suffix.apply(&mut record.suffix);

        self.telecom_phone.apply(&mut record.telecom_phone);
        self.telecom_email.apply(&mut record.telecom_email);

        self.gender.apply(&mut record.gender);
        self.birth_date.apply(&mut record.birth_date);

        self.address_use.apply(&mut record.address_use);
        self.address_line.apply(&mut record.address_line);
        self.address_city.apply(&mut record.address_city);
        self.address_district.apply(&mut record.address_district);
        self.address_state.apply(&mut record.address_state);
        self.address_postal_code.apply(&mut record.address_postal_code);
        self.address_country.apply(&mut record.address_country);

        self.identifier_use.apply(&mut record.identifier_use);
        self.identifier_system.apply(&mut record.identifier_system);
        self.identifier_value.apply(&mut record.identifier_value);
    }

    /// Build a fresh record, requiring family name, gender and birth date.
    pub fn into_new_record(self, id: Uuid, now: DateTime<Utc>) -> Result<PatientRecord, FhirError> {
        let family_name = self
            .family_name
            .as_set()
            .filter(|family| !family.is_empty())
            .cloned()
            .ok_or_else(|| FhirError::missing("name[0].family"))?;
        let gender = *self
            .gender
            .as_set()
            .ok_or_else(|| FhirError::missing("gender"))?;
        let birth_date = *self
            .birth_date
            .as_set()
            .ok_or_else(|| FhirError::missing("birthDate"))?;

        let mut record = PatientRecord {
            id,
            active: true,
            name_use: NameUse::default(),
            family_name,
            given_names: Vec::new(),
            prefix: None,
            suffix: None,
            telecom_phone: None,
            telecom_email: None,
            gender,
            birth_date,
            address_use: None,
            address_line: Vec::new(),
            address_city: None,
            address_district: None,
            address_state: None,
            address_postal_code: None,
            address_country: None,
            identifier_use: None,
            identifier_system: None,
            identifier_value: None,
            created_at: now,
            updated_at: now,
        };
        self.apply_to(&mut record);
        Ok(record)
    }
}
