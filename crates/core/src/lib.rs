//! patient-core: FHIR Patient types, codec and validation
//!
//! Transport-free half of the Patient API: the flat [`PatientRecord`], the
//! Patient wire model, the codec between them, the pre-persistence
//! validator, and the Bundle / OperationOutcome / CapabilityStatement
//! resources used in responses.

pub mod bundle;
pub mod capability;
pub mod codec;
pub mod error;
pub mod outcome;
pub mod record;
pub mod resource;
pub mod validator;

pub use bundle::{Bundle, BundleEntry, BundleLink, BundleType};
pub use capability::CapabilityStatement;
pub use codec::{decode, encode};
pub use error::FhirError;
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use record::{
    AddressUse, ContactPointSystem, ContactPointUse, Gender, IdentifierUse, NameUse, Patch,
    PatientPatch, PatientRecord, Truncation,
};
pub use resource::{Address, ContactPoint, HumanName, Identifier, PatientResource};
pub use validator::FhirValidator;
