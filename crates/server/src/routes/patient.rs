//! Patient resource HTTP handlers

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use patient_core::{
    Bundle, BundleEntry, FhirError, FhirValidator, OperationOutcome, PatientResource, decode,
    encode,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::auth::{GroupPolicy, Principal};
use crate::db::DynPatientStore;
use crate::error::AppError;

/// Parse the `{id}` path segment, rejecting anything that is not a UUID with 400
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::try_parse(raw)
        .map_err(|_| AppError::BadRequest(format!("Invalid patient ID format: {raw}")))
}

/// Unwrap a JSON body, reporting unparseable payloads as malformed resources
fn json_body(body: Result<Json<JsonValue>, JsonRejection>) -> Result<JsonValue, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| FhirError::malformed(rejection.body_text()).into())
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Patient/{} not found", id))
}

/// POST /fhir/Patient - Create a new patient
pub async fn create(
    State(store): State<DynPatientStore>,
    Extension(principal): Extension<Principal>,
    Extension(policy): Extension<GroupPolicy>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    if !policy.permits(&principal).await {
        return Err(AppError::Forbidden(format!(
            "Creating patients requires membership in group '{}'",
            policy.group
        )));
    }

    let resource = FhirValidator::validate_patient(json_body(body)?)?;
    let record = decode(&resource)?.into_new_record(Uuid::new_v4(), Utc::now())?;
    let stored = store.insert(&record).await?;

    tracing::info!(patient_id = %stored.id, subject = %principal.subject, "Patient created");
    tracing::debug!(patient = %stored, "Created patient display name");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/fhir/Patient/{}", stored.id))],
        Json(encode(&stored)),
    ))
}

/// GET /fhir/Patient - All patients as a searchset Bundle, newest first
pub async fn list(State(store): State<DynPatientStore>) -> Result<impl IntoResponse, AppError> {
    let entries = store
        .list()
        .await?
        .iter()
        .map(|record| -> Result<BundleEntry, AppError> {
            let resource = encode(record).to_json()?;
            Ok(BundleEntry::new(Some(format!("Patient/{}", record.id)), resource))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(Bundle::searchset(entries)))
}

/// GET /fhir/Patient/{id} - Read a patient
pub async fn read(
    State(store): State<DynPatientStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    match store.get(id).await? {
        Some(record) => Ok(Json(encode(&record))),
        None => Err(not_found(id)),
    }
}

/// PUT /fhir/Patient/{id} - Merge the supplied elements into a patient
///
/// Elements missing from the body keep their stored value. Concurrent updates
/// to one patient are not serialized; the last write wins.
pub async fn update(
    State(store): State<DynPatientStore>,
    Path(id): Path<String>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let mut record = store.get(id).await?.ok_or_else(|| not_found(id))?;

    let resource = PatientResource::from_json(json_body(body)?)?;
    decode(&resource)?.apply_to(&mut record);

    let stored = store.update(&record).await?.ok_or_else(|| not_found(id))?;
    tracing::info!(patient_id = %stored.id, "Patient updated");

    Ok(Json(encode(&stored)))
}

/// DELETE /fhir/Patient/{id}/delete - Permanently remove a patient
pub async fn delete(
    State(store): State<DynPatientStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    if store.delete(id).await? {
        tracing::info!(patient_id = %id, "Patient deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /fhir/Patient/$validate - Validate a patient without storing it
pub async fn validate(
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let resource = FhirValidator::validate_patient(json_body(body)?)?;
    decode(&resource)?;

    Ok(Json(OperationOutcome::success("Patient resource is valid")))
}
