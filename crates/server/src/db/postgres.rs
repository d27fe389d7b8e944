use async_trait::async_trait;
use deadpool_postgres::Pool;
use patient_core::{AddressUse, FhirError, Gender, IdentifierUse, NameUse, PatientRecord};
use tokio_postgres::{Row, types::ToSql};
use uuid::Uuid;

use super::PatientStore;
use crate::error::AppError;

/// DDL for the `patients` table, applied by [`PgPatientStore::migrate`]
const SCHEMA: &str = include_str!("schema.sql");

const SELECT_COLUMNS: &str = "id, active, name_use, family_name, given_names, prefix, suffix, \
     telecom_phone, telecom_email, gender, birth_date, address_use, address_line, address_city, \
     address_district, address_state, address_postal_code, address_country, identifier_use, \
     identifier_system, identifier_value, created_at, updated_at";

const INSERT_SQL: &str = "INSERT INTO patients (id, active, name_use, family_name, given_names, \
     prefix, suffix, telecom_phone, telecom_email, gender, birth_date, address_use, address_line, \
     address_city, address_district, address_state, address_postal_code, address_country, \
     identifier_use, identifier_system, identifier_value) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, \
     $19, $20, $21)";

const UPDATE_SQL: &str = "UPDATE patients SET active = $2, name_use = $3, family_name = $4, \
     given_names = $5, prefix = $6, suffix = $7, telecom_phone = $8, telecom_email = $9, \
     gender = $10, birth_date = $11, address_use = $12, address_line = $13, address_city = $14, \
     address_district = $15, address_state = $16, address_postal_code = $17, \
     address_country = $18, identifier_use = $19, identifier_system = $20, \
     identifier_value = $21, updated_at = NOW() \
     WHERE id = $1";

/// Patient rows in PostgreSQL
#[derive(Clone)]
pub struct PgPatientStore {
    pool: Pool,
}

impl PgPatientStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create the `patients` table and its indexes if they do not exist
    pub async fn migrate(&self) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;
        Ok(())
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn insert(&self, record: &PatientRecord) -> Result<PatientRecord, AppError> {
        let client = self.pool.get().await?;
        let columns = WriteColumns::new(record);
        let sql = format!("{INSERT_SQL} RETURNING {SELECT_COLUMNS}");
        let row = client.query_one(sql.as_str(), &columns.params()).await?;
        row_to_record(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PatientRecord>, AppError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM patients WHERE id = $1");
        let row = client.query_opt(sql.as_str(), &[&id]).await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list(&self) -> Result<Vec<PatientRecord>, AppError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {SELECT_COLUMNS} FROM patients ORDER BY created_at DESC");
        let rows = client.query(sql.as_str(), &[]).await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn update(&self, record: &PatientRecord) -> Result<Option<PatientRecord>, AppError> {
        let client = self.pool.get().await?;
        let columns = WriteColumns::new(record);
        let sql = format!("{UPDATE_SQL} RETURNING {SELECT_COLUMNS}");
        let row = client.query_opt(sql.as_str(), &columns.params()).await?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let client = self.pool.get().await?;
        let removed = client
            .execute("DELETE FROM patients WHERE id = $1", &[&id])
            .await?;
        Ok(removed > 0)
    }

    async fn ping(&self) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client.query_one("SELECT 1", &[]).await?;
        Ok(())
    }
}

/// Bind parameters `$1..$21` shared by the insert and update statements
struct WriteColumns<'a> {
    record: &'a PatientRecord,
    name_use: &'static str,
    gender: &'static str,
    address_use: Option<&'static str>,
    identifier_use: Option<&'static str>,
}

impl<'a> WriteColumns<'a> {
    fn new(record: &'a PatientRecord) -> Self {
        Self {
            record,
            name_use: record.name_use.as_str(),
            gender: record.gender.as_str(),
            address_use: record.address_use.map(AddressUse::as_str),
            identifier_use: record.identifier_use.map(IdentifierUse::as_str),
        }
    }

    fn params(&self) -> [&(dyn ToSql + Sync); 21] {
        let r = self.record;
        [
            &r.id,
            &r.active,
            &self.name_use,
            &r.family_name,
            &r.given_names,
            &r.prefix,
            &r.suffix,
            &r.telecom_phone,
            &r.telecom_email,
            &self.gender,
            &r.birth_date,
            &self.address_use,
            &r.address_line,
            &r.address_city,
            &r.address_district,
            &r.address_state,
            &r.address_postal_code,
            &r.address_country,
            &self.identifier_use,
            &r.identifier_system,
            &r.identifier_value,
        ]
    }
}

fn row_to_record(row: &Row) -> Result<PatientRecord, AppError> {
    let name_use: String = row.try_get("name_use")?;
    let gender: String = row.try_get("gender")?;
    let address_use: Option<String> = row.try_get("address_use")?;
    let identifier_use: Option<String> = row.try_get("identifier_use")?;

    Ok(PatientRecord {
        id: row.try_get("id")?,
        active: row.try_get("active")?,
        name_use: NameUse::parse("name_use", &name_use).map_err(corrupt_row)?,
        family_name: row.try_get("family_name")?,
        given_names: row.try_get("given_names")?,
        prefix: row.try_get("prefix")?,
        suffix: row.try_get("suffix")?,
        telecom_phone: row.try_get("telecom_phone")?,
        telecom_email: row.try_get("telecom_email")?,
        gender: Gender::parse("gender", &gender).map_err(corrupt_row)?,
        birth_date: row.try_get("birth_date")?,
        address_use: address_use
            .as_deref()
            .map(|code| AddressUse::parse("address_use", code))
            .transpose()
            .map_err(corrupt_row)?,
        address_line: row.try_get("address_line")?,
        address_city: row.try_get("address_city")?,
        address_district: row.try_get("address_district")?,
        address_state: row.try_get("address_state")?,
        address_postal_code: row.try_get("address_postal_code")?,
        address_country: row.try_get("address_country")?,
        identifier_use: identifier_use
            .as_deref()
            .map(|code| IdentifierUse::parse("identifier_use", code))
            .transpose()
            .map_err(corrupt_row)?,
        identifier_system: row.try_get("identifier_system")?,
        identifier_value: row.try_get("identifier_value")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// A stored code outside its value set is a storage fault, not a client error.
fn corrupt_row(err: FhirError) -> AppError {
    AppError::Internal(format!("Corrupt patient row: {}", err))
}
