//! Patient persistence
//!
//! Handlers talk to a [`PatientStore`]; the relational table itself is an
//! external collaborator reached through [`PgPatientStore`].

mod memory;
mod postgres;

pub use memory::InMemoryPatientStore;
pub use postgres::PgPatientStore;

use std::sync::Arc;

use async_trait::async_trait;
use deadpool_postgres::{Config, Pool, Runtime};
use patient_core::PatientRecord;
use tokio_postgres::NoTls;
use uuid::Uuid;

use crate::error::AppError;

/// Row storage for patients, keyed by UUID.
///
/// Writes are whole-row and unconditional: concurrent updates to the same id
/// resolve as last write wins.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Insert a new row; the store stamps `created_at`/`updated_at`.
    async fn insert(&self, record: &PatientRecord) -> Result<PatientRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<PatientRecord>, AppError>;

    /// All rows, newest created first
    async fn list(&self) -> Result<Vec<PatientRecord>, AppError>;

    /// Overwrite an existing row, refreshing `updated_at`. `None` if the row is gone.
    async fn update(&self, record: &PatientRecord) -> Result<Option<PatientRecord>, AppError>;

    /// Hard delete. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Cheap round-trip used by the health check
    async fn ping(&self) -> Result<(), AppError>;
}

pub type DynPatientStore = Arc<dyn PatientStore>;

/// Create a connection pool from a database URL
pub fn create_pool(database_url: &str) -> Result<Pool, deadpool_postgres::CreatePoolError> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
}
