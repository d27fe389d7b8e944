use async_trait::async_trait;
use chrono::Utc;
use patient_core::PatientRecord;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::PatientStore;
use crate::error::AppError;

/// Process-local patient rows, kept in creation order.
///
/// Used for `STORAGE_BACKEND=memory` and by the HTTP tests.
#[derive(Default)]
pub struct InMemoryPatientStore {
    rows: RwLock<Vec<PatientRecord>>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn insert(&self, record: &PatientRecord) -> Result<PatientRecord, AppError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|row| row.id == record.id) {
            return Err(AppError::Internal(format!(
                "Duplicate patient id {}",
                record.id
            )));
        }

        let now = Utc::now();
        let stored = PatientRecord {
            created_at: now,
            updated_at: now,
            ..record.clone()
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PatientRecord>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<PatientRecord>, AppError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().rev().cloned().collect())
    }

    async fn update(&self, record: &PatientRecord) -> Result<Option<PatientRecord>, AppError> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|row| row.id == record.id) else {
            return Ok(None);
        };

        *row = PatientRecord {
            created_at: row.created_at,
            updated_at: Utc::now(),
            ..record.clone()
        };
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| row.id != id);
        Ok(rows.len() < before)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use patient_core::{Gender, Patch, PatientPatch};

    fn record(family: &str) -> PatientRecord {
        PatientPatch {
            family_name: Patch::Set(family.into()),
            gender: Patch::Set(Gender::Unknown),
            birth_date: Patch::Set(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            ..Default::default()
        }
        .into_new_record(Uuid::new_v4(), Utc::now())
        .unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = InMemoryPatientStore::new();
        for family in ["First", "Second", "Third"] {
            store.insert(&record(family)).await.unwrap();
        }

        let families: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.family_name)
            .collect();
        assert_eq!(families, ["Third", "Second", "First"]);
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let store = InMemoryPatientStore::new();
        let stored = store.insert(&record("Doe")).await.unwrap();

        let mut changed = stored.clone();
        changed.family_name = "Roe".into();
        changed.created_at = Utc::now() + chrono::Duration::days(1);
        let updated = store.update(&changed).await.unwrap().unwrap();

        assert_eq!(updated.family_name, "Roe");
        assert_eq!(updated.created_at, stored.created_at);
        assert!(updated.updated_at >= stored.updated_at);
    }

    #[tokio::test]
    async fn missing_rows_report_absence() {
        let store = InMemoryPatientStore::new();
        let ghost = record("Ghost");

        assert_eq!(store.get(ghost.id).await.unwrap(), None);
        assert_eq!(store.update(&ghost).await.unwrap(), None);
        assert!(!store.delete(ghost.id).await.unwrap());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = InMemoryPatientStore::new();
        let stored = store.insert(&record("Doe")).await.unwrap();

        let mut first = stored.clone();
        first.telecom_phone = Some("111".into());
        let mut second = stored.clone();
        second.telecom_email = Some("two@example.com".into());

        store.update(&first).await.unwrap();
        store.update(&second).await.unwrap();

        let current = store.get(stored.id).await.unwrap().unwrap();
        assert_eq!(current.telecom_phone, None);
        assert_eq!(current.telecom_email.as_deref(), Some("two@example.com"));
    }
}
