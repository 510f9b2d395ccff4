use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ApiError, ApplicationApi};
use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};

/// Shared in-process record set. Cloning shares the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<Uuid, Application>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A view of the store limited to one owner's applications.
    pub fn scoped(&self, owner: Uuid) -> MemoryApplications {
        MemoryApplications {
            store: self.clone(),
            owner,
        }
    }
}

/// In-memory `ApplicationApi`, applying the same lifecycle rules as the database backend.
#[derive(Debug, Clone)]
pub struct MemoryApplications {
    store: MemoryStore,
    owner: Uuid,
}

impl MemoryApplications {
    /// A standalone fake with its own empty store.
    pub fn new(owner: Uuid) -> Self {
        MemoryStore::new().scoped(owner)
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    async fn mutate<F>(&self, id: Uuid, f: F) -> Result<Application, ApiError>
    where
        F: FnOnce(&mut Application),
    {
        let mut records = self.store.records.write().await;
        let record = records
            .get_mut(&id)
            .filter(|app| app.user_id == self.owner)
            .ok_or(ApiError::NotFound(id))?;
        f(record);
        Ok(record.clone())
    }
}

#[async_trait]
impl ApplicationApi for MemoryApplications {
    async fn list(&self) -> Result<Vec<Application>, ApiError> {
        let records = self.store.records.read().await;
        let mut apps: Vec<Application> = records
            .values()
            .filter(|app| app.user_id == self.owner)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, ApiError> {
        let records = self.store.records.read().await;
        Ok(records
            .get(&id)
            .filter(|app| app.user_id == self.owner)
            .cloned())
    }

    async fn create(&self, fields: NewApplication) -> Result<Application, ApiError> {
        fields.validate().map_err(ApiError::Validation)?;
        let app = Application::new(self.owner, fields, Utc::now());
        self.store
            .records
            .write()
            .await
            .insert(app.id, app.clone());
        Ok(app)
    }

    async fn update(&self, id: Uuid, fields: ApplicationPatch) -> Result<Application, ApiError> {
        fields.validate().map_err(ApiError::Validation)?;
        self.mutate(id, |app| app.apply_patch(fields, Utc::now()))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let mut records = self.store.records.write().await;
        match records.get(&id) {
            Some(app) if app.user_id == self.owner => {
                records.remove(&id);
                Ok(())
            }
            _ => Err(ApiError::NotFound(id)),
        }
    }

    async fn move_application(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        self.mutate(id, |app| app.transition_to(status, Utc::now()))
            .await
    }
}
