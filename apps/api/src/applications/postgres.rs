use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{ApiError, ApplicationApi};
use crate::models::application::{
    Application, ApplicationPatch, ApplicationRow, ApplicationStatus, NewApplication,
};

/// PostgreSQL-backed `ApplicationApi` for one owner.
///
/// Mutations are read-modify-write under `SELECT ... FOR UPDATE` so the
/// lifecycle rules on `Application` stay the single source of truth.
#[derive(Clone)]
pub struct PgApplications {
    pool: PgPool,
    owner: Uuid,
}

impl PgApplications {
    pub fn new(pool: PgPool, owner: Uuid) -> Self {
        Self { pool, owner }
    }

    async fn lock_row(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Application, ApiError> {
        let row = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(self.owner)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(ApiError::NotFound(id))?;

        decode(row)
    }

    async fn write_back<F>(&self, id: Uuid, f: F) -> Result<Application, ApiError>
    where
        F: FnOnce(&mut Application) + Send,
    {
        let mut tx = self.pool.begin().await?;
        let mut app = self.lock_row(&mut tx, id).await?;
        f(&mut app);

        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications
            SET company = $3, role = $4, status = $5, link = $6, salary_range = $7,
                notes = $8, applied_at = $9, updated_at = $10
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(app.id)
        .bind(self.owner)
        .bind(&app.company)
        .bind(&app.role)
        .bind(app.status.as_str())
        .bind(&app.link)
        .bind(&app.salary_range)
        .bind(&app.notes)
        .bind(app.applied_at)
        .bind(app.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        decode(row)
    }
}

fn decode(row: ApplicationRow) -> Result<Application, ApiError> {
    Application::try_from(row).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl ApplicationApi for PgApplications {
    async fn list(&self) -> Result<Vec<Application>, ApiError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(self.owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, ApiError> {
        sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(self.owner)
        .fetch_optional(&self.pool)
        .await?
        .map(decode)
        .transpose()
    }

    async fn create(&self, fields: NewApplication) -> Result<Application, ApiError> {
        fields.validate().map_err(ApiError::Validation)?;
        let app = Application::new(self.owner, fields, Utc::now());

        let row = sqlx::query_as::<_, ApplicationRow>(
            r#"
            INSERT INTO applications
                (id, user_id, company, role, status, link, salary_range, notes,
                 applied_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(app.id)
        .bind(app.user_id)
        .bind(&app.company)
        .bind(&app.role)
        .bind(app.status.as_str())
        .bind(&app.link)
        .bind(&app.salary_range)
        .bind(&app.notes)
        .bind(app.applied_at)
        .bind(app.created_at)
        .bind(app.updated_at)
        .fetch_one(&self.pool)
        .await?;

        info!("Created application {} for user {}", app.id, self.owner);
        decode(row)
    }

    async fn update(&self, id: Uuid, fields: ApplicationPatch) -> Result<Application, ApiError> {
        fields.validate().map_err(ApiError::Validation)?;
        self.write_back(id, |app| app.apply_patch(fields, Utc::now()))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(self.owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(id));
        }
        info!("Deleted application {id} for user {}", self.owner);
        Ok(())
    }

    async fn move_application(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        let app = self
            .write_back(id, |app| app.transition_to(status, Utc::now()))
            .await?;
        info!("Moved application {id} to {status}");
        Ok(app)
    }
}
