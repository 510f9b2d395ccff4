//! Persistence API for tracked applications.
//!
//! One capability set (`ApplicationApi`) with interchangeable implementations:
//! `MemoryApplications` (in-process fake), `PgApplications` (the server's
//! database) and `HttpApplications` (a client of this crate's REST surface).
//! Every implementation is scoped to a single owner.

pub mod handlers;
pub mod http;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};

pub use http::HttpApplications;
pub use memory::{MemoryApplications, MemoryStore};
pub use postgres::PgApplications;

/// The single failure value surfaced to the tracker. Its `Display` is the
/// human-readable message; callers do not branch on anything finer than "it failed".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Application {0} not found")]
    NotFound(Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Request failed (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt application record: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ApplicationApi: Send + Sync {
    /// All applications owned by the current user. No ordering is promised.
    async fn list(&self) -> Result<Vec<Application>, ApiError>;

    async fn get(&self, id: Uuid) -> Result<Option<Application>, ApiError>;

    /// Assigns `id`, `created_at` and `updated_at`; status defaults to `saved`.
    async fn create(&self, fields: NewApplication) -> Result<Application, ApiError>;

    /// Partial update; refreshes `updated_at`.
    async fn update(&self, id: Uuid, fields: ApplicationPatch) -> Result<Application, ApiError>;

    async fn delete(&self, id: Uuid) -> Result<(), ApiError>;

    /// Status-only update that stamps `applied_at` on the first move into `applied`.
    async fn move_application(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError>;
}
