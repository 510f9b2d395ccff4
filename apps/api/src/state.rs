use sqlx::PgPool;
use uuid::Uuid;

use crate::applications::{ApplicationApi, MemoryStore, PgApplications};
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Storage behind the applications endpoints, chosen by configuration.
#[derive(Clone)]
pub enum ApplicationBackend {
    Postgres(PgPool),
    Memory(MemoryStore),
}

impl ApplicationBackend {
    /// The persistence API as seen by one user.
    pub fn for_user(&self, user_id: Uuid) -> Box<dyn ApplicationApi> {
        match self {
            ApplicationBackend::Postgres(pool) => Box::new(PgApplications::new(pool.clone(), user_id)),
            ApplicationBackend::Memory(store) => Box::new(store.scoped(user_id)),
        }
    }
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub applications: ApplicationBackend,
    /// `None` when no API key is configured; AI endpoints then answer 503.
    pub llm: Option<LlmClient>,
    pub config: Config,
}
