pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ai::handlers as ai;
use crate::applications::handlers as applications;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Applications API
        .route(
            "/api/v1/applications",
            get(applications::handle_list).post(applications::handle_create),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get)
                .patch(applications::handle_update)
                .delete(applications::handle_delete),
        )
        .route(
            "/api/v1/applications/:id/move",
            post(applications::handle_move),
        )
        // AI functions
        .route(
            "/api/v1/functions/improve-resume",
            post(ai::handle_improve_resume),
        )
        .route(
            "/api/v1/functions/generate-cover-letter",
            post(ai::handle_generate_cover_letter),
        )
        .with_state(state)
}

/// Router over fresh in-memory storage with AI disabled.
#[cfg(test)]
pub(crate) fn memory_router(jwt_secret: &str) -> Router {
    use crate::applications::MemoryStore;
    use crate::config::{Config, StorageBackend};
    use crate::state::ApplicationBackend;

    let config = Config {
        storage: StorageBackend::Memory,
        database_url: None,
        jwt_secret: jwt_secret.to_string(),
        openai_api_key: None,
        openai_base_url: "http://localhost".to_string(),
        ai_model: "test-model".to_string(),
        port: 0,
        rust_log: "info".to_string(),
    };
    build_router(AppState {
        applications: ApplicationBackend::Memory(MemoryStore::new()),
        llm: None,
        config,
    })
}
