use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-5-2025-08-07";

/// Where the server keeps application records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("APPLICATIONS_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Server configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    /// Required only for the postgres backend.
    pub database_url: Option<String>,
    /// HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,
    /// AI functions answer 503 when unset.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub ai_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match std::env::var("APPLICATIONS_BACKEND") {
            Ok(raw) => StorageBackend::parse(&raw)?,
            Err(_) => StorageBackend::Postgres,
        };
        let database_url = match storage {
            StorageBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StorageBackend::Memory => optional_env("DATABASE_URL"),
        };

        Ok(Config {
            storage,
            database_url,
            jwt_secret: require_env("JWT_SECRET")?,
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            ai_model: optional_env("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Where a tracker client reads its applications from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerBackend {
    /// In-process fake; nothing leaves the process.
    InMemory,
    /// The REST API served by this crate's binary.
    Remote { base_url: String },
}

/// Client-side configuration for the tracker board.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub backend: TrackerBackend,
    pub session_path: PathBuf,
}

impl TrackerConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let backend = match optional_env("APPLYPRO_API_URL") {
            Some(url) => TrackerBackend::Remote {
                base_url: url.trim_end_matches('/').to_string(),
            },
            None => TrackerBackend::InMemory,
        };
        let session_path = optional_env("APPLYPRO_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".applypro/session.json"));

        TrackerConfig {
            backend,
            session_path,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
