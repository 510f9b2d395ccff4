//! ApplyPro: job-application tracker service and board client.
//!
//! The binary serves the applications REST API and the AI functions. The
//! `tracker` and `session` modules are the client side of the same API.

pub mod ai;
pub mod applications;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod tracker;
