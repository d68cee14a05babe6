//! Lexreview Server
//!
//! REST JSON API of a law review submission platform: researchers submit
//! papers, journals and their editors evaluate them, and accounts register a
//! payment method with an external payment provider.

use std::sync::Arc;

use sqlx::PgPool;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Used by the readiness probe
    pub pool: PgPool,
}
