pub mod constants;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod matching;
pub mod models;
pub mod notifications;
pub mod store;
pub mod utils;

pub use utils::config::Config;
pub use db::connection::get_db_pool;

// Re-export common types
pub use sqlx::PgPool;
pub use anyhow::Result;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
