//! Feed Edge - cache and HTTP plumbing for a social-feed content service
//!
//! Provides a two-tier cache (Redis with an in-process fallback) and the
//! middleware stack in front of the static web frontend.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::Cache;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
