//! API Module
//!
//! HTTP handlers and application assembly.
//!
//! # Endpoints
//! - `GET /health` - Health check with cache backend and hit/miss counters
//! - everything else - Static site under the configured root

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
