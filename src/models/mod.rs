//! Response models for the service's own endpoints
//!
//! This module defines the DTOs serialized into HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::HealthResponse;
