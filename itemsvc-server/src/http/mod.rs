//! HTTP server layer
//!
//! Axum server with:
//! - CORS restricted to the configured origins
//! - Request tracing
//! - Graceful shutdown
//! - Fixed JSON error bodies

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
