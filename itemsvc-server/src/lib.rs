//! itemsvc-server: HTTP item service
//!
//! Maps each HTTP verb+path onto a single parameterized statement against
//! the `items` table and returns the resulting row(s) as JSON.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, PoolSettings};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use models::Item;
