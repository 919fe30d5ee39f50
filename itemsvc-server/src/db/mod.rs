//! Database layer - connection pool, schema bootstrap and repositories
//!
//! - One pooled connection per request, released when the guard drops
//! - One statement per operation, no transactions spanning statements
//! - Uniqueness is left to the table's primary key

pub mod pool;
pub mod repos;
pub mod schema;

pub use pool::{create_pool, PoolSettings};
pub use repos::*;
