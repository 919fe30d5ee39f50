//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - One statement per call, on one explicitly acquired connection
//! - Constraint violations come back from the store, never pre-checked

pub mod items;

pub use items::{DbError, ItemRepo};
