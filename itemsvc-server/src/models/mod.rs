//! Domain models

pub mod item;

pub use item::*;

use serde::Serialize;

/// GET /username response
#[derive(Debug, Serialize)]
pub struct UsernameResponse {
    pub username: String,
}

/// Confirmation body for operations that return no row
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
