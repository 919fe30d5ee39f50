//! Host username endpoint

use axum::{routing::get, Json, Router};

use crate::models::UsernameResponse;

/// GET /username - the account the server process runs as
async fn username() -> Json<UsernameResponse> {
    Json(UsernameResponse {
        username: whoami::username(),
    })
}

/// Username routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/username", get(username))
}
