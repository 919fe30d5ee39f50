//! Custom Axum extractors

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderMap};
use serde_json::{Map, Value};

use super::error::ApiError;

/// Top-level fields of a JSON object body, with no shape or type checks.
///
/// A body that is missing, not labelled as JSON, unparsable, or not an
/// object yields no fields at all. Every column then binds as `NULL` and
/// the store decides what happens.
#[derive(Debug, Default)]
pub struct JsonFields(pub Map<String, Value>);

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<S> FromRequest<S> for JsonFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json_content_type(req.headers()) {
            return Ok(Self::default());
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Internal {
                message: format!("failed to read request body: {}", e),
            })?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(fields)) => Ok(Self(fields)),
            Ok(_) => Ok(Self::default()),
            Err(e) => {
                tracing::debug!("Ignoring unparsable JSON body: {}", e);
                Ok(Self::default())
            }
        }
    }
}
