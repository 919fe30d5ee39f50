//! Item record and request bodies
//!
//! JSON field names follow the table's column names, since clients read
//! rows exactly as the store returns them.
//!
//! Request fields are not type-checked here. Each one is handed to the store
//! as text and the store decides whether it fits the column.

use chrono::{DateTime, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// Primary key of an item as decoded from the store.
pub type ItemId = i64;

/// Item row as stored in the `items` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: Option<String>,
    pub description: Option<String>,
    #[sqlx(rename = "createdby")]
    #[serde(rename = "createdby")]
    pub created_by: Option<String>,
    #[sqlx(rename = "createddate")]
    #[serde(rename = "createddate", serialize_with = "serialize_created_date")]
    pub created_date: Option<NaiveDate>,
}

/// Render a stored date as midnight in `tz`, expressed as a UTC timestamp
/// with millisecond precision (`2024-05-17T00:00:00.000Z` when `tz` is UTC).
pub fn date_as_timestamp<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<String> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    // A midnight skipped by a DST change resolves to the next hour.
    let local = tz
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&date.and_hms_opt(1, 0, 0)?).earliest())?;
    let utc: DateTime<Utc> = local.with_timezone(&Utc);
    Some(utc.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn serialize_created_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date.and_then(|d| date_as_timestamp(d, &Local)) {
        Some(timestamp) => serializer.serialize_str(&timestamp),
        None => serializer.serialize_none(),
    }
}

/// Text handed to the store for one JSON field.
///
/// Strings pass through, other scalars use their JSON spelling, and
/// null or absent fields become SQL `NULL`.
pub fn field_text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// POST /items body
///
/// Every field is optional; a missing value is bound as SQL `NULL` and left
/// for the store to accept or reject.
#[derive(Debug, Clone, Default)]
pub struct CreateItemRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Recorded as the item's creator.
    pub username: Option<String>,
    /// Accepted for client compatibility, never persisted.
    pub legacy_created_by: Option<Value>,
}

impl CreateItemRequest {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            id: field_text(fields, "id"),
            name: field_text(fields, "name"),
            description: field_text(fields, "description"),
            username: field_text(fields, "username"),
            legacy_created_by: fields.get("CreatedBy").cloned(),
        }
    }
}

/// PUT /items/{id} body
///
/// Both fields are always written, so an omitted field becomes `NULL`.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateItemRequest {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            name: field_text(fields, "name"),
            description: field_text(fields, "description"),
        }
    }
}

/// The columns a create writes, in bind order.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

impl From<CreateItemRequest> for NewItem {
    fn from(req: CreateItemRequest) -> Self {
        Self {
            id: req.id,
            name: req.name,
            description: req.description,
            created_by: req.username,
        }
    }
}
