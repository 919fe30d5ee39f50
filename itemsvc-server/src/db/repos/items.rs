//! Item repository
//!
//! Every method holds exactly one pooled connection for exactly one
//! statement. The `PoolConnection` guard goes back to the pool when it drops,
//! so the `?` paths release it the same as the success path.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::Instrument;

use crate::models::{Item, NewItem};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {resource} '{id}' already exists")]
    Conflict {
        resource: &'static str,
        id: String,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    fn item_not_found(id: &str) -> Self {
        Self::NotFound {
            resource: "item",
            id: id.to_owned(),
        }
    }

    /// Split unique violations out of the generic store failures.
    fn from_insert(err: sqlx::Error, id: Option<&str>) -> Self {
        let unique_violation =
            matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());

        if unique_violation {
            Self::Conflict {
                resource: "item",
                id: id.unwrap_or_default().to_owned(),
                source: err,
            }
        } else {
            Self::Sqlx(err)
        }
    }
}

// Columns are cast on the way out so an externally created table with an
// INTEGER id or VARCHAR text columns still decodes into `Item`.
macro_rules! item_columns {
    () => {
        "id::bigint AS id, name::text AS name, description::text AS description, \
         createdby::text AS createdby, createddate::date AS createddate"
    };
}

// Values arrive as text and are cast by the store; a value that does not fit
// is a store error.
const INSERT_ITEM: &str = concat!(
    "INSERT INTO items (id, name, description, createdby, createddate) ",
    "VALUES ($1::text::bigint, $2::text, $3::text, $4::text, current_date) ",
    "RETURNING ",
    item_columns!()
);

const SELECT_BY_CREATOR: &str = concat!(
    "SELECT ",
    item_columns!(),
    " FROM items WHERE createdby = $1::text ORDER BY id ASC"
);

const SELECT_BY_ID: &str = concat!(
    "SELECT ",
    item_columns!(),
    " FROM items WHERE id = $1::text::bigint"
);

const UPDATE_BY_ID: &str = concat!(
    "UPDATE items SET name = $1::text, description = $2::text ",
    "WHERE id = $3::text::bigint RETURNING ",
    item_columns!()
);

const DELETE_BY_ID: &str = concat!(
    "DELETE FROM items WHERE id = $1::text::bigint RETURNING ",
    item_columns!()
);

/// Item repository
pub struct ItemRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn connection(&self) -> Result<PoolConnection<Postgres>, DbError> {
        let conn = self
            .pool
            .acquire()
            .instrument(tracing::debug_span!("acquire"))
            .await?;
        Ok(conn)
    }

    /// Insert a row stamped with the store's current date.
    ///
    /// Returns `DbError::Conflict` when the id already exists.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, item: NewItem) -> Result<Item, DbError> {
        let mut conn = self.connection().await?;
        let id = item.id.clone();

        sqlx::query_as::<_, Item>(INSERT_ITEM)
            .bind(item.id.as_deref())
            .bind(item.name)
            .bind(item.description)
            .bind(item.created_by)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| DbError::from_insert(e, id.as_deref()))
    }

    /// Items recorded under `creator`, ascending by id. Empty is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn list_by_creator(&self, creator: &str) -> Result<Vec<Item>, DbError> {
        let mut conn = self.connection().await?;

        let items = sqlx::query_as::<_, Item>(SELECT_BY_CREATOR)
            .bind(creator)
            .fetch_all(&mut *conn)
            .await?;

        Ok(items)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Item, DbError> {
        let mut conn = self.connection().await?;

        sqlx::query_as::<_, Item>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::item_not_found(id))
    }

    /// Overwrite both name and description; `None` writes `NULL`.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Item, DbError> {
        let mut conn = self.connection().await?;

        sqlx::query_as::<_, Item>(UPDATE_BY_ID)
            .bind(name)
            .bind(description)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::item_not_found(id))
    }

    /// Delete by id, returning the removed row.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Item, DbError> {
        let mut conn = self.connection().await?;

        sqlx::query_as::<_, Item>(DELETE_BY_ID)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::item_not_found(id))
    }
}
