//! Schema bootstrap for the items table
//!
//! Opt-in: existing tables are left untouched.

use sqlx::PgPool;

const CREATE_ITEMS: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        id BIGINT PRIMARY KEY,
        name TEXT,
        description TEXT,
        createdby TEXT,
        createddate DATE
    )
"#;

const CREATE_CREATEDBY_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_items_createdby ON items (createdby)
"#;

/// Create the items table and its creator index if missing.
pub async fn ensure(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Ensuring items schema...");

    sqlx::query(CREATE_ITEMS).execute(pool).await?;
    sqlx::query(CREATE_CREATEDBY_INDEX).execute(pool).await?;

    tracing::info!("Items schema ready");
    Ok(())
}
