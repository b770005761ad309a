//! Idempotent schema bootstrap for the PostgreSQL backend.
//!
//! Deployments that manage schema externally can skip [`ensure_schema`];
//! the repositories only assume the tables below exist.

use sqlx::PgPool;
use tracing::info;

use quire_core::{Error, Result};

/// DDL statements, applied in order. Each is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS folder (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        owner_id UUID NOT NULL,
        created_at_utc TIMESTAMPTZ NOT NULL,
        updated_at_utc TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_folder_owner ON folder(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_folder_owner_name ON folder(owner_id, name)",
    r#"
    CREATE TABLE IF NOT EXISTS note (
        id UUID PRIMARY KEY,
        folder_id UUID NOT NULL REFERENCES folder(id),
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        owner_id UUID NOT NULL,
        created_at_utc TIMESTAMPTZ NOT NULL,
        updated_at_utc TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_note_owner_folder ON note(owner_id, folder_id)",
    "CREATE INDEX IF NOT EXISTS idx_note_folder ON note(folder_id)",
    r#"
    CREATE TABLE IF NOT EXISTS permission (
        resource_id UUID NOT NULL,
        user_id UUID NOT NULL,
        can_edit BOOLEAN NOT NULL,
        can_view BOOLEAN NOT NULL,
        PRIMARY KEY (resource_id, user_id)
    )
    "#,
];

/// Create the folder, note, and permission tables and their indexes if they
/// do not already exist.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for ddl in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    info!(
        subsystem = "store",
        component = "schema",
        op = "ensure",
        "Schema bootstrap complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statement_order() {
        // Tables must be created before the indexes that reference them,
        // and folder before note (FK dependency).
        let folder_pos = SCHEMA.iter().position(|s| s.contains("TABLE IF NOT EXISTS folder"));
        let note_pos = SCHEMA.iter().position(|s| s.contains("TABLE IF NOT EXISTS note"));
        assert!(folder_pos.unwrap() < note_pos.unwrap());
    }
}
