//! Folder repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quire_core::{new_v7, Error, Folder, FolderStore, Result};

/// PostgreSQL implementation of FolderStore.
#[derive(Clone)]
pub struct PgFolderStore {
    pool: Pool<Postgres>,
}

impl PgFolderStore {
    /// Create a new PgFolderStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_folder(r: &sqlx::postgres::PgRow) -> Folder {
    Folder {
        id: r.get("id"),
        name: r.get("name"),
        owner_id: r.get("owner_id"),
        created_at_utc: r.get("created_at_utc"),
        updated_at_utc: r.get("updated_at_utc"),
    }
}

#[async_trait]
impl FolderStore for PgFolderStore {
    async fn create(&self, owner: Uuid, name: &str) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO folder (id, name, owner_id, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id)
        .bind(name)
        .bind(owner)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Folder>> {
        let row = sqlx::query(
            "SELECT id, name, owner_id, created_at_utc, updated_at_utc
             FROM folder WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(row_to_folder))
    }

    async fn find_by_name(&self, owner: Uuid, name: &str) -> Result<Option<Folder>> {
        // Limit-1 lookup; oldest id wins when duplicates exist so repeated
        // bootstraps keep adopting the same folder.
        let row = sqlx::query(
            "SELECT id, name, owner_id, created_at_utc, updated_at_utc
             FROM folder
             WHERE owner_id = $1 AND name = $2
             ORDER BY id
             LIMIT 1",
        )
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(row_to_folder))
    }

    async fn list(&self, owner: Uuid) -> Result<Vec<Folder>> {
        let rows = sqlx::query(
            "SELECT id, name, owner_id, created_at_utc, updated_at_utc
             FROM folder
             WHERE owner_id = $1
             ORDER BY name",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_folder).collect())
    }

    async fn rename(&self, id: Uuid, new_name: &str) -> Result<()> {
        let result = sqlx::query("UPDATE folder SET name = $1, updated_at_utc = $2 WHERE id = $3")
            .bind(new_name)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::FolderNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM folder WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::FolderNotFound(id));
        }
        Ok(())
    }
}
