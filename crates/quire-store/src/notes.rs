//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quire_core::{new_v7, CreateNoteRequest, Error, Note, NoteStore, NoteUpdate, Result};

/// PostgreSQL implementation of NoteStore.
#[derive(Clone)]
pub struct PgNoteStore {
    pool: Pool<Postgres>,
}

impl PgNoteStore {
    /// Create a new PgNoteStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn row_to_note(r: &sqlx::postgres::PgRow) -> Note {
    Note {
        id: r.get("id"),
        folder_id: r.get("folder_id"),
        title: r.get("title"),
        content: r.get("content"),
        owner_id: r.get("owner_id"),
        created_at_utc: r.get("created_at_utc"),
        updated_at_utc: r.get("updated_at_utc"),
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO note (id, folder_id, title, content, owner_id, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $6)",
        )
        .bind(id)
        .bind(req.folder_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.owner_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        let row = sqlx::query(
            "SELECT id, folder_id, title, content, owner_id, created_at_utc, updated_at_utc
             FROM note WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(row_to_note))
    }

    async fn list_for_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, folder_id, title, content, owner_id, created_at_utc, updated_at_utc
             FROM note
             WHERE owner_id = $1 AND folder_id = $2
             ORDER BY created_at_utc",
        )
        .bind(owner)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_note).collect())
    }

    async fn list_all(&self, owner: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            "SELECT id, folder_id, title, content, owner_id, created_at_utc, updated_at_utc
             FROM note
             WHERE owner_id = $1
             ORDER BY created_at_utc",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(row_to_note).collect())
    }

    async fn update(&self, id: Uuid, update: NoteUpdate) -> Result<()> {
        let result = sqlx::query(
            "UPDATE note SET title = $1, content = $2, updated_at_utc = $3 WHERE id = $4",
        )
        .bind(&update.title)
        .bind(&update.content)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NoteNotFound(id));
        }
        Ok(())
    }

    async fn delete_in_folder(&self, owner: Uuid, folder_id: Uuid) -> Result<()> {
        // Single-statement batch; deleting zero notes is a success.
        sqlx::query("DELETE FROM note WHERE owner_id = $1 AND folder_id = $2")
            .bind(owner)
            .bind(folder_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete_all_for_owner(&self, owner: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM note WHERE owner_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
