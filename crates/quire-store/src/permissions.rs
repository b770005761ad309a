//! Permission repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use quire_core::{Error, Permission, PermissionStore, Result};

/// PostgreSQL implementation of PermissionStore.
#[derive(Clone)]
pub struct PgPermissionStore {
    pool: Pool<Postgres>,
}

impl PgPermissionStore {
    /// Create a new PgPermissionStore with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for PgPermissionStore {
    async fn set(&self, resource_id: Uuid, user_id: Uuid, permission: Permission) -> Result<()> {
        sqlx::query(
            "INSERT INTO permission (resource_id, user_id, can_edit, can_view)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (resource_id, user_id)
             DO UPDATE SET can_edit = $3, can_view = $4",
        )
        .bind(resource_id)
        .bind(user_id)
        .bind(permission.can_edit)
        .bind(permission.can_view)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, resource_id: Uuid, user_id: Uuid) -> Result<Option<Permission>> {
        let row = sqlx::query(
            "SELECT can_edit, can_view FROM permission
             WHERE resource_id = $1 AND user_id = $2",
        )
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Permission {
            can_edit: r.get("can_edit"),
            can_view: r.get("can_view"),
        }))
    }
}
