//! # quire-store
//!
//! Remote-store gateway implementations for quire.
//!
//! This crate provides:
//! - Connection pool management for the PostgreSQL backend
//! - `Pg*Store` repositories implementing the gateway traits
//! - Idempotent schema bootstrap
//! - A hermetic in-memory store with deterministic fault injection and
//!   completion gating for exercising the synchronization core's race rules
//!
//! ## Example
//!
//! ```rust,ignore
//! use quire_store::{Database, FolderStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/quire").await?;
//!     db.migrate().await?;
//!
//!     let owner = quire_core::new_v7();
//!     let folder_id = db.folders.create(owner, "Work").await?;
//!     println!("Created folder: {}", folder_id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod folders;
pub mod memory;
pub mod notes;
pub mod permissions;
pub mod pool;
pub mod schema;

// Re-export core types
pub use quire_core::*;

pub use config::StoreConfig;
pub use folders::PgFolderStore;
pub use memory::{GateHandle, MemoryStore};
pub use notes::PgNoteStore;
pub use permissions::PgPermissionStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use schema::ensure_schema;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Folder repository.
    pub folders: PgFolderStore,
    /// Note repository.
    pub notes: PgNoteStore,
    /// Permission repository.
    pub permissions: PgPermissionStore,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            folders: PgFolderStore::new(pool.clone()),
            notes: PgNoteStore::new(pool.clone()),
            permissions: PgPermissionStore::new(pool.clone()),
            pool,
        }
    }

    /// Connect to the given database URL with default pool settings.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = pool::create_pool(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Connect using configuration resolved from the environment.
    pub async fn from_env() -> Result<Self> {
        let config = StoreConfig::from_env()?;
        let pool = pool::create_pool_with_config(&config.database_url, config.pool).await?;
        Ok(Self::new(pool))
    }

    /// Bootstrap the schema (idempotent).
    pub async fn migrate(&self) -> Result<()> {
        schema::ensure_schema(&self.pool).await
    }

    /// Assemble a [`Gateway`] over this database for the synchronization
    /// core.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(
            std::sync::Arc::new(self.folders.clone()),
            std::sync::Arc::new(self.notes.clone()),
            std::sync::Arc::new(self.permissions.clone()),
        )
    }
}
