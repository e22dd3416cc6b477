//! SQLite-backed store
//!
//! Tables:
//! - `boot_params`: one row per identifier with current/default version
//!   numbers and the JSON-encoded version list
//! - `boot_params_v1`: legacy records keyed by hardware identifier
//! - `group_templates`: group to (identifier, version) bindings, cascading
//!   on identifier deletion
//!
//! Every state transition loads the history, applies it through
//! `VersionedBootParams` and writes it back inside one transaction, so this
//! backend follows the same state machine as `MemoryStore`.

use crate::error::{BootParamsError, Result};
use crate::model::BootParams;
use crate::store::BootParamsStore;
use crate::versioned::{GroupBinding, VersionedBootParams};
use chrono::{DateTime, Utc};
use sqlx::{
    Row, SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// SQLite `BootParamsStore`
///
/// The pool serializes nothing on its own; the store-wide lock keeps
/// read-modify-write cycles from interleaving.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    lock: Arc<RwLock<()>>,
}

impl SqliteStore {
    /// Open (or create) a database from a `sqlite://` URL.
    pub async fn open(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        let store = Self::with_pool(pool);
        store.bootstrap().await?;
        info!("Opened boot parameter database {}", url);
        Ok(store)
    }

    /// Open an in-memory database (handy for tests).
    pub async fn open_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        // A single connection that never expires: each in-memory connection
        // is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        let store = Self::with_pool(pool);
        store.bootstrap().await?;
        Ok(store)
    }

    fn with_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            lock: Arc::new(RwLock::new(())),
        }
    }

    async fn bootstrap(&self) -> Result<()> {
        // Improve concurrency for file DBs.
        let _ = sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS boot_params (
              id TEXT PRIMARY KEY,
              current_version INTEGER NOT NULL,
              default_version INTEGER NOT NULL,
              versions TEXT NOT NULL,          -- JSON array, index i holds version i+1
              updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS boot_params_v1 (
              xname TEXT PRIMARY KEY,
              params TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS group_templates (
              group_name TEXT PRIMARY KEY,
              template_id TEXT NOT NULL
                REFERENCES boot_params(id) ON DELETE CASCADE,
              version INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_group_templates_template_id
              ON group_templates(template_id);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn to_version(raw: i64, column: &str) -> Result<u32> {
    u32::try_from(raw)
        .map_err(|_| BootParamsError::Backend(format!("{column} out of range: {raw}")))
}

fn row_to_history(row: &SqliteRow) -> Result<VersionedBootParams> {
    let versions: String = row.try_get("versions")?;
    let updated_at: String = row.try_get("updated_at")?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| BootParamsError::Backend(format!("invalid updated_at {updated_at}: {e}")))?
        .with_timezone(&Utc);
    Ok(VersionedBootParams {
        versions: serde_json::from_str(&versions)?,
        current_version: to_version(row.try_get("current_version")?, "current_version")?,
        default_version: to_version(row.try_get("default_version")?, "default_version")?,
        updated_at,
    })
}

fn row_to_binding(row: &SqliteRow) -> Result<GroupBinding> {
    Ok(GroupBinding {
        group: row.try_get("group_name")?,
        id: row.try_get("template_id")?,
        version: to_version(row.try_get("version")?, "version")?,
    })
}

async fn load_history(conn: &mut SqliteConnection, id: &str) -> Result<Option<VersionedBootParams>> {
    let row = sqlx::query(
        "SELECT current_version, default_version, versions, updated_at FROM boot_params WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(row_to_history).transpose()
}

async fn require_history(conn: &mut SqliteConnection, id: &str) -> Result<VersionedBootParams> {
    load_history(conn, id)
        .await?
        .ok_or_else(|| BootParamsError::NotFound(id.to_string()))
}

async fn save_history(conn: &mut SqliteConnection, id: &str, history: &VersionedBootParams) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO boot_params(id, current_version, default_version, versions, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
          current_version = excluded.current_version,
          default_version = excluded.default_version,
          versions = excluded.versions,
          updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(i64::from(history.current_version))
    .bind(i64::from(history.default_version))
    .bind(serde_json::to_string(&history.versions)?)
    .bind(history.updated_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn save_v1(conn: &mut SqliteConnection, xname: &str, encoded: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO boot_params_v1(xname, params) VALUES (?1, ?2)
        ON CONFLICT(xname) DO UPDATE SET params = excluded.params
        "#,
    )
    .bind(xname)
    .bind(encoded)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn load_binding(conn: &mut SqliteConnection, group: &str) -> Result<GroupBinding> {
    let row = sqlx::query("SELECT group_name, template_id, version FROM group_templates WHERE group_name = ?")
        .bind(group)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| BootParamsError::NotFound(group.to_string()))?;
    row_to_binding(&row)
}

#[async_trait::async_trait]
impl BootParamsStore for SqliteStore {
    async fn set(&self, id: &str, params: BootParams) -> Result<BootParams> {
        params.validate()?;
        let _guard = self.lock.write().await;
        let mut tx = self.pool.begin().await?;
        if load_history(&mut tx, id).await?.is_some() {
            return Err(BootParamsError::AlreadyExists(id.to_string()));
        }
        let created = VersionedBootParams::new(params);
        save_history(&mut tx, id, &created).await?;
        tx.commit().await?;
        info!("Created boot parameters for {}", id);
        created.current(id)
    }

    async fn get(&self, id: &str) -> Result<BootParams> {
        debug!("Getting current boot parameters for {}", id);
        let _guard = self.lock.read().await;
        let mut conn = self.pool.acquire().await?;
        require_history(&mut conn, id).await?.current(id)
    }

    async fn get_version(&self, id: &str, version: u32) -> Result<BootParams> {
        debug!("Getting boot parameters for {} version {}", id, version);
        let _guard = self.lock.read().await;
        let mut conn = self.pool.acquire().await?;
        require_history(&mut conn, id).await?.version(id, version)
    }

    async fn get_default(&self, id: &str) -> Result<BootParams> {
        debug!("Getting default boot parameters for {}", id);
        let _guard = self.lock.read().await;
        let mut conn = self.pool.acquire().await?;
        require_history(&mut conn, id).await?.default_params(id)
    }

    async fn get_history(&self, id: &str) -> Result<VersionedBootParams> {
        let _guard = self.lock.read().await;
        let mut conn = self.pool.acquire().await?;
        require_history(&mut conn, id).await
    }

    async fn update(&self, id: &str, params: BootParams) -> Result<BootParams> {
        params.validate()?;
        let _guard = self.lock.write().await;
        let mut tx = self.pool.begin().await?;
        let mut history = require_history(&mut tx, id).await?;
        let stored = history.append(params);
        save_history(&mut tx, id, &history).await?;
        tx.commit().await?;
        info!("Updated boot parameters for {} to version {}", id, stored.version);
        Ok(stored)
    }

    async fn set_default(&self, id: &str, version: u32) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut tx = self.pool.begin().await?;
        let mut history = require_history(&mut tx, id).await?;
        history.set_default(id, version)?;
        save_history(&mut tx, id, &history).await?;
        tx.commit().await?;
        info!("Set default boot parameters for {} to version {}", id, version);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM group_templates WHERE template_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM boot_params WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if let Err(e) = tx.commit().await {
            error!("Failed to delete boot parameters for {}: {}", id, e);
            return Err(e.into());
        }
        if removed > 0 {
            info!("Deleted boot parameters for {}", id);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let _guard = self.lock.read().await;
        let rows = sqlx::query("SELECT id FROM boot_params ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("id").map_err(BootParamsError::from))
            .collect()
    }

    async fn set_v1(&self, xname: &str, mut params: BootParams) -> Result<()> {
        params.validate()?;
        params.version = 0;
        let encoded = serde_json::to_string(&params)?;
        let _guard = self.lock.write().await;
        let mut conn = self.pool.acquire().await?;
        save_v1(&mut conn, xname, &encoded).await?;
        info!("Stored legacy boot parameters for {}", xname);
        Ok(())
    }

    async fn set_v1_many(&self, xnames: &[String], mut params: BootParams) -> Result<()> {
        params.validate()?;
        params.version = 0;
        let encoded = serde_json::to_string(&params)?;
        let _guard = self.lock.write().await;
        let mut tx = self.pool.begin().await?;
        for xname in xnames {
            save_v1(&mut tx, xname, &encoded).await?;
        }
        tx.commit().await?;
        info!("Stored legacy boot parameters for {} hosts", xnames.len());
        Ok(())
    }

    async fn get_v1(&self, xname: &str) -> Result<BootParams> {
        let _guard = self.lock.read().await;
        let row = sqlx::query("SELECT params FROM boot_params_v1 WHERE xname = ?")
            .bind(xname)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BootParamsError::NotFound(xname.to_string()))?;
        let raw: String = row.try_get("params")?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn delete_v1(&self, xname: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let removed = sqlx::query("DELETE FROM boot_params_v1 WHERE xname = ?")
            .bind(xname)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(BootParamsError::NotFound(xname.to_string()));
        }
        info!("Deleted legacy boot parameters for {}", xname);
        Ok(())
    }

    async fn assign_template_to_group(&self, id: &str, group: &str, version: u32) -> Result<u32> {
        let _guard = self.lock.write().await;
        let mut tx = self.pool.begin().await?;
        let resolved = require_history(&mut tx, id).await?.resolve(id, version)?;
        sqlx::query(
            r#"
            INSERT INTO group_templates(group_name, template_id, version) VALUES (?1, ?2, ?3)
            ON CONFLICT(group_name) DO UPDATE SET
              template_id = excluded.template_id,
              version = excluded.version
            "#,
        )
        .bind(group)
        .bind(id)
        .bind(i64::from(resolved))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        info!("Bound group {} to {} version {}", group, id, resolved);
        Ok(resolved)
    }

    async fn get_template_for_group(&self, group: &str) -> Result<BootParams> {
        debug!("Resolving template for group {}", group);
        let _guard = self.lock.read().await;
        let mut conn = self.pool.acquire().await?;
        let binding = load_binding(&mut conn, group).await?;
        require_history(&mut conn, &binding.id)
            .await?
            .version(&binding.id, binding.version)
    }

    async fn get_group_binding(&self, group: &str) -> Result<GroupBinding> {
        let _guard = self.lock.read().await;
        let mut conn = self.pool.acquire().await?;
        load_binding(&mut conn, group).await
    }

    async fn unassign_group(&self, group: &str) -> Result<()> {
        let _guard = self.lock.write().await;
        let removed = sqlx::query("DELETE FROM group_templates WHERE group_name = ?")
            .bind(group)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if removed == 0 {
            return Err(BootParamsError::NotFound(group.to_string()));
        }
        info!("Removed template binding for group {}", group);
        Ok(())
    }
}
