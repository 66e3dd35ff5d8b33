//! Embedded keyed object store.
//!
//! Each store is a single table keyed by `id` inside a SQLite file named
//! after its database (`<root>/<database>.sqlite`). A database may host
//! several stores. Every operation opens its own connection, runs inside one
//! transaction and closes the connection before returning, so no handle
//! outlives a call.
//!
//! When the host cannot provide storage ([`StoreLocation::Disabled`], or a
//! root directory that cannot be created) the record operations degrade to
//! no-ops: reads return nothing and writes resolve successfully. Callers that
//! need to know can ask [`StoreGateway::is_available`] first.

use std::{path::PathBuf, time::Duration};

use futures::future::BoxFuture;
use sqlx::{
    Connection, SqliteConnection,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use thiserror::Error;
use tracing::{debug, warn};

mod record;

pub use record::{Payload, StoredRecord};
use record::StoredRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("storage write failed: {0}")]
    StorageWriteFailed(String),
    #[error("store '{database}' is at version {found}, newer than requested {requested}")]
    VersionMismatch {
        database: String,
        found: u32,
        requested: u32,
    },
    #[error("invalid store name '{0}'")]
    InvalidName(String),
    #[error("corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Identity of a store: database file, table, and schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database: String,
    pub store: String,
    pub version: u32,
}

impl StoreConfig {
    pub fn new(database: impl Into<String>, store: impl Into<String>, version: u32) -> Self {
        Self {
            database: database.into(),
            store: store.into(),
            version,
        }
    }
}

/// Where store files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Directory(PathBuf),
    /// No embedded storage on this host; every store degrades to a no-op.
    Disabled,
}

impl StoreLocation {
    /// An empty path disables storage.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() {
            StoreLocation::Disabled
        } else {
            StoreLocation::Directory(path)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// Byte footprint of one record, as counted by eviction.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EntrySize {
    pub id: String,
    pub created_at: i64,
    pub size: i64,
}

/// Handle to one keyed store. Cheap to clone; holds no open connection.
#[derive(Debug, Clone)]
pub struct StoreGateway {
    config: StoreConfig,
    location: StoreLocation,
}

impl StoreGateway {
    pub fn new(config: StoreConfig, location: StoreLocation) -> Result<Self, StoreError> {
        validate_name(&config.database)?;
        validate_name(&config.store)?;
        Ok(Self { config, location })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens the database, creating the file and the store's table on first
    /// use and recording the schema version.
    pub async fn open(&self) -> Result<SqliteConnection, StoreError> {
        let root = match &self.location {
            StoreLocation::Directory(root) => root,
            StoreLocation::Disabled => {
                return Err(StoreError::StorageUnavailable(
                    "embedded storage is disabled".to_string(),
                ));
            }
        };

        tokio::fs::create_dir_all(root).await.map_err(|e| {
            StoreError::StorageUnavailable(format!("{}: {}", root.display(), e))
        })?;

        let options = SqliteConnectOptions::new()
            .filename(root.join(format!("{}.sqlite", self.config.database)))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        if let Err(e) = self.upgrade(&mut conn).await {
            close_quietly(conn).await;
            return Err(e);
        }
        Ok(conn)
    }

    async fn upgrade(&self, conn: &mut SqliteConnection) -> Result<(), StoreError> {
        let found: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut *conn)
            .await?;
        let found = u32::try_from(found).unwrap_or(0);
        let requested = self.config.version;

        if found > requested {
            return Err(StoreError::VersionMismatch {
                database: self.config.database.clone(),
                found,
                requested,
            });
        }

        let sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{}" (
                   id           TEXT PRIMARY KEY NOT NULL,
                   label        TEXT NOT NULL,
                   created_at   INTEGER NOT NULL,
                   payload_kind TEXT NOT NULL,
                   payload      BLOB NOT NULL
               )"#,
            self.config.store
        );
        sqlx::query(&sql).execute(&mut *conn).await?;

        if found < requested {
            debug!(
                database = %self.config.database,
                from = found,
                to = requested,
                "Upgrading store schema version"
            );
            sqlx::query(&format!("PRAGMA user_version = {requested}"))
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Whether the store can be opened on this host.
    pub async fn is_available(&self) -> bool {
        match self.open().await {
            Ok(conn) => {
                close_quietly(conn).await;
                true
            }
            Err(e) => {
                debug!(database = %self.config.database, error = %e, "Store unavailable");
                false
            }
        }
    }

    /// Runs `action` inside one transaction on a fresh connection. The
    /// transaction commits when `action` succeeds and rolls back otherwise;
    /// the connection is closed in both cases.
    pub async fn run_transaction<T, F>(&self, mode: TransactionMode, action: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection, &'c str) -> BoxFuture<'c, Result<T, StoreError>>
            + Send,
    {
        let mut conn = self.open().await?;
        let result = transact(&mut conn, mode, &self.config.store, action).await;
        close_quietly(conn).await;
        result
    }

    /// Inserts `record`, replacing any record with the same id.
    pub async fn put(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let row = StoredRow::from_record(record)?;
        let result = self
            .run_transaction(TransactionMode::ReadWrite, move |conn, table| {
                Box::pin(async move {
                    let sql = format!(
                        r#"INSERT INTO "{table}" (id, label, created_at, payload_kind, payload)
                           VALUES ($1, $2, $3, $4, $5)
                           ON CONFLICT(id) DO UPDATE SET
                               label = excluded.label,
                               created_at = excluded.created_at,
                               payload_kind = excluded.payload_kind,
                               payload = excluded.payload"#
                    );
                    sqlx::query(&sql)
                        .bind(row.id)
                        .bind(row.label)
                        .bind(row.created_at)
                        .bind(row.payload_kind)
                        .bind(row.payload)
                        .execute(&mut *conn)
                        .await
                        .map_err(|e| StoreError::StorageWriteFailed(e.to_string()))?;
                    Ok(())
                })
            })
            .await;
        self.degrade(result)
    }

    /// Every record, newest first.
    pub async fn get_all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let result = self
            .run_transaction(TransactionMode::ReadOnly, |conn, table| {
                Box::pin(async move {
                    let sql = format!(
                        r#"SELECT id, label, created_at, payload_kind, payload
                           FROM "{table}"
                           ORDER BY created_at DESC, id DESC"#
                    );
                    let rows = sqlx::query_as::<_, StoredRow>(&sql)
                        .fetch_all(&mut *conn)
                        .await?;
                    Ok(rows)
                })
            })
            .await;

        let rows = self.degrade(result)?;
        let records = rows
            .into_iter()
            .filter_map(|row| match StoredRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(database = %self.config.database, error = %e, "Skipping unreadable record");
                    None
                }
            })
            .collect();
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<Option<StoredRecord>, StoreError> {
        let id = id.to_string();
        let result = self
            .run_transaction(TransactionMode::ReadOnly, move |conn, table| {
                Box::pin(async move {
                    let sql = format!(
                        r#"SELECT id, label, created_at, payload_kind, payload
                           FROM "{table}"
                           WHERE id = $1"#
                    );
                    let row = sqlx::query_as::<_, StoredRow>(&sql)
                        .bind(id)
                        .fetch_optional(&mut *conn)
                        .await?;
                    Ok(row)
                })
            })
            .await;

        self.degrade(result)?
            .map(StoredRecord::try_from)
            .transpose()
    }

    /// Removes one record. Absent ids are not an error.
    pub async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let result = self
            .run_transaction(TransactionMode::ReadWrite, move |conn, table| {
                Box::pin(async move {
                    let sql = format!(r#"DELETE FROM "{table}" WHERE id = $1"#);
                    sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .await;
        self.degrade(result)
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let result = self
            .run_transaction(TransactionMode::ReadWrite, |conn, table| {
                Box::pin(async move {
                    let sql = format!(r#"DELETE FROM "{table}""#);
                    sqlx::query(&sql).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .await;
        self.degrade(result)
    }

    /// Per-record byte footprint (id + label + encoded payload), oldest first.
    pub async fn entry_sizes(&self) -> Result<Vec<EntrySize>, StoreError> {
        let result = self
            .run_transaction(TransactionMode::ReadOnly, |conn, table| {
                Box::pin(async move {
                    let sql = format!(
                        r#"SELECT id,
                                  created_at,
                                  LENGTH(CAST(id AS BLOB)) + LENGTH(CAST(label AS BLOB)) + LENGTH(payload) AS size
                           FROM "{table}"
                           ORDER BY created_at ASC, id ASC"#
                    );
                    let sizes = sqlx::query_as::<_, EntrySize>(&sql)
                        .fetch_all(&mut *conn)
                        .await?;
                    Ok(sizes)
                })
            })
            .await;
        self.degrade(result)
    }

    /// Sum of [`EntrySize::size`] over the whole store.
    pub async fn total_size(&self) -> Result<u64, StoreError> {
        let sizes = self.entry_sizes().await?;
        Ok(sizes.iter().map(|entry| entry.size.max(0) as u64).sum())
    }

    fn degrade<T: Default>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        match result {
            Err(StoreError::StorageUnavailable(reason)) => {
                debug!(
                    database = %self.config.database,
                    store = %self.config.store,
                    reason = %reason,
                    "Store unavailable, skipping operation"
                );
                Ok(T::default())
            }
            other => other,
        }
    }
}

async fn transact<T, F>(
    conn: &mut SqliteConnection,
    mode: TransactionMode,
    table: &str,
    action: F,
) -> Result<T, StoreError>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection, &'c str) -> BoxFuture<'c, Result<T, StoreError>>,
{
    if mode == TransactionMode::ReadOnly {
        sqlx::query("PRAGMA query_only = ON")
            .execute(&mut *conn)
            .await?;
    }

    // Failing to start or commit a write means the write did not land.
    let tx_error = |e: sqlx::Error| match mode {
        TransactionMode::ReadWrite => StoreError::StorageWriteFailed(e.to_string()),
        TransactionMode::ReadOnly => StoreError::Database(e),
    };

    let mut tx = conn.begin().await.map_err(tx_error)?;
    match action(&mut *tx, table).await {
        Ok(value) => {
            tx.commit().await.map_err(tx_error)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Store rollback failed");
            }
            Err(e)
        }
    }
}

async fn close_quietly(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!(error = %e, "Failed to close store connection");
    }
}

/// Store and database names end up in file names and SQL identifiers.
fn validate_name(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
