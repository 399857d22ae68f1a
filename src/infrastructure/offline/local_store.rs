use crate::application::ports::{IntentWriter, PendingOperationLog, RecordStore};
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::offline::{SqliteIntentWriter, SqlitePendingLog, SqliteRecordStore};
use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

/// Explicitly opened handle owning the local database.
///
/// `open` connects and applies migrations; `close` drains the pool. The record
/// store, pending log and intent writer handed out share the same pool and
/// must not be used after `close`.
pub struct LocalStore {
    pool: ConnectionPool,
    records: Arc<SqliteRecordStore>,
    pending: Arc<SqlitePendingLog>,
    writer: Arc<SqliteIntentWriter>,
}

impl LocalStore {
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = ConnectionPool::from_config(config).await?;
        let store = Self::from_pool(pool).await?;
        info!(url = %config.url, "Local store opened");
        Ok(store)
    }

    pub async fn open_in_memory() -> Result<Self, AppError> {
        let pool = ConnectionPool::from_memory().await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: ConnectionPool) -> Result<Self, AppError> {
        pool.migrate().await?;
        let records = Arc::new(SqliteRecordStore::new(pool.get_pool().clone()));
        let pending = Arc::new(SqlitePendingLog::new(pool.get_pool().clone()));
        let writer = Arc::new(SqliteIntentWriter::new(pool.get_pool().clone()));
        Ok(Self {
            pool,
            records,
            pending,
            writer,
        })
    }

    pub fn records(&self) -> Arc<dyn RecordStore> {
        self.records.clone()
    }

    pub fn pending_log(&self) -> Arc<dyn PendingOperationLog> {
        self.pending.clone()
    }

    pub fn intent_writer(&self) -> Arc<dyn IntentWriter> {
        self.writer.clone()
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("Local store closed");
    }
}
