//! Storage seam used by the commands

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::config::repository::records::{self, ApplyOutcome};
use crate::convenio::{ChangeSet, Record};
use crate::error::Result;

/// Persistent record set
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Full scan of the stored records
    async fn read_all(&self) -> Result<Vec<Record>>;

    /// Atomic truncate + bulk insert, deduplicated by agreement name
    async fn replace_all(&self, records: &[Record]) -> Result<usize>;

    /// Apply deletes, updates and inserts as one atomic unit
    async fn apply(&self, changes: &ChangeSet) -> Result<ApplyOutcome>;
}

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn read_all(&self) -> Result<Vec<Record>> {
        records::read_all(&self.pool).await
    }

    async fn replace_all(&self, records: &[Record]) -> Result<usize> {
        records::replace_all(&self.pool, records).await
    }

    async fn apply(&self, changes: &ChangeSet) -> Result<ApplyOutcome> {
        records::apply(&self.pool, changes).await
    }
}
