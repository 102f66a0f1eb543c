//! Repository for edit sessions
//!
//! A session remembers the filter that was active and the rows that were
//! visible when the edit workbook was exported. Those rows bound what the
//! save is allowed to delete.

use sqlx::{Row, SqliteConnection, SqlitePool};

use super::records::{self, ApplyOutcome};
use crate::convenio::{ChangeSet, Record, ViewFilter};
use crate::error::{ConvenioError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub id: i64,
    pub filter: ViewFilter,
    /// Filtered view snapshot taken when the session started
    pub snapshot: Vec<Record>,
    pub created_at: String,
    pub closed_at: Option<String>,
}

impl EditSession {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}

/// Persist a new session and return its id
pub async fn create_session(pool: &SqlitePool, filter: &ViewFilter, snapshot: &[Record]) -> Result<i64> {
    let filter_json = serde_json::to_string(filter)?;
    let snapshot_json = serde_json::to_string(snapshot)?;

    let result = sqlx::query("INSERT INTO edit_sessions (filter_json, snapshot_json) VALUES (?, ?)")
        .bind(&filter_json)
        .bind(&snapshot_json)
        .execute(pool)
        .await?;

    let id = result.last_insert_rowid();
    log::info!("Started edit session {} with {} visible rows", id, snapshot.len());
    Ok(id)
}

pub async fn get_session(pool: &SqlitePool, id: i64) -> Result<Option<EditSession>> {
    let row = sqlx::query(
        "SELECT id, filter_json, snapshot_json, created_at, closed_at FROM edit_sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_session).transpose()
}

/// Most recent session that has not been saved yet
pub async fn latest_open_session(pool: &SqlitePool) -> Result<Option<EditSession>> {
    let row = sqlx::query(
        r#"
        SELECT id, filter_json, snapshot_json, created_at, closed_at
        FROM edit_sessions
        WHERE closed_at IS NULL
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_session).transpose()
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> Result<EditSession> {
    let filter_json: String = row.try_get("filter_json")?;
    let snapshot_json: String = row.try_get("snapshot_json")?;

    Ok(EditSession {
        id: row.try_get("id")?,
        filter: serde_json::from_str(&filter_json)?,
        snapshot: serde_json::from_str(&snapshot_json)?,
        created_at: row.try_get("created_at")?,
        closed_at: row.try_get("closed_at")?,
    })
}

async fn close_session(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    let result = sqlx::query(
        "UPDATE edit_sessions SET closed_at = CURRENT_TIMESTAMP WHERE id = ? AND closed_at IS NULL",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ConvenioError::SessionNotFound(id));
    }
    Ok(())
}

/// Close every open session; used when the whole table is replaced
pub async fn close_open_sessions(conn: &mut SqliteConnection) -> Result<u64> {
    let result = sqlx::query("UPDATE edit_sessions SET closed_at = CURRENT_TIMESTAMP WHERE closed_at IS NULL")
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

async fn open_snapshot(conn: &mut SqliteConnection, id: i64) -> Result<Vec<Record>> {
    let snapshot_json: Option<String> =
        sqlx::query_scalar("SELECT snapshot_json FROM edit_sessions WHERE id = ? AND closed_at IS NULL")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    match snapshot_json {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Err(ConvenioError::SessionNotFound(id)),
    }
}

/// Every snapshot row must still be stored as it was shown, or be gone.
/// A changed row means its id may now name another record.
async fn verify_snapshot(conn: &mut SqliteConnection, id: i64, snapshot: &[Record]) -> Result<()> {
    for shown in snapshot {
        let Some(record_id) = shown.id else { continue };
        if let Some(stored) = records::read_by_id(&mut *conn, record_id).await? {
            if !stored.same_fields(shown) {
                return Err(ConvenioError::StaleSession {
                    session: id,
                    record: record_id,
                });
            }
        }
    }
    Ok(())
}

/// Apply a session's changes and close it in the same transaction, so a
/// session can never be saved twice. Refused when the rows the session
/// showed were changed by another write in the meantime.
pub async fn apply_session(pool: &SqlitePool, id: i64, changes: &ChangeSet) -> Result<ApplyOutcome> {
    let mut tx = pool.begin().await?;
    let snapshot = open_snapshot(&mut *tx, id).await?;
    verify_snapshot(&mut *tx, id, &snapshot).await?;
    let outcome = records::apply_changes(&mut *tx, changes).await?;
    close_session(&mut *tx, id).await?;
    tx.commit().await?;

    log::info!(
        "Saved edit session {}: {} deleted, {} updated, {} inserted",
        id,
        outcome.deleted,
        outcome.updated,
        outcome.inserted
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::testing::memory_pool;

    #[tokio::test]
    async fn test_session_round_trip() {
        let pool = memory_pool().await;
        let filter = ViewFilter {
            sistemas: vec!["SIAFI".into()],
            ..Default::default()
        };
        let snapshot = vec![Record::new("Banco A").with_id(1)];

        let id = create_session(&pool, &filter, &snapshot).await.unwrap();
        let session = get_session(&pool, id).await.unwrap().unwrap();

        assert_eq!(session.filter, filter);
        assert_eq!(session.snapshot, snapshot);
        assert!(session.is_open());
        assert_eq!(latest_open_session(&pool).await.unwrap().map(|s| s.id), Some(id));
    }

    #[tokio::test]
    async fn test_session_cannot_be_saved_twice() {
        let pool = memory_pool().await;
        records::replace_all(&pool, &[Record::new("Banco A")]).await.unwrap();
        let snapshot = records::read_all(&pool).await.unwrap();
        let id = create_session(&pool, &ViewFilter::default(), &snapshot).await.unwrap();

        let changes = ChangeSet {
            inserts: vec![Record::new("Banco B")],
            ..Default::default()
        };
        apply_session(&pool, id, &changes).await.unwrap();

        let err = apply_session(&pool, id, &changes).await.unwrap_err();
        assert!(matches!(err, ConvenioError::SessionNotFound(_)));
        assert_eq!(records::read_all(&pool).await.unwrap().len(), 2);
        assert!(latest_open_session(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_changed_snapshot_row_refuses_save() {
        let pool = memory_pool().await;
        records::replace_all(&pool, &[Record::new("Banco A"), Record::new("Banco B")])
            .await
            .unwrap();
        let snapshot = records::read_all(&pool).await.unwrap();
        let id = create_session(&pool, &ViewFilter::default(), &snapshot).await.unwrap();

        let mut renamed = snapshot[1].clone();
        renamed.convenio = "Banco Z".into();
        records::apply(
            &pool,
            &ChangeSet {
                updates: vec![crate::convenio::RecordUpdate::from_record(2, &renamed)],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let changes = ChangeSet {
            deletes: std::collections::BTreeSet::from([2]),
            ..Default::default()
        };
        let err = apply_session(&pool, id, &changes).await.unwrap_err();
        assert!(matches!(err, ConvenioError::StaleSession { session, record: 2 } if session == id));
        assert_eq!(records::read_all(&pool).await.unwrap().len(), 2);
        assert!(get_session(&pool, id).await.unwrap().unwrap().is_open());
    }

    #[tokio::test]
    async fn test_row_deleted_elsewhere_does_not_block_save() {
        let pool = memory_pool().await;
        records::replace_all(&pool, &[Record::new("Banco A"), Record::new("Banco B")])
            .await
            .unwrap();
        let snapshot = records::read_all(&pool).await.unwrap();
        let id = create_session(&pool, &ViewFilter::default(), &snapshot).await.unwrap();

        records::apply(
            &pool,
            &ChangeSet {
                deletes: std::collections::BTreeSet::from([1]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        apply_session(&pool, id, &ChangeSet::default()).await.unwrap();
        assert!(!get_session(&pool, id).await.unwrap().unwrap().is_open());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let pool = memory_pool().await;
        assert!(get_session(&pool, 42).await.unwrap().is_none());
    }
}
