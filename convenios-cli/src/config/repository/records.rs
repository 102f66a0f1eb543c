//! Repository for agreement records

use std::collections::HashSet;

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::sessions;
use crate::convenio::{ChangeSet, Record, RecordUpdate};
use crate::error::Result;

/// Row counts written by [`apply_changes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub deleted: u64,
    pub updated: u64,
    pub inserted: u64,
}

/// Read every record, ordered by id
pub async fn read_all(pool: &SqlitePool) -> Result<Vec<Record>> {
    let rows = sqlx::query(
        r#"
        SELECT id, convenio, sistema, responsavel, validacao, referencia,
               data_corte, data_lancamento
        FROM tabela_corte
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_record).collect()
}

/// Read one record on an open connection/transaction
pub async fn read_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Record>> {
    let row = sqlx::query(
        r#"
        SELECT id, convenio, sistema, responsavel, validacao, referencia,
               data_corte, data_lancamento
        FROM tabela_corte
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(row_to_record).transpose()
}

fn row_to_record(row: &SqliteRow) -> Result<Record> {
    Ok(Record {
        id: Some(row.try_get("id")?),
        convenio: row.try_get("convenio")?,
        sistema: row.try_get("sistema")?,
        responsavel: row.try_get("responsavel")?,
        validacao: row.try_get("validacao")?,
        referencia: row.try_get("referencia")?,
        data_corte: row.try_get::<Option<NaiveDate>, _>("data_corte")?,
        data_lancamento: row.try_get::<Option<NaiveDate>, _>("data_lancamento")?,
    })
}

/// Keep the first record for each agreement name
pub fn dedupe_by_convenio(records: &[Record]) -> Vec<&Record> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| {
            let first = seen.insert(r.convenio.as_str());
            if !first {
                log::debug!("Dropping duplicate agreement '{}'", r.convenio);
            }
            first
        })
        .collect()
}

/// Replace the whole table in one transaction.
///
/// Duplicates by agreement name collapse to their first occurrence and ids
/// are assigned from 1 in input order, so replaying the same input gives the
/// same table. Returns the number of rows written.
pub async fn replace_all(pool: &SqlitePool, records: &[Record]) -> Result<usize> {
    let unique = dedupe_by_convenio(records);

    let mut tx = pool.begin().await?;

    let cleared = sqlx::query("DELETE FROM tabela_corte")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    for (index, record) in unique.iter().enumerate() {
        insert_record(&mut *tx, Some(index as i64 + 1), record).await?;
    }

    // Ids now name different records; open edit workbooks can no longer be saved
    let invalidated = sessions::close_open_sessions(&mut *tx).await?;
    if invalidated > 0 {
        log::warn!("Closed {} open edit sessions replaced by this import", invalidated);
    }

    tx.commit().await?;

    log::info!(
        "Replaced {} stored records with {} ({} duplicates dropped)",
        cleared,
        unique.len(),
        records.len() - unique.len()
    );

    Ok(unique.len())
}

async fn insert_record(conn: &mut SqliteConnection, id: Option<i64>, record: &Record) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO tabela_corte (
            id, convenio, sistema, responsavel, validacao, referencia,
            data_corte, data_lancamento
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(&record.convenio)
    .bind(&record.sistema)
    .bind(&record.responsavel)
    .bind(&record.validacao)
    .bind(&record.referencia)
    .bind(record.data_corte)
    .bind(record.data_lancamento)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn update_record(conn: &mut SqliteConnection, update: &RecordUpdate) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE tabela_corte
        SET convenio = ?, sistema = ?, responsavel = ?, validacao = ?,
            referencia = ?, data_corte = ?, data_lancamento = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.convenio)
    .bind(&update.sistema)
    .bind(&update.responsavel)
    .bind(&update.validacao)
    .bind(&update.referencia)
    .bind(update.data_corte)
    .bind(update.data_lancamento)
    .bind(update.id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Apply deletes, updates and inserts on an open connection/transaction
pub async fn apply_changes(conn: &mut SqliteConnection, changes: &ChangeSet) -> Result<ApplyOutcome> {
    let mut outcome = ApplyOutcome::default();

    for id in &changes.deletes {
        outcome.deleted += sqlx::query("DELETE FROM tabela_corte WHERE id = ?")
            .bind(*id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
    }

    for update in &changes.updates {
        let affected = update_record(conn, update).await?;
        if affected == 0 {
            log::warn!("Record {} vanished before it could be updated", update.id);
        }
        outcome.updated += affected;
    }

    for record in &changes.inserts {
        let id = insert_record(conn, None, record).await?;
        log::debug!("Inserted '{}' as {}", record.convenio, id);
        outcome.inserted += 1;
    }

    Ok(outcome)
}

/// Apply a change set as a single transaction; any failure rolls back everything
pub async fn apply(pool: &SqlitePool, changes: &ChangeSet) -> Result<ApplyOutcome> {
    let mut tx = pool.begin().await?;
    let outcome = apply_changes(&mut *tx, changes).await?;
    tx.commit().await?;

    log::info!(
        "Applied changes: {} deleted, {} updated, {} inserted",
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
    use crate::convenio::reconcile;
    use std::collections::BTreeSet;

    fn rec(name: &str) -> Record {
        let mut r = Record::new(name);
        r.validacao = "Ana".into();
        r
    }

    #[tokio::test]
    async fn test_replace_all_dedupes_and_is_idempotent() {
        let pool = memory_pool().await;
        let mut input = vec![rec("Banco A"), rec("Banco B"), rec("Banco A")];
        input[0].data_corte = NaiveDate::from_ymd_opt(2025, 1, 10);

        assert_eq!(replace_all(&pool, &input).await.unwrap(), 2);
        let first = read_all(&pool).await.unwrap();

        assert_eq!(replace_all(&pool, &input).await.unwrap(), 2);
        let second = read_all(&pool).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].id, Some(1));
        assert_eq!(first[0].convenio, "Banco A");
        assert_eq!(first[0].data_corte, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(first[1].id, Some(2));
    }

    #[tokio::test]
    async fn test_surgical_save_leaves_filtered_out_rows() {
        let pool = memory_pool().await;
        replace_all(&pool, &[rec("Banco 1"), rec("Banco 2"), rec("Banco 3")])
            .await
            .unwrap();

        let original = read_all(&pool).await.unwrap();
        let snapshot = original[..2].to_vec();
        let edited = vec![original[0].clone()];

        let changes = reconcile(&edited, &original, &snapshot);
        assert_eq!(changes.deletes, BTreeSet::from([2]));

        let outcome = apply(&pool, &changes).await.unwrap();
        assert_eq!(outcome.deleted, 1);

        let ids: Vec<_> = read_all(&pool).await.unwrap().iter().filter_map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_updates_and_inserts_applied_together() {
        let pool = memory_pool().await;
        replace_all(&pool, &[rec("Banco 1")]).await.unwrap();

        let mut edited = read_all(&pool).await.unwrap();
        edited[0].referencia = "REF-9".into();
        let changes = ChangeSet {
            updates: vec![RecordUpdate::from_record(1, &edited[0])],
            inserts: vec![rec("Banco Novo")],
            ..Default::default()
        };

        let outcome = apply(&pool, &changes).await.unwrap();
        assert_eq!(outcome, ApplyOutcome { deleted: 0, updated: 1, inserted: 1 });

        let stored = read_all(&pool).await.unwrap();
        assert_eq!(stored[0].referencia, "REF-9");
        assert_eq!(stored[1].convenio, "Banco Novo");
        assert_eq!(stored[1].id, Some(2));
    }

    #[tokio::test]
    async fn test_replace_all_closes_open_sessions() {
        let pool = memory_pool().await;
        replace_all(&pool, &[rec("Banco 1")]).await.unwrap();
        let snapshot = read_all(&pool).await.unwrap();
        let id = sessions::create_session(&pool, &crate::convenio::ViewFilter::default(), &snapshot)
            .await
            .unwrap();

        replace_all(&pool, &[rec("Banco 9")]).await.unwrap();

        let session = sessions::get_session(&pool, id).await.unwrap().unwrap();
        assert!(!session.is_open());
        assert!(sessions::latest_open_session(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_apply_rolls_back_everything() {
        let pool = memory_pool().await;
        replace_all(&pool, &[rec("Banco 1"), rec("Banco 2")]).await.unwrap();

        let mut bad = rec("Banco 2");
        bad.convenio = "   ".into();
        let changes = ChangeSet {
            deletes: BTreeSet::from([1]),
            updates: vec![RecordUpdate::from_record(2, &bad)],
            ..Default::default()
        };

        assert!(apply(&pool, &changes).await.is_err());

        let stored = read_all(&pool).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].convenio, "Banco 2");
    }
}
