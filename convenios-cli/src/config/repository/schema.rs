//! Table definitions, created on connect

use sqlx::SqlitePool;

use crate::error::Result;

/// Create the tables if they do not exist yet
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    // INTEGER PRIMARY KEY without AUTOINCREMENT: ids restart at 1 after a full replace
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tabela_corte (
            id INTEGER PRIMARY KEY,
            convenio TEXT NOT NULL CHECK (length(trim(convenio)) > 0),
            sistema TEXT NOT NULL DEFAULT '',
            responsavel TEXT NOT NULL DEFAULT '',
            validacao TEXT NOT NULL DEFAULT '',
            referencia TEXT NOT NULL DEFAULT '',
            data_corte TEXT,
            data_lancamento TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS edit_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filter_json TEXT NOT NULL,
            snapshot_json TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            closed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
