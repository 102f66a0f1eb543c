//! `convenios edit`: round-trip a filtered view through a workbook
//!
//! `edit start` records the filter and the visible rows as a session and
//! writes them with their ids. `edit apply` reads the workbook back and
//! saves only the difference: rows removed from the sheet are deleted, but
//! only if they were part of the session's visible rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;

use super::filter::FilterArgs;
use super::write_output;
use crate::config::Config;
use crate::config::repository::sessions::{self, EditSession};
use crate::convenio::excel::{read_edit_workbook, render_edit_workbook};
use crate::convenio::{ChangeSet, Record, ViewFilter, new_rows, reconcile};
use crate::store::{RecordStore, SqliteStore};

#[derive(Subcommand, Debug)]
pub enum EditCommands {
    /// Export the filtered view as an editable workbook and open a session
    Start(EditStartArgs),

    /// Save an edited workbook back to the database
    Apply(EditApplyArgs),
}

#[derive(Args, Debug)]
pub struct EditStartArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output workbook
    #[arg(short, long, default_value = "edicao.xlsx")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct EditApplyArgs {
    /// Edited workbook
    pub file: PathBuf,

    /// Session to save (defaults to the latest open one)
    #[arg(long)]
    pub session: Option<i64>,

    /// Show the planned changes without saving
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_edit_command(command: EditCommands, config: &Config, store: &SqliteStore) -> Result<()> {
    match command {
        EditCommands::Start(args) => start(args, config, store).await,
        EditCommands::Apply(args) => apply(args, store).await,
    }
}

async fn start(args: EditStartArgs, config: &Config, store: &SqliteStore) -> Result<()> {
    let records = store.read_all().await?;
    let filter: ViewFilter = args.filter.into();
    let visible = filter.apply(&records);

    let session_id = sessions::create_session(store.pool(), &filter, &visible).await?;
    let bytes = render_edit_workbook(&visible)?;
    let path = config.export_path(&args.output);
    write_output(&path, &bytes)?;

    println!(
        "Session {} started with {} rows: {}",
        session_id.to_string().bold(),
        visible.len(),
        path.display().to_string().bright_green()
    );
    println!(
        "Edit the file, then run: {}",
        format!("convenios edit apply {} --session {}", path.display(), session_id).cyan()
    );
    Ok(())
}

async fn apply(args: EditApplyArgs, store: &SqliteStore) -> Result<()> {
    let session = load_session(store, args.session).await?;

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read workbook: {}", args.file.display()))?;
    let edited = read_edit_workbook(bytes)
        .with_context(|| format!("Failed to read edit workbook: {}", args.file.display()))?;

    let original = store.read_all().await?;
    let changes = plan_changes(&edited, &original, &session);

    print_plan(&changes);

    if changes.is_empty() {
        println!("Nothing to save.");
        return Ok(());
    }
    if args.dry_run {
        println!("{}", "Dry run, nothing written.".yellow());
        return Ok(());
    }

    let outcome = sessions::apply_session(store.pool(), session.id, &changes).await?;
    println!(
        "{} Session {} saved: {} deleted, {} updated, {} inserted",
        "✓".bright_green(),
        session.id,
        outcome.deleted,
        outcome.updated,
        outcome.inserted
    );
    Ok(())
}

async fn load_session(store: &SqliteStore, id: Option<i64>) -> Result<EditSession> {
    let session = match id {
        Some(id) => sessions::get_session(store.pool(), id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Edit session {} does not exist", id))?,
        None => sessions::latest_open_session(store.pool())
            .await?
            .ok_or_else(|| anyhow::anyhow!("No open edit session. Run 'convenios edit start' first."))?,
    };

    if !session.is_open() {
        anyhow::bail!(
            "Edit session {} is closed: it was already saved or the table was re-imported since. Run 'convenios edit start' again.",
            session.id
        );
    }
    log::debug!("Using edit session {} from {}", session.id, session.created_at);
    Ok(session)
}

/// Deletes and updates bounded by the session snapshot, plus the new rows
fn plan_changes(edited: &[Record], original: &[Record], session: &EditSession) -> ChangeSet {
    reconcile(edited, original, &session.snapshot).with_inserts(new_rows(edited))
}

fn print_plan(changes: &ChangeSet) {
    println!(
        "{} to delete, {} to update, {} to insert",
        changes.deletes.len().to_string().red(),
        changes.updates.len().to_string().yellow(),
        changes.inserts.len().to_string().green()
    );
    for id in &changes.deletes {
        log::info!("delete {}", id);
    }
    for update in &changes.updates {
        log::info!("update {} ({})", update.id, update.convenio);
    }
    for record in &changes.inserts {
        log::info!("insert '{}'", record.convenio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::testing::memory_pool;
    use crate::convenio::excel::render_edit_workbook;
    use std::collections::BTreeSet;

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::new(memory_pool().await);
        let mut records = vec![Record::new("Banco 1"), Record::new("Banco 2"), Record::new("Banco 3")];
        records[0].sistema = "SIAFI".into();
        records[1].sistema = "SIAFI".into();
        records[2].sistema = "SIG".into();
        store.replace_all(&records).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_filtered_edit_only_touches_visible_rows() {
        let store = seeded_store().await;
        let filter = ViewFilter {
            sistemas: vec!["SIAFI".into()],
            ..Default::default()
        };
        let visible = filter.apply(&store.read_all().await.unwrap());
        let id = sessions::create_session(store.pool(), &filter, &visible).await.unwrap();
        let session = load_session(&store, Some(id)).await.unwrap();

        // User deletes "Banco 2", renames "Banco 1" and adds a row
        let bytes = render_edit_workbook(&visible).unwrap();
        let mut edited = read_edit_workbook(bytes).unwrap();
        edited.remove(1);
        edited[0].referencia = "REF-1".into();
        edited.push(Record::new("Banco 4"));

        let changes = plan_changes(&edited, &store.read_all().await.unwrap(), &session);
        assert_eq!(changes.deletes, BTreeSet::from([2]));
        assert_eq!(changes.updates.len(), 1);
        assert_eq!(changes.inserts.len(), 1);

        sessions::apply_session(store.pool(), id, &changes).await.unwrap();

        let names: Vec<_> = store
            .read_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.convenio)
            .collect();
        assert_eq!(names, vec!["Banco 1", "Banco 3", "Banco 4"]);
    }

    #[tokio::test]
    async fn test_reimport_invalidates_open_session() {
        let store = seeded_store().await;
        let visible = store.read_all().await.unwrap();
        let id = sessions::create_session(store.pool(), &ViewFilter::default(), &visible)
            .await
            .unwrap();
        let session = load_session(&store, Some(id)).await.unwrap();

        // Workbook with "Banco 2" removed, saved after a fresh import
        let mut edited = read_edit_workbook(render_edit_workbook(&visible).unwrap()).unwrap();
        edited.remove(1);
        store
            .replace_all(&[Record::new("Banco X"), Record::new("Banco Y"), Record::new("Banco Z")])
            .await
            .unwrap();

        assert!(load_session(&store, Some(id)).await.is_err());
        let changes = plan_changes(&edited, &store.read_all().await.unwrap(), &session);
        assert!(sessions::apply_session(store.pool(), id, &changes).await.is_err());

        let names: Vec<_> = store.read_all().await.unwrap().into_iter().map(|r| r.convenio).collect();
        assert_eq!(names, vec!["Banco X", "Banco Y", "Banco Z"]);
    }

    #[tokio::test]
    async fn test_reused_id_is_not_overwritten() {
        let store = seeded_store().await;
        let visible = store.read_all().await.unwrap();
        let id = sessions::create_session(store.pool(), &ViewFilter::default(), &visible)
            .await
            .unwrap();
        let session = load_session(&store, Some(id)).await.unwrap();

        // Meanwhile "Banco 3" is deleted and a new row takes its freed id
        store
            .apply(&ChangeSet {
                deletes: BTreeSet::from([3]),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .apply(&ChangeSet::default().with_inserts(vec![Record::new("Banco 4")]))
            .await
            .unwrap();
        let current = store.read_all().await.unwrap();
        assert_eq!(current[2].id, Some(3));

        // The stale workbook still holds "Banco 3" under id 3 and drops "Banco 2"
        let mut edited = read_edit_workbook(render_edit_workbook(&visible).unwrap()).unwrap();
        edited.remove(1);
        let changes = plan_changes(&edited, &current, &session);

        let err = sessions::apply_session(store.pool(), id, &changes).await.unwrap_err();
        assert!(matches!(err, crate::error::ConvenioError::StaleSession { record: 3, .. }));

        let names: Vec<_> = store.read_all().await.unwrap().into_iter().map(|r| r.convenio).collect();
        assert_eq!(names, vec!["Banco 1", "Banco 2", "Banco 4"]);
    }

    #[tokio::test]
    async fn test_saved_session_cannot_be_loaded_again() {
        let store = seeded_store().await;
        let visible = store.read_all().await.unwrap();
        let id = sessions::create_session(store.pool(), &ViewFilter::default(), &visible)
            .await
            .unwrap();
        sessions::apply_session(store.pool(), id, &ChangeSet::default()).await.unwrap();

        assert!(load_session(&store, Some(id)).await.is_err());
        assert!(load_session(&store, None).await.is_err());
    }
}
