//! `convenios add`: insert a single record

use anyhow::Result;
use colored::*;

use crate::cli::AddArgs;
use crate::convenio::{ChangeSet, Record};
use crate::store::RecordStore;

impl From<AddArgs> for Record {
    fn from(args: AddArgs) -> Self {
        Record {
            id: None,
            convenio: args.convenio.trim().to_string(),
            sistema: args.sistema.trim().to_string(),
            responsavel: args.responsavel.trim().to_string(),
            validacao: args.validacao.trim().to_string(),
            referencia: args.referencia.trim().to_string(),
            data_corte: args.data_corte,
            data_lancamento: args.data_lancamento,
        }
    }
}

pub async fn handle_add_command(args: AddArgs, store: &dyn RecordStore) -> Result<()> {
    let record = Record::from(args);
    if record.convenio.is_empty() {
        anyhow::bail!("The agreement name cannot be empty");
    }

    let existing = store.read_all().await?;
    if existing.iter().any(|r| r.convenio == record.convenio) {
        println!(
            "{} '{}' is already stored",
            "warning:".yellow(),
            record.convenio
        );
    }

    let name = record.convenio.clone();
    let changes = ChangeSet::default().with_inserts(vec![record]);
    store.apply(&changes).await?;

    println!("{} Added '{}'", "✓".bright_green(), name.bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::repository::testing::memory_pool;
    use crate::store::SqliteStore;

    fn args(name: &str) -> AddArgs {
        AddArgs {
            convenio: name.into(),
            sistema: " SIAFI ".into(),
            responsavel: String::new(),
            validacao: "Ana".into(),
            referencia: String::new(),
            data_corte: None,
            data_lancamento: chrono::NaiveDate::from_ymd_opt(2025, 6, 1),
        }
    }

    #[tokio::test]
    async fn test_add_appends_after_existing_ids() {
        let store = SqliteStore::new(memory_pool().await);
        store.replace_all(&[Record::new("Banco A")]).await.unwrap();

        handle_add_command(args("Banco Novo"), &store).await.unwrap();

        let stored = store.read_all().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].id, Some(2));
        assert_eq!(stored[1].sistema, "SIAFI");
        assert_eq!(stored[1].data_lancamento, chrono::NaiveDate::from_ymd_opt(2025, 6, 1));
    }

    #[tokio::test]
    async fn test_add_rejects_blank_name() {
        let store = SqliteStore::new(memory_pool().await);
        assert!(handle_add_command(args("  "), &store).await.is_err());
        assert!(store.read_all().await.unwrap().is_empty());
    }
}
