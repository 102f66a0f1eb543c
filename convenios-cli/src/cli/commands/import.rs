//! `convenios import`: normalize an upload and replace the stored table

use anyhow::{Context, Result};
use colored::*;
use std::fs::File;

use super::confirm;
use crate::cli::ImportArgs;
use crate::convenio::normalize::{self, Normalized, SourceFormat};
use crate::store::RecordStore;

pub async fn handle_import_command(args: ImportArgs, store: &dyn RecordStore) -> Result<()> {
    let format = if args.csv {
        SourceFormat::Csv
    } else {
        SourceFormat::from_path(&args.file)
    };

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open spreadsheet: {}", args.file.display()))?;
    let normalized = normalize::normalize(file, format)
        .with_context(|| format!("Failed to normalize {}", args.file.display()))?;

    print_summary(&normalized);

    if args.dry_run {
        println!("{}", "Dry run, nothing written.".yellow());
        return Ok(());
    }

    let prompt = if normalized.records.is_empty() {
        println!("{}", "The upload has no records.".yellow());
        "Clear the stored table?".to_string()
    } else {
        format!("Replace the stored table with {} records?", normalized.records.len())
    };
    if !confirm(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let written = store.replace_all(&normalized.records).await?;
    println!(
        "{} {} records stored",
        "✓".bright_green(),
        written.to_string().bold()
    );
    if written < normalized.records.len() {
        println!(
            "  {} duplicate agreement names were skipped",
            normalized.records.len() - written
        );
    }

    Ok(())
}

/// Print what normalization kept, dropped and could not parse
pub fn print_summary(normalized: &Normalized) {
    println!(
        "{} records, {} section rows and {} blank rows dropped",
        normalized.records.len().to_string().bold(),
        normalized.separators_dropped,
        normalized.blank_rows_dropped
    );

    for warning in &normalized.warnings {
        println!(
            "  {} row {}: '{}' in {} is not a date, left empty",
            "warning:".yellow(),
            warning.row,
            warning.value,
            warning.column
        );
    }
}
