//! `convenios normalize`: write the cleaned workbook without touching the database

use anyhow::{Context, Result};
use colored::*;
use std::fs::File;

use super::import::print_summary;
use super::write_output;
use crate::cli::NormalizeArgs;
use crate::convenio::excel::{NORMALIZED_SHEET, render_as_spreadsheet};
use crate::convenio::normalize::{self, SourceFormat};

pub fn handle_normalize_command(args: NormalizeArgs) -> Result<()> {
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

    let bytes = render_as_spreadsheet(&normalized.records, NORMALIZED_SHEET)?;
    write_output(&args.output, &bytes)?;

    println!(
        "Normalized workbook saved to: {}",
        args.output.display().to_string().bright_green()
    );
    Ok(())
}
