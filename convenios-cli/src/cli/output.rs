//! Rendering records for the terminal

use anyhow::{Context, Result};
use colored::*;
use unicode_width::UnicodeWidthStr;

use crate::convenio::Record;
use crate::convenio::record::columns;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned table
    Table,
    /// Semicolon separated values with a header row
    Csv,
    /// Pretty-printed JSON array
    Json,
}

/// Format records according to the requested output format
pub fn format_records(records: &[Record], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = records
                .iter()
                .map(|r| r.display_values().to_vec())
                .collect();
            Ok(render_table(&columns::ALL, &rows))
        }
        OutputFormat::Csv => records_to_csv(records),
        OutputFormat::Json => {
            serde_json::to_string_pretty(records).context("Failed to format JSON output")
        }
    }
}

fn records_to_csv(records: &[Record]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    writer.write_record(columns::ALL)?;
    for record in records {
        writer.write_record(record.display_values())?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// Render rows under a bold header, padding by display width so accented
/// names stay aligned
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    out.push_str(&header_line.join("  ").bold().to_string());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push_str(&rule.join("  ").dimmed().to_string());
    out.push('\n');

    for row in rows {
        let line: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }

    out
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}
