//! Command-line interface definitions

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use commands::edit::EditCommands;
use commands::filter::FilterArgs;
use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "convenios", version, about = "Track agreement cutoff and launch dates")]
pub struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database URL, overrides config and CONVENIOS_DATABASE_URL
    #[arg(long, global = true, value_name = "URL")]
    pub database: Option<String>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a spreadsheet and replace the stored table with it
    Import(ImportArgs),

    /// Normalize a spreadsheet into a clean workbook without touching the database
    Normalize(NormalizeArgs),

    /// Show stored records, optionally filtered
    List(ListArgs),

    /// Show launches and cutoffs due on a day (today by default)
    Today(TodayArgs),

    /// Export the filtered records to a workbook
    Export(ExportArgs),

    /// Add a single record
    Add(AddArgs),

    /// Edit records through a workbook
    #[command(subcommand)]
    Edit(EditCommands),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Spreadsheet to import (.xlsx, .xls, .ods or .csv)
    pub file: PathBuf,

    /// Read the file as CSV regardless of its extension
    #[arg(long)]
    pub csv: bool,

    /// Do not ask for confirmation before replacing the stored table
    #[arg(short, long)]
    pub yes: bool,

    /// Normalize and report, but do not write
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    pub file: PathBuf,

    /// Output workbook
    #[arg(short, long)]
    pub output: PathBuf,

    #[arg(long)]
    pub csv: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Print the values available for each filter instead of records
    #[arg(long)]
    pub options: bool,
}

#[derive(Args, Debug)]
pub struct TodayArgs {
    /// Day to check (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = commands::filter::parse_date_arg)]
    pub date: Option<chrono::NaiveDate>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Output workbook
    #[arg(short, long, default_value = "relatorio_filtrado.xlsx")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Agreement name
    pub convenio: String,

    #[arg(long, default_value = "")]
    pub sistema: String,

    #[arg(long, default_value = "")]
    pub responsavel: String,

    #[arg(long, default_value = "")]
    pub validacao: String,

    #[arg(long, default_value = "")]
    pub referencia: String,

    #[arg(long, value_parser = commands::filter::parse_date_arg)]
    pub data_corte: Option<chrono::NaiveDate>,

    #[arg(long, value_parser = commands::filter::parse_date_arg)]
    pub data_lancamento: Option<chrono::NaiveDate>,
}
