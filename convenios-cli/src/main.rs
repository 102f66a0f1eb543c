//! convenios: keeps the agreement cutoff/launch table in SQLite and moves it
//! in and out of spreadsheets.

mod cli;
mod config;
mod convenio;
mod error;
mod store;

use anyhow::Result;
use clap::Parser;
use colored::*;

use cli::commands::{add, edit, export, import, list, normalize, today};
use cli::{Cli, Commands};
use config::Config;
use store::SqliteStore;

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        database,
        command,
        ..
    } = cli;

    // Normalizing a file never needs the database
    if let Commands::Normalize(args) = command {
        return normalize::handle_normalize_command(args);
    }

    let mut config = Config::load(config_path.as_deref())?;
    if let Some(url) = database {
        config.database.url = url;
    }

    let pool = config::connect(&config.database).await?;
    let store = SqliteStore::new(pool);

    match command {
        Commands::Normalize(args) => normalize::handle_normalize_command(args),
        Commands::Import(args) => import::handle_import_command(args, &store).await,
        Commands::List(args) => list::handle_list_command(args, &store).await,
        Commands::Today(args) => today::handle_today_command(args, &store).await,
        Commands::Export(args) => export::handle_export_command(args, &config, &store).await,
        Commands::Add(args) => add::handle_add_command(args, &store).await,
        Commands::Edit(command) => edit::handle_edit_command(command, &config, &store).await,
    }
}
