//! `convenios today`: launches and cutoffs due on a day

use anyhow::Result;
use colored::*;

use crate::cli::TodayArgs;
use crate::cli::output::render_table;
use crate::convenio::record::{columns, format_date};
use crate::convenio::{Record, due_on};
use crate::store::RecordStore;

const SUMMARY_COLUMNS: [&str; 5] = [
    columns::CONVENIO,
    columns::DATA_CORTE,
    columns::DATA_LANCAMENTO,
    columns::RESPONSAVEL,
    columns::VALIDACAO,
];

pub async fn handle_today_command(args: TodayArgs, store: &dyn RecordStore) -> Result<()> {
    let date = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let records = store.read_all().await?;
    let due = due_on(&records, date);

    println!("{} {}", "Dia".bold(), date.format("%d/%m/%Y"));
    println!();
    print_section("Lançamentos", &due.launches);
    println!();
    print_section("Cortes", &due.cutoffs);
    Ok(())
}

fn print_section(title: &str, records: &[Record]) {
    println!("{} ({})", title.bright_cyan().bold(), records.len());
    if records.is_empty() {
        println!("  {}", "nada para hoje".dimmed());
        return;
    }

    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.convenio.clone(),
                format_date(r.data_corte),
                format_date(r.data_lancamento),
                r.responsavel.clone(),
                r.validacao.clone(),
            ]
        })
        .collect();
    print!("{}", render_table(&SUMMARY_COLUMNS, &rows));
}
