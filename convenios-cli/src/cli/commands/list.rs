//! `convenios list`: show stored records through a filter

use anyhow::Result;
use colored::*;

use crate::cli::ListArgs;
use crate::cli::output::format_records;
use crate::convenio::{ViewFilter, filter_options};
use crate::store::RecordStore;

pub async fn handle_list_command(args: ListArgs, store: &dyn RecordStore) -> Result<()> {
    let records = store.read_all().await?;

    if args.options {
        let options = filter_options(&records);
        print_options("Convênios", &options.convenios);
        print_options("Sistemas", &options.sistemas);
        print_options("Responsáveis", &options.responsaveis);
        print_options("Validadores", &options.validadores);
        return Ok(());
    }

    let filter: ViewFilter = args.filter.into();
    let visible = filter.apply(&records);
    log::debug!("{} of {} records match the filter", visible.len(), records.len());

    print!("{}", format_records(&visible, args.format)?);
    Ok(())
}

fn print_options<'a>(title: &str, values: impl IntoIterator<Item = &'a String>) {
    println!("{}", title.bold());
    for value in values {
        if value.is_empty() {
            println!("  {}", "(vazio)".dimmed());
        } else {
            println!("  {}", value);
        }
    }
}
