//! `convenios export`: write the filtered view to a workbook

use anyhow::Result;
use colored::*;

use super::write_output;
use crate::cli::ExportArgs;
use crate::config::Config;
use crate::convenio::ViewFilter;
use crate::convenio::excel::{EXPORT_SHEET, render_as_spreadsheet};
use crate::store::RecordStore;

pub async fn handle_export_command(args: ExportArgs, config: &Config, store: &dyn RecordStore) -> Result<()> {
    let records = store.read_all().await?;
    let filter: ViewFilter = args.filter.into();
    let visible = filter.apply(&records);

    let bytes = render_as_spreadsheet(&visible, EXPORT_SHEET)?;
    let path = config.export_path(&args.output);
    write_output(&path, &bytes)?;

    println!(
        "{} records exported to: {}",
        visible.len().to_string().bold(),
        path.display().to_string().bright_green()
    );
    Ok(())
}
