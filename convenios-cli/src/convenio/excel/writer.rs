//! Write records to Excel format

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};

use crate::convenio::record::{Record, columns};
use crate::error::Result;

/// Identifier column of edit workbooks
pub const ID_COLUMN: &str = "_id";

/// Sheet name of filtered exports
pub const EXPORT_SHEET: &str = "Acessos";

/// Sheet name of normalized uploads
pub const NORMALIZED_SHEET: &str = "Tratada";

/// Sheet name of edit workbooks
pub const EDIT_SHEET: &str = "Edição";

/// Render a single-sheet report workbook: one header row, no identifier column
pub fn render_as_spreadsheet(records: &[Record], sheet_name: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    write_records(worksheet, records, false)?;

    Ok(workbook.save_to_buffer()?)
}

/// Render an editable workbook; the leading `_id` column ties rows back to storage
pub fn render_edit_workbook(records: &[Record]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EDIT_SHEET)?;

    write_records(worksheet, records, true)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_records(ws: &mut Worksheet, records: &[Record], with_id: bool) -> Result<()> {
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");

    let offset: u16 = if with_id { 1 } else { 0 };

    if with_id {
        ws.write_string_with_format(0, 0, ID_COLUMN, &header_format)?;
    }
    for (col, name) in columns::ALL.iter().enumerate() {
        ws.write_string_with_format(0, col as u16 + offset, *name, &header_format)?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;

        if with_id {
            if let Some(id) = record.id {
                ws.write_number(row, 0, id as f64)?;
            }
        }

        let texts = [
            &record.convenio,
            &record.sistema,
            &record.responsavel,
            &record.validacao,
            &record.referencia,
        ];
        for (col, value) in texts.iter().enumerate() {
            if !value.is_empty() {
                ws.write_string(row, col as u16 + offset, value.as_str())?;
            }
        }

        let dates = [record.data_corte, record.data_lancamento];
        for (i, date) in dates.iter().enumerate() {
            if let Some(d) = date {
                let col = (texts.len() + i) as u16 + offset;
                ws.write_datetime_with_format(row, col, &excel_date(*d)?, &date_format)?;
            }
        }
    }

    ws.set_freeze_panes(1, 0)?;
    ws.autofit();

    Ok(())
}

fn excel_date(date: chrono::NaiveDate) -> Result<ExcelDateTime> {
    use chrono::Datelike;
    let year = u16::try_from(date.year()).map_err(|_| {
        XlsxError::DateTimeRangeError(format!("Year: '{}' outside Excel range of 1900-9999", date.year()))
    })?;
    Ok(ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)?)
}
