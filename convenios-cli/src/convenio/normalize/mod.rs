//! Spreadsheet normalization
//!
//! Turns an uploaded agreement spreadsheet into clean records:
//! - section separator rows ("FEDERAL", "ESTADUAL", ...) and blank rows are dropped
//! - headers from either naming vintage are mapped onto the canonical columns
//! - cutoff and launch dates are parsed; unparsable cells become missing dates
//!   and are reported as warnings instead of failing the upload

mod classify;
mod columns;
mod dates;
mod sheet;

use std::io::{Read, Seek};

use classify::{RowKind, classify};
use columns::{ColumnMap, resolve_all};
pub use dates::{DateCell, parse_cell as parse_date_cell, parse_text as parse_date_text};
pub use sheet::{Cell, RawSheet, SourceFormat, cell_at, read_sheet};
pub(crate) use sheet::data_to_cell;

use crate::convenio::record::{Record, columns as canonical};
use crate::error::Result;

/// A date cell that could not be parsed and was stored as missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWarning {
    /// 1-based spreadsheet row, header included
    pub row: usize,
    pub column: &'static str,
    pub value: String,
}

/// Output of a normalization run
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub separators_dropped: usize,
    pub blank_rows_dropped: usize,
    pub warnings: Vec<DateWarning>,
}

/// Normalize an upload read from the start of `reader`
pub fn normalize<R: Read + Seek>(reader: R, format: SourceFormat) -> Result<Normalized> {
    let sheet = read_sheet(reader, format)?;
    normalize_sheet(&sheet)
}

/// Normalize an already parsed sheet
pub fn normalize_sheet(sheet: &RawSheet) -> Result<Normalized> {
    if sheet.is_empty() {
        return Ok(Normalized::default());
    }

    let map = resolve_all(&sheet.headers)?;
    let mut out = Normalized::default();

    for (index, row) in sheet.rows.iter().enumerate() {
        let sheet_row = index + 2;
        let convenio = cell_at(row, map.convenio);
        let validacao = cell_at(row, map.validacao);

        match classify(convenio, validacao) {
            RowKind::Separator => {
                log::debug!("Row {}: section separator '{}'", sheet_row, convenio.to_string_value());
                out.separators_dropped += 1;
            }
            RowKind::Blank => out.blank_rows_dropped += 1,
            RowKind::Data => {
                let record = build_record(row, &map, sheet_row, &mut out.warnings);
                out.records.push(record);
            }
        }
    }

    for warning in &out.warnings {
        log::warn!(
            "Row {}: unparsable {} '{}', stored as missing",
            warning.row,
            warning.column,
            warning.value
        );
    }

    log::info!(
        "Normalized {} records ({} separators, {} blank rows dropped, {} date warnings)",
        out.records.len(),
        out.separators_dropped,
        out.blank_rows_dropped,
        out.warnings.len()
    );

    Ok(out)
}

fn build_record(
    row: &[Cell],
    map: &ColumnMap,
    sheet_row: usize,
    warnings: &mut Vec<DateWarning>,
) -> Record {
    let text = |col: Option<usize>| {
        col.map(|c| cell_at(row, c).to_string_value())
            .unwrap_or_default()
    };

    let mut date = |col: usize, column: &'static str| match dates::parse_cell(cell_at(row, col)) {
        DateCell::Date(d) => Some(d),
        DateCell::Missing => None,
        DateCell::Invalid(value) => {
            warnings.push(DateWarning {
                row: sheet_row,
                column,
                value,
            });
            None
        }
    };

    Record {
        id: None,
        convenio: text(Some(map.convenio)),
        sistema: text(map.sistema),
        responsavel: text(map.responsavel),
        validacao: text(Some(map.validacao)),
        referencia: text(map.referencia),
        data_corte: date(map.data_corte, canonical::DATA_CORTE),
        data_lancamento: date(map.data_lancamento, canonical::DATA_LANCAMENTO),
    }
}
