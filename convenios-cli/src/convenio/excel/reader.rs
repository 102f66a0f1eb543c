//! Read an edited workbook back into records

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{Reader, Xlsx};

use super::writer::ID_COLUMN;
use crate::convenio::normalize::{Cell, DateCell, cell_at, data_to_cell, parse_date_cell};
use crate::convenio::record::{Record, columns};
use crate::error::{ConvenioError, Result};

struct ColumnIndices {
    id: usize,
    fields: [usize; 7],
}

/// Parse an edit workbook produced by [`super::render_edit_workbook`].
///
/// Rows with an empty `_id` are new records. Fully blank rows are skipped.
/// Unlike uploads, a bad date here is rejected: silently clearing a date the
/// user mistyped would overwrite stored data.
pub fn read_edit_workbook(bytes: Vec<u8>) -> Result<Vec<Record>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ConvenioError::InvalidEditWorkbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ConvenioError::InvalidEditWorkbook("workbook has no sheets".into()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ConvenioError::InvalidEditWorkbook(format!("sheet '{}': {}", sheet_name, e)))?;

    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|r| r.iter().map(data_to_cell).collect())
        .collect();

    let Some((header, data)) = rows.split_first() else {
        return Err(ConvenioError::InvalidEditWorkbook("sheet is empty".into()));
    };

    let indices = parse_header(header)?;
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for (row_idx, row) in data.iter().enumerate() {
        let sheet_row = row_idx + 2;
        if row.iter().all(Cell::is_blank) {
            continue;
        }

        let record = parse_row(row, &indices, sheet_row)?;
        if let Some(id) = record.id {
            if !seen.insert(id) {
                return Err(ConvenioError::InvalidEditWorkbook(format!(
                    "row {}: duplicate {} {}",
                    sheet_row, ID_COLUMN, id
                )));
            }
        }
        records.push(record);
    }

    log::debug!("Read {} rows from edit workbook", records.len());
    Ok(records)
}

fn parse_header(header: &[Cell]) -> Result<ColumnIndices> {
    let names: Vec<String> = header.iter().map(Cell::to_string_value).collect();
    let find = |name: &str| {
        names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ConvenioError::InvalidEditWorkbook(format!("missing column '{}'", name)))
    };

    let id = find(ID_COLUMN)?;
    let mut fields = [0usize; 7];
    for (slot, name) in fields.iter_mut().zip(columns::ALL) {
        *slot = find(name)?;
    }

    Ok(ColumnIndices { id, fields })
}

fn parse_row(row: &[Cell], indices: &ColumnIndices, sheet_row: usize) -> Result<Record> {
    let invalid = |msg: String| ConvenioError::InvalidEditWorkbook(format!("row {}: {}", sheet_row, msg));

    let id = match cell_at(row, indices.id) {
        Cell::Empty => None,
        Cell::Number(n) if n.fract() == 0.0 && *n > 0.0 => Some(*n as i64),
        Cell::Text(s) => Some(
            s.trim()
                .parse::<i64>()
                .map_err(|_| invalid(format!("invalid {} '{}'", ID_COLUMN, s)))?,
        ),
        other => {
            return Err(invalid(format!(
                "invalid {} '{}'",
                ID_COLUMN,
                other.to_string_value()
            )));
        }
    };

    let text = |i: usize| cell_at(row, indices.fields[i]).to_string_value();
    let date = |i: usize| match parse_date_cell(cell_at(row, indices.fields[i])) {
        DateCell::Date(d) => Ok(Some(d)),
        DateCell::Missing => Ok(None),
        DateCell::Invalid(value) => Err(invalid(format!(
            "'{}' is not a date in {}",
            value,
            columns::ALL[i]
        ))),
    };

    let record = Record {
        id,
        convenio: text(0),
        sistema: text(1),
        responsavel: text(2),
        validacao: text(3),
        referencia: text(4),
        data_corte: date(5)?,
        data_lancamento: date(6)?,
    };

    if record.convenio.is_empty() {
        return Err(invalid(format!("{} is required", columns::CONVENIO)));
    }

    Ok(record)
}
