//! Raw spreadsheet reading: bytes in, typed header + rows out

use std::io::{Cursor, Read, Seek, SeekFrom};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::NaiveDate;

use super::dates;
use crate::error::{ConvenioError, Result};

/// How the upload should be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// xlsx / xlsm / xlsb / xls / ods, detected from content
    #[default]
    Workbook,
    Csv,
}

impl SourceFormat {
    /// Pick a format from a file name; anything but `.csv` is read as a workbook
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => SourceFormat::Csv,
            _ => SourceFormat::Workbook,
        }
    }
}

/// A single typed cell as read from the upload
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// Empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Render the cell as a trimmed string; whole numbers lose their fraction
    pub fn to_string_value(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        }
    }
}

/// Header row plus data rows, before any cleaning
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY: Cell = Cell::Empty;

/// Cell at `col` in `row`, `Empty` when the row is short
pub fn cell_at(row: &[Cell], col: usize) -> &Cell {
    row.get(col).unwrap_or(&EMPTY)
}

impl RawSheet {
    /// Build a sheet from a header row and data rows (the first row is the header)
    pub fn from_rows(mut rows: Vec<Vec<Cell>>) -> Self {
        if rows.is_empty() {
            return RawSheet::default();
        }
        let header = rows.remove(0);
        RawSheet {
            headers: header.iter().map(Cell::to_string_value).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Read the upload from the start of the stream
pub fn read_sheet<R: Read + Seek>(mut reader: R, format: SourceFormat) -> Result<RawSheet> {
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| ConvenioError::Unreadable(format!("cannot rewind upload: {}", e)))?;

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| ConvenioError::Unreadable(format!("cannot read upload: {}", e)))?;

    if bytes.is_empty() {
        log::info!("Upload is empty, nothing to normalize");
        return Ok(RawSheet::default());
    }

    match format {
        SourceFormat::Workbook => read_workbook_bytes(bytes),
        SourceFormat::Csv => read_csv_bytes(&bytes),
    }
}

fn read_workbook_bytes(bytes: Vec<u8>) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ConvenioError::Unreadable(e.to_string()))?;

    let sheet_name = match workbook.sheet_names().first() {
        Some(name) => name.clone(),
        None => return Ok(RawSheet::default()),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ConvenioError::Unreadable(format!("sheet '{}': {}", sheet_name, e)))?;

    log::debug!(
        "Reading sheet '{}' ({} rows x {} columns)",
        sheet_name,
        range.height(),
        range.width()
    );

    let rows = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    Ok(RawSheet::from_rows(rows))
}

/// Convert a calamine cell into our typed cell
pub(crate) fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dates::from_excel_serial(dt.as_f64()) {
            Some(d) => Cell::Date(d),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match dates::parse_text(s) {
            Some(d) => Cell::Date(d),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn read_csv_bytes(bytes: &[u8]) -> Result<RawSheet> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let delimiter = sniff_delimiter(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| ConvenioError::Unreadable(format!("CSV line {}: {}", line + 1, e)))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(field)
                    }
                })
                .collect(),
        );
    }

    Ok(RawSheet::from_rows(rows))
}

/// Spreadsheet programs in pt-BR locales export CSV with `;`
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas { b';' } else { b',' }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_upload_yields_empty_sheet() {
        let sheet = read_sheet(Cursor::new(Vec::new()), SourceFormat::Workbook).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_csv_semicolon_delimiter() {
        let data = "Convênio;Validação\nBanco X;João\n;\n".as_bytes().to_vec();
        let sheet = read_sheet(Cursor::new(data), SourceFormat::Csv).unwrap();
        assert_eq!(sheet.headers, vec!["Convênio", "Validação"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0][0], Cell::text("Banco X"));
        assert!(sheet.rows[1].iter().all(Cell::is_blank));
    }

    #[test]
    fn test_stream_is_rewound_before_reading() {
        let mut cursor = Cursor::new(b"Convenio,Validacao\nA,B\n".to_vec());
        cursor.seek(SeekFrom::End(0)).unwrap();
        let sheet = read_sheet(cursor, SourceFormat::Csv).unwrap();
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_cell_string_value() {
        assert_eq!(Cell::Number(42.0).to_string_value(), "42");
        assert_eq!(Cell::Number(1.5).to_string_value(), "1.5");
        assert_eq!(Cell::text("  x ").to_string_value(), "x");
        assert!(Cell::text("   ").is_blank());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            SourceFormat::from_path(std::path::Path::new("base.CSV")),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(std::path::Path::new("base.xlsx")),
            SourceFormat::Workbook
        );
    }
}
