//! Error taxonomy shared by the normalizer, the reconciler and the store

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvenioError {
    /// The upload lacks a column we cannot do without
    #[error("column not found in spreadsheet: {column}")]
    MissingColumn { column: String },

    /// The upload could not be parsed as a spreadsheet at all
    #[error("unreadable spreadsheet: {0}")]
    Unreadable(String),

    /// An edited workbook that does not look like one we exported
    #[error("invalid edit workbook: {0}")]
    InvalidEditWorkbook(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("edit session not found: {0}")]
    SessionNotFound(i64),

    /// Rows shown by the session were changed by another write since it started
    #[error("edit session {session} is out of date: record {record} changed since the workbook was exported")]
    StaleSession { session: i64, record: i64 },

    #[error("spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl ConvenioError {
    /// True for errors caused by the uploaded file rather than the store
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConvenioError::MissingColumn { .. }
                | ConvenioError::Unreadable(_)
                | ConvenioError::InvalidEditWorkbook(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConvenioError>;
