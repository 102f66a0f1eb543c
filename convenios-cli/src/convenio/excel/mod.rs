//! Excel import/export for reports and edit sessions

mod reader;
mod writer;

pub use reader::read_edit_workbook;
pub use writer::{EXPORT_SHEET, NORMALIZED_SHEET, render_as_spreadsheet, render_edit_workbook};
