//! Row classification: section separators, blank rows and data

use super::sheet::Cell;

/// Labels of the merged section rows that split the sheet by government sphere
pub const SECTION_KEYWORDS: [&str; 4] = ["FEDERAL", "ESTADUAL", "MUNICIPAL", "Governos"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Separator,
    Blank,
    Data,
}

/// Classify a row from its agreement-name and validator cells.
///
/// A separator needs both: a keyword somewhere in the agreement-name text
/// (case-sensitive substring) and a validator that is empty or itself a
/// keyword. "FEDERAL - Banco X" validated by a person is data.
pub fn classify(convenio: &Cell, validacao: &Cell) -> RowKind {
    if is_section_label(convenio) && is_section_validator(validacao) {
        return RowKind::Separator;
    }
    if convenio.is_blank() {
        return RowKind::Blank;
    }
    RowKind::Data
}

fn is_section_label(cell: &Cell) -> bool {
    match cell.as_text() {
        Some(text) => SECTION_KEYWORDS.iter().any(|k| text.contains(k)),
        None => false,
    }
}

fn is_section_validator(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(s) => {
            let s = s.trim();
            s.is_empty() || SECTION_KEYWORDS.contains(&s)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_with_empty_validator_is_separator() {
        assert_eq!(classify(&Cell::text("FEDERAL"), &Cell::text("")), RowKind::Separator);
        assert_eq!(classify(&Cell::text("FEDERAL"), &Cell::Empty), RowKind::Separator);
        assert_eq!(
            classify(&Cell::text("Governos Estaduais"), &Cell::text("ESTADUAL")),
            RowKind::Separator
        );
    }

    #[test]
    fn test_keyword_with_real_validator_is_data() {
        assert_eq!(
            classify(&Cell::text("FEDERAL - Banco X"), &Cell::text("João")),
            RowKind::Data
        );
    }

    #[test]
    fn test_keyword_match_is_case_sensitive() {
        assert_eq!(classify(&Cell::text("federal"), &Cell::Empty), RowKind::Data);
    }

    #[test]
    fn test_non_text_agreement_is_never_separator() {
        assert_eq!(classify(&Cell::Number(7.0), &Cell::Empty), RowKind::Data);
        assert_eq!(classify(&Cell::Empty, &Cell::Empty), RowKind::Blank);
        assert_eq!(classify(&Cell::text("  "), &Cell::text("Maria")), RowKind::Blank);
    }
}
