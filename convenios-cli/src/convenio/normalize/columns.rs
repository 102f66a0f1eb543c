//! Column resolution across spreadsheet naming vintages
//!
//! Every canonical column has a prioritized list of header candidates. The
//! first candidate that matches a header wins. Date columns are resolved as a
//! pair per vintage so that a sheet never mixes an old-style cutoff column with
//! a new-style launch column.

use crate::convenio::record::columns;
use crate::error::{ConvenioError, Result};

/// How a candidate is compared against a header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Trimmed header equals the candidate
    Exact,
    /// Header contains the candidate as a substring
    Contains,
}

/// Candidate header names for one canonical column
#[derive(Debug, Clone, Copy)]
pub struct ColumnCandidates {
    pub canonical: &'static str,
    pub names: &'static [&'static str],
    pub rule: MatchRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { index: usize, header: String },
    NotFound,
}

impl Resolution {
    pub fn index(&self) -> Option<usize> {
        match self {
            Resolution::Resolved { index, .. } => Some(*index),
            Resolution::NotFound => None,
        }
    }
}

pub const CONVENIO: ColumnCandidates = ColumnCandidates {
    canonical: columns::CONVENIO,
    names: &["Convênio", "Convenio", "Convênios", "Convenios"],
    rule: MatchRule::Exact,
};

pub const SISTEMA: ColumnCandidates = ColumnCandidates {
    canonical: columns::SISTEMA,
    names: &["Sistema", "Sistemas"],
    rule: MatchRule::Exact,
};

pub const RESPONSAVEL: ColumnCandidates = ColumnCandidates {
    canonical: columns::RESPONSAVEL,
    names: &["Responsavel", "Responsável"],
    rule: MatchRule::Exact,
};

pub const VALIDACAO: ColumnCandidates = ColumnCandidates {
    canonical: columns::VALIDACAO,
    names: &["Validação", "Validacao", "Validador"],
    rule: MatchRule::Exact,
};

pub const REFERENCIA: ColumnCandidates = ColumnCandidates {
    canonical: columns::REFERENCIA,
    names: &["Referência", "Referencia"],
    rule: MatchRule::Exact,
};

/// One naming vintage for the two date columns
#[derive(Debug, Clone, Copy)]
pub struct DateVintage {
    pub label: &'static str,
    pub corte: &'static str,
    pub lancamento: &'static str,
}

/// Vintages in priority order: the source spreadsheet naming first, then
/// sheets that already carry canonical names
pub const DATE_VINTAGES: [DateVintage; 2] = [
    DateVintage {
        label: "source",
        corte: "Data corte",
        lancamento: "Data lançamento",
    },
    DateVintage {
        label: "canonical",
        corte: columns::DATA_CORTE,
        lancamento: columns::DATA_LANCAMENTO,
    },
];

/// Resolved positions of every canonical column in the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub convenio: usize,
    pub validacao: usize,
    pub sistema: Option<usize>,
    pub responsavel: Option<usize>,
    pub referencia: Option<usize>,
    pub data_corte: usize,
    pub data_lancamento: usize,
}

impl ColumnMap {
    fn used(&self) -> Vec<usize> {
        let mut used = vec![self.convenio, self.validacao, self.data_corte, self.data_lancamento];
        used.extend(self.sistema);
        used.extend(self.responsavel);
        used.extend(self.referencia);
        used
    }
}

pub fn resolve(headers: &[String], candidates: &ColumnCandidates) -> Resolution {
    for name in candidates.names {
        let found = headers.iter().position(|h| matches(h, name, candidates.rule));
        if let Some(index) = found {
            return Resolution::Resolved {
                index,
                header: headers[index].clone(),
            };
        }
    }
    Resolution::NotFound
}

fn matches(header: &str, candidate: &str, rule: MatchRule) -> bool {
    match rule {
        MatchRule::Exact => header.trim() == candidate,
        MatchRule::Contains => header.contains(candidate),
    }
}

fn find_contains(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.contains(name))
}

/// Resolve the cutoff/launch pair, trying each vintage in order.
///
/// When no vintage has both columns, the error names the half missing from
/// the first vintage that had the other one, or the cutoff column when no
/// date column was found at all.
pub fn resolve_dates(headers: &[String]) -> Result<(usize, usize)> {
    let mut missing = None;

    for vintage in &DATE_VINTAGES {
        let corte = find_contains(headers, vintage.corte);
        let lancamento = find_contains(headers, vintage.lancamento);

        match (corte, lancamento) {
            (Some(c), Some(l)) => {
                log::debug!(
                    "Date columns resolved with {} naming: '{}', '{}'",
                    vintage.label,
                    headers[c],
                    headers[l]
                );
                return Ok((c, l));
            }
            (Some(_), None) => {
                missing.get_or_insert(columns::DATA_LANCAMENTO);
            }
            (None, Some(_)) => {
                missing.get_or_insert(columns::DATA_CORTE);
            }
            (None, None) => {}
        }
    }

    log::warn!("Date columns not found; headers present: {:?}", headers);
    Err(ConvenioError::MissingColumn {
        column: missing.unwrap_or(columns::DATA_CORTE).to_string(),
    })
}

fn required(headers: &[String], candidates: &ColumnCandidates) -> Result<usize> {
    match resolve(headers, candidates) {
        Resolution::Resolved { index, header } => {
            log::debug!("{} read from column '{}'", candidates.canonical, header);
            Ok(index)
        }
        Resolution::NotFound => Err(ConvenioError::MissingColumn {
            column: candidates.canonical.to_string(),
        }),
    }
}

/// Resolve every canonical column, failing on the first required one missing
pub fn resolve_all(headers: &[String]) -> Result<ColumnMap> {
    let convenio = required(headers, &CONVENIO)?;
    let validacao = required(headers, &VALIDACAO)?;
    let (data_corte, data_lancamento) = resolve_dates(headers)?;

    let map = ColumnMap {
        convenio,
        validacao,
        sistema: resolve(headers, &SISTEMA).index(),
        responsavel: resolve(headers, &RESPONSAVEL).index(),
        referencia: resolve(headers, &REFERENCIA).index(),
        data_corte,
        data_lancamento,
    };

    let used = map.used();
    for (index, header) in headers.iter().enumerate() {
        if !used.contains(&index) && !header.is_empty() {
            log::debug!("Ignoring column '{}'", header);
        }
    }

    Ok(map)
}
