//! Filtered views over the stored records

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::Record;

/// Active filter selections for one session.
///
/// Empty lists place no restriction. A record without a date never matches
/// a date filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    #[serde(default)]
    pub convenios: Vec<String>,
    #[serde(default)]
    pub sistemas: Vec<String>,
    #[serde(default)]
    pub responsaveis: Vec<String>,
    #[serde(default)]
    pub validadores: Vec<String>,
    #[serde(default)]
    pub data_lancamento: Option<NaiveDate>,
    #[serde(default)]
    pub data_corte: Option<NaiveDate>,
}

impl ViewFilter {
    pub fn is_empty(&self) -> bool {
        *self == ViewFilter::default()
    }

    pub fn matches(&self, record: &Record) -> bool {
        in_selection(&self.convenios, &record.convenio)
            && in_selection(&self.sistemas, &record.sistema)
            && in_selection(&self.responsaveis, &record.responsavel)
            && in_selection(&self.validadores, &record.validacao)
            && date_matches(self.data_lancamento, record.data_lancamento)
            && date_matches(self.data_corte, record.data_corte)
    }

    pub fn apply(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

fn in_selection(selection: &[String], value: &str) -> bool {
    selection.is_empty() || selection.iter().any(|s| s == value)
}

fn date_matches(wanted: Option<NaiveDate>, actual: Option<NaiveDate>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual == Some(w),
    }
}

/// Records with a launch or a cutoff on a given day
#[derive(Debug, Clone)]
pub struct DueToday {
    pub date: NaiveDate,
    pub launches: Vec<Record>,
    pub cutoffs: Vec<Record>,
}

pub fn due_on(records: &[Record], date: NaiveDate) -> DueToday {
    DueToday {
        date,
        launches: records
            .iter()
            .filter(|r| r.data_lancamento == Some(date))
            .cloned()
            .collect(),
        cutoffs: records
            .iter()
            .filter(|r| r.data_corte == Some(date))
            .cloned()
            .collect(),
    }
}

/// Distinct values offered for each multi-select filter
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOptions {
    pub convenios: BTreeSet<String>,
    pub sistemas: BTreeSet<String>,
    pub responsaveis: BTreeSet<String>,
    pub validadores: BTreeSet<String>,
}

pub fn filter_options(records: &[Record]) -> FilterOptions {
    let mut options = FilterOptions::default();
    for r in records {
        options.convenios.insert(r.convenio.clone());
        options.sistemas.insert(r.sistema.clone());
        options.responsaveis.insert(r.responsavel.clone());
        options.validadores.insert(r.validacao.clone());
    }
    options
}
