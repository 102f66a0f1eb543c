//! The agreement record and its canonical column names

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Canonical column names, in export order
pub mod columns {
    pub const CONVENIO: &str = "Convênio";
    pub const SISTEMA: &str = "Sistema";
    pub const RESPONSAVEL: &str = "Responsavel";
    pub const VALIDACAO: &str = "Validação";
    pub const REFERENCIA: &str = "Referência";
    pub const DATA_CORTE: &str = "Data de Corte";
    pub const DATA_LANCAMENTO: &str = "Data de Lançamento";

    pub const ALL: [&str; 7] = [
        CONVENIO,
        SISTEMA,
        RESPONSAVEL,
        VALIDACAO,
        REFERENCIA,
        DATA_CORTE,
        DATA_LANCAMENTO,
    ];
}

/// One agreement entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Storage-assigned identifier, `None` for rows not saved yet
    pub id: Option<i64>,
    pub convenio: String,
    pub sistema: String,
    pub responsavel: String,
    pub validacao: String,
    pub referencia: String,
    pub data_corte: Option<NaiveDate>,
    pub data_lancamento: Option<NaiveDate>,
}

impl Record {
    pub fn new(convenio: impl Into<String>) -> Self {
        Self {
            convenio: convenio.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Compare every mutable field, ignoring the identifier
    pub fn same_fields(&self, other: &Record) -> bool {
        self.convenio == other.convenio
            && self.sistema == other.sistema
            && self.responsavel == other.responsavel
            && self.validacao == other.validacao
            && self.referencia == other.referencia
            && self.data_corte == other.data_corte
            && self.data_lancamento == other.data_lancamento
    }

    /// Text values in canonical column order; dates as DD/MM/YYYY or empty
    pub fn display_values(&self) -> [String; 7] {
        [
            self.convenio.clone(),
            self.sistema.clone(),
            self.responsavel.clone(),
            self.validacao.clone(),
            self.referencia.clone(),
            format_date(self.data_corte),
            format_date(self.data_lancamento),
        ]
    }
}

/// Full-row rewrite of a stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    pub id: i64,
    pub convenio: String,
    pub sistema: String,
    pub responsavel: String,
    pub validacao: String,
    pub referencia: String,
    pub data_corte: Option<NaiveDate>,
    pub data_lancamento: Option<NaiveDate>,
}

impl RecordUpdate {
    pub fn from_record(id: i64, record: &Record) -> Self {
        Self {
            id,
            convenio: record.convenio.clone(),
            sistema: record.sistema.clone(),
            responsavel: record.responsavel.clone(),
            validacao: record.validacao.clone(),
            referencia: record.referencia.clone(),
            data_corte: record.data_corte,
            data_lancamento: record.data_lancamento,
        }
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_fields_ignores_id() {
        let a = Record::new("Banco X").with_id(1);
        let b = Record::new("Banco X").with_id(2);
        assert!(a.same_fields(&b));

        let mut c = b.clone();
        c.data_corte = NaiveDate::from_ymd_opt(2025, 3, 10);
        assert!(!a.same_fields(&c));
    }

    #[test]
    fn test_display_values_formats_dates() {
        let mut record = Record::new("Banco X");
        record.data_lancamento = NaiveDate::from_ymd_opt(2025, 1, 7);
        let values = record.display_values();
        assert_eq!(values[5], "");
        assert_eq!(values[6], "07/01/2025");
    }
}
