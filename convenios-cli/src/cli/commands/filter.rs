//! Filter flags shared by list, export and edit

use chrono::NaiveDate;
use clap::Args;

use crate::convenio::ViewFilter;
use crate::convenio::normalize::parse_date_text;

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only these agreements (repeatable)
    #[arg(long = "convenio", value_name = "NAME")]
    pub convenios: Vec<String>,

    /// Only these systems (repeatable)
    #[arg(long = "sistema", value_name = "NAME")]
    pub sistemas: Vec<String>,

    /// Only these responsible parties (repeatable)
    #[arg(long = "responsavel", value_name = "NAME")]
    pub responsaveis: Vec<String>,

    /// Only these validators (repeatable)
    #[arg(long = "validador", value_name = "NAME")]
    pub validadores: Vec<String>,

    /// Exact launch date
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub data_lancamento: Option<NaiveDate>,

    /// Exact cutoff date
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub data_corte: Option<NaiveDate>,
}

impl From<FilterArgs> for ViewFilter {
    fn from(args: FilterArgs) -> Self {
        ViewFilter {
            convenios: args.convenios,
            sistemas: args.sistemas,
            responsaveis: args.responsaveis,
            validadores: args.validadores,
            data_lancamento: args.data_lancamento,
            data_corte: args.data_corte,
        }
    }
}

/// Parse a date flag (DD/MM/YYYY, YYYY-MM-DD, ...)
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date_text(s).ok_or_else(|| format!("'{}' is not a date, use DD/MM/YYYY", s))
}
