use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Scale used when handing currency values to the outside world.
pub const CURRENCY_SCALE: u32 = 2;

/// Column names of the source file, in the order they're checked.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Data",
    "Valor Pago",
    "Autor da Emenda",
    "Órgão",
    "Ação Orçamentária",
    "Função (Área de Atuação)",
    "Subfunção (Especificação da Área de Atuação)",
    "Programa Orçamentário",
    "UF DO FAVORECIDO",
];

/// A row exactly as it comes out of the source file: every cell is still a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Valor Pago")]
    pub amount_paid: String,
    #[serde(rename = "Autor da Emenda")]
    pub author: String,
    #[serde(rename = "Órgão")]
    pub agency: String,
    #[serde(rename = "Ação Orçamentária")]
    pub budget_action: String,
    #[serde(rename = "Função (Área de Atuação)")]
    pub function: String,
    #[serde(rename = "Subfunção (Especificação da Área de Atuação)")]
    pub subfunction: String,
    #[serde(rename = "Programa Orçamentário")]
    pub program: String,
    #[serde(rename = "UF DO FAVORECIDO")]
    pub beneficiary_state: String,
}

/// One amendment disbursement once normalized. You'll note there's no `month` or `year`
/// field: they only ever depend on `date`, so instead of keeping three fields in sync
/// they're computed when asked for and at serialization time (see `RecordSerializer`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RecordSerializer")]
pub(crate) struct Record {
    pub date: Option<NaiveDate>,
    pub amount_paid: Decimal,
    pub author: String,
    pub agency: String,
    pub budget_action: String,
    pub function: String,
    pub subfunction: String,
    pub program: String,
    pub beneficiary_state: String,
}

impl Record {
    pub fn month(&self) -> Option<u32> {
        self.date.map(|d| d.month())
    }

    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Raw (unstripped) value of a categorical column.
    pub fn category(&self, column: Column) -> &str {
        match column {
            Column::Agency => &self.agency,
            Column::BudgetAction => &self.budget_action,
            Column::Function => &self.function,
            Column::Subfunction => &self.subfunction,
            Column::Program => &self.program,
            Column::BeneficiaryState => &self.beneficiary_state,
        }
    }
}

/// Serialization proxy for `Record`, adding the derived date columns.
#[derive(Serialize)]
pub(crate) struct RecordSerializer {
    #[serde(rename = "Data")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Valor Pago")]
    pub amount_paid: Decimal,
    #[serde(rename = "Autor da Emenda")]
    pub author: String,
    #[serde(rename = "Órgão")]
    pub agency: String,
    #[serde(rename = "Ação Orçamentária")]
    pub budget_action: String,
    #[serde(rename = "Função (Área de Atuação)")]
    pub function: String,
    #[serde(rename = "Subfunção (Especificação da Área de Atuação)")]
    pub subfunction: String,
    #[serde(rename = "Programa Orçamentário")]
    pub program: String,
    #[serde(rename = "UF DO FAVORECIDO")]
    pub beneficiary_state: String,
    #[serde(rename = "Mes")]
    pub month: Option<u32>,
    #[serde(rename = "Ano")]
    pub year: Option<i32>,
}

impl From<Record> for RecordSerializer {
    fn from(record: Record) -> Self {
        let mut amount_paid = record.amount_paid;
        amount_paid.rescale(CURRENCY_SCALE);
        Self {
            month: record.month(),
            year: record.year(),
            date: record.date,
            amount_paid,
            author: record.author,
            agency: record.agency,
            budget_action: record.budget_action,
            function: record.function,
            subfunction: record.subfunction,
            program: record.program,
            beneficiary_state: record.beneficiary_state,
        }
    }
}

/// Categorical columns a `Dimension` can group on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Column {
    Agency,
    BudgetAction,
    Function,
    Subfunction,
    Program,
    BeneficiaryState,
}

/// The fixed breakdowns an author's payments can be aggregated along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Agency → budget action → function → subfunction
    AgencyAndAction,
    BeneficiaryState,
    Function,
    Subfunction,
    Program,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::AgencyAndAction,
        Dimension::BeneficiaryState,
        Dimension::Function,
        Dimension::Subfunction,
        Dimension::Program,
    ];

    /// Every tag, comma separated.
    pub fn tags() -> String {
        Dimension::ALL.map(|d| d.tag()).join(", ")
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Dimension::AgencyAndAction => "agency_and_action",
            Dimension::BeneficiaryState => "beneficiary_state",
            Dimension::Function => "function",
            Dimension::Subfunction => "subfunction",
            Dimension::Program => "program",
        }
    }

    /// Caption shown above the breakdown
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::AgencyAndAction => "Órgão e Ação Orçamentária",
            Dimension::BeneficiaryState => "Estado Favorecido",
            Dimension::Function => "Função Orçamentária",
            Dimension::Subfunction => "Subfunção Orçamentária",
            Dimension::Program => "Programa Orçamentário",
        }
    }

    /// Grouping path, outermost level first.
    pub(crate) fn columns(&self) -> &'static [Column] {
        match self {
            Dimension::AgencyAndAction => &[
                Column::Agency,
                Column::BudgetAction,
                Column::Function,
                Column::Subfunction,
            ],
            Dimension::BeneficiaryState => &[Column::BeneficiaryState],
            Dimension::Function => &[Column::Function],
            Dimension::Subfunction => &[Column::Subfunction],
            Dimension::Program => &[Column::Program],
        }
    }

    /// Width of the numeric code prefix dropped from display labels.
    pub(crate) fn label_prefix_len(&self) -> usize {
        match self {
            Dimension::AgencyAndAction | Dimension::BeneficiaryState => 0,
            Dimension::Function => 5,
            Dimension::Subfunction | Dimension::Program => 6,
        }
    }

    /// Whether rows are ranked by amount rather than left in key order.
    pub(crate) fn ranked(&self) -> bool {
        matches!(self, Dimension::Function | Dimension::Subfunction)
    }
}

impl std::str::FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|d| d.tag() == s)
            .ok_or_else(|| Error::InvalidDimension(s.to_string()))
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for Dimension {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// One group of an aggregation: the raw key path it was grouped on, the label to
/// display for it and the summed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "AggregatedRowSerializer")]
pub(crate) struct AggregatedRow {
    pub path: Vec<String>,
    pub label: String,
    pub amount: Decimal,
}

/// CSV can't hold a nested path, so it's flattened here.
#[derive(Serialize)]
pub(crate) struct AggregatedRowSerializer {
    pub path: String,
    pub label: String,
    pub amount: Decimal,
}

impl From<AggregatedRow> for AggregatedRowSerializer {
    fn from(row: AggregatedRow) -> Self {
        let mut amount = row.amount;
        amount.rescale(CURRENCY_SCALE);
        Self {
            path: row.path.join(" > "),
            label: row.label,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AggregatedResult {
    pub author: String,
    pub dimension: Dimension,
    pub rows: Vec<AggregatedRow>,
}

impl AggregatedResult {
    /// `None` if the rows don't sum within `Decimal` range.
    pub fn total(&self) -> Option<Decimal> {
        crate::compute::checked_sum(self.rows.iter().map(|r| r.amount))
    }
}

/// Headline figures for one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Summary {
    pub author: String,
    pub records: usize,
    pub total_paid: Decimal,
    pub total_paid_millions: Decimal,
}

/// What to do with `-` markers found in a currency cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignPolicy {
    /// Drop the marker and keep the magnitude, so every amount ends up non-negative.
    #[default]
    Strip,
    /// Drop the marker but negate the value, so refunds subtract from totals.
    Negate,
}

/// The normalized dataset. Built once, then only ever read.
#[derive(Debug, Default, Clone)]
pub(crate) struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Distinct authors, sorted.
    pub fn authors(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.author.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn contains_author(&self, author: &str) -> bool {
        self.records.iter().any(|r| r.author == author)
    }

    pub fn by_author<'a>(&'a self, author: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.author == author)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Author {0:?} not found")]
    NotFound(String),
    #[error("Unknown dimension {0:?} (expected one of: {})", Dimension::tags())]
    InvalidDimension(String),
    #[error("Record #{record}: amount {value:?} is not a number")]
    InvalidAmount { record: usize, value: String },
    #[error("Amounts paid to {0:?} add up past the largest representable value")]
    AmountOverflow(String),
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Delimiter {0:?} must be a single ASCII character")]
    InvalidDelimiter(char),
}
