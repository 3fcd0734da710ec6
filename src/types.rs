use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

/// Which cumulative count a time-series table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Cases,
    Deaths,
}

impl Stat {
    pub fn plural(self) -> &'static str {
        match self {
            Stat::Cases => "cases",
            Stat::Deaths => "deaths",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            Stat::Cases => "case",
            Stat::Deaths => "death",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stat::Cases => "Cases",
            Stat::Deaths => "Deaths",
        }
    }
}

/// One date-labelled column of a wide time-series table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateColumn {
    pub date: NaiveDate,
    /// Header exactly as it appears in the source file.
    pub label: String,
    /// Position of the column in the source header.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    /// Identity fields, aligned with `TimeSeriesTable::identity_headers`.
    pub identity: Vec<String>,
    /// Cumulative counts, aligned with `TimeSeriesTable::dates`.
    pub values: Vec<i64>,
}

/// A wide table: a leading block of identity columns followed by a
/// contiguous, ascending block of date columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    pub identity_headers: Vec<String>,
    pub dates: Vec<DateColumn>,
    pub rows: Vec<TimeSeriesRow>,
}

impl TimeSeriesTable {
    /// Index of an identity column by header name.
    pub fn identity_column(&self, name: &str) -> Option<usize> {
        self.identity_headers.iter().position(|h| h == name)
    }
}

/// A narrow per-unit table such as a daily report: string identity fields
/// and numeric statistic columns kept as raw text until aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// A ranked region rendered for display.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Region")]
    #[tabled(rename = "Region")]
    pub region: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}
