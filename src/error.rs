use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the aggregation core.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// The table has no usable block of `mm/dd/yy` date columns.
    #[error("malformed schedule: {0}")]
    MalformedSchedule(String),

    /// A requested start date falls after the last date column.
    #[error("no data on or after {requested}; last date is {last}")]
    DateOutOfRange { requested: NaiveDate, last: NaiveDate },

    /// A ranking was requested on a column that does not exist after aggregation.
    #[error("unknown statistic: {0}")]
    UnknownStatistic(String),
}

/// Errors returned while fetching or parsing a CSV resource.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The resource does not exist (HTTP 404 or missing file).
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// No daily report was published inside the lookback window.
    #[error("no daily report found in the last {days} days")]
    LookbackExhausted { days: u32 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Errors returned by a chart renderer.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to prepare chart directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chart drawing failed: {0}")]
    Draw(String),

    #[error("nothing to plot")]
    Empty,
}

/// Errors returned when loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Errors surfaced by a command handler.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    /// The responder could not deliver a reply.
    #[error("failed to send reply: {0}")]
    Send(String),
}
