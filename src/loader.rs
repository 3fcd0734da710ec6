use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use csv::ReaderBuilder;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::LoadError;
use crate::normalize::{normalize_report, normalize_table};
use crate::types::{ReportTable, Stat, TimeSeriesRow, TimeSeriesTable};
use crate::util::parse_count_safe;
use crate::window;

/// Supplies the tables a command needs. Implemented over HTTP/files for
/// production and in memory for tests.
#[async_trait]
pub trait TableSource: Send + Sync {
    async fn time_series(&self, stat: Stat) -> Result<TimeSeriesTable, LoadError>;
    async fn daily_report(&self) -> Result<ReportTable, LoadError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub skipped_rows: usize,
    /// Blank or unparseable count cells read as zero.
    pub coerced_cells: usize,
}

/// Parse a wide time-series CSV and normalize its region labels.
///
/// # Errors
///
/// Returns [`LoadError::Csv`] if the header cannot be read and
/// [`LoadError::Core`] if the header has no valid date block.
pub fn parse_time_series(text: &str) -> Result<(TimeSeriesTable, LoadReport), LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let schedule = window::locate(&headers)?;
    let identity_len = schedule.first_index();
    debug!(
        first = schedule.first_label(),
        last = %schedule.last_display_label(),
        identity_len,
        "located date block"
    );

    let mut report = LoadReport::default();
    let mut rows: Vec<TimeSeriesRow> = Vec::new();
    for result in rdr.records() {
        report.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                report.skipped_rows += 1;
                continue;
            }
        };
        let identity = (0..identity_len)
            .map(|i| record.get(i).unwrap_or("").trim().to_string())
            .collect();
        let values = schedule
            .columns
            .iter()
            .map(|col| {
                parse_count_safe(record.get(col.index)).unwrap_or_else(|| {
                    report.coerced_cells += 1;
                    0
                })
            })
            .collect();
        rows.push(TimeSeriesRow { identity, values });
    }

    let mut table = TimeSeriesTable {
        identity_headers: headers[..identity_len].to_vec(),
        dates: schedule.columns,
        rows,
    };
    normalize_table(&mut table);
    Ok((table, report))
}

/// Parse a narrow daily-report CSV and normalize its region labels.
///
/// # Errors
///
/// Returns [`LoadError::Csv`] if the header cannot be read.
pub fn parse_report(text: &str) -> Result<ReportTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut skipped = 0usize;
    let mut rows = Vec::new();
    for result in rdr.records() {
        match result {
            Ok(record) => rows.push(record.iter().map(|f| f.trim().to_string()).collect()),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "skipped unreadable daily report rows");
    }
    let mut table = ReportTable { headers, rows };
    normalize_report(&mut table);
    Ok(table)
}

/// File name of the daily report published for `date`.
pub fn daily_report_name(date: NaiveDate) -> String {
    date.format("%m-%d-%Y.csv").to_string()
}

/// Reads tables from HTTP(S) URLs or local paths.
pub struct RemoteSource {
    client: Client,
    confirmed: String,
    deaths: String,
    daily_reports: String,
    lookback_days: u32,
}

impl RemoteSource {
    /// # Errors
    ///
    /// Returns [`LoadError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            confirmed: config.confirmed_url.clone(),
            deaths: config.deaths_url.clone(),
            daily_reports: config.daily_reports_url.clone(),
            lookback_days: config.report_lookback_days,
        })
    }

    /// Fetch a resource as text. `Ok(None)` means it does not exist.
    async fn fetch(&self, location: &str) -> Result<Option<String>, LoadError> {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            let resp = self.client.get(location).send().await?;
            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(LoadError::Status {
                    url: location.to_string(),
                    status: status.as_u16(),
                });
            }
            return Ok(Some(resp.text().await?));
        }
        match tokio::fs::read_to_string(location).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LoadError::Io {
                path: PathBuf::from(location),
                source,
            }),
        }
    }

    async fn fetch_required(&self, location: &str) -> Result<String, LoadError> {
        self.fetch(location)
            .await?
            .ok_or_else(|| LoadError::NotFound(location.to_string()))
    }

    /// Most recent daily report, starting the day before `today` and walking
    /// back one day at a time.
    async fn latest_daily_report(&self, today: NaiveDate) -> Result<ReportTable, LoadError> {
        let base = self.daily_reports.trim_end_matches('/');
        for days_back in 1..=self.lookback_days {
            let Some(date) = today.checked_sub_days(chrono::Days::new(u64::from(days_back))) else {
                break;
            };
            let location = format!("{base}/{}", daily_report_name(date));
            match self.fetch(&location).await? {
                Some(text) => {
                    debug!(%location, "loaded daily report");
                    return parse_report(&text);
                }
                None => warn!(%location, "daily report not published yet"),
            }
        }
        Err(LoadError::LookbackExhausted {
            days: self.lookback_days,
        })
    }
}

#[async_trait]
impl TableSource for RemoteSource {
    async fn time_series(&self, stat: Stat) -> Result<TimeSeriesTable, LoadError> {
        let location = match stat {
            Stat::Cases => &self.confirmed,
            Stat::Deaths => &self.deaths,
        };
        let text = self.fetch_required(location).await?;
        let (table, report) = parse_time_series(&text)?;
        debug!(
            %location,
            total_rows = report.total_rows,
            skipped_rows = report.skipped_rows,
            coerced_cells = report.coerced_cells,
            dates = table.dates.len(),
            "loaded time series"
        );
        Ok(table)
    }

    async fn daily_report(&self) -> Result<ReportTable, LoadError> {
        self.latest_daily_report(Local::now().date_naive()).await
    }
}
