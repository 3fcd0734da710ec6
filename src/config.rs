use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const JHU_BASE: &str =
    "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data";

/// Runtime configuration for the bot.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Leading token every command must start with.
    pub prefix: String,
    pub confirmed_url: String,
    pub deaths_url: String,
    /// Directory URL (or path) holding `MM-DD-YYYY.csv` daily reports.
    pub daily_reports_url: String,
    pub report_lookback_days: u32,
    pub rolling_window: usize,
    pub reply_timeout: Duration,
    pub chart_dir: PathBuf,
    /// Leave chart files on disk after the reply has been sent.
    pub keep_charts: bool,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub log_level: String,
}

/// Load configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function, so it can
/// be tested with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let prefix = or_default("COVID_BOT_PREFIX", "~covid").trim().to_string();
    if prefix.is_empty() {
        return Err(invalid("COVID_BOT_PREFIX", "must not be empty".to_string()));
    }

    let confirmed_url = or_default(
        "COVID_BOT_CONFIRMED_URL",
        &format!("{JHU_BASE}/csse_covid_19_time_series/time_series_covid19_confirmed_US.csv"),
    );
    let deaths_url = or_default(
        "COVID_BOT_DEATHS_URL",
        &format!("{JHU_BASE}/csse_covid_19_time_series/time_series_covid19_deaths_US.csv"),
    );
    let daily_reports_url = or_default(
        "COVID_BOT_DAILY_REPORTS_URL",
        &format!("{JHU_BASE}/csse_covid_19_daily_reports_us/"),
    );

    let report_lookback_days = parse_u32("COVID_BOT_REPORT_LOOKBACK_DAYS", "3")?;
    if report_lookback_days == 0 {
        return Err(invalid("COVID_BOT_REPORT_LOOKBACK_DAYS", "must be at least 1".to_string()));
    }

    let rolling_window = parse_u32("COVID_BOT_ROLLING_WINDOW", "7")? as usize;
    if rolling_window == 0 {
        return Err(invalid("COVID_BOT_ROLLING_WINDOW", "must be at least 1".to_string()));
    }

    let reply_timeout = Duration::from_secs(parse_u64("COVID_BOT_REPLY_TIMEOUT_SECS", "60")?);
    let chart_dir = PathBuf::from(or_default("COVID_BOT_CHART_DIR", "./charts"));
    let keep_charts = or_default("COVID_BOT_KEEP_CHARTS", "true")
        .trim()
        .parse::<bool>()
        .map_err(|e| invalid("COVID_BOT_KEEP_CHARTS", e.to_string()))?;
    let request_timeout_secs = parse_u64("COVID_BOT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("COVID_BOT_USER_AGENT", "covid-report-bot/0.1");
    let log_level = or_default("COVID_BOT_LOG_LEVEL", "info");

    Ok(AppConfig {
        prefix,
        confirmed_url,
        deaths_url,
        daily_reports_url,
        report_lookback_days,
        rolling_window,
        reply_timeout,
        chart_dir,
        keep_charts,
        request_timeout_secs,
        user_agent,
        log_level,
    })
}
