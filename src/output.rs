// User-visible text for every command outcome.
//
// The core never produces text; everything a user reads is composed here
// from computed series and rankings.
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::aggregate::RegionSeries;
use crate::command::ReportStat;
use crate::error::{BotError, CoreError, LoadError};
use crate::reports::{Ranked, Ranking};
use crate::series::DailySummary;
use crate::types::{RankingRow, Stat};
use crate::util::{format_int, format_number, long_date};
use crate::window::DateWindow;

/// Render rows as a markdown table, or `(no rows)`.
pub fn markdown_table<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn to_json_line<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// "A", "A and B", "A, B, and C".
pub fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => (*one).to_string(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// Greedy word wrap at `width` columns.
fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

pub fn total_title(region: &str, stat: Stat) -> String {
    format!("Total Reported COVID-19 {} for {region}", stat.title())
}

pub fn totals_title(regions: &[&str], stat: Stat) -> String {
    wrap(
        &format!("Total Reported COVID-19 {} for {}", stat.title(), join_names(regions)),
        60,
    )
}

pub fn daily_title(region: &str, stat: Stat) -> String {
    format!("Daily Reported COVID-19 {} for {region}", stat.title())
}

pub fn total_axis(stat: Stat) -> String {
    format!("Total {}", stat.title())
}

pub fn daily_axis(stat: Stat) -> String {
    format!("Number of {}", stat.plural())
}

pub fn total_text(series: &RegionSeries, stat: Stat, window: DateWindow<'_>) -> String {
    match series.first_recorded() {
        Some(i) => format!(
            "{} has reached {} {} since the first recorded {} there on {}.",
            series.name,
            format_int(series.last()),
            stat.plural(),
            stat.singular(),
            long_date(window.dates()[i].date)
        ),
        None => format!(
            "{} has no recorded {} as of {}.",
            series.name,
            stat.plural(),
            long_date(window.end().date)
        ),
    }
}

pub fn totals_text(series: &[RegionSeries], stat: Stat) -> String {
    let mut out = format!("Since the first recorded {} in the United States:", stat.singular());
    for s in series {
        out.push_str(&format!(
            "\n{} has reached {} {}",
            s.name,
            format_int(s.last()),
            stat.title()
        ));
    }
    out
}

pub fn daily_text(
    region: &str,
    summary: &DailySummary,
    stat: Stat,
    window: DateWindow<'_>,
    width: usize,
) -> String {
    let peak_date = window
        .dates()
        .get(summary.peak_index)
        .map_or_else(String::new, |c| long_date(c.date));
    format!(
        "{region} had {} new {} yesterday. The {width}-day average number of new {} is {}.\n\
         The max number of {} in a day was {}, on {peak_date}",
        format_int(summary.last_daily),
        stat.plural(),
        stat.plural(),
        format_number(summary.last_average, 0),
        stat.plural(),
        format_int(summary.peak),
    )
}

fn describe(stat: ReportStat) -> &'static str {
    match stat {
        ReportStat::Confirmed => "confirmed case count",
        ReportStat::Deaths => "death toll",
        ReportStat::FatalityRatio => "case fatality ratio",
    }
}

fn display_value(stat: ReportStat, value: f64) -> String {
    match stat {
        ReportStat::Confirmed => format!("{} confirmed cases", format_number(value, 0)),
        ReportStat::Deaths => format!("{} deaths", format_number(value, 0)),
        ReportStat::FatalityRatio => format!("{}%", format_number(value * 100.0, 2)),
    }
}

fn ranking_rows(stat: ReportStat, ranked: &[Ranked]) -> Vec<RankingRow> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, r)| RankingRow {
            rank: i + 1,
            region: r.group.clone(),
            value: display_value(stat, r.value),
        })
        .collect()
}

pub fn report_text(ranking: &Ranking, stat: ReportStat) -> String {
    let mut out = format!(
        "The top {} worst US states/territories by {} are:",
        ranking.top.len(),
        describe(stat)
    );
    for r in &ranking.top {
        out.push_str(&format!("\n     {} with {}", r.group, display_value(stat, r.value)));
    }
    out.push_str(&format!(
        "\n\nThe {} best US states/territories by {} are:",
        ranking.bottom.len(),
        describe(stat)
    ));
    for r in &ranking.bottom {
        out.push_str(&format!("\n     {} with {}", r.group, display_value(stat, r.value)));
    }
    out.push_str("\n```\nWorst\n");
    out.push_str(&markdown_table(&ranking_rows(stat, &ranking.top)));
    out.push_str("\n\nBest\n");
    out.push_str(&markdown_table(&ranking_rows(stat, &ranking.bottom)));
    out.push_str("\n```");
    out
}

pub fn report_prompt_text() -> String {
    "Which statistic should the report rank by? Reply with 1 (confirmed), \
     2 (deaths) or 3 (fatality ratio)."
        .to_string()
}

pub fn help_text(prefix: &str) -> String {
    format!(
        "COVID-19 Visualizer produces plots of daily and total case and death counts for US \
         states and territories, and reports which states are doing the worst.\n\n\
         USAGE:\n\
         To request information from the bot, type '{prefix}' at the beginning of your message.\n\
         For a plot of daily cases, type 'daily' after this; for cumulative totals, type 'total'.\n\
         Add 'deaths' to plot deaths instead of cases, and 'since m/d/yy' to shorten the window.\n\
         For the whole country, type 'US' in your message.\n\
         For states, type as many state names as you wish in any order.\n\
         Example:\n{prefix} total US New Hampshire Vermont\n\n\
         For a ranking of states, type '{prefix} report' optionally followed by \
         'confirmed', 'deaths' or 'fatality'."
    )
}

pub fn improper_format_text(prefix: &str) -> String {
    format!("You have entered a request with an improper format. Type '{prefix} help' for usage info.")
}

pub fn no_region_text(prefix: &str) -> String {
    format!(
        "I couldn't find a state, territory or country in that request. Type '{prefix} help' \
         for usage info."
    )
}

pub fn timeout_text() -> String {
    "No response received, so the request was cancelled.".to_string()
}

/// Text shown when a handler fails.
pub fn error_text(err: &BotError) -> String {
    match err {
        BotError::Core(CoreError::MalformedSchedule(_))
        | BotError::Load(LoadError::Core(CoreError::MalformedSchedule(_))) => {
            "The upstream data is not in the expected format right now. Please try again later."
                .to_string()
        }
        BotError::Core(CoreError::DateOutOfRange { requested, last }) => format!(
            "There is no data on or after {}. The latest available date is {}.",
            long_date(*requested),
            long_date(*last)
        ),
        BotError::Core(CoreError::UnknownStatistic(name)) => {
            format!("The latest report does not include '{name}'.")
        }
        BotError::Load(LoadError::LookbackExhausted { .. }) => {
            "No recent daily report has been published yet. Please try again later.".to_string()
        }
        BotError::Load(_) => "I couldn't fetch the data right now. Please try again later.".to_string(),
        BotError::Chart(_) => "I couldn't draw that chart.".to_string(),
        BotError::Send(_) => "Something went wrong while sending the reply.".to_string(),
    }
}
