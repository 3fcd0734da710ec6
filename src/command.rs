//! Command classification.
//!
//! Command text is tokenized once; the operation and statistic come from
//! keywords and regions come from a longest-match lookup of token sequences
//! against the canonical names of a loaded table.

use chrono::NaiveDate;

use crate::aggregate::{RegionIndex, RegionKey};
use crate::reports::FATALITY_RATIO;
use crate::types::Stat;
use crate::util::parse_date_label;

/// What a command asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Help,
    /// Cumulative chart; one region or several on the same chart.
    Total,
    Daily,
    Report,
    Unrecognized,
}

/// Statistic a ranking report is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStat {
    Confirmed,
    Deaths,
    FatalityRatio,
}

impl ReportStat {
    /// Column name in the aggregated report.
    pub fn column(self) -> &'static str {
        match self {
            ReportStat::Confirmed => "Confirmed",
            ReportStat::Deaths => "Deaths",
            ReportStat::FatalityRatio => FATALITY_RATIO,
        }
    }

    /// Parse a follow-up answer or a command keyword.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "confirmed" | "cases" | "case" | "1" => Some(ReportStat::Confirmed),
            "deaths" | "death" | "2" => Some(ReportStat::Deaths),
            "fatality" | "ratio" | "cfr" | "3" => Some(ReportStat::FatalityRatio),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub operation: Operation,
    pub stat: Stat,
    /// Set only when a report command names its statistic.
    pub report_stat: Option<ReportStat>,
    /// Start of the requested window, from `since m/d/yy` or a bare date.
    pub since: Option<NaiveDate>,
    /// Lowercase words with date tokens removed.
    pub words: Vec<String>,
}

const ALIASES: &[(&[&str], &str)] = &[
    (&["us"], "The United States"),
    (&["usa"], "The United States"),
    (&["united", "states"], "The United States"),
];

/// Split text into lowercase alphanumeric words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Classify `text` if it starts with `prefix`; `None` means the message is
/// not a command.
pub fn parse_command(text: &str, prefix: &str) -> Option<Command> {
    let rest = text.trim().strip_prefix(prefix)?;
    if rest.starts_with(|c: char| c.is_alphanumeric()) {
        return None;
    }

    let mut since = None;
    let mut kept = Vec::new();
    for piece in rest.split_whitespace() {
        match parse_date_label(piece.trim_matches(|c: char| c == ',' || c == '.')) {
            Some(date) => since = Some(date),
            None => kept.push(piece),
        }
    }
    let words: Vec<String> = tokenize(&kept.join(" "))
        .into_iter()
        .filter(|w| w != "since")
        .collect();
    let has = |w: &str| words.iter().any(|x| x == w);

    let operation = if has("report") {
        Operation::Report
    } else if has("daily") {
        Operation::Daily
    } else if has("total") {
        Operation::Total
    } else if has("help") {
        Operation::Help
    } else {
        Operation::Unrecognized
    };

    let stat = if has("deaths") || has("death") {
        Stat::Deaths
    } else {
        Stat::Cases
    };

    let report_stat = if operation == Operation::Report {
        words
            .iter()
            .filter(|w| w.as_str() != "report")
            .find_map(|w| ReportStat::from_word(w))
    } else {
        None
    };

    Some(Command {
        operation,
        stat,
        report_stat,
        since,
        words,
    })
}

/// Resolve region names mentioned in `words` against `index`.
///
/// At each position the longest canonical name (or alias) whose tokens match
/// is taken and its tokens are consumed, so "west virginia" yields only West
/// Virginia. Each region is returned once, in order of first mention.
pub fn resolve_regions(words: &[String], index: &RegionIndex) -> Vec<RegionKey> {
    let mut candidates: Vec<(Vec<String>, RegionKey)> = index
        .keys()
        .iter()
        .map(|k| (tokenize(&k.name), k.clone()))
        .filter(|(tokens, _)| !tokens.is_empty())
        .collect();
    for (tokens, target) in ALIASES {
        if let Some(key) = index.find(target) {
            let tokens = tokens.iter().map(|t| (*t).to_string()).collect();
            candidates.push((tokens, key.clone()));
        }
    }
    // Longest first; stable so column priority decides between equal names.
    candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut found: Vec<RegionKey> = Vec::new();
    let mut pos = 0;
    while pos < words.len() {
        let hit = candidates
            .iter()
            .find(|(tokens, _)| words[pos..].starts_with(tokens));
        match hit {
            Some((tokens, key)) => {
                if !found.iter().any(|f| f.name == key.name) {
                    found.push(key.clone());
                }
                pos += tokens.len();
            }
            None => pos += 1,
        }
    }
    found
}
