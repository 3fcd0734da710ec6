//! Canonical region labels.
//!
//! Upstream files use terse or inverted names for a handful of regions. They
//! are rewritten once at load time so that command text and dataset labels
//! agree.

use crate::types::{ReportTable, TimeSeriesTable};

/// Region-identifier headers whose values are normalized.
pub const REGION_COLUMNS: &[&str] = &[
    "Province_State",
    "Country_Region",
    "Province/State",
    "Country/Region",
];

const CANONICAL_NAMES: &[(&str, &str)] = &[
    ("US", "The United States"),
    ("Korea, South", "South Korea"),
    ("Korea, North", "North Korea"),
    ("Taiwan*", "Taiwan"),
    ("Congo (Kinshasa)", "Democratic Republic of the Congo"),
    ("Congo (Brazzaville)", "Republic of the Congo"),
];

/// Canonical form of a single label. Unknown labels pass through.
pub fn canonical_name(raw: &str) -> &str {
    CANONICAL_NAMES
        .iter()
        .find(|(from, _)| *from == raw)
        .map_or(raw, |(_, to)| *to)
}

/// Rewrite a known ambiguous label in place.
pub fn normalize_label(label: &mut String) {
    let canonical = canonical_name(label);
    if canonical != label.as_str() {
        *label = canonical.to_string();
    }
}

/// Normalize every region-identifier column of a time-series table in place.
pub fn normalize_table(table: &mut TimeSeriesTable) {
    let columns: Vec<usize> = REGION_COLUMNS
        .iter()
        .filter_map(|name| table.identity_column(name))
        .collect();
    for row in &mut table.rows {
        for &col in &columns {
            if let Some(label) = row.identity.get_mut(col) {
                normalize_label(label);
            }
        }
    }
}

/// Normalize every region-identifier column of a report table in place.
pub fn normalize_report(table: &mut ReportTable) {
    let columns: Vec<usize> = REGION_COLUMNS
        .iter()
        .filter_map(|name| table.column(name))
        .collect();
    for row in &mut table.rows {
        for &col in &columns {
            if let Some(label) = row.get_mut(col) {
                normalize_label(label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeSeriesRow;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn normalize_all(labels: &mut [String]) {
        labels.iter_mut().for_each(normalize_label);
    }

    #[test]
    fn rewrites_known_labels() {
        let mut v = labels(&["US", "Korea, South", "Taiwan*", "France"]);
        normalize_all(&mut v);
        assert_eq!(v, labels(&["The United States", "South Korea", "Taiwan", "France"]));
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut once = labels(&["US", "Korea, South", "Congo (Kinshasa)", "Vermont", ""]);
        normalize_all(&mut once);
        let mut twice = once.clone();
        normalize_all(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_targets_are_never_sources() {
        for (_, to) in CANONICAL_NAMES {
            assert_eq!(canonical_name(to), *to);
        }
    }

    #[test]
    fn table_normalization_touches_region_columns_only() {
        let mut table = TimeSeriesTable {
            identity_headers: labels(&["Admin2", "Province_State", "Country_Region"]),
            dates: Vec::new(),
            rows: vec![TimeSeriesRow {
                identity: labels(&["US", "Vermont", "US"]),
                values: Vec::new(),
            }],
        };
        normalize_table(&mut table);
        assert_eq!(
            table.rows[0].identity,
            labels(&["US", "Vermont", "The United States"])
        );
    }

    #[test]
    fn report_normalization_rewrites_country_column() {
        let mut table = ReportTable {
            headers: labels(&["Province_State", "Country_Region", "Confirmed"]),
            rows: vec![labels(&["Guam", "US", "10"])],
        };
        normalize_report(&mut table);
        assert_eq!(table.rows[0], labels(&["Guam", "The United States", "10"]));
    }
}
