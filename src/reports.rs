use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::CoreError;
use crate::types::ReportTable;
use crate::util::parse_f64_safe;

/// Number of rows kept at each end of a ranking.
pub const RANK_SIZE: usize = 5;

/// Derived `Deaths / Confirmed` column.
pub const FATALITY_RATIO: &str = "Fatality_Ratio";

#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub group: String,
    /// Aligned with `AggregatedReport::columns`.
    pub values: Vec<f64>,
}

/// One row per distinct group value, in order of first appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedReport {
    pub group_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<GroupRow>,
}

impl AggregatedReport {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append `name = numerator / denominator`. Division by zero leaves a
    /// non-finite value in place rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownStatistic`] if either operand column is
    /// missing.
    pub fn with_ratio(
        mut self,
        name: &str,
        numerator: &str,
        denominator: &str,
    ) -> Result<Self, CoreError> {
        let num = self
            .column(numerator)
            .ok_or_else(|| CoreError::UnknownStatistic(numerator.to_string()))?;
        let den = self
            .column(denominator)
            .ok_or_else(|| CoreError::UnknownStatistic(denominator.to_string()))?;
        for row in &mut self.rows {
            let ratio = row.values[num] / row.values[den];
            row.values.push(ratio);
        }
        self.columns.push(name.to_string());
        Ok(self)
    }
}

/// Group `table` by `group_key` and sum `sum_columns` per group.
///
/// Requested columns missing from the table are left out of the result, so
/// ranking on them later fails with `UnknownStatistic`. Blank or unparseable
/// cells count as zero.
///
/// # Errors
///
/// Returns [`CoreError::UnknownStatistic`] if `group_key` is not a column.
pub fn compose_report(
    table: &ReportTable,
    group_key: &str,
    sum_columns: &[&str],
) -> Result<AggregatedReport, CoreError> {
    let group_idx = table
        .column(group_key)
        .ok_or_else(|| CoreError::UnknownStatistic(group_key.to_string()))?;
    let (columns, indices): (Vec<String>, Vec<usize>) = sum_columns
        .iter()
        .filter_map(|name| table.column(name).map(|idx| ((*name).to_string(), idx)))
        .unzip();

    let mut rows: Vec<GroupRow> = Vec::new();
    let mut by_group: HashMap<String, usize> = HashMap::new();
    for record in &table.rows {
        let Some(group) = record.get(group_idx) else {
            continue;
        };
        let slot = *by_group.entry(group.clone()).or_insert_with(|| {
            rows.push(GroupRow {
                group: group.clone(),
                values: vec![0.0; indices.len()],
            });
            rows.len() - 1
        });
        for (acc, &idx) in rows[slot].values.iter_mut().zip(&indices) {
            *acc += parse_f64_safe(record.get(idx).map(String::as_str)).unwrap_or(0.0);
        }
    }

    Ok(AggregatedReport {
        group_column: group_key.to_string(),
        columns,
        rows,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub group: String,
    pub value: f64,
}

/// Highest and lowest groups by one statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub statistic: String,
    pub top: Vec<Ranked>,
    pub bottom: Vec<Ranked>,
}

/// Select the `k` largest and `k` smallest groups by `statistic`.
///
/// Non-finite values are unranked and appear in neither list. Ties keep
/// their original row order.
///
/// # Errors
///
/// Returns [`CoreError::UnknownStatistic`] if `statistic` is not a column of
/// the aggregated report.
pub fn rank(report: &AggregatedReport, statistic: &str, k: usize) -> Result<Ranking, CoreError> {
    let col = report
        .column(statistic)
        .ok_or_else(|| CoreError::UnknownStatistic(statistic.to_string()))?;

    let mut ranked: Vec<Ranked> = report
        .rows
        .iter()
        .filter(|r| r.values[col].is_finite())
        .map(|r| Ranked {
            group: r.group.clone(),
            value: r.values[col],
        })
        .collect();

    ranked.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    let top: Vec<Ranked> = ranked.iter().take(k).cloned().collect();

    ranked.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
    let bottom: Vec<Ranked> = ranked.into_iter().take(k).collect();

    Ok(Ranking {
        statistic: statistic.to_string(),
        top,
        bottom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> ReportTable {
        ReportTable {
            headers: headers.iter().map(|s| (*s).to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| (*s).to_string()).collect())
                .collect(),
        }
    }

    fn groups(list: &[Ranked]) -> Vec<&str> {
        list.iter().map(|r| r.group.as_str()).collect()
    }

    #[test]
    fn groups_and_sums_in_first_appearance_order() {
        let t = table(
            &["Province_State", "Confirmed", "Deaths"],
            &[
                &["Texas", "10", "1"],
                &["Ohio", "4", "0"],
                &["Texas", "1,000", "9"],
                &["Ohio", "", "2"],
            ],
        );
        let r = compose_report(&t, "Province_State", &["Confirmed", "Deaths"]).unwrap();
        assert_eq!(r.columns, vec!["Confirmed", "Deaths"]);
        assert_eq!(r.rows.len(), 2);
        assert_eq!(r.rows[0].group, "Texas");
        assert_eq!(r.rows[0].values, vec![1010.0, 10.0]);
        assert_eq!(r.rows[1].values, vec![4.0, 2.0]);
    }

    #[test]
    fn missing_group_key_is_unknown_statistic() {
        let t = table(&["Confirmed"], &[&["1"]]);
        let err = compose_report(&t, "Province_State", &["Confirmed"]).unwrap_err();
        assert_eq!(err, CoreError::UnknownStatistic("Province_State".to_string()));
    }

    #[test]
    fn zero_denominator_yields_undefined_ratio_that_is_never_ranked() {
        let t = table(
            &["Province_State", "Confirmed", "Deaths"],
            &[&["A", "10", "1"], &["B", "0", "0"]],
        );
        let r = compose_report(&t, "Province_State", &["Confirmed", "Deaths"])
            .unwrap()
            .with_ratio(FATALITY_RATIO, "Deaths", "Confirmed")
            .unwrap();
        let col = r.column(FATALITY_RATIO).unwrap();
        assert!((r.rows[0].values[col] - 0.1).abs() < 1e-12);
        assert!(!r.rows[1].values[col].is_finite());

        let ranking = rank(&r, FATALITY_RATIO, RANK_SIZE).unwrap();
        assert_eq!(groups(&ranking.top), vec!["A"]);
        assert_eq!(groups(&ranking.bottom), vec!["A"]);
    }

    #[test]
    fn positive_over_zero_is_also_unranked() {
        let t = table(
            &["Province_State", "Confirmed", "Deaths"],
            &[&["A", "0", "3"], &["B", "100", "1"]],
        );
        let r = compose_report(&t, "Province_State", &["Confirmed", "Deaths"])
            .unwrap()
            .with_ratio(FATALITY_RATIO, "Deaths", "Confirmed")
            .unwrap();
        let ranking = rank(&r, FATALITY_RATIO, RANK_SIZE).unwrap();
        assert_eq!(groups(&ranking.top), vec!["B"]);
    }

    #[test]
    fn ranking_keeps_top_and_bottom_five_with_stable_ties() {
        let rows: Vec<Vec<String>> = [
            ("A", "50"),
            ("B", "10"),
            ("C", "90"),
            ("D", "10"),
            ("E", "70"),
            ("F", "90"),
            ("G", "30"),
        ]
        .iter()
        .map(|(g, v)| vec![(*g).to_string(), (*v).to_string()])
        .collect();
        let t = ReportTable {
            headers: vec!["Province_State".to_string(), "Confirmed".to_string()],
            rows,
        };
        let r = compose_report(&t, "Province_State", &["Confirmed"]).unwrap();
        let ranking = rank(&r, "Confirmed", RANK_SIZE).unwrap();
        assert_eq!(groups(&ranking.top), vec!["C", "F", "E", "A", "G"]);
        assert_eq!(groups(&ranking.bottom), vec!["B", "D", "G", "A", "E"]);
    }

    #[test]
    fn ranking_unknown_column_fails() {
        let t = table(&["Province_State", "Confirmed"], &[&["A", "1"]]);
        let r = compose_report(&t, "Province_State", &["Confirmed", "Recovered"]).unwrap();
        assert_eq!(r.columns, vec!["Confirmed"]);
        let err = rank(&r, "Recovered", RANK_SIZE).unwrap_err();
        assert_eq!(err, CoreError::UnknownStatistic("Recovered".to_string()));
    }

    #[test]
    fn ratio_on_missing_operand_fails() {
        let t = table(&["Province_State", "Confirmed"], &[&["A", "1"]]);
        let err = compose_report(&t, "Province_State", &["Confirmed"])
            .unwrap()
            .with_ratio(FATALITY_RATIO, "Deaths", "Confirmed")
            .unwrap_err();
        assert_eq!(err, CoreError::UnknownStatistic("Deaths".to_string()));
    }
}
