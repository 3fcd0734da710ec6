use std::collections::HashMap;

use tracing::warn;

use crate::normalize::REGION_COLUMNS;
use crate::types::TimeSeriesTable;
use crate::window::DateWindow;

/// A canonical region name within one region-identifier column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub column: usize,
    pub name: String,
}

/// Maps every canonical region name of a table to the rows carrying it.
///
/// Keys are ordered by column priority (`REGION_COLUMNS` order) and then by
/// first appearance, so a name present in several columns resolves to the
/// most specific one.
#[derive(Debug, Clone, Default)]
pub struct RegionIndex {
    keys: Vec<RegionKey>,
    rows: HashMap<RegionKey, Vec<usize>>,
}

impl RegionIndex {
    pub fn build(table: &TimeSeriesTable) -> Self {
        let mut index = Self::default();
        for column in REGION_COLUMNS
            .iter()
            .filter_map(|name| table.identity_column(name))
        {
            for (row_idx, row) in table.rows.iter().enumerate() {
                let Some(name) = row.identity.get(column) else {
                    continue;
                };
                if name.trim().is_empty() {
                    continue;
                }
                let key = RegionKey {
                    column,
                    name: name.clone(),
                };
                let entry = index.rows.entry(key.clone()).or_insert_with(|| {
                    index.keys.push(key);
                    Vec::new()
                });
                entry.push(row_idx);
            }
        }
        index
    }

    /// All keys in priority order.
    pub fn keys(&self) -> &[RegionKey] {
        &self.keys
    }

    /// The highest-priority key carrying `name`.
    pub fn find(&self, name: &str) -> Option<&RegionKey> {
        self.keys.iter().find(|k| k.name == name)
    }

    pub fn rows(&self, key: &RegionKey) -> &[usize] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Sum every row whose identifier in `key.column` equals `key.name`
    /// column-wise across `window`.
    ///
    /// A key with no rows yields zeros of the window length.
    pub fn aggregate(
        &self,
        table: &TimeSeriesTable,
        key: &RegionKey,
        window: DateWindow<'_>,
    ) -> RegionSeries {
        let rows = self.rows(key);
        let mut values = vec![0i64; window.len()];
        for &row_idx in rows {
            let Some(row) = table.rows.get(row_idx) else {
                continue;
            };
            for (acc, v) in values.iter_mut().zip(window.slice(&row.values)) {
                *acc += *v;
            }
        }
        if rows.is_empty() {
            warn!(region = %key.name, "no rows matched region");
        }
        RegionSeries {
            name: key.name.clone(),
            values,
            matched_rows: rows.len(),
        }
    }
}

/// Cumulative counts for one region over a date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSeries {
    pub name: String,
    pub values: Vec<i64>,
    /// Number of table rows summed; zero means the name matched nothing.
    pub matched_rows: usize,
}

impl RegionSeries {
    pub fn last(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    /// Position of the first positive sample, i.e. the first recorded count.
    pub fn first_recorded(&self) -> Option<usize> {
        self.values.iter().position(|v| *v > 0)
    }
}
