//! Date-window location and slicing.
//!
//! The locator scans a header once and produces the explicit ordered list of
//! (date, label, column index) triples that every window operation indexes
//! into. Labels are only ever compared as parsed dates, so the display form of
//! a label (`1/2/21`) resolves to the same column as the raw form (`01/02/21`).

use chrono::NaiveDate;

use crate::error::CoreError;
use crate::types::{DateColumn, TimeSeriesTable};
use crate::util::{display_label, is_date_label, parse_date_label};

/// Result of scanning a header for its date block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSchedule {
    pub columns: Vec<DateColumn>,
}

impl DateSchedule {
    /// Header of the first date column, as written in the source.
    pub fn first_label(&self) -> &str {
        &self.columns[0].label
    }

    /// Last date column in zero-pad-stripped display form.
    pub fn last_display_label(&self) -> String {
        display_label(self.columns[self.columns.len() - 1].date)
    }

    /// Header position of the first date column.
    pub fn first_index(&self) -> usize {
        self.columns[0].index
    }
}

/// Locate the date block of a wide table header.
///
/// The first date column is the first header matching `m/d/yy`; the last one
/// is always the final header. Every header in between must be a date and the
/// dates must strictly ascend.
///
/// # Errors
///
/// Returns [`CoreError::MalformedSchedule`] if no header is a date, if the
/// final header is not a date, or if the block between them has a gap or is
/// out of order.
pub fn locate(headers: &[String]) -> Result<DateSchedule, CoreError> {
    let first_index = headers
        .iter()
        .position(|h| is_date_label(h))
        .ok_or_else(|| CoreError::MalformedSchedule("no mm/dd/yy columns".to_string()))?;

    let mut columns: Vec<DateColumn> = Vec::with_capacity(headers.len() - first_index);
    for (index, label) in headers.iter().enumerate().skip(first_index) {
        let date = parse_date_label(label).ok_or_else(|| {
            CoreError::MalformedSchedule(format!(
                "column {index} ('{label}') interrupts the date block"
            ))
        })?;
        if let Some(prev) = columns.last() {
            if date <= prev.date {
                return Err(CoreError::MalformedSchedule(format!(
                    "column {index} ('{label}') is not after '{}'",
                    prev.label
                )));
            }
            if prev.date.succ_opt() != Some(date) {
                return Err(CoreError::MalformedSchedule(format!(
                    "column {index} ('{label}') leaves a gap after '{}'",
                    prev.label
                )));
            }
        }
        columns.push(DateColumn {
            date,
            label: label.trim().to_string(),
            index,
        });
    }
    Ok(DateSchedule { columns })
}

/// An inclusive span of a table's date columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow<'a> {
    columns: &'a [DateColumn],
    offset: usize,
}

impl<'a> DateWindow<'a> {
    /// Every date column of the table, from the first label through the
    /// display form of the last.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedSchedule`] if the table has no dates.
    pub fn full(table: &'a TimeSeriesTable) -> Result<Self, CoreError> {
        let (Some(first), Some(last)) = (table.dates.first(), table.dates.last()) else {
            return Err(CoreError::MalformedSchedule(
                "table has no date columns".to_string(),
            ));
        };
        Self::between(table, &first.label, &display_label(last.date))
    }

    /// The span between two labels, inclusive. Either label may be padded or
    /// in display form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedSchedule`] if a label is not a date
    /// column of the table or if `start` falls after `end`.
    pub fn between(table: &'a TimeSeriesTable, start: &str, end: &str) -> Result<Self, CoreError> {
        let from = position_of(table, start)?;
        let to = position_of(table, end)?;
        if from > to {
            return Err(CoreError::MalformedSchedule(format!(
                "window start '{start}' is after end '{end}'"
            )));
        }
        Ok(Self {
            columns: &table.dates[from..=to],
            offset: from,
        })
    }

    /// Narrow the window so it starts at `date`. Dates before the window are
    /// clamped to its start.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DateOutOfRange`] if `date` is after the end.
    pub fn since(self, date: NaiveDate) -> Result<Self, CoreError> {
        let skip = self.columns.partition_point(|c| c.date < date);
        if skip >= self.columns.len() {
            return Err(CoreError::DateOutOfRange {
                requested: date,
                last: self.end().date,
            });
        }
        Ok(Self {
            columns: &self.columns[skip..],
            offset: self.offset + skip,
        })
    }

    pub fn dates(&self) -> &'a [DateColumn] {
        self.columns
    }

    pub fn end(&self) -> &'a DateColumn {
        &self.columns[self.columns.len() - 1]
    }

    /// Number of dates in the window; never zero.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Position of the window's first date within `TimeSeriesTable::dates`.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Slice a row's values, aligned with the table's dates, to this window.
    pub fn slice<'v, T>(&self, values: &'v [T]) -> &'v [T] {
        let end = (self.offset + self.columns.len()).min(values.len());
        let start = self.offset.min(end);
        &values[start..end]
    }
}

fn position_of(table: &TimeSeriesTable, label: &str) -> Result<usize, CoreError> {
    let date = parse_date_label(label)
        .ok_or_else(|| CoreError::MalformedSchedule(format!("'{label}' is not a date label")))?;
    table
        .dates
        .binary_search_by(|c| c.date.cmp(&date))
        .map_err(|_| CoreError::MalformedSchedule(format!("no column for '{label}'")))
}
