use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use log::info;

use super::model::{FilteredTable, ObservationTable};

// ---------------------------------------------------------------------------
// DateRange – closed interval of calendar days
// ---------------------------------------------------------------------------

/// Inclusive range of calendar days: `start 00:00:00` through
/// `end 23:59:59.999…`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Returns `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(DateRange { start, end })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        DateRange { start: day, end: day }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let day = ts.date();
        self.start <= day && day <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end)
        }
    }
}

// ---------------------------------------------------------------------------
// Range filter
// ---------------------------------------------------------------------------

/// Keep the rows whose timestamp falls inside `range`, in original order.
///
/// Rows with a missing timestamp never match. An empty result is a normal
/// outcome the caller must check for.
pub fn filter_range(table: &ObservationTable, range: DateRange) -> FilteredTable {
    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|r| r.timestamp.is_some_and(|ts| range.contains(ts)))
        .cloned()
        .collect();

    info!("{} of {} rows fall within {range}", rows.len(), table.len());

    FilteredTable {
        range,
        columns: table.columns.clone(),
        rows,
    }
}
