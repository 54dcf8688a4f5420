use chrono::NaiveDateTime;

use super::filter::DateRange;
use super::timestamp::TimestampStrategy;

// ---------------------------------------------------------------------------
// ColumnNames – declared field labels from header line 2
// ---------------------------------------------------------------------------

/// Ordered column names as declared in the file header.
/// The first entry is always the timestamp column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames(Vec<String>);

impl ColumnNames {
    pub fn new(names: Vec<String>) -> Self {
        ColumnNames(names)
    }

    /// Name of the timestamp (index) column.
    pub fn index_name(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or("")
    }

    /// Names of the numeric columns, in file order.
    pub fn value_names(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Observation – one data row
// ---------------------------------------------------------------------------

/// A single logger record. `None` is the missing marker for both the
/// timestamp and every numeric cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: Option<NaiveDateTime>,
    /// One entry per value column, same order as `ObservationTable::columns`.
    pub values: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// ObservationTable – the loaded dataset
// ---------------------------------------------------------------------------

/// The full loaded dataset, indexed by timestamp.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    /// Name of the timestamp column.
    pub index_name: String,
    /// Names of the numeric columns (excludes the index).
    pub columns: Vec<String>,
    pub rows: Vec<Observation>,
    /// Strategy that produced the index, `None` for an empty body.
    pub strategy: Option<TimestampStrategy>,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows whose timestamp is the missing marker.
    pub fn missing_timestamps(&self) -> usize {
        self.rows.iter().filter(|r| r.timestamp.is_none()).count()
    }

    /// Missing-cell count per value column.
    pub fn missing_per_column(&self) -> Vec<(&str, usize)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let missing = self
                    .rows
                    .iter()
                    .filter(|r| r.values.get(i).copied().flatten().is_none())
                    .count();
                (name.as_str(), missing)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FilteredTable – rows inside a date range
// ---------------------------------------------------------------------------

/// A read-only slice of an [`ObservationTable`] restricted to a [`DateRange`].
///
/// Every row here has a valid timestamp.
#[derive(Debug, Clone)]
pub struct FilteredTable {
    pub range: DateRange,
    pub columns: Vec<String>,
    pub rows: Vec<Observation>,
}

impl FilteredTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().find_map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.rows.iter().rev().find_map(|r| r.timestamp)
    }

    /// `(timestamp, value)` points of one column, skipping missing cells.
    /// Returns `None` if the column does not exist.
    pub fn series(&self, name: &str) -> Option<Vec<(NaiveDateTime, f64)>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|r| Some((r.timestamp?, r.values.get(idx).copied().flatten()?)))
                .collect(),
        )
    }

    /// `(x, y)` pairs of two columns with pairwise deletion: a row is skipped
    /// when either cell is missing. Returns `None` if a column does not exist.
    pub fn paired(&self, x: &str, y: &str) -> Option<Vec<(f64, f64)>> {
        let xi = self.column_index(x)?;
        let yi = self.column_index(y)?;
        Some(
            self.rows
                .iter()
                .filter_map(|r| {
                    let xv = r.values.get(xi).copied().flatten()?;
                    let yv = r.values.get(yi).copied().flatten()?;
                    Some((xv, yv))
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 8, 7)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> FilteredTable {
        FilteredTable {
            range: DateRange::single_day(NaiveDate::from_ymd_opt(2023, 8, 7).unwrap()),
            columns: vec!["Nivel_Avg".into(), "Uy_Avg".into()],
            rows: vec![
                Observation { timestamp: Some(ts(1)), values: vec![Some(2.0), Some(1.0)] },
                Observation { timestamp: Some(ts(2)), values: vec![None, Some(2.0)] },
                Observation { timestamp: Some(ts(3)), values: vec![Some(6.0), None] },
                Observation { timestamp: Some(ts(4)), values: vec![Some(8.0), Some(4.0)] },
            ],
        }
    }

    #[test]
    fn test_column_names_split_index() {
        let names = ColumnNames::new(vec!["TIMESTAMP".into(), "RECORD".into(), "Nivel_Avg".into()]);
        assert_eq!(names.index_name(), "TIMESTAMP");
        assert_eq!(names.value_names(), &["RECORD".to_string(), "Nivel_Avg".to_string()]);
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_paired_drops_incomplete_rows() {
        let table = sample();
        let pairs = table.paired("Uy_Avg", "Nivel_Avg").unwrap();
        assert_eq!(pairs, vec![(1.0, 2.0), (4.0, 8.0)]);
        assert!(table.paired("Uy_Avg", "Temp").is_none());
    }

    #[test]
    fn test_series_skips_missing_cells() {
        let table = sample();
        let nivel = table.series("Nivel_Avg").unwrap();
        assert_eq!(nivel.len(), 3);
        assert_eq!(table.first_timestamp(), Some(ts(1)));
        assert_eq!(table.last_timestamp(), Some(ts(4)));
    }
}
