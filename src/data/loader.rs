use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::StringRecord;
use log::{info, warn};

use super::header::{interpret_header, HEADER_LINES};
use super::model::{ColumnNames, Observation, ObservationTable};
use super::timestamp::{coerce_unparsed, parse_timestamp_column};
use crate::error::{PipelineError, Result};

/// Raw timestamp tokens carried in a `DateParse` diagnostic.
const DIAGNOSTIC_SAMPLE: usize = 5;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a logger file: 4-line header, then comma-separated records.
pub fn load_file(path: &Path) -> Result<ObservationTable> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = load_reader(BufReader::new(file))?;
    info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Load from any buffered source. The header and body are read in one pass.
pub fn load_reader<R: BufRead>(mut reader: R) -> Result<ObservationTable> {
    let columns = interpret_header(&mut reader)?;
    let records = read_body(reader, &columns)?;
    build_table(&columns, &records)
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Parse a cell as a number, mapping anything else to the missing marker.
///
/// Total over arbitrary input. Non-finite values (`NAN`, `INF`) count as
/// missing.
pub fn parse_numeric_or_missing(token: &str) -> Option<f64> {
    token
        .trim()
        .trim_matches('"')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

fn read_body<R: BufRead>(reader: R, columns: &ColumnNames) -> Result<Vec<StringRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() != columns.len() {
            let body_line = record.position().map_or(0, |p| p.line());
            return Err(PipelineError::ColumnMismatch {
                line: body_line + HEADER_LINES as u64,
                expected: columns.len(),
                found: record.len(),
                record: record.iter().collect::<Vec<_>>().join(","),
            });
        }
        records.push(record);
    }
    Ok(records)
}

fn build_table(columns: &ColumnNames, records: &[StringRecord]) -> Result<ObservationTable> {
    let index_name = columns.index_name().to_string();
    let value_names = columns.value_names().to_vec();

    if records.is_empty() {
        warn!("data body is empty");
        return Ok(ObservationTable {
            index_name,
            columns: value_names,
            rows: Vec::new(),
            strategy: None,
        });
    }

    let tokens: Vec<&str> = records.iter().map(|r| r.get(0).unwrap_or("")).collect();

    let (strategy, mut parsed) =
        parse_timestamp_column(&tokens).map_err(|tried| PipelineError::DateParse {
            column: index_name.clone(),
            tried,
            sample: tokens
                .iter()
                .filter(|t| !t.trim().is_empty())
                .take(DIAGNOSTIC_SAMPLE)
                .map(|t| t.to_string())
                .collect(),
        })?;
    info!("timestamp column '{index_name}' parsed with the {strategy} strategy");

    if !parsed.unparsed.is_empty() {
        let pending = parsed.unparsed.len();
        let missing = coerce_unparsed(&mut parsed, &tokens);
        warn!(
            "{pending} timestamps did not match the inferred layout; {missing} coerced to missing"
        );
    }

    let rows: Vec<Observation> = records
        .iter()
        .zip(parsed.values)
        .map(|(record, timestamp)| Observation {
            timestamp,
            values: record.iter().skip(1).map(parse_numeric_or_missing).collect(),
        })
        .collect();

    let table = ObservationTable {
        index_name,
        columns: value_names,
        rows,
        strategy: Some(strategy),
    };

    let missing_ts = table.missing_timestamps();
    if missing_ts > 0 {
        warn!("{missing_ts} rows have no valid timestamp");
    }
    for (name, missing) in table.missing_per_column() {
        if missing > 0 {
            warn!("column '{name}': {missing} non-numeric cells coerced to missing");
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::timestamp::TimestampStrategy;
    use chrono::NaiveDate;
    use std::io::Cursor;

    const HEADER: &str = "\"TOA5\",\"CR1000\"\n\
\"TIMESTAMP\",\"RECORD\",\"Nivel_Avg\",\"Uy_Avg\"\n\
\"TS\",\"RN\",\"cm\",\"m/s\"\n\
\"\",\"\",\"Avg\",\"Avg\"\n";

    fn load(body: &str) -> Result<ObservationTable> {
        load_reader(Cursor::new(format!("{HEADER}{body}")))
    }

    #[test]
    fn test_numeric_coercion_is_total() {
        assert_eq!(parse_numeric_or_missing("12.5"), Some(12.5));
        assert_eq!(parse_numeric_or_missing("  -3 "), Some(-3.0));
        assert_eq!(parse_numeric_or_missing("\"7\""), Some(7.0));
        assert_eq!(parse_numeric_or_missing("1e3"), Some(1000.0));
        for junk in ["", "NAN", "nan", "INF", "-inf", "abc", "1,5", "--", "\u{fffd}"] {
            assert_eq!(parse_numeric_or_missing(junk), None, "token {junk:?}");
        }
    }

    #[test]
    fn test_numeric_coercion_idempotent() {
        for token in ["1.25", "NAN", "x", "-0.001", "", "3"] {
            let once = parse_numeric_or_missing(token);
            let again = once.map(|v| v.to_string()).and_then(|s| parse_numeric_or_missing(&s));
            assert_eq!(once, again);
        }
    }

    #[test]
    fn test_load_campbell_rows() {
        let table = load(
            "\"2023-08-07 00:00:00\",0,120.5,-1.25\n\
             \"2023-08-07 00:15:00\",1,\"NAN\",0.5\n",
        )
        .unwrap();
        assert_eq!(table.index_name, "TIMESTAMP");
        assert_eq!(table.columns, vec!["RECORD", "Nivel_Avg", "Uy_Avg"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.strategy, Some(TimestampStrategy::DayFirst));
        assert_eq!(table.rows[0].values, vec![Some(0.0), Some(120.5), Some(-1.25)]);
        assert_eq!(table.rows[1].values[1], None);
        assert_eq!(
            table.rows[1].timestamp,
            NaiveDate::from_ymd_opt(2023, 8, 7).unwrap().and_hms_opt(0, 15, 0)
        );
    }

    #[test]
    fn test_bad_timestamp_row_does_not_abort() {
        let table = load(
            "2023-08-07 00:00:00,0,1,1\n\
             garbage,1,2,2\n\
             2023-08-07 00:30:00,2,3,3\n",
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.missing_timestamps(), 1);
        assert!(table.rows[1].timestamp.is_none());
        assert_eq!(table.rows[2].values[1], Some(3.0));
    }

    #[test]
    fn test_unparseable_column_is_date_parse_error() {
        let err = load("soon,0,1,1\nlater,1,2,2\n").unwrap_err();
        match err {
            PipelineError::DateParse { column, tried, sample } => {
                assert_eq!(column, "TIMESTAMP");
                assert_eq!(tried.len(), 3);
                assert_eq!(sample, vec!["soon", "later"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_count_mismatch_reported() {
        let err = load(
            "2023-08-07 00:00:00,0,1,1\n\
             2023-08-07 00:15:00,1,2\n",
        )
        .unwrap_err();
        match err {
            PipelineError::ColumnMismatch { line, expected, found, record } => {
                assert_eq!(line, 6);
                assert_eq!(expected, 4);
                assert_eq!(found, 3);
                assert_eq!(record, "2023-08-07 00:15:00,1,2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_body_gives_empty_table() {
        let table = load("").unwrap();
        assert!(table.is_empty());
        assert!(table.strategy.is_none());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file(Path::new("/definitely/not/here.dat")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }));
    }
}
