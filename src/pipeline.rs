//! The two chart runs. Each is a straight line:
//! header → load → filter → (fit) → render.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::info;
use serde::Serialize;

use crate::color::resolve_colors;
use crate::config::{RegressionConfig, RenderStyle, TimeSeriesConfig};
use crate::data::filter::{filter_range, DateRange};
use crate::data::loader::load_file;
use crate::data::model::FilteredTable;
use crate::error::{PipelineError, Result};
use crate::render::{regression, timeseries};
use crate::stats::{linear_regression, LinearFit};

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// A chart was written.
    Rendered(RunReport),
    /// The date range selected no rows; nothing was drawn.
    NoData { range: DateRange },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub output: PathBuf,
    pub rows: usize,
    pub first: NaiveDateTime,
    pub last: NaiveDateTime,
    /// Present for the regression chart.
    pub fit: Option<LinearFit>,
}

fn missing_column(name: &str, table: &FilteredTable) -> PipelineError {
    PipelineError::MissingColumn {
        name: name.to_string(),
        available: table.columns.clone(),
    }
}

/// Load and filter. `None` when the range selects nothing.
fn load_in_range(
    input: &Path,
    range: DateRange,
) -> Result<Option<(FilteredTable, NaiveDateTime, NaiveDateTime)>> {
    let table = load_file(input)?;
    let filtered = filter_range(&table, range);
    match (filtered.first_timestamp(), filtered.last_timestamp()) {
        (Some(first), Some(last)) => Ok(Some((filtered, first, last))),
        _ => {
            info!("no rows in {range}, skipping chart");
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Time-series overlay
// ---------------------------------------------------------------------------

pub fn run_timeseries(
    input: &Path,
    cfg: &TimeSeriesConfig,
    style: &RenderStyle,
) -> Result<RunOutcome> {
    let range = cfg.range().ok_or(PipelineError::InvalidRange {
        start: cfg.start,
        end: cfg.end,
    })?;
    let Some((filtered, first, last)) = load_in_range(input, range)? else {
        return Ok(RunOutcome::NoData { range });
    };

    let configured: Vec<Option<&str>> = cfg.series.iter().map(|s| s.color.as_deref()).collect();
    let series = cfg
        .series
        .iter()
        .zip(resolve_colors(&configured))
        .map(|(spec, color)| {
            filtered
                .series(&spec.column)
                .map(|points| timeseries::Series { spec, points, color })
                .ok_or_else(|| missing_column(&spec.column, &filtered))
        })
        .collect::<Result<Vec<_>>>()?;

    timeseries::render(&series, (first, last), cfg, style)?;

    Ok(RunOutcome::Rendered(RunReport {
        output: cfg.output.clone(),
        rows: filtered.len(),
        first,
        last,
        fit: None,
    }))
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

pub fn run_regression(
    input: &Path,
    cfg: &RegressionConfig,
    style: &RenderStyle,
) -> Result<RunOutcome> {
    let range = cfg.range();
    let Some((filtered, first, last)) = load_in_range(input, range)? else {
        return Ok(RunOutcome::NoData { range });
    };

    for name in [&cfg.x_column, &cfg.y_column] {
        if filtered.column_index(name).is_none() {
            return Err(missing_column(name, &filtered));
        }
    }
    let pairs = filtered
        .paired(&cfg.x_column, &cfg.y_column)
        .unwrap_or_default();
    info!(
        "{} of {} rows have both '{}' and '{}'",
        pairs.len(),
        filtered.len(),
        cfg.x_column,
        cfg.y_column
    );

    let fit = linear_regression(&pairs)?;
    info!("fitted {fit}, r = {:.4}, std err = {:.4}", fit.r_value, fit.std_err);

    regression::render(&pairs, &fit, cfg, style)?;

    Ok(RunOutcome::Rendered(RunReport {
        output: cfg.output.clone(),
        rows: filtered.len(),
        first,
        last,
        fit: Some(fit),
    }))
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Human-readable failure report: stage, cause, and the offending input.
pub fn describe_failure(err: &PipelineError) -> String {
    let mut out = format!("Failed during the {} stage: {err}", err.stage());
    let sample = err.sample();
    if !sample.is_empty() {
        out.push_str("\nInput sample:");
        for line in sample {
            let _ = write!(out, "\n  {line}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_failure_includes_sample() {
        let err = PipelineError::DateParse {
            column: "TIMESTAMP".into(),
            tried: vec!["day-first", "mixed", "locale-inferred"],
            sample: vec!["soon".into(), "later".into()],
        };
        let text = describe_failure(&err);
        assert!(text.starts_with("Failed during the load stage"));
        assert!(text.contains("\n  soon\n  later"));
    }

    #[test]
    fn test_describe_failure_without_sample() {
        let err = PipelineError::MalformedHeader { found: 1 };
        assert_eq!(
            describe_failure(&err),
            "Failed during the header stage: malformed header: expected 4 lines, found 1"
        );
    }
}
