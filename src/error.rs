use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::stats::StatsError;

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// The step of a run that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    Load,
    Filter,
    Analysis,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Header => write!(f, "header"),
            Stage::Load => write!(f, "load"),
            Stage::Filter => write!(f, "filter"),
            Stage::Analysis => write!(f, "analysis"),
            Stage::Render => write!(f, "render"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Everything that can end a chart run early.
///
/// An empty date range is deliberately absent: it is reported as
/// [`crate::pipeline::RunOutcome::NoData`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reading input: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed header: expected 4 lines, found {found}")]
    MalformedHeader { found: usize },

    #[error("malformed header: line 2 declares no usable column names")]
    EmptyColumnNames,

    #[error("could not parse timestamp column '{column}' (tried {})", .tried.join(", "))]
    DateParse {
        column: String,
        tried: Vec<&'static str>,
        sample: Vec<String>,
    },

    #[error("line {line}: header declares {expected} columns but the row has {found}")]
    ColumnMismatch {
        line: u64,
        expected: usize,
        found: usize,
        record: String,
    },

    #[error("tokenizing data body: {0}")]
    Csv(#[from] csv::Error),

    #[error("date range starts {start} but ends {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("column '{name}' not found (available: {})", .available.join(", "))]
    MissingColumn { name: String, available: Vec<String> },

    #[error("regression failed: {0}")]
    Regression(#[from] StatsError),

    #[error("drawing chart: {0}")]
    Render(String),

    #[error("writing {path}: {reason}")]
    RenderWrite { path: PathBuf, reason: String },
}

impl PipelineError {
    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Io { .. }
            | PipelineError::Read(_)
            | PipelineError::MalformedHeader { .. }
            | PipelineError::EmptyColumnNames => Stage::Header,
            PipelineError::DateParse { .. }
            | PipelineError::ColumnMismatch { .. }
            | PipelineError::Csv(_) => Stage::Load,
            PipelineError::InvalidRange { .. } | PipelineError::MissingColumn { .. } => {
                Stage::Filter
            }
            PipelineError::Regression(_) => Stage::Analysis,
            PipelineError::Render(_) | PipelineError::RenderWrite { .. } => Stage::Render,
        }
    }

    /// Raw input that illustrates the failure, if the error carries any.
    pub fn sample(&self) -> Vec<String> {
        match self {
            PipelineError::DateParse { sample, .. } => sample.clone(),
            PipelineError::ColumnMismatch { record, .. } => vec![record.clone()],
            _ => Vec::new(),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_assignment() {
        assert_eq!(PipelineError::MalformedHeader { found: 2 }.stage(), Stage::Header);
        let mismatch = PipelineError::ColumnMismatch {
            line: 7,
            expected: 4,
            found: 3,
            record: "a,b,c".into(),
        };
        assert_eq!(mismatch.stage(), Stage::Load);
        assert_eq!(mismatch.sample(), vec!["a,b,c".to_string()]);
        assert_eq!(
            mismatch.to_string(),
            "line 7: header declares 4 columns but the row has 3"
        );
    }

    #[test]
    fn test_date_parse_message_lists_strategies() {
        let err = PipelineError::DateParse {
            column: "TIMESTAMP".into(),
            tried: vec!["day-first", "mixed"],
            sample: vec!["garbage".into()],
        };
        assert_eq!(
            err.to_string(),
            "could not parse timestamp column 'TIMESTAMP' (tried day-first, mixed)"
        );
        assert_eq!(err.stage(), Stage::Load);
    }
}
