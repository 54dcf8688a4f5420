use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;

// ---------------------------------------------------------------------------
// Candidate formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format {
    pattern: &'static str,
    date_only: bool,
}

const fn dt(pattern: &'static str) -> Format {
    Format { pattern, date_only: false }
}

const fn d(pattern: &'static str) -> Format {
    Format { pattern, date_only: true }
}

/// Year-first layouts. Never ambiguous.
const YEAR_FIRST: &[Format] = &[
    dt("%Y-%m-%d %H:%M:%S"),
    dt("%Y-%m-%d %H:%M:%S%.f"),
    dt("%Y-%m-%dT%H:%M:%S"),
    dt("%Y-%m-%dT%H:%M:%S%.f"),
    dt("%Y-%m-%d %H:%M"),
    dt("%Y/%m/%d %H:%M:%S"),
    dt("%Y/%m/%d %H:%M"),
    d("%Y-%m-%d"),
    d("%Y/%m/%d"),
];

const DAY_FIRST: &[Format] = &[
    dt("%d/%m/%Y %H:%M:%S"),
    dt("%d/%m/%Y %H:%M"),
    dt("%d-%m-%Y %H:%M:%S"),
    dt("%d-%m-%Y %H:%M"),
    dt("%d.%m.%Y %H:%M:%S"),
    dt("%d.%m.%Y %H:%M"),
    d("%d/%m/%Y"),
    d("%d-%m-%Y"),
    d("%d.%m.%Y"),
];

const MONTH_FIRST: &[Format] = &[
    dt("%m/%d/%Y %H:%M:%S"),
    dt("%m/%d/%Y %H:%M"),
    dt("%m/%d/%Y %I:%M:%S %p"),
    dt("%m/%d/%Y %I:%M %p"),
    dt("%m-%d-%Y %H:%M:%S"),
    d("%m/%d/%Y"),
    d("%m-%d-%Y"),
];

fn parse_with(token: &str, fmt: Format) -> Option<NaiveDateTime> {
    if fmt.date_only {
        NaiveDate::parse_from_str(token, fmt.pattern)
            .ok()
            .and_then(|day| day.and_hms_opt(0, 0, 0))
    } else {
        NaiveDateTime::parse_from_str(token, fmt.pattern).ok()
    }
}

fn first_match(token: &str, groups: &[&[Format]]) -> Option<(Format, NaiveDateTime)> {
    groups
        .iter()
        .flat_map(|g| g.iter())
        .find_map(|&fmt| parse_with(token, fmt).map(|t| (fmt, t)))
}

/// Per-element parse used by the `Mixed` strategy and the coercion pass:
/// year-first, then month-first, then day-first.
fn parse_any(token: &str) -> Option<NaiveDateTime> {
    first_match(token, &[YEAR_FIRST, MONTH_FIRST, DAY_FIRST]).map(|(_, t)| t)
}

/// Infer one format from the first non-blank token that any candidate accepts.
fn infer_format(tokens: &[&str], groups: &[&[Format]], scan_all: bool) -> Option<Format> {
    let mut non_blank = tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty());
    if scan_all {
        non_blank.find_map(|t| first_match(t, groups).map(|(f, _)| f))
    } else {
        non_blank.next().and_then(|t| first_match(t, groups).map(|(f, _)| f))
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// One rule for turning the raw timestamp column into instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStrategy {
    /// One format inferred from the first row, day-before-month when
    /// ambiguous, applied strictly to every row.
    DayFirst,
    /// Every row parsed on its own against all known layouts.
    Mixed,
    /// One format inferred from the first recognisable row, month-before-day
    /// when ambiguous, rows that do not match are left unparsed.
    LocaleInferred,
}

impl TimestampStrategy {
    /// Priority order in which strategies are attempted.
    pub const ORDER: [TimestampStrategy; 3] = [
        TimestampStrategy::DayFirst,
        TimestampStrategy::Mixed,
        TimestampStrategy::LocaleInferred,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TimestampStrategy::DayFirst => "day-first",
            TimestampStrategy::Mixed => "mixed",
            TimestampStrategy::LocaleInferred => "locale-inferred",
        }
    }

    /// Parse the whole column. Blank tokens are always missing.
    pub fn apply(self, tokens: &[&str]) -> Result<ParsedColumn, StrategyError> {
        match self {
            TimestampStrategy::DayFirst => {
                let fmt = infer_format(tokens, &[YEAR_FIRST, DAY_FIRST], false)
                    .ok_or(StrategyError::NoFormat)?;
                strict(tokens, |t| parse_with(t, fmt))
            }
            TimestampStrategy::Mixed => strict(tokens, parse_any),
            TimestampStrategy::LocaleInferred => {
                let fmt = infer_format(tokens, &[YEAR_FIRST, MONTH_FIRST, DAY_FIRST], true)
                    .ok_or(StrategyError::NoFormat)?;
                Ok(lenient(tokens, |t| parse_with(t, fmt)))
            }
        }
    }
}

impl fmt::Display for TimestampStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a strategy rejected a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// No row matched any candidate layout.
    NoFormat,
    /// A row did not parse under the strategy's rules.
    Unparseable { row: usize, token: String },
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyError::NoFormat => write!(f, "no recognisable timestamp layout"),
            StrategyError::Unparseable { row, token } => {
                write!(f, "row {row}: '{token}' does not parse")
            }
        }
    }
}

/// Output of a strategy: one slot per row, plus the rows whose non-blank
/// token was left unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedColumn {
    pub values: Vec<Option<NaiveDateTime>>,
    pub unparsed: Vec<usize>,
}

fn strict<F>(tokens: &[&str], parse: F) -> Result<ParsedColumn, StrategyError>
where
    F: Fn(&str) -> Option<NaiveDateTime>,
{
    let values = tokens
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            let token = raw.trim();
            if token.is_empty() {
                return Ok(None);
            }
            parse(token).map(Some).ok_or_else(|| StrategyError::Unparseable {
                row,
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ParsedColumn { values, unparsed: Vec::new() })
}

fn lenient<F>(tokens: &[&str], parse: F) -> ParsedColumn
where
    F: Fn(&str) -> Option<NaiveDateTime>,
{
    let mut unparsed = Vec::new();
    let values = tokens
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            let token = raw.trim();
            if token.is_empty() {
                return None;
            }
            let parsed = parse(token);
            if parsed.is_none() {
                unparsed.push(row);
            }
            parsed
        })
        .collect();
    ParsedColumn { values, unparsed }
}

// ---------------------------------------------------------------------------
// Column parse with fallback
// ---------------------------------------------------------------------------

/// Try every strategy in [`TimestampStrategy::ORDER`]; the first that accepts
/// the column is used for all of it.
///
/// On failure returns the names of the strategies tried.
pub fn parse_timestamp_column(
    tokens: &[&str],
) -> Result<(TimestampStrategy, ParsedColumn), Vec<&'static str>> {
    let mut tried = Vec::with_capacity(TimestampStrategy::ORDER.len());
    for strategy in TimestampStrategy::ORDER {
        match strategy.apply(tokens) {
            Ok(parsed) => return Ok((strategy, parsed)),
            Err(e) => {
                debug!("timestamp strategy '{strategy}' rejected: {e}");
                tried.push(strategy.name());
            }
        }
    }
    Err(tried)
}

/// Forced coercion pass: re-parse every unparsed row element by element and
/// turn whatever still fails into the missing marker. Never fails.
///
/// Returns the number of rows that ended up missing.
pub fn coerce_unparsed(column: &mut ParsedColumn, tokens: &[&str]) -> usize {
    let mut missing = 0;
    for row in column.unparsed.drain(..) {
        let recovered = tokens.get(row).and_then(|t| parse_any(t.trim()));
        if recovered.is_none() {
            missing += 1;
        }
        if let Some(slot) = column.values.get_mut(row) {
            *slot = recovered;
        }
    }
    missing
}
