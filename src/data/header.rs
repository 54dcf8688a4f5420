use std::io::BufRead;

use log::debug;

use super::model::ColumnNames;
use crate::error::{PipelineError, Result};

/// Number of header lines preceding the data body.
pub const HEADER_LINES: usize = 4;

/// Zero-based header line that carries the column names.
const NAMES_LINE: usize = 1;

/// The four raw header lines.
#[derive(Debug, Clone)]
pub struct RawHeader {
    pub lines: Vec<String>,
}

/// Read exactly the first [`HEADER_LINES`] lines, leaving `reader` positioned
/// at the first data row.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<RawHeader> {
    let mut lines = Vec::with_capacity(HEADER_LINES);
    let mut buf = String::new();

    while lines.len() < HEADER_LINES {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Err(PipelineError::MalformedHeader { found: lines.len() });
        }
        lines.push(buf.trim_end_matches(['\r', '\n']).to_string());
    }

    Ok(RawHeader { lines })
}

/// Split header line 2 on commas and strip whitespace and double quotes
/// from every token.
pub fn column_names(header: &RawHeader) -> Result<ColumnNames> {
    let line = header
        .lines
        .get(NAMES_LINE)
        .ok_or(PipelineError::MalformedHeader { found: header.lines.len() })?;

    let names: Vec<String> = line
        .trim()
        .split(',')
        .map(|tok| tok.trim().trim_matches('"').trim().to_string())
        .collect();

    if names.first().map_or(true, |n| n.is_empty()) {
        return Err(PipelineError::EmptyColumnNames);
    }

    debug!("header declares {} columns: {}", names.len(), names.join(", "));
    Ok(ColumnNames::new(names))
}

/// Read the header and extract its column names in one step.
pub fn interpret_header<R: BufRead>(reader: &mut R) -> Result<ColumnNames> {
    let header = read_header(reader)?;
    column_names(&header)
}
