//! CSV results file.
//!
//! One line per result row: the label, then every latency of the series in
//! nanoseconds, in measured order. Numbers are plain decimal digits, so the
//! file parses the same way in every locale.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BenchError, Result};
use crate::runner::ResultRow;

/// Writes all rows in one buffered pass once every pass has finished.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create or truncate the file and write `rows`.
    pub fn write(&self, rows: &[ResultRow]) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        write_rows(&mut out, rows)?;
        out.flush()?;
        Ok(())
    }
}

pub fn write_rows<W: Write>(out: &mut W, rows: &[ResultRow]) -> io::Result<()> {
    for row in rows {
        out.write_all(escape_field(&row.label).as_bytes())?;
        for sample in &row.samples {
            write!(out, ",{}", sample.as_nanos())?;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Quote a field only when it contains a delimiter, a quote or a line break.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// A row read back from a results file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub label: String,
    pub nanos: Vec<u64>,
}

impl ParsedRow {
    pub fn samples(&self) -> Vec<Duration> {
        self.nanos.iter().map(|&ns| Duration::from_nanos(ns)).collect()
    }
}

pub fn read_results(path: &Path) -> Result<Vec<ParsedRow>> {
    let contents = std::fs::read_to_string(path)?;
    parse_results(&contents)
}

/// Parse the format produced by [`write_rows`]. Blank lines are skipped.
pub fn parse_results(contents: &str) -> Result<Vec<ParsedRow>> {
    let mut rows = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line_no = idx + 1;
        let malformed = |message: String| BenchError::MalformedResults {
            line: line_no,
            message,
        };
        if line.trim().is_empty() {
            continue;
        }

        let (label, rest) = split_label(line).map_err(|m| malformed(m.to_string()))?;
        let mut nanos = Vec::new();
        if let Some(rest) = rest {
            for field in rest.split(',') {
                let value = field
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| malformed(format!("bad latency value '{}': {}", field, e)))?;
                nanos.push(value);
            }
        }
        rows.push(ParsedRow { label, nanos });
    }
    Ok(rows)
}

/// Split off the (possibly quoted) label. Returns the label and the remainder
/// after its delimiter, if any.
fn split_label(line: &str) -> std::result::Result<(String, Option<&str>), &'static str> {
    let Some(quoted) = line.strip_prefix('"') else {
        return Ok(match line.split_once(',') {
            Some((label, rest)) => (label.to_string(), Some(rest)),
            None => (line.to_string(), None),
        });
    };

    let mut label = String::new();
    let mut chars = quoted.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '"' {
            label.push(c);
            continue;
        }
        if let Some(&(_, '"')) = chars.peek() {
            chars.next();
            label.push('"');
            continue;
        }
        // Closing quote.
        let rest = &quoted[i + 1..];
        return match rest.strip_prefix(',') {
            Some(rest) => Ok((label, Some(rest))),
            None if rest.is_empty() => Ok((label, None)),
            None => Err("unexpected text after quoted label"),
        };
    }
    Err("unterminated quoted label")
}
