//! CSV ingestion (component 4.I): a parallel block-based reader with a
//! per-block finite-state-machine parser and a per-block error handler that
//! caches a bounded number of conversion warnings rather than aborting the
//! whole copy when `IGNORE_ERRORS` is set.

use std::fs;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::cast::{self, CastOptions};
use crate::config::{CsvDefaultsConfig, PerformanceConfig};
use crate::error::{Error, Result};
use crate::value::{LogicalType, Scalar};

#[derive(Debug, Clone)]
pub struct CsvWarning {
    pub line: usize,
    pub message: String,
}

/// Per-block conversion-error accumulator (§4.I): caches up to
/// `max_cached_error_count` warnings, then starts counting the overflow
/// without retaining the message text, so a catastrophically malformed
/// file can't blow up memory while still reporting *that* rows were
/// dropped.
#[derive(Debug, Default)]
pub struct BlockErrorHandler {
    cap: usize,
    warnings: Vec<CsvWarning>,
    overflowed: usize,
}

impl BlockErrorHandler {
    pub fn new(cap: usize) -> Self {
        BlockErrorHandler { cap, warnings: Vec::new(), overflowed: 0 }
    }

    pub fn record(&mut self, line: usize, message: String) {
        if self.warnings.len() < self.cap {
            self.warnings.push(CsvWarning { line, message });
        } else {
            self.overflowed += 1;
        }
    }

    pub fn warnings(&self) -> &[CsvWarning] {
        &self.warnings
    }

    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    fn merge(&mut self, mut other: BlockErrorHandler) {
        for w in other.warnings.drain(..) {
            self.record(w.line, w.message);
        }
        self.overflowed += other.overflowed;
    }
}

/// Splits raw file bytes into `~block_size`-byte chunks aligned to the next
/// newline after the target boundary, so no record straddles two blocks'
/// independent scans (the usual `PARALLEL_BLOCK_SIZE` scan-boundary rule).
fn split_into_blocks(data: &[u8], block_size: usize) -> Vec<(usize, usize)> {
    if data.is_empty() {
        return Vec::new();
    }
    let mut blocks = Vec::new();
    let mut start = 0;
    while start < data.len() {
        let mut end = (start + block_size).min(data.len());
        if end < data.len() {
            while end < data.len() && data[end - 1] != b'\n' {
                end += 1;
            }
        }
        blocks.push((start, end));
        start = end;
    }
    blocks
}

/// A tiny finite-state-machine line/field splitter honoring `"`-quoting and
/// `\`-escaping, mirroring the per-character dispatch a hand-written CSV
/// scanner uses rather than pulling in a regex/grammar.
fn parse_block(block: &str) -> Vec<Vec<String>> {
    #[derive(PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::FieldStart;

    let mut chars = block.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            State::FieldStart if c == '"' => state = State::Quoted,
            State::FieldStart | State::Unquoted => match c {
                ',' => {
                    row.push(std::mem::take(&mut field));
                    state = State::FieldStart;
                }
                '\n' | '\r' => {
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                    state = State::FieldStart;
                }
                _ => {
                    field.push(c);
                    state = State::Unquoted;
                }
            },
            State::Quoted => match c {
                '"' => state = State::QuoteInQuoted,
                '\\' => {
                    if let Some(&next) = chars.peek() {
                        field.push(next);
                        chars.next();
                    }
                }
                _ => field.push(c),
            },
            State::QuoteInQuoted => match c {
                '"' => {
                    field.push('"');
                    state = State::Quoted;
                }
                ',' => {
                    row.push(std::mem::take(&mut field));
                    state = State::FieldStart;
                }
                '\n' | '\r' => {
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                    state = State::FieldStart;
                }
                _ => {
                    field.push(c);
                    state = State::Unquoted;
                }
            },
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

pub struct CsvReadResult {
    pub rows: Vec<Vec<Scalar>>,
    pub errors: BlockErrorHandler,
}

/// Reads `path` against `column_types` (in file-column order), honoring
/// `defaults.header`/`defaults.parallel`: serial and parallel reads must
/// produce row-order-identical results, the only difference being whether
/// blocks are scanned with `rayon::par_iter` or sequentially (§8 "CSV
/// serial/parallel determinism").
pub fn read_csv(
    path: &str,
    column_types: &[LogicalType],
    defaults: &CsvDefaultsConfig,
    perf: &PerformanceConfig,
    cast_options: &CastOptions,
) -> Result<CsvReadResult> {
    let data = fs::read(path).map_err(|e| {
        Error::Io(std::io::Error::new(e.kind(), format!("{path}: {e}")))
    })?;
    let text = String::from_utf8_lossy(&data);
    let blocks = split_into_blocks(text.as_bytes(), perf.parallel_block_size);

    // Each block's first line number in the whole file, so warnings carry a
    // global 1-based line number rather than one reset at every block
    // boundary.
    let mut line_offsets = Vec::with_capacity(blocks.len());
    let mut lines_so_far = 0usize;
    for &(start, end) in &blocks {
        line_offsets.push(lines_so_far);
        lines_so_far += text.as_bytes()[start..end].iter().filter(|&&b| b == b'\n').count();
    }

    let parse_one = |(range, line_offset, is_first_block): ((usize, usize), usize, bool)| -> (Vec<Vec<Scalar>>, BlockErrorHandler) {
        let chunk = &text[range.0..range.1];
        let mut handler = BlockErrorHandler::new(perf.max_cached_error_count);
        let mut out = Vec::new();
        for (i, fields) in parse_block(chunk).into_iter().enumerate() {
            if defaults.header && is_first_block && i == 0 {
                continue;
            }
            match cast_row(&fields, column_types, cast_options) {
                Ok(row) => out.push(row),
                Err(e) => {
                    handler.record(line_offset + i + 1, e.to_string());
                }
            }
        }
        (out, handler)
    };

    let work: Vec<((usize, usize), usize, bool)> = blocks
        .into_iter()
        .zip(line_offsets)
        .enumerate()
        .map(|(i, (range, offset))| (range, offset, i == 0))
        .collect();
    let block_results: Vec<(Vec<Vec<Scalar>>, BlockErrorHandler)> = if defaults.parallel {
        work.into_par_iter().map(parse_one).collect()
    } else {
        work.into_iter().map(parse_one).collect()
    };

    let mut rows = Vec::new();
    let mut errors = BlockErrorHandler::new(perf.max_cached_error_count);
    for (block_rows, block_errors) in block_results {
        rows.extend(block_rows);
        errors.merge(block_errors);
    }

    if !defaults.ignore_errors && !errors.warnings.is_empty() {
        let first = &errors.warnings[0];
        return Err(Error::copy(format!("line {}: {}", first.line, first.message)));
    }

    Ok(CsvReadResult { rows, errors })
}

fn cast_row(fields: &[String], column_types: &[LogicalType], options: &CastOptions) -> Result<Vec<Scalar>> {
    if fields.len() != column_types.len() {
        return Err(Error::copy(format!(
            "Expected {} columns but found {}",
            column_types.len(),
            fields.len()
        )));
    }
    fields
        .iter()
        .zip(column_types)
        .map(|(f, ty)| cast::cast_value(f, ty, options).map_err(Error::from))
        .collect()
}

/// Backing store for `CALL SHOW_WARNINGS()`: every warning recorded across
/// every copy this connection has run, queryable as a table function.
#[derive(Default)]
pub struct WarningLog {
    inner: Mutex<Vec<CsvWarning>>,
}

impl WarningLog {
    pub fn record_all(&self, warnings: &[CsvWarning]) {
        self.inner.lock().unwrap().extend(warnings.iter().cloned());
    }

    pub fn snapshot(&self) -> Vec<CsvWarning> {
        self.inner.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_with_escaped_quotes() {
        let rows = parse_block("a,\"b,c\",d\n1,\"he said \\\"hi\\\"\",2\n");
        assert_eq!(rows[0], vec!["a", "b,c", "d"]);
        assert_eq!(rows[1][1], "he said \"hi\"");
    }

    #[test]
    fn serial_and_parallel_reads_agree_on_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        fs::write(&path, "id,name\n1,a\n2,b\n3,c\n4,d\n5,e\n").unwrap();

        let types = vec![LogicalType::Int64, LogicalType::String];
        let options = CastOptions::default();
        let mut perf = PerformanceConfig::default();
        perf.parallel_block_size = 8; // force multiple blocks

        let mut serial_defaults = CsvDefaultsConfig::default();
        serial_defaults.header = true;
        serial_defaults.parallel = false;
        let serial = read_csv(path.to_str().unwrap(), &types, &serial_defaults, &perf, &options).unwrap();

        let mut parallel_defaults = CsvDefaultsConfig::default();
        parallel_defaults.header = true;
        parallel_defaults.parallel = true;
        let parallel = read_csv(path.to_str().unwrap(), &types, &parallel_defaults, &perf, &options).unwrap();

        assert_eq!(serial.rows, parallel.rows);
    }

    #[test]
    fn ignore_errors_caches_conversion_failures_as_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id\nnotanumber\n").unwrap();

        let types = vec![LogicalType::Int64];
        let options = CastOptions::default();
        let perf = PerformanceConfig::default();
        let mut defaults = CsvDefaultsConfig::default();
        defaults.header = false;
        defaults.ignore_errors = true;
        let result = read_csv(path.to_str().unwrap(), &types, &defaults, &perf, &options).unwrap();
        assert_eq!(result.rows.len(), 0);
        assert_eq!(result.errors.warnings().len(), 1);
    }

    /// S4 (out-of-range int32 overflow, ten times): every line fails the
    /// same way, the table stays empty, and every warning reconstructs
    /// the same offending substring with the 1-based source line number.
    #[test]
    fn ten_out_of_range_rows_each_produce_a_numbered_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overflow.csv");
        let line = "1152921504606846976";
        fs::write(&path, format!("{line}\n").repeat(10)).unwrap();

        let types = vec![LogicalType::Int32];
        let options = CastOptions::default();
        let perf = PerformanceConfig::default();
        let defaults = CsvDefaultsConfig { ignore_errors: true, ..CsvDefaultsConfig::default() };

        let result = read_csv(path.to_str().unwrap(), &types, &defaults, &perf, &options).unwrap();
        assert_eq!(result.rows.len(), 0);
        assert_eq!(result.errors.warnings().len(), 10);
        for (i, w) in result.errors.warnings().iter().enumerate() {
            assert_eq!(w.line, i + 1);
            assert!(w.message.starts_with(&format!(
                "Conversion exception: Cast failed. Could not convert \"{line}\" to INT32."
            )));
        }
    }
}
