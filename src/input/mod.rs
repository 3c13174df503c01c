//! Module turning the raw input files into lines and lines into typed records.

mod decode;


use std::path::Path;

use crate::domain::SourceFile;
use crate::error::{Error, io_error};

pub(crate) use decode::{DecodeError, decode_account, decode_customer};

/// Reads a file into its non-blank lines, preserving their order.
pub fn load_lines(path: impl AsRef<Path>) -> Result<Vec<String>, Error> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// Splits a single line into its trimmed fields.
pub(crate) fn split_fields(line: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(record.iter().map(str::to_string).collect())
}

/// Fallback used when the csv reader rejects a line: the fields are still needed for the error report.
pub(crate) fn split_fields_lossy(line: &str) -> Vec<String> {
    line.split(',').map(|field| field.trim().to_string()).collect()
}

/// Whether these are the fields of the header row of the given file.
pub(crate) fn is_header(fields: &[String], file: SourceFile) -> bool {
    fields
        .first()
        .is_some_and(|first| first.trim().eq_ignore_ascii_case(file.header_token()))
}
