// error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the validating load operations.
///
/// Every variant carries enough positional context (path, 1-based line and
/// column numbers, offending literals) to reproduce the diagnostic without
/// re-reading the file. Loads fail atomically: when one of these is returned,
/// no matrix or map value is observable.
#[derive(Debug, Error)]
pub enum Error {
    #[error("expected {expected} file, but got {path}")]
    PathNotFound { expected: &'static str, path: PathBuf },

    #[error("could not determine delimiter for .fam file {path}: no candidate delimiter yields {expected_fields} fields")]
    DelimiterDetectionFailed { path: PathBuf, expected_fields: usize },

    #[error("{format} {path} should contain at least one data row with at least 3 tab-separated columns, but contains\n{first_lines}")]
    InvalidMapFile { format: &'static str, path: PathBuf, first_lines: String },

    #[error("{format} {path} should contain either 3 or 4 tab-separated columns, but contains {found}")]
    InvalidColumnCount { format: &'static str, path: PathBuf, found: usize },

    #[error("{format} {path} line {line} contains {found} columns, but {reference} contains {expected}")]
    ColumnCountMismatch {
        format: &'static str,
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
        reference: &'static str,
    },

    #[error("{format} {path} line {line} column {column}: expected {expected} but got {actual}")]
    MalformedField {
        format: &'static str,
        path: PathBuf,
        line: u64,
        column: usize,
        expected: &'static str,
        actual: String,
    },

    #[error("genetic map file {path} line {line} should contain an unsigned integer physical position in the first column and a floating point genetic position in the third column, but found {physical} and {genetic}")]
    MalformedMapRow { path: PathBuf, line: u64, physical: String, genetic: String },

    #[error("expected {path} to contain {expected} lines, but found {found}")]
    RowCountMismatch { path: PathBuf, expected: u64, found: u64 },

    #[error("error on line {line} of {path}: expected row to contain 2x{individuals}+5={expected} entries, but found {found}")]
    HapsRowLength {
        path: PathBuf,
        line: u64,
        individuals: usize,
        expected: usize,
        found: usize,
    },

    #[error("error on line {line} of {path}: expected row to contain boolean data, but column {column} was \"{actual}\"")]
    NonBooleanField { path: PathBuf, line: u64, column: usize, actual: String },

    #[error("expected {which} row of .samples file {path} to begin \"{expected}\"")]
    SamplesHeaderMismatch { path: PathBuf, which: &'static str, expected: &'static str },

    #[error("{kind} positions in {path} are not {requirement}")]
    MonotonicityViolation {
        path: PathBuf,
        kind: &'static str,
        requirement: &'static str,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode .bed file {path}: {source}")]
    BedDecode {
        path: PathBuf,
        #[source]
        source: Box<bed_reader::BedErrorPlus>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
