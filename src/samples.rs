// samples.rs
//
// Individual-metadata readers: the Oxford .sample[s] file with its two fixed
// header rows, and the PLINK .fam file with its auto-detected delimiter.

use std::path::Path;

use crate::error::{Error, Result};
use crate::reader::LineSource;
use crate::text::split_by_delimiter;

/// Candidate .fam delimiters, tried in priority order; first match wins.
pub const FAM_DELIMITER_CANDIDATES: [&str; 2] = [" ", "\t"];

/// A .fam row has exactly 6 fields: family id, individual id, father,
/// mother, sex, phenotype.
pub const FAM_FIELDS_PER_ROW: usize = 6;

const SAMPLES_HEADER: &str = "ID_1 ID_2 missing";
const SAMPLES_ZERO_ROW: &str = "0 0 0";

/// Count individuals in an Oxford .sample[s] file.
///
/// The first line must begin with the literal tokens `ID_1 ID_2 missing` and
/// the second with the zero row `0 0 0`; every non-empty line after those two
/// is one individual.
pub fn count_individuals_in_samples_file(path: &Path) -> Result<usize> {
    let mut source = LineSource::open(path)?;
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let header = source.next_line().map_err(io_err)?.unwrap_or_default();
    if !line_starts_with_tokens(&header, SAMPLES_HEADER) {
        return Err(Error::SamplesHeaderMismatch {
            path: path.to_path_buf(),
            which: "first",
            expected: SAMPLES_HEADER,
        });
    }

    let zero_row = source.next_line().map_err(io_err)?.unwrap_or_default();
    if !line_starts_with_tokens(&zero_row, SAMPLES_ZERO_ROW) {
        return Err(Error::SamplesHeaderMismatch {
            path: path.to_path_buf(),
            which: "second",
            expected: SAMPLES_ZERO_ROW,
        });
    }

    let mut num_individuals = 0usize;
    while let Some(line) = source.next_line().map_err(io_err)? {
        if !line.is_empty() {
            num_individuals += 1;
        }
    }
    Ok(num_individuals)
}

fn line_starts_with_tokens(line: &str, expected: &str) -> bool {
    let fields = split_by_delimiter(line, " ");
    let expected: Vec<&str> = expected.split(' ').collect();
    fields.len() >= expected.len()
        && fields.iter().zip(&expected).all(|(field, want)| field == want)
}

/// Shape of a .fam file: how many individuals it lists and which delimiter
/// its rows use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamInfo {
    pub num_individuals: usize,
    pub delimiter: &'static str,
}

/// Find the first candidate delimiter that splits `line` into exactly
/// `expected_fields` fields.
pub fn detect_delimiter(
    line: &str,
    candidates: &[&'static str],
    expected_fields: usize,
) -> Option<&'static str> {
    candidates
        .iter()
        .copied()
        .find(|delimiter| split_by_delimiter(line, delimiter).len() == expected_fields)
}

/// Count individuals in a PLINK .fam file, auto-detecting its delimiter.
pub fn read_fam_file(path: &Path) -> Result<FamInfo> {
    let mut source = LineSource::open(path)?;
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let first_line = source.next_line().map_err(io_err)?.unwrap_or_default();
    let delimiter = detect_delimiter(&first_line, &FAM_DELIMITER_CANDIDATES, FAM_FIELDS_PER_ROW)
        .ok_or_else(|| Error::DelimiterDetectionFailed {
            path: path.to_path_buf(),
            expected_fields: FAM_FIELDS_PER_ROW,
        })?;

    let mut num_individuals = 1usize;
    let mut line_no = 1u64;
    while let Some(line) = source.next_line().map_err(io_err)? {
        line_no += 1;
        let fields = split_by_delimiter(&line, delimiter);
        if fields.is_empty() {
            continue;
        }
        if fields.len() != FAM_FIELDS_PER_ROW {
            return Err(Error::ColumnCountMismatch {
                format: ".fam file",
                path: path.to_path_buf(),
                line: line_no,
                found: fields.len(),
                expected: FAM_FIELDS_PER_ROW,
                reference: "line 1",
            });
        }
        num_individuals += 1;
    }

    Ok(FamInfo { num_individuals, delimiter })
}
