// genetic_map.rs
//
// Reader for genetic map files: 3 or 4 tab-separated columns, optional header
// row, physical position (base pairs) in the first column and genetic
// position (centimorgans) in the third. Structurally these files are easy to
// confuse with PLINK maps, whose first two columns are chromosome and variant
// ids; see the disambiguation heuristic below.

use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};
use crate::reader::{count_nonempty_lines, LineSource};
use crate::text::{parse_float, parse_unsigned, split_by_delimiter};
use crate::util::{is_increasing, is_strictly_increasing};

const FORMAT: &str = "genetic map file";

/// Genetic deltas above this many cM per Mbp of physical delta are taken as a
/// sign that one of the columns is in the wrong unit.
const UNITS_CM_PER_MBP_LIMIT: f64 = 10.0;

/// What to do when map positions fail their monotonicity requirement
/// (physical strictly increasing, genetic non-decreasing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonotonicityPolicy {
    /// Fail the load with [`Error::MonotonicityViolation`].
    #[default]
    Fatal,
    /// Log a warning and keep the positions as read.
    Warn,
}

/// The shape of a map file as determined from its first one or two lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapShape {
    pub num_cols: usize,
    pub has_header: bool,
}

/// A data row has at least 3 tab-separated fields, an unsigned-integer
/// field 0 and a float-parseable field 2.
fn valid_data_row(row: &str) -> bool {
    if row.is_empty() {
        return false;
    }
    let fields = split_by_delimiter(row, "\t");
    if fields.len() < 3 {
        return false;
    }
    parse_unsigned(&fields[0]).is_ok() && parse_float(&fields[2]).is_ok()
}

/// Decide column count and header presence from at most the first two lines.
///
/// With V0/V1 = "is line 0/1 a valid data row":
/// both valid means no header; invalid non-empty line 0 followed by a valid
/// line 1 means a header; a valid line 0 followed by nothing (or a trailing
/// blank) is a single-row file; anything else is not a map file.
pub fn sniff_map_format(first_lines: &[String], path: &Path) -> Result<MapShape> {
    let line0 = first_lines.first().map(String::as_str).unwrap_or("");
    let line1 = first_lines.get(1).map(String::as_str);

    let v0 = valid_data_row(line0);
    let v1 = line1.is_some_and(valid_data_row);
    let potential_header = !v0 && !line0.is_empty();

    let (valid, has_header) = if v0 && v1 {
        (true, false)
    } else if potential_header && v1 {
        (true, true)
    } else if v0 && !v1 {
        let valid = match line1 {
            None => true,
            Some(l) => l.is_empty(),
        };
        (valid, false)
    } else {
        (false, false)
    };

    if !valid {
        return Err(Error::InvalidMapFile {
            format: FORMAT,
            path: path.to_path_buf(),
            first_lines: first_lines.join("\n"),
        });
    }

    let reference = if has_header { line1.unwrap_or("") } else { line0 };
    Ok(MapShape {
        num_cols: split_by_delimiter(reference, "\t").len(),
        has_header,
    })
}

/// A fully validated genetic map.
#[derive(Debug, Clone)]
pub struct GeneticMap {
    path: PathBuf,
    shape: MapShape,
    physical_positions: Vec<u64>,
    genetic_positions: Vec<f64>,
}

impl GeneticMap {
    /// Load and validate a genetic map with the default (fatal) monotonicity
    /// policy.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_policy(path, MonotonicityPolicy::default())
    }

    pub fn load_with_policy(path: impl AsRef<Path>, policy: MonotonicityPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::PathNotFound { expected: "genetic map", path });
        }

        let shape = {
            let mut source = LineSource::open(&path)?;
            let mut first_lines = Vec::with_capacity(2);
            while first_lines.len() < 2 {
                match source.next_line().map_err(|source| Error::Io {
                    path: path.clone(),
                    source,
                })? {
                    Some(line) => first_lines.push(line),
                    None => break,
                }
            }
            sniff_map_format(&first_lines, &path)?
        };

        let mut num_sites = count_nonempty_lines(&path)? as usize;
        if shape.has_header {
            num_sites -= 1;
        }

        let mut map = Self {
            path,
            shape,
            physical_positions: Vec::with_capacity(num_sites),
            genetic_positions: Vec::with_capacity(num_sites),
        };
        map.read_rows()?;
        map.warn_if_plink_shaped();
        map.warn_on_unit_confusion();
        enforce_monotonic(
            FORMAT,
            &map.path,
            &map.physical_positions,
            &map.genetic_positions,
            policy,
        )?;

        Ok(map)
    }

    fn read_rows(&mut self) -> Result<()> {
        let mut source = LineSource::open(&self.path)?;
        let io_err = |source| Error::Io { path: self.path.clone(), source };

        let mut line_no = 0u64;
        if self.shape.has_header {
            source.next_line().map_err(io_err)?;
            line_no += 1;
        }

        while let Some(line) = source.next_line().map_err(io_err)? {
            line_no += 1;
            let fields = split_by_delimiter(&line, "\t");
            if fields.is_empty() {
                continue;
            }

            if fields.len() != self.shape.num_cols {
                return Err(Error::ColumnCountMismatch {
                    format: FORMAT,
                    path: self.path.clone(),
                    line: line_no,
                    found: fields.len(),
                    expected: self.shape.num_cols,
                    reference: "the first data row",
                });
            }

            match (parse_unsigned(&fields[0]), parse_float(&fields[2])) {
                (Ok(physical), Ok(genetic)) => {
                    self.physical_positions.push(physical);
                    self.genetic_positions.push(genetic);
                }
                _ => {
                    return Err(Error::MalformedMapRow {
                        path: self.path.clone(),
                        line: line_no,
                        physical: fields[0].clone(),
                        genetic: fields[2].clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// A genetic map whose "physical positions" all coincide was most likely
    /// a PLINK map, whose first column is a chromosome id.
    fn warn_if_plink_shaped(&self) {
        let positions = &self.physical_positions;
        if positions.len() >= 2 && positions.iter().all(|&p| p == positions[0]) {
            warn!(
                "genetic map file {} may be a PLINK map: the values at column indices 0 and 1 look like chromosome and variant ids",
                self.path.display()
            );
        }
    }

    /// Flag probable Morgans/Mbp units confusion: genetic deltas far larger
    /// than the corresponding physical deltas suggest the columns are not in
    /// cM and base pairs.
    fn warn_on_unit_confusion(&self) {
        let suspicious = self
            .physical_positions
            .windows(2)
            .zip(self.genetic_positions.windows(2))
            .filter(|(physical, genetic)| {
                let delta_mbp = physical[1].saturating_sub(physical[0]) as f64 / 1.0e6;
                genetic[1] - genetic[0] > delta_mbp * UNITS_CM_PER_MBP_LIMIT
            })
            .count();

        if suspicious > 0 {
            let percentage = 100.0 * suspicious as f64 / self.num_sites() as f64;
            warn!(
                "{:.1}% of entries in genetic map file {} have genetic position deltas larger than {} cM per Mbp; genetic positions should be in centimorgans and physical positions in base pairs",
                percentage,
                self.path.display(),
                UNITS_CM_PER_MBP_LIMIT
            );
        }
    }

    pub fn num_sites(&self) -> usize {
        self.physical_positions.len()
    }

    pub fn num_cols(&self) -> usize {
        self.shape.num_cols
    }

    pub fn has_header(&self) -> bool {
        self.shape.has_header
    }

    pub fn physical_positions(&self) -> &[u64] {
        &self.physical_positions
    }

    pub fn genetic_positions(&self) -> &[f64] {
        &self.genetic_positions
    }
}

/// Enforce the map position invariants under the given policy: physical
/// positions strictly increasing, genetic positions non-decreasing.
pub(crate) fn enforce_monotonic(
    format: &'static str,
    path: &Path,
    physical: &[u64],
    genetic: &[f64],
    policy: MonotonicityPolicy,
) -> Result<()> {
    if !is_strictly_increasing(physical) {
        match policy {
            MonotonicityPolicy::Fatal => {
                return Err(Error::MonotonicityViolation {
                    path: path.to_path_buf(),
                    kind: "physical",
                    requirement: "strictly increasing",
                });
            }
            MonotonicityPolicy::Warn => warn!(
                "physical positions in {} {} are not strictly increasing",
                format,
                path.display()
            ),
        }
    }

    if !is_increasing(genetic) {
        match policy {
            MonotonicityPolicy::Fatal => {
                return Err(Error::MonotonicityViolation {
                    path: path.to_path_buf(),
                    kind: "genetic",
                    requirement: "increasing",
                });
            }
            MonotonicityPolicy::Warn => warn!(
                "genetic positions in {} {} are not increasing",
                format,
                path.display()
            ),
        }
    }

    Ok(())
}
