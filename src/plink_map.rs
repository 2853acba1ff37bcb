// plink_map.rs
//
// Reader for PLINK map files: 3 or 4 tab-separated columns, no header row.
// Columns are chromosome id, variant id, genetic position in centimorgans
// (4-column files only), and physical position in base pairs. Sniffing is
// column-count-only, which is what makes these files structurally confusable
// with genetic maps.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::genetic_map::{enforce_monotonic, MonotonicityPolicy};
use crate::reader::LineSource;
use crate::text::{parse_float, parse_unsigned, split_by_delimiter};

const FORMAT: &str = "PLINK map file";

const CHR_COL: usize = 0;
const SNP_COL: usize = 1;
const GEN_COL: usize = 2;

/// A fully validated PLINK map.
#[derive(Debug, Clone)]
pub struct PlinkMap {
    path: PathBuf,
    num_cols: usize,
    chr_ids: Vec<String>,
    snp_ids: Vec<String>,
    genetic_positions: Vec<f64>,
    physical_positions: Vec<u64>,
}

impl PlinkMap {
    /// Load and validate a PLINK map with the default (fatal) monotonicity
    /// policy.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_policy(path, MonotonicityPolicy::default())
    }

    pub fn load_with_policy(path: impl AsRef<Path>, policy: MonotonicityPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::PathNotFound { expected: "PLINK map", path });
        }

        let num_cols = Self::sniff_column_count(&path)?;

        let mut map = Self {
            path,
            num_cols,
            chr_ids: Vec::new(),
            snp_ids: Vec::new(),
            genetic_positions: Vec::new(),
            physical_positions: Vec::new(),
        };
        map.read_rows()?;
        enforce_monotonic(
            FORMAT,
            &map.path,
            &map.physical_positions,
            &map.genetic_positions,
            policy,
        )?;

        Ok(map)
    }

    fn sniff_column_count(path: &Path) -> Result<usize> {
        let mut source = LineSource::open(path)?;
        let first_line = source
            .next_line()
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?
            .unwrap_or_default();

        let num_cols = split_by_delimiter(&first_line, "\t").len();
        if num_cols != 3 && num_cols != 4 {
            return Err(Error::InvalidColumnCount {
                format: FORMAT,
                path: path.to_path_buf(),
                found: num_cols,
            });
        }
        Ok(num_cols)
    }

    fn read_rows(&mut self) -> Result<()> {
        // 4-column files carry the genetic position; in 3-column files the
        // physical position moves up into its place.
        let phys_col = if self.num_cols == 4 { 3 } else { 2 };

        let mut source = LineSource::open(&self.path)?;
        let io_err = |source| Error::Io { path: self.path.clone(), source };

        let mut line_no = 0u64;
        while let Some(line) = source.next_line().map_err(io_err)? {
            line_no += 1;
            let fields = split_by_delimiter(&line, "\t");
            if fields.is_empty() {
                continue;
            }

            if fields.len() != self.num_cols {
                return Err(Error::ColumnCountMismatch {
                    format: FORMAT,
                    path: self.path.clone(),
                    line: line_no,
                    found: fields.len(),
                    expected: self.num_cols,
                    reference: "line 1",
                });
            }

            self.chr_ids.push(fields[CHR_COL].clone());
            self.snp_ids.push(fields[SNP_COL].clone());

            if self.num_cols == 4 {
                let genetic = parse_float(&fields[GEN_COL]).map_err(|_| Error::MalformedField {
                    format: FORMAT,
                    path: self.path.clone(),
                    line: line_no,
                    column: GEN_COL + 1,
                    expected: "floating point",
                    actual: fields[GEN_COL].clone(),
                })?;
                self.genetic_positions.push(genetic);
            }

            let physical = parse_unsigned(&fields[phys_col]).map_err(|_| Error::MalformedField {
                format: FORMAT,
                path: self.path.clone(),
                line: line_no,
                column: phys_col + 1,
                expected: "unsigned integer",
                actual: fields[phys_col].clone(),
            })?;
            self.physical_positions.push(physical);
        }

        Ok(())
    }

    pub fn num_sites(&self) -> usize {
        self.physical_positions.len()
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn chr_ids(&self) -> &[String] {
        &self.chr_ids
    }

    pub fn snp_ids(&self) -> &[String] {
        &self.snp_ids
    }

    /// Genetic positions in centimorgans; empty for 3-column maps.
    pub fn genetic_positions(&self) -> &[f64] {
        &self.genetic_positions
    }

    pub fn physical_positions(&self) -> &[u64] {
        &self.physical_positions
    }
}
