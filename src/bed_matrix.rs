// bed_matrix.rs
//
// Genotype matrix built from a PLINK bed/bim/fam triple. The packed 2-bit
// decoding is delegated to the bed-reader crate; this module validates the
// companion files, dimensions the matrix from their row counts, and owns the
// missing-data bookkeeping on the decoded bytes.

use std::path::Path;

use bed_reader::{Bed, ReadOptions};
use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::error::{Error, Result};
use crate::reader::{resolve_with_extensions, LineSource};
use crate::samples::read_fam_file;
use crate::stats::{fold_to_minor, GenotypeSource, MISSING_SENTINEL};
use crate::text::{parse_float, parse_unsigned, split_by_delimiter};

const BIM_FORMAT: &str = ".bim file";
const BIM_FIELDS_PER_ROW: usize = 6;

const BIM_NAME_COL: usize = 1;
const BIM_GEN_COL: usize = 2;
const BIM_PHYS_COL: usize = 3;

/// Per-site metadata parsed from a .bim file.
#[derive(Debug, Default)]
struct BimMetadata {
    site_names: Vec<String>,
    genetic_positions: Vec<f64>,
    physical_positions: Vec<u64>,
}

/// A genotype matrix decoded from PLINK binary data.
///
/// Values are allele-1 dosages in {0, 1, 2} with 3 as the missing sentinel;
/// the matrix is individuals x sites.
#[derive(Debug, Clone)]
pub struct BedMatrix {
    num_individuals: usize,
    site_names: Vec<String>,
    physical_positions: Vec<u64>,
    genetic_positions: Vec<f64>,
    /// individuals x sites, values in {0, 1, 2, MISSING_SENTINEL}.
    data: Array2<u8>,
    /// Missing calls per site, precomputed at construction.
    missing_counts: Array1<u64>,
}

impl BedMatrix {
    /// Build a matrix from explicit .bed, .bim and .fam paths.
    pub fn from_bed_bim_fam(
        bed_file: impl AsRef<Path>,
        bim_file: impl AsRef<Path>,
        fam_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let bed_file = bed_file.as_ref();
        let bim_file = bim_file.as_ref();
        let fam_file = fam_file.as_ref();

        require_regular_file(bed_file, ".bed")?;
        require_regular_file(bim_file, ".bim")?;
        require_regular_file(fam_file, ".fam")?;

        // The companion files dimension the matrix before any bed byte is
        // decoded.
        let fam = read_fam_file(fam_file)?;
        let bim = read_bim_file(bim_file)?;

        let data = decode_bed_file(bed_file, bim_file, fam_file, fam.num_individuals, bim.site_names.len())?;
        let missing_counts = data
            .map(|&call| u64::from(call == MISSING_SENTINEL))
            .sum_axis(Axis(0));

        Ok(Self {
            num_individuals: fam.num_individuals,
            site_names: bim.site_names,
            physical_positions: bim.physical_positions,
            genetic_positions: bim.genetic_positions,
            data,
            missing_counts,
        })
    }

    /// Build a matrix from a shared path prefix (`prefix.bed`, `prefix.bim`,
    /// `prefix.fam`).
    pub fn from_prefix(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        let resolve = |ext: &'static str| {
            resolve_with_extensions(prefix, &[ext])
                .ok_or_else(|| Error::PathNotFound { expected: ext, path: prefix.to_path_buf() })
        };
        Self::from_bed_bim_fam(resolve(".bed")?, resolve(".bim")?, resolve(".fam")?)
    }

    pub fn num_individuals(&self) -> usize {
        self.num_individuals
    }

    pub fn num_sites(&self) -> usize {
        self.site_names.len()
    }

    /// Variant names from the .bim file.
    pub fn site_names(&self) -> &[String] {
        &self.site_names
    }

    pub fn physical_positions(&self) -> &[u64] {
        &self.physical_positions
    }

    /// Genetic positions in centimorgans, from the .bim file.
    pub fn genetic_positions(&self) -> &[f64] {
        &self.genetic_positions
    }

    /// The individuals x sites matrix, with 3 marking missing calls.
    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    /// The matrix as floats with missing calls mapped to NaN.
    pub fn data_as_float(&self) -> Array2<f32> {
        self.data.mapv(|call| {
            if call == MISSING_SENTINEL {
                f32::NAN
            } else {
                f32::from(call)
            }
        })
    }

    /// All calls at one site (a column of the matrix).
    pub fn site(&self, site_id: usize) -> ArrayView1<'_, u8> {
        self.data.column(site_id)
    }

    /// All calls for one individual (a row of the matrix).
    pub fn individual(&self, individual_id: usize) -> ArrayView1<'_, u8> {
        self.data.row(individual_id)
    }

    /// Per-site missing-call counts for the whole matrix.
    pub fn missing_counts(&self) -> &Array1<u64> {
        &self.missing_counts
    }

    pub fn missing_frequencies(&self) -> Array1<f64> {
        let num_individuals = self.num_individuals as f64;
        self.missing_counts.mapv(|missing| missing as f64 / num_individuals)
    }

    /// Per-site observed chromosome counts (the NCHROBS column of a .frq
    /// report).
    pub fn observed_hap_counts(&self) -> Array1<u64> {
        let num_individuals = self.num_individuals as u64;
        self.missing_counts.mapv(|missing| 2 * (num_individuals - missing))
    }

    /// Per-site allele counts for the whole matrix at once; equal to calling
    /// [`GenotypeSource::allele_count`] at every site.
    pub fn allele_counts(&self) -> Array1<u64> {
        let raw = self.data.map(|&call| u64::from(call)).sum_axis(Axis(0));
        raw - self.missing_counts.mapv(|missing| u64::from(MISSING_SENTINEL) * missing)
    }

    pub fn minor_allele_counts(&self) -> Array1<u64> {
        let mut counts = self.allele_counts();
        counts.zip_mut_with(&self.observed_hap_counts(), |count, &observed| {
            *count = fold_to_minor(*count, observed);
        });
        counts
    }

    pub fn derived_allele_counts(&self) -> Array1<u64> {
        self.allele_counts()
    }

    pub fn minor_allele_frequencies(&self) -> Array1<f64> {
        let mut frequencies = self.minor_allele_counts().mapv(|count| count as f64);
        frequencies.zip_mut_with(&self.observed_hap_counts(), |frequency, &observed| {
            *frequency /= observed as f64;
        });
        frequencies
    }

    pub fn derived_allele_frequencies(&self) -> Array1<f64> {
        let mut frequencies = self.derived_allele_counts().mapv(|count| count as f64);
        frequencies.zip_mut_with(&self.observed_hap_counts(), |frequency, &observed| {
            *frequency /= observed as f64;
        });
        frequencies
    }
}

impl GenotypeSource for BedMatrix {
    fn num_individuals(&self) -> usize {
        self.num_individuals
    }

    fn num_sites(&self) -> usize {
        self.site_names.len()
    }

    fn site(&self, site_id: usize) -> ArrayView1<'_, u8> {
        self.data.column(site_id)
    }

    fn site_name(&self, site_id: usize) -> Option<&str> {
        self.site_names.get(site_id).map(String::as_str)
    }

    fn missing_count(&self, site_id: usize) -> u64 {
        self.missing_counts[site_id]
    }

    fn observed_haps(&self, site_id: usize) -> u64 {
        2 * (self.num_individuals as u64 - self.missing_counts[site_id])
    }
}

fn require_regular_file(path: &Path, expected: &'static str) -> Result<()> {
    if !path.is_file() {
        return Err(Error::PathNotFound { expected, path: path.to_path_buf() });
    }
    Ok(())
}

fn read_bim_file(path: &Path) -> Result<BimMetadata> {
    let mut source = LineSource::open(path)?;
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let mut metadata = BimMetadata::default();
    let mut line_no = 0u64;
    while let Some(line) = source.next_line().map_err(io_err)? {
        line_no += 1;
        let fields = split_by_delimiter(&line, "\t");
        if fields.is_empty() {
            continue;
        }

        if fields.len() != BIM_FIELDS_PER_ROW {
            return Err(Error::ColumnCountMismatch {
                format: BIM_FORMAT,
                path: path.to_path_buf(),
                line: line_no,
                found: fields.len(),
                expected: BIM_FIELDS_PER_ROW,
                reference: "line 1",
            });
        }

        let genetic = parse_float(&fields[BIM_GEN_COL]).map_err(|_| Error::MalformedField {
            format: BIM_FORMAT,
            path: path.to_path_buf(),
            line: line_no,
            column: BIM_GEN_COL + 1,
            expected: "floating point",
            actual: fields[BIM_GEN_COL].clone(),
        })?;
        let physical = parse_unsigned(&fields[BIM_PHYS_COL]).map_err(|_| Error::MalformedField {
            format: BIM_FORMAT,
            path: path.to_path_buf(),
            line: line_no,
            column: BIM_PHYS_COL + 1,
            expected: "unsigned integer",
            actual: fields[BIM_PHYS_COL].clone(),
        })?;

        metadata.site_names.push(fields[BIM_NAME_COL].clone());
        metadata.genetic_positions.push(genetic);
        metadata.physical_positions.push(physical);
    }

    Ok(metadata)
}

/// Decode the packed genotypes into an individuals x sites byte matrix.
///
/// Dimensions come from our own bim/fam parse; the decoder is trusted for the
/// byte layout only and fills {0, 1, 2} allele-1 dosages with 3 for missing.
fn decode_bed_file(
    bed_file: &Path,
    bim_file: &Path,
    fam_file: &Path,
    num_individuals: usize,
    num_sites: usize,
) -> Result<Array2<u8>> {
    let decode_err = |source| Error::BedDecode { path: bed_file.to_path_buf(), source };

    let mut bed = Bed::builder(bed_file)
        .fam_path(fam_file)
        .bim_path(bim_file)
        .iid_count(num_individuals)
        .sid_count(num_sites)
        .build()
        .map_err(decode_err)?;

    let decoded = ReadOptions::builder()
        .i8()
        .count_a1()
        .missing_value(MISSING_SENTINEL as i8)
        .read(&mut bed)
        .map_err(decode_err)?;

    Ok(decoded.mapv(|call| call as u8))
}
