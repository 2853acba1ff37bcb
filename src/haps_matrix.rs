// haps_matrix.rs
//
// Genotype matrix built from an Oxford-style haps/samples pair plus a map
// file. The matrix is sites x haplotypes with values in {0, 1}; there is no
// missing data in this format.

use std::path::Path;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::genetic_map::MonotonicityPolicy;
use crate::plink_map::PlinkMap;
use crate::reader::{resolve_with_extensions, LineSource};
use crate::samples::count_individuals_in_samples_file;
use crate::stats::{fold_to_minor, GenotypeSource};
use crate::text::split_by_delimiter;

/// The first 5 fields of a haps row are site metadata (chromosome, id,
/// position, alleles); haplotype calls start at field index 5.
const HAPS_METADATA_FIELDS: usize = 5;

/// A fully validated haplotype matrix.
#[derive(Debug, Clone)]
pub struct HapsMatrix {
    num_individuals: usize,
    physical_positions: Vec<u64>,
    genetic_positions: Vec<f64>,
    /// sites x haplotypes, values in {0, 1}.
    data: Array2<u8>,
}

impl HapsMatrix {
    /// Build a matrix from explicit .hap[s], .sample[s] and .map paths.
    pub fn from_haps_and_samples(
        haps_file: impl AsRef<Path>,
        samples_file: impl AsRef<Path>,
        map_file: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::from_haps_and_samples_with_policy(
            haps_file,
            samples_file,
            map_file,
            MonotonicityPolicy::default(),
        )
    }

    pub fn from_haps_and_samples_with_policy(
        haps_file: impl AsRef<Path>,
        samples_file: impl AsRef<Path>,
        map_file: impl AsRef<Path>,
        policy: MonotonicityPolicy,
    ) -> Result<Self> {
        let haps_file = haps_file.as_ref();
        let samples_file = samples_file.as_ref();
        let map_file = map_file.as_ref();

        require_regular_file(haps_file, ".hap[s][.gz]")?;
        require_regular_file(samples_file, ".sample[s]")?;
        require_regular_file(map_file, ".map")?;

        // Strict ordering: the samples and map files size the matrix before
        // the haps file is touched.
        let num_individuals = count_individuals_in_samples_file(samples_file)?;
        let map = PlinkMap::load_with_policy(map_file, policy)?;

        let data = read_haps_file(haps_file, map.num_sites(), num_individuals)?;

        Ok(Self {
            num_individuals,
            physical_positions: map.physical_positions().to_vec(),
            genetic_positions: map.genetic_positions().to_vec(),
            data,
        })
    }

    /// Build a matrix from a shared path prefix, resolving the usual
    /// extension spellings (`.hap`, `.haps`, gzipped or not; `.sample` or
    /// `.samples`).
    pub fn from_prefix(prefix: impl AsRef<Path>) -> Result<Self> {
        let prefix = prefix.as_ref();
        let haps = resolve_with_extensions(prefix, &[".hap", ".haps", ".hap.gz", ".haps.gz"])
            .ok_or_else(|| Error::PathNotFound {
                expected: ".hap[s][.gz]",
                path: prefix.to_path_buf(),
            })?;
        let samples = resolve_with_extensions(prefix, &[".sample", ".samples"]).ok_or_else(|| {
            Error::PathNotFound { expected: ".sample[s]", path: prefix.to_path_buf() }
        })?;
        let map = resolve_with_extensions(prefix, &[".map"]).ok_or_else(|| Error::PathNotFound {
            expected: ".map",
            path: prefix.to_path_buf(),
        })?;
        Self::from_haps_and_samples(haps, samples, map)
    }

    pub fn num_individuals(&self) -> usize {
        self.num_individuals
    }

    pub fn num_haps(&self) -> usize {
        2 * self.num_individuals
    }

    pub fn num_sites(&self) -> usize {
        self.data.nrows()
    }

    pub fn physical_positions(&self) -> &[u64] {
        &self.physical_positions
    }

    /// Genetic positions in centimorgans; empty when the map had no genetic
    /// position column.
    pub fn genetic_positions(&self) -> &[f64] {
        &self.genetic_positions
    }

    /// The sites x haplotypes matrix of {0, 1} calls.
    pub fn data(&self) -> &Array2<u8> {
        &self.data
    }

    pub fn data_as_float(&self) -> Array2<f32> {
        self.data.mapv(f32::from)
    }

    /// All haplotype calls at one site (a row of the matrix).
    pub fn site(&self, site_id: usize) -> ArrayView1<'_, u8> {
        self.data.row(site_id)
    }

    /// One haplotype across all sites (a column of the matrix).
    pub fn hap(&self, hap_id: usize) -> ArrayView1<'_, u8> {
        self.data.column(hap_id)
    }

    /// The two haplotype columns belonging to one individual.
    pub fn individual(&self, individual_id: usize) -> ArrayView2<'_, u8> {
        let first_hap = 2 * individual_id;
        self.data.slice(s![.., first_hap..first_hap + 2])
    }

    /// Per-site allele counts for the whole matrix at once; equal to calling
    /// [`GenotypeSource::allele_count`] at every site.
    pub fn allele_counts(&self) -> Array1<u64> {
        self.data.map(|&call| u64::from(call)).sum_axis(Axis(1))
    }

    pub fn minor_allele_counts(&self) -> Array1<u64> {
        let num_haps = self.num_haps() as u64;
        self.allele_counts().mapv(|count| fold_to_minor(count, num_haps))
    }

    pub fn derived_allele_counts(&self) -> Array1<u64> {
        self.allele_counts()
    }

    pub fn minor_allele_frequencies(&self) -> Array1<f64> {
        let num_haps = self.num_haps() as f64;
        self.minor_allele_counts().mapv(|count| count as f64 / num_haps)
    }

    pub fn derived_allele_frequencies(&self) -> Array1<f64> {
        let num_haps = self.num_haps() as f64;
        self.derived_allele_counts().mapv(|count| count as f64 / num_haps)
    }
}

impl GenotypeSource for HapsMatrix {
    fn num_individuals(&self) -> usize {
        self.num_individuals
    }

    fn num_sites(&self) -> usize {
        self.data.nrows()
    }

    fn site(&self, site_id: usize) -> ArrayView1<'_, u8> {
        self.data.row(site_id)
    }

    fn missing_count(&self, _site_id: usize) -> u64 {
        0
    }

    fn observed_haps(&self, _site_id: usize) -> u64 {
        self.num_haps() as u64
    }
}

fn require_regular_file(path: &Path, expected: &'static str) -> Result<()> {
    if !path.is_file() {
        return Err(Error::PathNotFound { expected, path: path.to_path_buf() });
    }
    Ok(())
}

/// Validate the haps file shape in full, then allocate and fill the matrix.
///
/// Nothing is allocated until every row has been checked, so a malformed file
/// can never leave a partially populated matrix behind.
fn read_haps_file(path: &Path, num_sites: usize, num_individuals: usize) -> Result<Array2<u8>> {
    validate_haps_file(path, num_sites, num_individuals)?;

    let num_haps = 2 * num_individuals;
    let mut data = Array2::<u8>::zeros((num_sites, num_haps));

    let mut source = LineSource::open(path)?;
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };
    for row_id in 0..num_sites {
        let line = source.next_line().map_err(io_err)?.unwrap_or_default();
        let fields = split_by_delimiter(&line, " ");
        for col_id in 0..num_haps {
            data[[row_id, col_id]] = u8::from(fields[HAPS_METADATA_FIELDS + col_id] == "1");
        }
    }

    Ok(data)
}

fn validate_haps_file(path: &Path, num_sites: usize, num_individuals: usize) -> Result<()> {
    let expected_fields = HAPS_METADATA_FIELDS + 2 * num_individuals;

    let mut source = LineSource::open(path)?;
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let mut lines_in_file = 0u64;
    for site_id in 0..num_sites {
        let line = source.next_line().map_err(io_err)?.unwrap_or_default();
        let fields = split_by_delimiter(&line, " ");

        if fields.len() != expected_fields {
            return Err(Error::HapsRowLength {
                path: path.to_path_buf(),
                line: site_id as u64 + 1,
                individuals: num_individuals,
                expected: expected_fields,
                found: fields.len(),
            });
        }
        for (col_id, field) in fields.iter().enumerate().skip(HAPS_METADATA_FIELDS) {
            if field != "0" && field != "1" {
                return Err(Error::NonBooleanField {
                    path: path.to_path_buf(),
                    line: site_id as u64 + 1,
                    column: col_id + 1,
                    actual: field.clone(),
                });
            }
        }
        lines_in_file += 1;
    }

    // Anything left beyond the expected rows, other than trailing blank
    // lines, means the file disagrees with the map.
    while let Some(line) = source.next_line().map_err(io_err)? {
        if !line.is_empty() {
            lines_in_file += 1;
        }
    }
    if lines_in_file != num_sites as u64 {
        return Err(Error::RowCountMismatch {
            path: path.to_path_buf(),
            expected: num_sites as u64,
            found: lines_in_file,
        });
    }

    Ok(())
}
