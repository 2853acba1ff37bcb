// stats.rs
//
// Per-site statistics over a materialized genotype matrix, shared by the
// haps-backed and bed-backed variants through one capability trait so the
// counting formulas exist exactly once.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::ArrayView1;

use crate::error::{Error, Result};

/// The reserved byte value marking unobserved genotype calls.
pub const MISSING_SENTINEL: u8 = 3;

/// Fold a raw allele count above the 50% threshold to its complement.
///
/// `observed` is the number of observed (non-missing) haplotypes at the site.
pub(crate) fn fold_to_minor(count: u64, observed: u64) -> u64 {
    if 2 * count > observed {
        observed - count
    } else {
        count
    }
}

/// A materialized genotype matrix with per-site metadata.
///
/// Implementations expose one site as a contiguous view regardless of the
/// underlying orientation (sites-as-rows for haps data, sites-as-columns for
/// bed data) and declare their own frequency denominator through
/// [`observed_haps`](GenotypeSource::observed_haps): total haplotypes for
/// haplotype matrices, twice the non-missing individual count for
/// PLINK-derived matrices.
pub trait GenotypeSource {
    fn num_individuals(&self) -> usize;

    fn num_sites(&self) -> usize;

    fn num_haps(&self) -> usize {
        2 * self.num_individuals()
    }

    /// All calls at one site, in individual/haplotype order.
    fn site(&self, site_id: usize) -> ArrayView1<'_, u8>;

    /// The variant name for a site, when the source format carries one.
    fn site_name(&self, _site_id: usize) -> Option<&str> {
        None
    }

    /// Count of missing calls at a site.
    fn missing_count(&self, site_id: usize) -> u64;

    /// Number of observed chromosomes at a site: the frequency denominator.
    fn observed_haps(&self, site_id: usize) -> u64;

    /// Raw count of allele 1 at a site. The missing sentinel contributes
    /// spuriously to a naive sum and is subtracted back out.
    fn allele_count(&self, site_id: usize) -> u64 {
        let raw: u64 = self.site(site_id).iter().map(|&call| u64::from(call)).sum();
        raw - u64::from(MISSING_SENTINEL) * self.missing_count(site_id)
    }

    /// The allele count folded to the less frequent allele.
    fn minor_allele_count(&self, site_id: usize) -> u64 {
        fold_to_minor(self.allele_count(site_id), self.observed_haps(site_id))
    }

    /// The allele count taken as-is, assuming allele 1 is derived.
    fn derived_allele_count(&self, site_id: usize) -> u64 {
        self.allele_count(site_id)
    }

    fn minor_allele_frequency(&self, site_id: usize) -> f64 {
        self.minor_allele_count(site_id) as f64 / self.observed_haps(site_id) as f64
    }

    fn derived_allele_frequency(&self, site_id: usize) -> f64 {
        self.derived_allele_count(site_id) as f64 / self.observed_haps(site_id) as f64
    }

    fn missing_frequency(&self, site_id: usize) -> f64 {
        self.missing_count(site_id) as f64 / self.num_individuals() as f64
    }
}

/// Write a .frq-style fixed-width frequency report for every site.
///
/// Sources without per-site names (haps-backed matrices) report `.` in the
/// SNP column.
pub fn write_frequency_report<S: GenotypeSource + ?Sized>(source: &S, path: &Path) -> Result<()> {
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, " CHR           SNP   A1   A2          MAF  NCHROBS").map_err(io_err)?;
    for site_id in 0..source.num_sites() {
        writeln!(
            writer,
            "{:>4}{:>14}{:>5}{:>5}{:>13}{:>9}",
            1,
            source.site_name(site_id).unwrap_or("."),
            1,
            2,
            source.minor_allele_frequency(site_id),
            source.observed_haps(site_id)
        )
        .map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::Array2;

    /// Minimal in-memory source for exercising the provided methods.
    struct FixtureSource {
        /// individuals x sites, sentinel 3 for missing.
        data: Array2<u8>,
        missing_counts: Vec<u64>,
    }

    impl FixtureSource {
        fn new(data: Array2<u8>) -> Self {
            let missing_counts = data
                .columns()
                .into_iter()
                .map(|col| col.iter().filter(|&&call| call == MISSING_SENTINEL).count() as u64)
                .collect();
            Self { data, missing_counts }
        }
    }

    impl GenotypeSource for FixtureSource {
        fn num_individuals(&self) -> usize {
            self.data.nrows()
        }

        fn num_sites(&self) -> usize {
            self.data.ncols()
        }

        fn site(&self, site_id: usize) -> ArrayView1<'_, u8> {
            self.data.column(site_id)
        }

        fn site_name(&self, site_id: usize) -> Option<&str> {
            ["SNP_1", "SNP_2", "SNP_3"].get(site_id).copied()
        }

        fn missing_count(&self, site_id: usize) -> u64 {
            self.missing_counts[site_id]
        }

        fn observed_haps(&self, site_id: usize) -> u64 {
            2 * (self.num_individuals() as u64 - self.missing_count(site_id))
        }
    }

    fn fixture() -> FixtureSource {
        // 4 individuals x 3 sites; site 1 has one missing call, site 2 is
        // heavily skewed towards allele 1.
        FixtureSource::new(
            Array2::from_shape_vec(
                (4, 3),
                vec![
                    0, 1, 2, //
                    1, 3, 2, //
                    0, 0, 2, //
                    2, 1, 1, //
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn fold_to_minor_cases() {
        assert_eq!(fold_to_minor(0, 8), 0);
        assert_eq!(fold_to_minor(4, 8), 4);
        assert_eq!(fold_to_minor(5, 8), 3);
        assert_eq!(fold_to_minor(8, 8), 0);
    }

    #[test]
    fn sentinel_is_subtracted_from_the_raw_sum() {
        let source = fixture();

        assert_eq!(source.missing_count(0), 0);
        assert_eq!(source.allele_count(0), 3);

        // Site 1 sums to 5 but one call is the sentinel.
        assert_eq!(source.missing_count(1), 1);
        assert_eq!(source.allele_count(1), 2);
        assert_eq!(source.observed_haps(1), 6);
    }

    #[test]
    fn folded_and_unfolded_counts() {
        let source = fixture();

        assert_eq!(source.derived_allele_count(2), 7);
        assert_eq!(source.minor_allele_count(2), 1);
        assert_eq!(source.minor_allele_frequency(2), 1.0 / 8.0);
        assert_eq!(source.derived_allele_frequency(2), 7.0 / 8.0);
        assert_eq!(source.missing_frequency(1), 0.25);
    }

    #[test]
    fn frequency_report_layout() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.frq");
        let source = fixture();

        write_frequency_report(&source, &path).unwrap();
        let report = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines.len(), 1 + source.num_sites());
        assert_eq!(lines[0], " CHR           SNP   A1   A2          MAF  NCHROBS");
        assert_eq!(lines[1], format!("{:>4}{:>14}{:>5}{:>5}{:>13}{:>9}", 1, "SNP_1", 1, 2, 0.375, 8));
        assert!(lines[2].contains("SNP_2"));
        assert!(lines[2].ends_with("        6"));
    }
}
