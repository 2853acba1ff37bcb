// main.rs

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use genomatrix::{
    write_frequency_report, BedMatrix, GenotypeSource, HapsMatrix, MonotonicityPolicy,
};

fn main() -> Result<()> {
    let cli_args = cli::CliArgs::parse();

    // Initialize logger
    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    let policy = if cli_args.lenient_maps {
        MonotonicityPolicy::Warn
    } else {
        MonotonicityPolicy::Fatal
    };

    let source: Box<dyn GenotypeSource> = match &cli_args.input {
        cli::InputFormat::Haps { haps, samples, map } => {
            info!(
                "Loading haplotype data: haps={}, samples={}, map={}",
                haps.display(),
                samples.display(),
                map.display()
            );
            let matrix = HapsMatrix::from_haps_and_samples_with_policy(haps, samples, map, policy)
                .with_context(|| format!("Failed to load haps data from {}", haps.display()))?;
            Box::new(matrix)
        }
        cli::InputFormat::Bed { bed, bim, fam } => {
            info!(
                "Loading PLINK binary data: bed={}, bim={}, fam={}",
                bed.display(),
                bim.display(),
                fam.display()
            );
            let matrix = BedMatrix::from_bed_bim_fam(bed, bim, fam)
                .with_context(|| format!("Failed to load bed data from {}", bed.display()))?;
            Box::new(matrix)
        }
    };

    info!(
        "Loaded genotype matrix: {} individuals, {} sites.",
        source.num_individuals(),
        source.num_sites()
    );

    let num_sites = source.num_sites();
    if num_sites > 0 {
        let total_missing: u64 = (0..num_sites).map(|site| source.missing_count(site)).sum();
        let mean_maf: f64 = (0..num_sites)
            .map(|site| source.minor_allele_frequency(site))
            .filter(|frequency| frequency.is_finite())
            .sum::<f64>()
            / num_sites as f64;
        info!(
            "Summary: {} missing calls in total, mean minor allele frequency {:.4}.",
            total_missing, mean_maf
        );
    }

    if let Some(frq_path) = &cli_args.out_frq {
        info!("Writing frequency report to {}...", frq_path.display());
        write_frequency_report(source.as_ref(), frq_path)
            .with_context(|| format!("Failed to write frequency report {}", frq_path.display()))?;
    }

    info!("genomatrix finished successfully.");
    Ok(())
}

mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Load population-genetics genotype data into a validated matrix and report per-site statistics.", long_about = None, propagate_version = true)]
    pub(crate) struct CliArgs {
        #[command(subcommand)]
        pub(crate) input: InputFormat,

        /// Write a .frq-style frequency report to this path.
        #[arg(long = "out-frq", global = true)]
        pub(crate) out_frq: Option<PathBuf>,

        /// Downgrade map monotonicity violations from errors to warnings.
        #[arg(long, global = true)]
        pub(crate) lenient_maps: bool,

        #[arg(long, default_value = "Info", global = true)]
        pub(crate) log_level: String,
    }

    #[derive(Subcommand, Debug)]
    pub(crate) enum InputFormat {
        /// Oxford-style haplotype data: .hap[s][.gz] + .sample[s] + .map.
        Haps {
            #[arg(long)]
            haps: PathBuf,

            #[arg(long)]
            samples: PathBuf,

            #[arg(long)]
            map: PathBuf,
        },
        /// PLINK binary data: .bed + .bim + .fam.
        Bed {
            #[arg(long)]
            bed: PathBuf,

            #[arg(long)]
            bim: PathBuf,

            #[arg(long)]
            fam: PathBuf,
        },
    }
}
