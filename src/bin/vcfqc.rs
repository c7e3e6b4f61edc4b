//! Combined CLI binary - filters a directory of VCF files and verifies the output in one step

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use vcfqc_rs::{
    filter::filter_vcf_directory,
    utils::{display_name, Timer},
    validate_thresholds,
    verify::{verify_directory, write_verification_report},
    FilterThresholds,
};

#[derive(Parser)]
#[command(name = "vcfqc")]
#[command(about = "vcfqc - filter VCF files on variant quality and verify the filtered output")]
#[command(long_about = "
vcfqc prepares single-sample VCF files for downstream variant prioritisation.

This tool combines filtering and verification in a single step:
1. Filters every VCF in the input directory on QUAL, GQ, DP and VAF, writing
   <name>_filtered.vcf files to the output directory
2. Re-checks every filtered file against the same thresholds
3. Optionally writes a tab-separated verification report

For separate steps use the individual tools: filter_vcf, verify_vcf,
analyze_vcf, count_dp and summarize_report.
")]
struct Args {
    /// Directory containing the input VCF files
    #[arg(long, value_name = "DIR")]
    input_dir: PathBuf,

    /// Directory for the filtered VCF files
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Write a TSV verification report to this path
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Minimum QUAL (exclusive)
    #[arg(long, default_value_t = FilterThresholds::default().min_quality)]
    min_qual: f64,

    /// Minimum genotype quality (exclusive)
    #[arg(long, default_value_t = FilterThresholds::default().min_gq)]
    min_gq: u32,

    /// Minimum read depth (exclusive)
    #[arg(long, default_value_t = FilterThresholds::default().min_dp)]
    min_dp: u32,

    /// Minimum variant allele frequency (exclusive)
    #[arg(long, default_value_t = FilterThresholds::default().min_vaf)]
    min_vaf: f64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn run() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    if args.input_dir == args.output_dir {
        bail!("Output directory must differ from the input directory");
    }

    let thresholds = FilterThresholds {
        min_quality: args.min_qual,
        min_gq: args.min_gq,
        min_dp: args.min_dp,
        min_vaf: args.min_vaf,
    };
    validate_thresholds(&thresholds).context("Invalid filter thresholds")?;

    log::info!("Starting vcfqc");
    log::info!("Input directory: {:?}", args.input_dir);
    log::info!("Output directory: {:?}", args.output_dir);
    log::info!("Thresholds: {:?}", thresholds);

    // Step 1: filter
    let filtered = {
        let _timer = Timer::new("Filtering VCF files");
        filter_vcf_directory(&args.input_dir, &args.output_dir, &thresholds)
            .with_context(|| format!("Failed to filter VCF files in {:?}", args.input_dir))?
    };

    let skipped = filtered.iter().filter(|f| f.result.is_err()).count();
    let written: usize = filtered
        .iter()
        .filter_map(|f| f.result.as_ref().ok())
        .map(|o| o.written)
        .sum();
    let total: usize = filtered
        .iter()
        .filter_map(|f| f.result.as_ref().ok())
        .map(|o| o.total)
        .sum();

    println!(
        "Filtered {} files: {} of {} variants kept, {} files skipped",
        filtered.len() - skipped,
        written,
        total,
        skipped
    );
    for file in filtered.iter().filter(|f| f.result.is_err()) {
        if let Err(e) = &file.result {
            println!(" - skipped {}: {}", display_name(&file.input), e);
        }
    }

    // Step 2: verify
    let summary = {
        let _timer = Timer::new("Verifying filtered files");
        verify_directory(&args.output_dir, &thresholds)
            .with_context(|| format!("Failed to verify VCF files in {:?}", args.output_dir))?
    };

    println!(
        "Verified {} files: {} passed, {} failed",
        summary.files.len(),
        summary.passed_count(),
        summary.failed_count()
    );
    for file in summary.failed() {
        println!(
            " - {} ({}, most common reason: {})",
            file.file_name(),
            file.status,
            file.most_frequent_reason().unwrap_or("Unknown")
        );
    }

    // Step 3: report
    if let Some(report) = &args.report {
        write_verification_report(&summary, report)
            .with_context(|| format!("Failed to write verification report {:?}", report))?;
        log::info!("Verification report written to: {:?}", report);
    }

    log::info!("vcfqc completed successfully");
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
