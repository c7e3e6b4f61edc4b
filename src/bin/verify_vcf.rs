//! CLI binary for verifying that filtered VCF files only contain passing variants

use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use vcfqc_rs::{
    utils::Timer,
    validate_thresholds,
    verify::{verify_directory, write_verification_report, VerificationSummary},
    FilterThresholds, VcfQcError, VcfQcResult,
};

#[derive(Parser)]
#[command(name = "verify_vcf")]
#[command(about = "Re-check every variant of filtered VCF files against the quality filters")]
#[command(long_about = "
Re-applies the QUAL, GQ, DP and VAF filters to every record of every VCF in a
directory. A file passes verification only if none of its records fail.

For each failing file the most frequent failure reason is reported using the
reason codes QUAL, NoSample, GQ, NoGQ, DP, NoDP, VAF, AD_Missing, NoAD,
ZeroReads, AD_Format_Error and 'Error: <message>'.

Files that cannot be parsed are reported as failed and do not stop the run.
Use --report to also write a tab-separated report with one row per file.
")]
struct Args {
    /// Directory containing the VCF files to verify
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

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

fn print_summary(summary: &VerificationSummary) {
    println!("{}", "=".repeat(50));
    println!("Verification Summary");
    println!("{}", "=".repeat(50));

    if summary.passed_count() > 0 {
        println!("\nFiles that passed verification ({}):", summary.passed_count());
        for file in summary.passed() {
            println!(" - {} ({} variants)", file.file_name(), file.total_variants);
        }
    } else {
        println!("\nNo files passed the verification.");
    }

    if summary.failed_count() > 0 {
        println!("\nFiles that failed verification ({}):", summary.failed_count());
        for file in summary.failed() {
            match (file.status.detail(), file.most_frequent_reason()) {
                (Some(detail), _) => {
                    println!(" - {} ({}: {})", file.file_name(), file.status, detail)
                }
                (None, Some(reason)) => println!(
                    " - {} ({} of {} variants failed, most common reason: {})",
                    file.file_name(),
                    file.failed_variants,
                    file.total_variants,
                    reason
                ),
                (None, None) => println!(" - {}", file.file_name()),
            }
        }
    } else {
        println!("\nAll files passed the verification.");
    }

    println!("{}", "=".repeat(50));
}

fn run() -> VcfQcResult<()> {
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

    let thresholds = FilterThresholds {
        min_quality: args.min_qual,
        min_gq: args.min_gq,
        min_dp: args.min_dp,
        min_vaf: args.min_vaf,
    };
    validate_thresholds(&thresholds)?;

    log::info!("Verifying VCF files in {:?}", args.input_dir);

    let _timer = Timer::new("Verifying VCF files");
    let summary = verify_directory(&args.input_dir, &thresholds)?;
    print_summary(&summary);

    if let Some(report) = &args.report {
        if let Some(parent) = report.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_verification_report(&summary, report)?;
        log::info!("Verification report written to: {:?}", report);
    }

    Ok(())
}

/// Handle application errors and provide user-friendly messages
fn handle_error(error: VcfQcError) -> ! {
    match error {
        VcfQcError::FileNotFound(path) => {
            eprintln!("Error: Directory not found at {}", path);
        }
        VcfQcError::InvalidConfig(msg) => {
            eprintln!("Error: Invalid configuration: {}", msg);
            eprintln!("Please check your filter thresholds.");
        }
        VcfQcError::Csv(ref e) => {
            eprintln!("Error: Could not write verification report: {}", e);
        }
        VcfQcError::Io(ref e) => {
            eprintln!("Error: I/O error: {}", e);
            eprintln!("Please check file permissions and disk space.");
        }
        e @ VcfQcError::Parse { .. } => {
            eprintln!("Error: {}", e);
        }
    }
    std::process::exit(1);
}

fn main() {
    if let Err(e) = run() {
        handle_error(e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args() {
        Args::command().debug_assert();

        let args = Args::parse_from(["verify_vcf", "filtered", "--report", "report.tsv", "--min-dp", "20"]);
        assert_eq!(args.input_dir, PathBuf::from("filtered"));
        assert_eq!(args.report, Some(PathBuf::from("report.tsv")));
        assert_eq!(args.min_dp, 20);
        assert_eq!(args.min_gq, 20);
    }
}
