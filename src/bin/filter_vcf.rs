//! CLI binary for quality filtering a directory of VCF files

use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use vcfqc_rs::{
    filter::filter_vcf_directory,
    utils::{display_name, Timer},
    validate_thresholds, FilterThresholds, VcfQcError, VcfQcResult,
};

#[derive(Parser)]
#[command(name = "filter_vcf")]
#[command(about = "Apply QUAL, GQ, DP and VAF filters to every VCF in a directory")]
#[command(long_about = "
Reads every .vcf and .vcf.gz file in the input directory and writes the
records that pass all filters to <name>_filtered.vcf in the output directory.

A record passes when, for the first sample:
- QUAL is greater than --min-qual
- FORMAT/GQ is greater than --min-gq
- FORMAT/DP is greater than --min-dp
- the VAF computed from FORMAT/AD (alt / (ref + alt)) is greater than --min-vaf

Header lines and passing records are copied unchanged. Files that cannot be
parsed are skipped and the remaining files are still processed.
")]
struct Args {
    /// Directory containing the input VCF files
    #[arg(long, value_name = "DIR")]
    input_dir: PathBuf,

    /// Directory for the filtered VCF files (created if missing)
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

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

    log::info!("Input directory: {:?}", args.input_dir);
    log::info!("Output directory: {:?}", args.output_dir);
    log::info!("Thresholds: {:?}", thresholds);

    let _timer = Timer::new("Filtering VCF files");
    let results = filter_vcf_directory(&args.input_dir, &args.output_dir, &thresholds)?;

    if results.is_empty() {
        log::warn!("No VCF files found in {:?}", args.input_dir);
    }

    for file in &results {
        match &file.result {
            Ok(outcome) => println!(
                "{}: {} of {} variants passed -> {}",
                display_name(&file.input),
                outcome.written,
                outcome.total,
                file.output.display()
            ),
            Err(e) => println!("{}: skipped ({})", display_name(&file.input), e),
        }
    }

    Ok(())
}

/// Handle application errors and provide user-friendly messages
fn handle_error(error: VcfQcError) -> ! {
    match error {
        VcfQcError::FileNotFound(path) => {
            eprintln!("Error: Input directory not found: {}", path);
        }
        VcfQcError::InvalidConfig(msg) => {
            eprintln!("Error: Invalid configuration: {}", msg);
            eprintln!("Please check your filter thresholds.");
        }
        VcfQcError::Io(ref e) => {
            eprintln!("Error: I/O error: {}", e);
            eprintln!("Please check directory permissions and disk space.");
        }
        e @ (VcfQcError::Parse { .. } | VcfQcError::Csv(_)) => {
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
    fn test_args_defaults() {
        Args::command().debug_assert();

        let args = Args::parse_from(["filter_vcf", "--input-dir", "in", "--output-dir", "out"]);
        assert_eq!(args.min_qual, 30.0);
        assert_eq!(args.min_gq, 20);
        assert_eq!(args.min_dp, 12);
        assert_eq!(args.min_vaf, 0.45);
    }
}
