//! CLI binary for summarising QUAL, DP, GQ and VAF distributions

use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use vcfqc_rs::{
    stats::{analyze_directory, Metric, SeriesSummary},
    utils::Timer,
    VcfQcError, VcfQcResult,
};

#[derive(Parser)]
#[command(name = "analyze_vcf")]
#[command(about = "Summary statistics of variant quality metrics across a directory of VCF files")]
#[command(long_about = "
Collects QUAL, FORMAT/DP, FORMAT/GQ and the variant allele frequency derived
from FORMAT/AD for the first sample of every record in every VCF of a
directory, then reports min, 25th percentile, median, 75th percentile and max
for each metric. Useful for choosing filter thresholds before running
filter_vcf.
")]
struct Args {
    /// Directory containing the input VCF files
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn format_summary(metric: Metric, summary: Option<&SeriesSummary>) -> String {
    match summary {
        None => format!("No data collected for {}.", metric),
        Some(s) => format!(
            "{} Statistics (across all files, n={}):\n  Min: {:.2}\n  25th Percentile: {:.2}\n  Median (50th Percentile): {:.2}\n  75th Percentile: {:.2}\n  Max: {:.2}",
            metric, s.count, s.min, s.p25, s.median, s.p75, s.max
        ),
    }
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

    let _timer = Timer::new("Collecting metrics");
    let collector = analyze_directory(&args.input_dir)?;

    println!("--- Statistical Summary ---");
    for (metric, summary) in collector.summaries() {
        println!("\n{}", format_summary(metric, summary.as_ref()));
    }

    Ok(())
}

fn handle_error(error: VcfQcError) -> ! {
    match error {
        VcfQcError::FileNotFound(path) => {
            eprintln!("Error: Directory not found at {}", path);
        }
        VcfQcError::Io(ref e) => {
            eprintln!("Error: I/O error: {}", e);
        }
        e => eprintln!("Error: {}", e),
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

    #[test]
    fn test_format_summary() {
        assert_eq!(
            format_summary(Metric::GenotypeQuality, None),
            "No data collected for Genotype Quality (GQ)."
        );

        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let summary = SeriesSummary::from_values(&values);
        let text = format_summary(Metric::Depth, summary.as_ref());
        assert!(text.starts_with("Depth (DP) Statistics"));
        assert!(text.contains("Median (50th Percentile): 5.50"));
        assert!(text.contains("Max: 10.00"));
    }
}
