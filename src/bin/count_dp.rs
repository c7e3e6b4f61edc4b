//! CLI binary for estimating how many variants a read-depth cutoff removes

use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use vcfqc_rs::{
    depth::analyze_dp_cutoff_directory,
    utils::display_name,
    FilterThresholds, VcfQcError, VcfQcResult,
};

#[derive(Parser)]
#[command(name = "count_dp")]
#[command(about = "Count variants per VCF file that a DP cutoff would omit")]
struct Args {
    /// Directory containing the input VCF files
    #[arg(value_name = "DIR")]
    input_dir: PathBuf,

    /// Variants with FORMAT/DP at or below this value are counted as omitted
    #[arg(long, default_value_t = FilterThresholds::default().min_dp)]
    dp_cutoff: u32,

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

    let results = analyze_dp_cutoff_directory(&args.input_dir, args.dp_cutoff)?;

    println!("--- DP Cutoff Analysis ---\n");
    println!("Using a DP cutoff of > {} to count omitted variants.\n", args.dp_cutoff);

    for (path, count) in &results {
        println!("File: {}", display_name(path));
        println!("  Total variants: {}", count.total);
        println!("  Variants with DP <= {}: {}", args.dp_cutoff, count.omitted);
        println!("  Percentage omitted: {:.2}%\n", count.percent_omitted());
    }

    Ok(())
}

fn handle_error(error: VcfQcError) -> ! {
    match error {
        VcfQcError::FileNotFound(path) => {
            eprintln!("Error: Directory not found at {}", path);
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
