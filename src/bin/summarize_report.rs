//! CLI binary for condensing a verification report into per-file outcomes

use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use vcfqc_rs::{
    utils::validate_file_readable,
    verify::{read_verification_report, summarize_report},
    VcfQcError, VcfQcResult,
};

#[derive(Parser)]
#[command(name = "summarize_report")]
#[command(about = "Summarise a TSV verification report written by verify_vcf --report")]
struct Args {
    /// Path to the verification report
    #[arg(value_name = "REPORT")]
    report: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run() -> VcfQcResult<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    validate_file_readable(&args.report)?;
    let rows = read_verification_report(&args.report)?;
    log::info!("Read {} rows from {:?}", rows.len(), args.report);

    if rows.is_empty() {
        println!("No files found in the report.");
        return Ok(());
    }

    let summary = summarize_report(&rows);

    println!("--- Verification Report Summary ---");
    println!("Total files processed: {}\n", summary.total_files());

    println!("Files that PASSED all filters: {}", summary.passed.len());
    for file in &summary.passed {
        println!("- {}", file);
    }

    println!("\nFiles that FAILED one or more filters: {}", summary.failed.len());
    for (file, reason) in &summary.failed {
        println!("- {} (Most common failure reason: {})", file, reason);
    }

    Ok(())
}

fn handle_error(error: VcfQcError) -> ! {
    match error {
        VcfQcError::FileNotFound(path) => {
            eprintln!("Error: Report not found: {}", path);
        }
        VcfQcError::Csv(ref e) => {
            eprintln!("Error: Could not parse report: {}", e);
            eprintln!("Expected the tab-separated format written by verify_vcf --report.");
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
