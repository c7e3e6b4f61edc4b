fn main() {
    println!("vcfqc-rs - Variant Quality Control Tools");
    println!();
    println!("RECOMMENDED: Use the combined tool for most workflows:");
    println!("  vcfqc            - Filter a VCF directory and verify the output (one step)");
    println!();
    println!("Individual tools:");
    println!("  filter_vcf       - Apply QUAL/GQ/DP/VAF filters to a VCF directory");
    println!("  verify_vcf       - Re-check filtered VCFs and report failure reasons");
    println!("  analyze_vcf      - Min/quartiles/max of QUAL, DP, GQ and VAF");
    println!("  count_dp         - Count variants a DP cutoff would omit");
    println!("  summarize_report - Condense a verify_vcf TSV report");
    println!();
    println!("For help with each tool:");
    println!("  cargo run -- --help");
    println!("  cargo run --bin verify_vcf -- --help");
    println!();
    println!("Quick start example:");
    println!("  cargo run -- --input-dir vcf_files --output-dir filtered_vcf_dir --report verification.tsv");
}
