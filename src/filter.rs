//! Variant quality filtering

use crate::{
    utils::{ensure_dir, filtered_output_name, list_vcf_files, validate_dir_exists},
    vcf::{Field, VariantRecord, VcfReader, VcfWriter},
    FilterThresholds, VcfQcError, VcfQcResult,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a record was rejected. `Display` gives the reason code used in
/// verification reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterReason {
    Qual,
    NoSample,
    Gq,
    NoGq,
    Dp,
    NoDp,
    Vaf,
    AdMissing,
    NoAd,
    ZeroReads,
    AdFormatError,
    Error(String),
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::Qual => write!(f, "QUAL"),
            FilterReason::NoSample => write!(f, "NoSample"),
            FilterReason::Gq => write!(f, "GQ"),
            FilterReason::NoGq => write!(f, "NoGQ"),
            FilterReason::Dp => write!(f, "DP"),
            FilterReason::NoDp => write!(f, "NoDP"),
            FilterReason::Vaf => write!(f, "VAF"),
            FilterReason::AdMissing => write!(f, "AD_Missing"),
            FilterReason::NoAd => write!(f, "NoAD"),
            FilterReason::ZeroReads => write!(f, "ZeroReads"),
            FilterReason::AdFormatError => write!(f, "AD_Format_Error"),
            FilterReason::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// Outcome of the filter predicate for one record
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail(FilterReason),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn reason(&self) -> String {
        match self {
            Verdict::Pass => "Passed".to_string(),
            Verdict::Fail(reason) => reason.to_string(),
        }
    }
}

/// Apply the filter checks in order QUAL, sample, GQ, DP, VAF.
/// The first failing check decides the reason.
pub fn passes(record: &VariantRecord, thresholds: &FilterThresholds) -> Verdict {
    match check(record, thresholds) {
        Ok(()) => Verdict::Pass,
        Err(reason) => Verdict::Fail(reason),
    }
}

fn check(record: &VariantRecord, thresholds: &FilterThresholds) -> Result<(), FilterReason> {
    match &record.quality {
        Field::Present(qual) if *qual > thresholds.min_quality => {}
        Field::Malformed(raw) => {
            return Err(FilterReason::Error(format!("could not parse QUAL value '{}'", raw)))
        }
        _ => return Err(FilterReason::Qual),
    }

    let genotype = record.first_genotype().ok_or(FilterReason::NoSample)?;

    check_threshold(
        &genotype.genotype_quality,
        thresholds.min_gq,
        "GQ",
        FilterReason::Gq,
        FilterReason::NoGq,
    )?;
    check_threshold(
        &genotype.depth,
        thresholds.min_dp,
        "DP",
        FilterReason::Dp,
        FilterReason::NoDp,
    )?;

    let (ref_reads, alt_reads) = match &genotype.allele_depths {
        Field::Absent => return Err(FilterReason::NoAd),
        Field::Missing => return Err(FilterReason::AdMissing),
        Field::Malformed(_) => return Err(FilterReason::AdFormatError),
        Field::Present(depths) if depths.len() < 2 => return Err(FilterReason::AdMissing),
        Field::Present(depths) => (depths[0] as u64, depths[1] as u64),
    };

    let total_reads = ref_reads + alt_reads;
    if total_reads == 0 {
        return Err(FilterReason::ZeroReads);
    }
    if alt_reads as f64 / total_reads as f64 <= thresholds.min_vaf {
        return Err(FilterReason::Vaf);
    }

    Ok(())
}

fn check_threshold(
    field: &Field<u32>,
    min: u32,
    name: &str,
    below: FilterReason,
    absent: FilterReason,
) -> Result<(), FilterReason> {
    match field {
        Field::Present(value) if *value > min => Ok(()),
        Field::Present(_) | Field::Missing => Err(below),
        Field::Absent => Err(absent),
        Field::Malformed(raw) => Err(FilterReason::Error(format!(
            "could not parse {} value '{}'",
            name, raw
        ))),
    }
}

/// Variant allele frequency from the first two AD entries, if computable
pub fn variant_allele_frequency(record: &VariantRecord) -> Option<f64> {
    let depths = record.first_genotype()?.allele_depths.present()?;
    if depths.len() < 2 {
        return None;
    }

    let total = depths[0] as u64 + depths[1] as u64;
    if total == 0 {
        None
    } else {
        Some(depths[1] as f64 / total as f64)
    }
}

/// Counts for one filtered file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub total: usize,
    pub written: usize,
}

/// Filter a single VCF, writing the header and every passing record
pub fn filter_vcf_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    thresholds: &FilterThresholds,
) -> VcfQcResult<FilterOutcome> {
    let mut reader = VcfReader::from_path(&input)?;
    let mut writer = VcfWriter::create(&output, reader.header_lines())?;
    log::debug!(
        "Filtering {:?} (samples: {})",
        input.as_ref(),
        reader.sample_names().join(", ")
    );
    let mut outcome = FilterOutcome::default();

    for record in reader.records() {
        let record = record?;
        outcome.total += 1;

        match passes(&record, thresholds) {
            Verdict::Pass => {
                writer.write_record(&record)?;
                outcome.written += 1;

                let dp = record.first_genotype().and_then(|g| g.depth.present().copied());
                match (variant_allele_frequency(&record), dp) {
                    (Some(vaf), Some(dp)) => log::info!(
                        "Variant: {}:{} | VAF: {:.2} | DP: {}",
                        record.chrom,
                        record.pos,
                        vaf,
                        dp
                    ),
                    _ => log::info!("Variant: {}:{} passed filters", record.chrom, record.pos),
                }
            }
            Verdict::Fail(reason) => {
                log::debug!("Variant {}:{} filtered out: {}", record.chrom, record.pos, reason);
            }
        }
    }

    writer.finish()?;
    Ok(outcome)
}

/// Per-file result of a directory filtering run
#[derive(Debug)]
pub struct FilteredFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: VcfQcResult<FilterOutcome>,
}

/// Filter every VCF in `input_dir` into `output_dir` as `<stem>_filtered.vcf`.
/// Files that fail to parse are skipped and their partial output removed.
pub fn filter_vcf_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    thresholds: &FilterThresholds,
) -> VcfQcResult<Vec<FilteredFile>> {
    validate_dir_exists(&input_dir)?;
    ensure_dir(&output_dir)?;

    let mut results = Vec::new();
    for input in list_vcf_files(&input_dir)? {
        let output = output_dir.as_ref().join(filtered_output_name(&input));
        let result = filter_vcf_file(&input, &output, thresholds);

        match &result {
            Ok(outcome) if outcome.written == 0 => {
                log::warn!(
                    "No variants passed filters in {:?}; empty output {:?} created",
                    input,
                    output
                );
            }
            Ok(outcome) => {
                log::info!(
                    "Filtered {:?}: {} of {} variants written to {:?}",
                    input,
                    outcome.written,
                    outcome.total,
                    output
                );
            }
            Err(e) => {
                match e {
                    VcfQcError::Parse { .. } => {
                        log::warn!("Skipping {:?} due to a parsing error: {}", input, e)
                    }
                    _ => log::error!("Unexpected error while processing {:?}: {}", input, e),
                }
                if output.exists() {
                    std::fs::remove_file(&output)?;
                }
            }
        }

        results.push(FilteredFile {
            input,
            output,
            result,
        });
    }

    Ok(results)
}
