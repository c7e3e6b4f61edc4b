//! Verification of filtered VCF files and the per-file verification report

use crate::{
    filter::{passes, Verdict},
    utils::{display_name, list_vcf_files, validate_dir_exists},
    vcf::VcfReader,
    FilterThresholds, VcfQcError, VcfQcResult,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Classification of one verified file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Passed,
    Failed,
    ParseError(String),
    UnexpectedError(String),
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Passed => "Passed",
            FileStatus::Failed => "Failed",
            FileStatus::ParseError(_) => "Parse Error",
            FileStatus::UnexpectedError(_) => "Unexpected Error",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            FileStatus::ParseError(message) | FileStatus::UnexpectedError(message) => {
                Some(message.as_str())
            }
            _ => None,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Verification result for a single file
#[derive(Debug, Clone)]
pub struct FileVerification {
    pub path: PathBuf,
    pub total_variants: usize,
    pub failed_variants: usize,
    /// Failure counts keyed by reason code, in order of first occurrence
    pub reason_counts: IndexMap<String, usize>,
    pub status: FileStatus,
}

impl FileVerification {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    pub fn is_passed(&self) -> bool {
        self.status == FileStatus::Passed
    }

    pub fn most_frequent_reason(&self) -> Option<&str> {
        most_frequent_reason(&self.reason_counts)
    }
}

/// Highest-count reason; ties go to the reason seen first
pub fn most_frequent_reason(counts: &IndexMap<String, usize>) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for (reason, &count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((reason.as_str(), count)),
        }
    }
    best.map(|(reason, _)| reason)
}

/// Re-apply the filter to every record of one file. A file passes only
/// when no record fails. Never returns an error: unreadable files are
/// classified instead.
pub fn verify_vcf_file<P: AsRef<Path>>(path: P, thresholds: &FilterThresholds) -> FileVerification {
    let mut verification = FileVerification {
        path: path.as_ref().to_path_buf(),
        total_variants: 0,
        failed_variants: 0,
        reason_counts: IndexMap::new(),
        status: FileStatus::Passed,
    };

    if let Err(e) = tally_records(&mut verification, thresholds) {
        verification.status = match e {
            VcfQcError::Parse { .. } => FileStatus::ParseError(e.to_string()),
            _ => FileStatus::UnexpectedError(e.to_string()),
        };
        return verification;
    }

    if verification.failed_variants > 0 {
        verification.status = FileStatus::Failed;
    }
    verification
}

fn tally_records(verification: &mut FileVerification, thresholds: &FilterThresholds) -> VcfQcResult<()> {
    let file_name = verification.file_name();
    let mut reader = VcfReader::from_path(&verification.path)?;

    for record in reader.records() {
        let record = record?;
        verification.total_variants += 1;

        if let Verdict::Fail(reason) = passes(&record, thresholds) {
            verification.failed_variants += 1;
            log::debug!(
                "Variant {}:{} in '{}' failed due to: {}",
                record.chrom,
                record.pos,
                file_name,
                reason
            );
            *verification.reason_counts.entry(reason.to_string()).or_insert(0) += 1;
        }
    }

    Ok(())
}

/// Results for every VCF in a directory, in file name order
#[derive(Debug, Clone, Default)]
pub struct VerificationSummary {
    pub files: Vec<FileVerification>,
}

impl VerificationSummary {
    pub fn passed(&self) -> impl Iterator<Item = &FileVerification> {
        self.files.iter().filter(|f| f.is_passed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileVerification> {
        self.files.iter().filter(|f| !f.is_passed())
    }

    pub fn passed_count(&self) -> usize {
        self.passed().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }
}

/// Verify every VCF in a directory. Only a missing directory is an error.
pub fn verify_directory<P: AsRef<Path>>(
    dir: P,
    thresholds: &FilterThresholds,
) -> VcfQcResult<VerificationSummary> {
    validate_dir_exists(&dir)?;

    let mut summary = VerificationSummary::default();
    for path in list_vcf_files(&dir)? {
        let verification = verify_vcf_file(&path, thresholds);

        match &verification.status {
            FileStatus::Passed => log::info!(
                "Verification passed for '{}': all {} variants passed the filters",
                verification.file_name(),
                verification.total_variants
            ),
            FileStatus::Failed => log::info!(
                "Verification failed for '{}': {} out of {} variants failed the filters",
                verification.file_name(),
                verification.failed_variants,
                verification.total_variants
            ),
            status => log::warn!(
                "Skipped '{}': {}",
                verification.file_name(),
                status.detail().unwrap_or_else(|| status.label())
            ),
        }

        summary.files.push(verification);
    }

    Ok(summary)
}

/// One row of the TSV verification report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub file: String,
    pub status: String,
    pub total_variants: usize,
    pub failed_variants: usize,
    pub top_reason: String,
    pub detail: String,
}

impl From<&FileVerification> for ReportRow {
    fn from(verification: &FileVerification) -> Self {
        ReportRow {
            file: verification.file_name(),
            status: verification.status.label().to_string(),
            total_variants: verification.total_variants,
            failed_variants: verification.failed_variants,
            top_reason: verification.most_frequent_reason().unwrap_or_default().to_string(),
            detail: verification.status.detail().unwrap_or_default().to_string(),
        }
    }
}

/// Write one TSV row per verified file
pub fn write_verification_report<P: AsRef<Path>>(
    summary: &VerificationSummary,
    output_path: P,
) -> VcfQcResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(output_path)?;

    for verification in &summary.files {
        writer.serialize(ReportRow::from(verification))?;
    }
    writer.flush()?;

    Ok(())
}

/// Read a TSV verification report back
pub fn read_verification_report<P: AsRef<Path>>(path: P) -> VcfQcResult<Vec<ReportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .map_err(|e| {
            if e.is_io_error() {
                VcfQcError::FileNotFound(path.as_ref().to_string_lossy().to_string())
            } else {
                VcfQcError::Csv(e)
            }
        })?;

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Passed files and, for each failed file, its most common failure reason
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub passed: Vec<String>,
    pub failed: IndexMap<String, String>,
}

impl ReportSummary {
    pub fn total_files(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

pub fn summarize_report(rows: &[ReportRow]) -> ReportSummary {
    let mut summary = ReportSummary::default();

    for row in rows {
        if row.status == FileStatus::Passed.label() {
            summary.passed.push(row.file.clone());
        } else {
            let reason = if !row.top_reason.is_empty() {
                row.top_reason.clone()
            } else if row.status != FileStatus::Failed.label() {
                row.status.clone()
            } else {
                "Unknown".to_string()
            };
            summary.failed.insert(row.file.clone(), reason);
        }
    }

    summary
}
