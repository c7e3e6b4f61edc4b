//! # vcfqc - Variant Quality Control Tools
//!
//! Quality filtering, verification and summary statistics for single-sample
//! variant call files (VCF) ahead of downstream prioritisation.

pub mod depth;
pub mod filter;
pub mod stats;
pub mod utils;
pub mod vcf;
pub mod verify;

/// Threshold set applied by the variant filter. Every comparison is strict:
/// a value equal to its threshold fails.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterThresholds {
    pub min_quality: f64,   // QUAL must exceed this
    pub min_gq: u32,        // FORMAT/GQ must exceed this
    pub min_dp: u32,        // FORMAT/DP must exceed this
    pub min_vaf: f64,       // alt / (ref + alt) from FORMAT/AD must exceed this
}

impl Default for FilterThresholds {
    fn default() -> Self {
        Self {
            min_quality: 30.0,
            min_gq: 20,
            min_dp: 12,
            min_vaf: 0.45,
        }
    }
}

/// Validate filter thresholds
pub fn validate_thresholds(thresholds: &FilterThresholds) -> VcfQcResult<()> {
    if !thresholds.min_quality.is_finite() || thresholds.min_quality < 0.0 {
        return Err(VcfQcError::InvalidConfig(
            "min_quality must be a non-negative number".to_string(),
        ));
    }

    if !thresholds.min_vaf.is_finite() || thresholds.min_vaf < 0.0 || thresholds.min_vaf >= 1.0 {
        return Err(VcfQcError::InvalidConfig(
            "min_vaf must be between 0 and 1".to_string(),
        ));
    }

    Ok(())
}

/// Error types for the vcfqc library
#[derive(Debug, thiserror::Error)]
pub enum VcfQcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("VCF parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type VcfQcResult<T> = Result<T, VcfQcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = FilterThresholds::default();
        assert_eq!(thresholds.min_quality, 30.0);
        assert_eq!(thresholds.min_gq, 20);
        assert_eq!(thresholds.min_dp, 12);
        assert_eq!(thresholds.min_vaf, 0.45);
        assert!(validate_thresholds(&thresholds).is_ok());
    }

    #[test]
    fn test_validate_thresholds() {
        let invalid = FilterThresholds {
            min_vaf: 1.0,
            ..FilterThresholds::default()
        };
        assert!(validate_thresholds(&invalid).is_err());

        let invalid = FilterThresholds {
            min_quality: -5.0,
            ..FilterThresholds::default()
        };
        assert!(validate_thresholds(&invalid).is_err());

        let invalid = FilterThresholds {
            min_quality: f64::NAN,
            ..FilterThresholds::default()
        };
        assert!(validate_thresholds(&invalid).is_err());
    }
}
