//! Summary statistics over QUAL, DP, GQ and VAF across VCF files

use crate::{
    filter::variant_allele_frequency,
    utils::{display_name, list_vcf_files},
    vcf::{VariantRecord, VcfReader},
    VcfQcResult,
};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Order statistics over a slice of values
pub trait Stats {
    /// Percentile `p` in `[0, 100]` with linear interpolation between
    /// neighbouring ranks. NaN for an empty slice.
    fn percentile(&self, p: f64) -> f64;

    fn median(&self) -> f64 {
        self.percentile(50.0)
    }
}

impl Stats for [f64] {
    fn percentile(&self, p: f64) -> f64 {
        if self.is_empty() {
            return f64::NAN;
        }

        let mut sorted = self.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        percentile_of_sorted(&sorted, p)
    }
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Five-number summary of one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub count: usize,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

impl SeriesSummary {
    /// `None` when there is nothing to summarise
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        Some(SeriesSummary {
            count: values.len(),
            min: values.percentile(0.0),
            p25: values.percentile(25.0),
            median: values.median(),
            p75: values.percentile(75.0),
            max: values.percentile(100.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Quality,
    Depth,
    GenotypeQuality,
    VariantAlleleFrequency,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Quality => "Quality (QUAL)",
            Metric::Depth => "Depth (DP)",
            Metric::GenotypeQuality => "Genotype Quality (GQ)",
            Metric::VariantAlleleFrequency => "Variant Allele Frequency (VAF)",
        };
        write!(f, "{}", label)
    }
}

/// Accumulates the four metric series. Values are only collected when
/// present and well-formed.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    quals: Vec<f64>,
    depths: Vec<f64>,
    gqs: Vec<f64>,
    vafs: Vec<f64>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: &VariantRecord) {
        if let Some(&qual) = record.quality.present() {
            if qual.is_finite() {
                self.quals.push(qual);
            }
        }

        let Some(genotype) = record.first_genotype() else {
            return;
        };

        if let Some(&dp) = genotype.depth.present() {
            self.depths.push(dp as f64);
        }
        if let Some(&gq) = genotype.genotype_quality.present() {
            self.gqs.push(gq as f64);
        }
        if let Some(vaf) = variant_allele_frequency(record) {
            self.vafs.push(vaf);
        }
    }

    /// Collect every record of one file. Records read before a parse error
    /// stay collected.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P) -> VcfQcResult<usize> {
        let mut reader = VcfReader::from_path(&path)?;
        let mut count = 0;

        for record in reader.records() {
            self.add_record(&record?);
            count += 1;
        }

        Ok(count)
    }

    pub fn values(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Quality => &self.quals,
            Metric::Depth => &self.depths,
            Metric::GenotypeQuality => &self.gqs,
            Metric::VariantAlleleFrequency => &self.vafs,
        }
    }

    pub fn summary(&self, metric: Metric) -> Option<SeriesSummary> {
        SeriesSummary::from_values(self.values(metric))
    }

    pub fn summaries(&self) -> Vec<(Metric, Option<SeriesSummary>)> {
        [
            Metric::Quality,
            Metric::Depth,
            Metric::GenotypeQuality,
            Metric::VariantAlleleFrequency,
        ]
        .into_iter()
        .map(|metric| (metric, self.summary(metric)))
        .collect()
    }
}

/// Collect metrics across every VCF in a directory. Unreadable files are
/// logged and skipped.
pub fn analyze_directory<P: AsRef<Path>>(input_dir: P) -> VcfQcResult<MetricsCollector> {
    let mut collector = MetricsCollector::new();

    for path in list_vcf_files(&input_dir)? {
        log::info!("Analyzing metrics in: {}", display_name(&path));
        match collector.add_file(&path) {
            Ok(count) => log::debug!("Collected {} records from {:?}", count, path),
            Err(e) => log::warn!("Error processing {}: {}", display_name(&path), e),
        }
    }

    Ok(collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert_close(values.percentile(0.0), 1.0);
        assert_close(values.percentile(25.0), 3.25);
        assert_close(values.median(), 5.5);
        assert_close(values.percentile(75.0), 7.75);
        assert_close(values.percentile(100.0), 10.0);

        assert_close([4.0_f64, 1.0, 3.0].median(), 3.0);
        assert_close([7.0_f64].percentile(25.0), 7.0);
        assert!(Vec::<f64>::new().percentile(50.0).is_nan());
    }

    #[test]
    fn test_series_summary() {
        let values: Vec<f64> = (1..=10).rev().map(|v| v as f64).collect();
        let summary = SeriesSummary::from_values(&values).unwrap();
        assert_eq!(summary.count, 10);
        assert_close(summary.min, 1.0);
        assert_close(summary.p25, 3.25);
        assert_close(summary.median, 5.5);
        assert_close(summary.p75, 7.75);
        assert_close(summary.max, 10.0);

        assert!(SeriesSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_analyze_directory() {
        let dir = tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("a.vcf")).unwrap();
        writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1").unwrap();
        writeln!(file, "chr1\t1\t.\tA\tT\t40\tPASS\t.\tGT:AD:DP:GQ\t0/1:10,10:20:60").unwrap();
        writeln!(file, "chr1\t2\t.\tA\tT\t.\tPASS\t.\tGT:AD:DP:GQ\t0/1:0,0:x:.").unwrap();
        writeln!(file, "chr1\t3\t.\tA\tT\t60\tPASS\t.\tGT:DP\t0/1:30").unwrap();
        drop(file);

        // Records before the malformed line still count
        std::fs::write(
            dir.path().join("b.vcf"),
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n\
             chr2\t5\t.\tG\tC\t80\tPASS\t.\tGT:DP\t0/1:40\n\
             chr2\tbad\n",
        )
        .unwrap();

        let collector = analyze_directory(dir.path()).unwrap();
        assert_eq!(collector.values(Metric::Quality), &[40.0, 60.0, 80.0]);
        assert_eq!(collector.values(Metric::Depth), &[20.0, 30.0, 40.0]);
        assert_eq!(collector.values(Metric::GenotypeQuality), &[60.0]);
        assert_eq!(collector.values(Metric::VariantAlleleFrequency), &[0.5]);

        let summaries = collector.summaries();
        assert_eq!(summaries.len(), 4);
        assert_close(summaries[0].1.as_ref().unwrap().median, 60.0);
    }

    #[test]
    fn test_sites_only_records_contribute_quality_only() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("sites.vcf"),
            "##fileformat=VCFv4.2\n\
             #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
             chr3\t7\t.\tA\tG\t90\tPASS\tDP=50\n",
        )
        .unwrap();

        let collector = analyze_directory(dir.path()).unwrap();
        assert_eq!(collector.values(Metric::Quality), &[90.0]);
        assert!(collector.values(Metric::Depth).is_empty());
        assert!(collector.values(Metric::GenotypeQuality).is_empty());
        assert!(collector.values(Metric::VariantAlleleFrequency).is_empty());

        let summaries = collector.summaries();
        assert_eq!(summaries[0].1.as_ref().unwrap().count, 1);
        assert!(summaries[1].1.is_none());
    }

    #[test]
    fn test_empty_collector_reports_no_data() {
        let collector = MetricsCollector::new();
        assert!(collector.summaries().iter().all(|(_, s)| s.is_none()));
        assert_eq!(Metric::Depth.to_string(), "Depth (DP)");
    }
}
