//! Read-depth cutoff analysis: how many variants a DP threshold would drop

use crate::{
    utils::{list_vcf_files, validate_dir_exists},
    vcf::{Field, VcfReader},
    VcfQcResult,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthCutoffCount {
    pub total: usize,
    pub omitted: usize,
}

impl DepthCutoffCount {
    pub fn percent_omitted(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.omitted as f64 / self.total as f64 * 100.0
        }
    }
}

/// Count variants whose first-sample DP is at or below `cutoff`.
/// Malformed DP values count as omitted; records without a sample or
/// without DP are not.
pub fn count_dp_omissions<P: AsRef<Path>>(path: P, cutoff: u32) -> VcfQcResult<DepthCutoffCount> {
    let mut reader = VcfReader::from_path(&path)?;
    let mut count = DepthCutoffCount::default();

    for record in reader.records() {
        let record = record?;
        count.total += 1;

        let Some(genotype) = record.first_genotype() else {
            continue;
        };

        match &genotype.depth {
            Field::Present(dp) if *dp <= cutoff => count.omitted += 1,
            Field::Malformed(raw) => {
                log::debug!(
                    "Unparseable DP '{}' at {}:{} counted as omitted",
                    raw,
                    record.chrom,
                    record.pos
                );
                count.omitted += 1;
            }
            _ => {}
        }
    }

    Ok(count)
}

/// Run the cutoff count over every VCF in a directory. Files that cannot
/// be read are logged and left out.
pub fn analyze_dp_cutoff_directory<P: AsRef<Path>>(
    input_dir: P,
    cutoff: u32,
) -> VcfQcResult<Vec<(PathBuf, DepthCutoffCount)>> {
    validate_dir_exists(&input_dir)?;

    let mut results = Vec::new();
    for path in list_vcf_files(&input_dir)? {
        match count_dp_omissions(&path, cutoff) {
            Ok(count) => results.push((path, count)),
            Err(e) => log::warn!("Error processing {:?}: {}", path, e),
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n";

    #[test]
    fn test_count_dp_omissions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("depth.vcf");
        std::fs::write(
            &path,
            format!(
                "{}{}{}{}{}{}",
                HEADER,
                "chr1\t1\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:12\n",
                "chr1\t2\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:13\n",
                "chr1\t3\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:abc\n",
                "chr1\t4\t.\tA\tT\t50\tPASS\t.\tGT\t0/1\n",
                "chr1\t5\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:.\n",
            ),
        )
        .unwrap();

        let count = count_dp_omissions(&path, 12).unwrap();
        assert_eq!(count, DepthCutoffCount { total: 5, omitted: 2 });
        assert!((count.percent_omitted() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_omitted_empty() {
        assert_eq!(DepthCutoffCount::default().percent_omitted(), 0.0);
    }

    #[test]
    fn test_analyze_dp_cutoff_directory_skips_bad_files() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.vcf"),
            format!("{}chr1\t1\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:5\n", HEADER),
        )
        .unwrap();
        std::fs::write(dir.path().join("b.vcf"), "no header here\n").unwrap();

        let results = analyze_dp_cutoff_directory(dir.path(), 12).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, DepthCutoffCount { total: 1, omitted: 1 });
    }
}
