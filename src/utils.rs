//! Utility functions for file handling and common operations

use crate::{VcfQcError, VcfQcResult};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Check if a file is gzip compressed
pub fn is_gzipped<P: AsRef<Path>>(path: P) -> VcfQcResult<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0; 2];

    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(buffer == [0x1f, 0x8b]),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(VcfQcError::Io(e)),
    }
}

/// Validate that a directory exists
pub fn validate_dir_exists<P: AsRef<Path>>(path: P) -> VcfQcResult<()> {
    if !path.as_ref().is_dir() {
        return Err(VcfQcError::FileNotFound(
            path.as_ref().to_string_lossy().to_string(),
        ));
    }
    Ok(())
}

/// Validate that a file exists and is readable
pub fn validate_file_readable<P: AsRef<Path>>(path: P) -> VcfQcResult<()> {
    File::open(&path)
        .map_err(|_| VcfQcError::FileNotFound(path.as_ref().to_string_lossy().to_string()))?;
    Ok(())
}

/// Create a directory (and parents) if it doesn't exist
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> VcfQcResult<()> {
    if !path.as_ref().exists() {
        std::fs::create_dir_all(&path)?;
        log::info!("Created output directory: {:?}", path.as_ref());
    }
    Ok(())
}

/// Split a VCF file name into its stem and VCF suffix (`.vcf` or `.vcf.gz`)
fn split_vcf_name(file_name: &str) -> Option<(&str, &str)> {
    [".vcf.gz", ".vcf"].iter().find_map(|suffix| {
        file_name
            .strip_suffix(suffix)
            .filter(|stem| !stem.is_empty())
            .map(|stem| (stem, *suffix))
    })
}

/// Check if a path names a VCF file
pub fn is_vcf_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .and_then(|s| s.to_str())
        .and_then(split_vcf_name)
        .is_some()
}

/// List the VCF files directly inside a directory, sorted by name
pub fn list_vcf_files<P: AsRef<Path>>(dir: P) -> VcfQcResult<Vec<PathBuf>> {
    validate_dir_exists(&dir)?;

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && is_vcf_path(&path) {
            files.push(path);
        }
    }
    files.sort();

    log::debug!("Found {} VCF files in {:?}", files.len(), dir.as_ref());
    Ok(files)
}

/// Output file name for a filtered VCF: `<stem>_filtered.vcf[.gz]`
pub fn filtered_output_name<P: AsRef<Path>>(input: P) -> String {
    let file_name = display_name(&input);
    match split_vcf_name(&file_name) {
        Some((stem, suffix)) => format!("{}_filtered{}", stem, suffix),
        None => format!("{}_filtered.vcf", file_name),
    }
}

/// File name component of a path, for reports and log lines
pub fn display_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.as_ref().to_string_lossy().to_string())
}

/// Timer utility for measuring execution time
pub struct Timer {
    start: std::time::Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::info!("Starting timer: {}", name);
        Timer {
            start: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("Timer '{}' elapsed: {:.2?}", self.name, self.elapsed());
    }
}
