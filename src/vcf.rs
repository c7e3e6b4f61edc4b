//! VCF reading and writing for single-sample variant records

use crate::{utils::is_gzipped, VcfQcError, VcfQcResult};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

const FIXED_COLUMNS: [&str; 8] = ["#CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// A value looked up in a record, keeping apart "not declared" from
/// "declared but empty" and "declared but unparseable".
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// The key is not part of the FORMAT declaration
    Absent,
    /// The key is declared but the value is `.` or not supplied
    Missing,
    Present(T),
    /// Raw text that could not be parsed
    Malformed(String),
}

impl<T> Field<T> {
    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: FromStr> Field<T> {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some(".") => Field::Missing,
            Some(raw) => raw
                .parse::<T>()
                .map(Field::Present)
                .unwrap_or_else(|_| Field::Malformed(raw.to_string())),
        }
    }
}

/// Per-sample FORMAT values consulted by the filters
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeCall {
    pub depth: Field<u32>,
    pub genotype_quality: Field<u32>,
    pub allele_depths: Field<Vec<u32>>,
}

impl GenotypeCall {
    /// Build a call from the FORMAT keys and one colon-separated sample column
    pub fn from_sample(format_keys: &[&str], sample: &str) -> Self {
        let values: Vec<&str> = sample.split(':').collect();
        let lookup = |key: &str| -> Option<Option<&str>> {
            format_keys
                .iter()
                .position(|&k| k == key)
                .map(|idx| values.get(idx).copied())
        };

        let depth = lookup("DP").map_or(Field::Absent, Field::parse);
        let genotype_quality = lookup("GQ").map_or(Field::Absent, Field::parse);
        let allele_depths = lookup("AD").map_or(Field::Absent, parse_allele_depths);

        GenotypeCall {
            depth,
            genotype_quality,
            allele_depths,
        }
    }
}

fn parse_allele_depths(raw: Option<&str>) -> Field<Vec<u32>> {
    let raw = match raw {
        None | Some("") | Some(".") => return Field::Missing,
        Some(raw) => raw,
    };

    raw.split(',')
        .map(|count| count.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map(Field::Present)
        .unwrap_or_else(|_| Field::Malformed(raw.to_string()))
}

/// Column layout taken from the `#CHROM` header line
#[derive(Debug, Clone)]
pub struct VcfColumnIndices {
    pub format: Option<usize>,
    pub samples: Vec<String>,
}

impl VcfColumnIndices {
    pub fn from_header(header_line: &str, line_number: usize) -> VcfQcResult<Self> {
        let fields: Vec<&str> = header_line.trim_end().split('\t').collect();

        for (idx, expected) in FIXED_COLUMNS.iter().enumerate() {
            if fields.get(idx) != Some(expected) {
                return Err(VcfQcError::Parse {
                    line: line_number,
                    message: format!("expected column {} to be {} in header", idx + 1, expected),
                });
            }
        }

        let format = match fields.get(8) {
            Some(&"FORMAT") => Some(8),
            Some(other) => {
                return Err(VcfQcError::Parse {
                    line: line_number,
                    message: format!("expected FORMAT column, found {}", other),
                })
            }
            None => None,
        };
        let samples = fields.iter().skip(9).map(|s| s.to_string()).collect();

        Ok(VcfColumnIndices { format, samples })
    }
}

/// A parsed VCF data line. The original text is kept for pass-through output.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: u32,
    pub quality: Field<f64>,
    pub genotypes: Vec<GenotypeCall>,
    line: String,
}

impl VariantRecord {
    pub fn from_line(line: &str, line_number: usize, indices: &VcfColumnIndices) -> VcfQcResult<Self> {
        let parse_error = |message: String| VcfQcError::Parse {
            line: line_number,
            message,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < FIXED_COLUMNS.len() {
            return Err(parse_error(format!(
                "expected at least {} columns, found {}",
                FIXED_COLUMNS.len(),
                fields.len()
            )));
        }

        let chrom = fields[0].to_string();
        let pos = match fields[1].parse::<u32>() {
            Ok(pos) if pos > 0 => pos,
            _ => return Err(parse_error(format!("invalid position: {}", fields[1]))),
        };
        let quality = Field::parse(Some(fields[5]));

        let genotypes = match indices.format {
            Some(format_idx) if fields.len() > format_idx + 1 + indices.samples.len() => {
                return Err(parse_error(format!(
                    "{} sample columns found but header declares {}",
                    fields.len() - format_idx - 1,
                    indices.samples.len()
                )))
            }
            Some(format_idx) if fields.len() > format_idx => {
                let format_keys: Vec<&str> = fields[format_idx].split(':').collect();
                fields[format_idx + 1..]
                    .iter()
                    .map(|sample| GenotypeCall::from_sample(&format_keys, sample))
                    .collect()
            }
            Some(_) => Vec::new(),
            None if fields.len() > FIXED_COLUMNS.len() => {
                return Err(parse_error(
                    "sample columns present but header declares no FORMAT column".to_string(),
                ))
            }
            None => Vec::new(),
        };

        Ok(VariantRecord {
            chrom,
            pos,
            quality,
            genotypes,
            line: line.to_string(),
        })
    }

    /// Only the first sample is consulted by the filters
    pub fn first_genotype(&self) -> Option<&GenotypeCall> {
        self.genotypes.first()
    }

    pub fn line(&self) -> &str {
        &self.line
    }
}

/// Streaming VCF reader over plain or gzip-compressed input
pub struct VcfReader<R: BufRead> {
    reader: R,
    header_lines: Vec<String>,
    indices: VcfColumnIndices,
    pending: Option<(usize, String)>,
    line_number: usize,
}

impl VcfReader<Box<dyn BufRead>> {
    pub fn from_path<P: AsRef<Path>>(path: P) -> VcfQcResult<Self> {
        let file = File::open(&path)
            .map_err(|_| VcfQcError::FileNotFound(path.as_ref().to_string_lossy().to_string()))?;

        let reader: Box<dyn BufRead> = if is_gzipped(&path)? {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        VcfReader::new(reader)
    }
}

impl<R: BufRead> VcfReader<R> {
    /// Consume the header. Fails if no `#CHROM` line precedes the first record.
    pub fn new(mut reader: R) -> VcfQcResult<Self> {
        let mut header_lines = Vec::new();
        let mut indices = None;
        let mut pending = None;
        let mut line_number = 0;
        let mut line = String::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);

            if trimmed.starts_with("#CHROM") {
                indices = Some(VcfColumnIndices::from_header(trimmed, line_number)?);
                header_lines.push(trimmed.to_string());
                break;
            } else if trimmed.starts_with('#') {
                header_lines.push(trimmed.to_string());
            } else if !trimmed.is_empty() {
                pending = Some((line_number, trimmed.to_string()));
                break;
            }
        }

        let indices = indices.ok_or_else(|| VcfQcError::Parse {
            line: line_number,
            message: "missing #CHROM header line".to_string(),
        })?;

        Ok(VcfReader {
            reader,
            header_lines,
            indices,
            pending,
            line_number,
        })
    }

    pub fn header_lines(&self) -> &[String] {
        &self.header_lines
    }

    pub fn sample_names(&self) -> &[String] {
        &self.indices.samples
    }

    pub fn records(&mut self) -> VcfRecordIterator<'_, R> {
        VcfRecordIterator { reader: self }
    }

    fn next_data_line(&mut self) -> VcfQcResult<Option<(usize, String)>> {
        if let Some(pending) = self.pending.take() {
            return Ok(Some(pending));
        }

        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            return Ok(Some((self.line_number, trimmed.to_string())));
        }
    }
}

/// Iterator over VCF records
pub struct VcfRecordIterator<'a, R: BufRead> {
    reader: &'a mut VcfReader<R>,
}

impl<R: BufRead> Iterator for VcfRecordIterator<'_, R> {
    type Item = VcfQcResult<VariantRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.next_data_line() {
            Ok(Some((line_number, line))) => Some(VariantRecord::from_line(
                &line,
                line_number,
                &self.reader.indices,
            )),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Output file, gzip compressed or plain
pub enum VcfSink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for VcfSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            VcfSink::Plain(w) => w.write(buf),
            VcfSink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            VcfSink::Plain(w) => w.flush(),
            VcfSink::Gzip(w) => w.flush(),
        }
    }
}

impl VcfSink {
    /// Write the gzip trailer if any and flush to disk
    pub fn finish(self) -> io::Result<()> {
        match self {
            VcfSink::Plain(mut w) => w.flush(),
            VcfSink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

/// Writes header and record lines verbatim
pub struct VcfWriter<W: Write> {
    writer: W,
}

impl VcfWriter<VcfSink> {
    /// Create an output file, gzip compressed when the path ends in `.gz`
    pub fn create<P: AsRef<Path>>(path: P, header_lines: &[String]) -> VcfQcResult<Self> {
        let file = BufWriter::new(File::create(&path)?);
        let sink = if path.as_ref().extension().and_then(|s| s.to_str()) == Some("gz") {
            VcfSink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            VcfSink::Plain(file)
        };

        VcfWriter::new(sink, header_lines)
    }

    pub fn finish(self) -> VcfQcResult<()> {
        self.writer.finish()?;
        Ok(())
    }
}

impl<W: Write> VcfWriter<W> {
    pub fn new(mut writer: W, header_lines: &[String]) -> VcfQcResult<Self> {
        for line in header_lines {
            writeln!(writer, "{}", line)?;
        }
        Ok(VcfWriter { writer })
    }

    pub fn write_record(&mut self, record: &VariantRecord) -> VcfQcResult<()> {
        writeln!(self.writer, "{}", record.line())?;
        Ok(())
    }

    pub fn into_inner(mut self) -> VcfQcResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Write};
    use tempfile::NamedTempFile;

    const HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n";

    fn reader_for(body: &str) -> VcfReader<Cursor<Vec<u8>>> {
        VcfReader::new(Cursor::new(format!("{}{}", HEADER, body).into_bytes())).unwrap()
    }

    #[test]
    fn test_genotype_call_from_sample() {
        let call = GenotypeCall::from_sample(&["GT", "AD", "DP", "GQ"], "0/1:10,12:22:99");
        assert_eq!(call.allele_depths, Field::Present(vec![10, 12]));
        assert_eq!(call.depth, Field::Present(22));
        assert_eq!(call.genotype_quality, Field::Present(99));
    }

    #[test]
    fn test_genotype_call_absent_missing_malformed() {
        let call = GenotypeCall::from_sample(&["GT", "AD", "DP"], "0/1:.:abc");
        assert_eq!(call.allele_depths, Field::Missing);
        assert_eq!(call.depth, Field::Malformed("abc".to_string()));
        assert_eq!(call.genotype_quality, Field::Absent);

        // Trailing fields may be dropped from a sample column
        let call = GenotypeCall::from_sample(&["GT", "DP", "GQ"], "0/1");
        assert_eq!(call.depth, Field::Missing);
        assert_eq!(call.genotype_quality, Field::Missing);

        let call = GenotypeCall::from_sample(&["AD"], "5,x");
        assert_eq!(call.allele_depths, Field::Malformed("5,x".to_string()));
    }

    #[test]
    fn test_read_records() {
        let mut reader = reader_for(
            "chr1\t100\t.\tA\tT\t50.5\tPASS\t.\tGT:AD:DP:GQ\t0/1:10,12:22:99\n\
             chr2\t200\t.\tG\tC\t.\tPASS\t.\tGT:DP\t0/1:8\n",
        );
        assert_eq!(reader.header_lines().len(), 2);
        assert_eq!(reader.sample_names(), &["S1".to_string()]);

        let records: Vec<VariantRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chrom, "chr1");
        assert_eq!(records[0].pos, 100);
        assert_eq!(records[0].quality, Field::Present(50.5));
        assert_eq!(records[1].quality, Field::Missing);
        assert_eq!(records[1].first_genotype().unwrap().depth, Field::Present(8));
    }

    #[test]
    fn test_sites_only_vcf_has_no_genotypes() {
        let input = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\nchr1\t100\t.\tA\tT\t50\tPASS\tDP=30\n";
        let mut reader = VcfReader::new(Cursor::new(input.as_bytes().to_vec())).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert!(record.first_genotype().is_none());
    }

    #[test]
    fn test_parse_errors() {
        let missing_header = "chr1\t100\t.\tA\tT\t50\tPASS\t.\n";
        assert!(matches!(
            VcfReader::new(Cursor::new(missing_header.as_bytes().to_vec())),
            Err(VcfQcError::Parse { .. })
        ));

        let mut reader = reader_for("chr1\tabc\t.\tA\tT\t50\tPASS\t.\tGT\t0/1\n");
        match reader.records().next() {
            Some(Err(VcfQcError::Parse { line, .. })) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }

        let mut reader = reader_for("chr1\t100\t.\tA\n");
        assert!(matches!(reader.records().next(), Some(Err(VcfQcError::Parse { .. }))));
    }

    #[test]
    fn test_writer_preserves_lines() {
        let line = "chr1\t100\trs1\tA\tT\t50.50\tPASS\tDP=30;AF=0.5\tGT:AD:DP:GQ\t0/1:10,12:22:99";
        let mut reader = reader_for(&format!("{}\n", line));
        let header = reader.header_lines().to_vec();
        let record = reader.records().next().unwrap().unwrap();

        let mut writer = VcfWriter::new(Vec::new(), &header).unwrap();
        writer.write_record(&record).unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(output, format!("{}{}\n", HEADER, line));
    }

    #[test]
    fn test_extra_sample_column_is_parse_error() {
        let mut reader = reader_for("chr1\t100\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:30\t0/1:40\n");
        match reader.records().next() {
            Some(Err(VcfQcError::Parse { line, message })) => {
                assert_eq!(line, 3);
                assert!(message.contains("2 sample columns"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        // Fewer sample columns than declared is still accepted
        let header = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\n";
        let input = format!("{}chr1\t100\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:30\n", header);
        let mut reader = VcfReader::new(Cursor::new(input.into_bytes())).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(record.genotypes.len(), 1);
    }

    #[test]
    fn test_create_gzipped_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf.gz");
        let line = "chr1\t100\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:30";
        let mut reader = reader_for(&format!("{}\n", line));
        let header = reader.header_lines().to_vec();
        let record = reader.records().next().unwrap().unwrap();

        let mut writer = VcfWriter::create(&path, &header).unwrap();
        writer.write_record(&record).unwrap();
        writer.finish().unwrap();

        assert!(is_gzipped(&path).unwrap());
        let mut content = String::new();
        MultiGzDecoder::new(File::open(&path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, format!("{}{}\n", HEADER, line));
    }

    #[test]
    fn test_read_gzipped_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        write!(encoder, "{}chr1\t100\t.\tA\tT\t50\tPASS\t.\tGT:DP\t0/1:30\n", HEADER).unwrap();
        temp_file.write_all(&encoder.finish().unwrap()).unwrap();

        let mut reader = VcfReader::from_path(temp_file.path()).unwrap();
        let records: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first_genotype().unwrap().depth, Field::Present(30));
    }
}
