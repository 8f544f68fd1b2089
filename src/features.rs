//! Scan-record feature tables (CSV)
//!
//! The feature table is the flat interchange format between extraction and
//! reporting: ten fixed columns, one row per scan record, with the literal
//! string `N/A` marking absent optional values. Reading converts the sentinel
//! back into `None` once, at this boundary; nothing downstream compares
//! strings.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::mzml::ScanRecord;
use crate::summary::WindowSummary;

/// Sentinel written for absent optional fields
pub const NOT_APPLICABLE: &str = "N/A";

/// Column order of the feature table
pub const FEATURE_COLUMNS: [&str; 10] = [
    "Precursor Ion m/z",
    "Retention Time",
    "Injection Time",
    "Isolation Window Target",
    "Isolation window upper offset",
    "Isolation window lower offset",
    "MS1 Base Peak m/z",
    "Base Peak Intensity",
    "Total Ion Current",
    "Demultiplexing",
];

/// Errors that can occur reading or writing delimited tables
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// I/O error on the underlying file
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// Header row lacks a required column
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// File parses as a table but its content is unusable
    #[error("Invalid table format: {0}")]
    InvalidFormat(String),
}

/// Positions of the feature columns in one particular file's header
struct ColumnIndex {
    precursor_mz: usize,
    retention_time: usize,
    injection_time: usize,
    window_target: usize,
    window_upper: usize,
    window_lower: usize,
    base_peak_mz: usize,
    base_peak_intensity: usize,
    total_ion_current: usize,
    demultiplexing: usize,
}

impl ColumnIndex {
    fn locate(headers: &csv::StringRecord) -> Result<Self, TableError> {
        let position = |name: &str| -> Result<usize, TableError> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            precursor_mz: position(FEATURE_COLUMNS[0])?,
            retention_time: position(FEATURE_COLUMNS[1])?,
            injection_time: position(FEATURE_COLUMNS[2])?,
            window_target: position(FEATURE_COLUMNS[3])?,
            window_upper: position(FEATURE_COLUMNS[4])?,
            window_lower: position(FEATURE_COLUMNS[5])?,
            base_peak_mz: position(FEATURE_COLUMNS[6])?,
            base_peak_intensity: position(FEATURE_COLUMNS[7])?,
            total_ion_current: position(FEATURE_COLUMNS[8])?,
            demultiplexing: position(FEATURE_COLUMNS[9])?,
        })
    }
}

/// Read a feature table from a file
pub fn read_scan_records<P: AsRef<Path>>(path: P) -> Result<Vec<ScanRecord>, TableError> {
    let file = File::open(path)?;
    read_scan_records_from(BufReader::new(file))
}

/// Read a feature table from a reader
pub fn read_scan_records_from<R: BufRead>(reader: R) -> Result<Vec<ScanRecord>, TableError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnIndex::locate(&headers)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let cell = |index: usize| row.get(index).unwrap_or("");

        let retention_time = match optional_f64(cell(columns.retention_time)) {
            Some(value) => value,
            None => {
                log::debug!("skipping row without a usable retention time");
                continue;
            }
        };

        let precursor_mz = optional_f64(cell(columns.precursor_mz));
        let injection_time = optional_f64(cell(columns.injection_time));
        let window_target = optional_f64(cell(columns.window_target));
        let window_upper = optional_f64(cell(columns.window_upper));
        let window_lower = optional_f64(cell(columns.window_lower));
        let is_fragmentation = precursor_mz.is_some()
            || window_target.is_some()
            || window_upper.is_some()
            || window_lower.is_some()
            || injection_time.is_some();

        records.push(ScanRecord {
            ms_level: if is_fragmentation { 2 } else { 1 },
            retention_time,
            demultiplexed: cell(columns.demultiplexing) == "Yes",
            precursor_mz,
            isolation_window_target: window_target,
            isolation_window_upper_offset: window_upper,
            isolation_window_lower_offset: window_lower,
            injection_time,
            base_peak_mz: optional_f64(cell(columns.base_peak_mz)),
            base_peak_intensity: optional_f64(cell(columns.base_peak_intensity)),
            total_ion_current: optional_f64(cell(columns.total_ion_current)),
        });
    }

    Ok(records)
}

/// Streaming feature-table writer.
///
/// Writes the header on construction, then one row per record, so extraction
/// can emit rows as they come off the stream without buffering the run.
pub struct FeatureWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl FeatureWriter<File> {
    /// Create a feature table at the given path
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        Self::new(File::create(path)?)
    }
}

impl<W: Write> FeatureWriter<W> {
    /// Wrap a writer and emit the header row
    pub fn new(writer: W) -> Result<Self, TableError> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(FEATURE_COLUMNS)?;
        Ok(Self { writer })
    }

    /// Append one record as a row
    pub fn write(&mut self, record: &ScanRecord) -> Result<(), TableError> {
        self.writer.write_record([
            format_field(record.precursor_mz),
            format!("{:?}", record.retention_time),
            format_field(record.injection_time),
            format_field(record.isolation_window_target),
            format_field(record.isolation_window_upper_offset),
            format_field(record.isolation_window_lower_offset),
            format_field(record.base_peak_mz),
            format_field(record.base_peak_intensity),
            format_field(record.total_ion_current),
            if record.demultiplexed { "Yes" } else { "No" }.to_string(),
        ])?;
        Ok(())
    }

    /// Flush buffered rows to the underlying writer
    pub fn finish(mut self) -> Result<(), TableError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Write a whole record slice as a feature table
pub fn write_scan_records<P: AsRef<Path>>(
    path: P,
    records: &[ScanRecord],
) -> Result<(), TableError> {
    let mut writer = FeatureWriter::create(path)?;
    for record in records {
        writer.write(record)?;
    }
    writer.finish()
}

/// Write the per-target isolation-window detail table
pub fn write_window_table<P: AsRef<Path>>(
    path: P,
    summary: &WindowSummary,
) -> Result<(), TableError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Target", "Upper Window", "Lower Window", "Window Size"])?;
    for window in summary.windows.values() {
        writer.write_record([
            format!("{:?}", window.target),
            format!("{:?}", window.upper_offset),
            format!("{:?}", window.lower_offset),
            format!("{:?}", window.window_size),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse one cell: the `N/A` sentinel, an empty cell, and non-numeric text
/// all come back as `None`.
fn optional_f64(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() || value == NOT_APPLICABLE {
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::debug!("skipping unparseable numeric value '{}'", value);
            None
        }
    }
}

fn format_field(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => NOT_APPLICABLE.to_string(),
    }
}
