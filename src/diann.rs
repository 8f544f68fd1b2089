//! DiaNN output-table readers
//!
//! DiaNN emits tab-separated statistics and feature tables alongside each
//! search. Only the handful of columns the reports consume are read; rows
//! with non-numeric values in those columns are skipped, missing columns are
//! fatal for the file.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::features::TableError;

static NG_AMOUNT: OnceLock<Regex> = OnceLock::new();

fn ng_amount() -> &'static Regex {
    NG_AMOUNT.get_or_init(|| Regex::new(r"_(\d+)ng").expect("hardwired pattern is valid"))
}

/// One detected feature: m/z against retention-time apex, with charge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeaturePoint {
    /// Feature m/z
    pub mz: f64,
    /// Retention time at the feature apex, in minutes
    pub rt_apex: f64,
    /// Charge state
    pub charge: i32,
}

/// One identified precursor from the DiaNN main report
#[derive(Debug, Clone, PartialEq)]
pub struct PrecursorRow {
    /// Peptide sequence with modification annotations
    pub modified_peptide: String,
    /// Precursor charge state
    pub charge: i32,
    /// Retention time, in minutes
    pub rt: f64,
    /// Precursor m/z
    pub precursor_mz: f64,
}

/// Peak width (in scans) for one acquisition, keyed by sample load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FwhmPoint {
    /// Nanogram load parsed out of the run file name
    pub ng: u32,
    /// Full width at half maximum, in scans
    pub fwhm: f64,
}

/// Read `Precursors.Identified` from a stats table: last parseable row wins.
///
/// Returns `None` when no row carries a parseable count.
pub fn precursors_identified<P: AsRef<Path>>(path: P) -> Result<Option<i64>, TableError> {
    let mut reader = tsv_reader(path)?;
    let index = column(reader.headers()?, "Precursors.Identified")?;

    let mut last = None;
    for row in reader.records() {
        let row = row?;
        if let Some(count) = parse_i64(row.get(index)) {
            last = Some(count);
        }
    }
    Ok(last)
}

/// Sum `Precursors.Identified` over every parseable row of a stats table.
///
/// Returns `None` when no row carries a parseable count, so callers can skip
/// the file rather than chart a zero.
pub fn total_precursors_identified<P: AsRef<Path>>(path: P) -> Result<Option<i64>, TableError> {
    let mut reader = tsv_reader(path)?;
    let index = column(reader.headers()?, "Precursors.Identified")?;

    let mut total: Option<i64> = None;
    for row in reader.records() {
        let row = row?;
        if let Some(count) = parse_i64(row.get(index)) {
            *total.get_or_insert(0) += count;
        }
    }
    Ok(total)
}

/// Read the FWHM point from the first data row of a stats table.
///
/// The nanogram load comes out of the `File.Name` column (`..._50ng...`).
pub fn fwhm_point<P: AsRef<Path>>(path: P) -> Result<FwhmPoint, TableError> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers()?.clone();
    let file_index = column(&headers, "File.Name")?;
    let fwhm_index = column(&headers, "FWHM.Scans")?;

    let row = match reader.records().next() {
        Some(row) => row?,
        None => {
            return Err(TableError::InvalidFormat(
                "statistics file has no data rows".to_string(),
            ))
        }
    };

    let file_name = row.get(file_index).unwrap_or("");
    let ng = ng_amount()
        .captures(file_name)
        .and_then(|captures| captures.get(1))
        .and_then(|amount| amount.as_str().parse().ok())
        .ok_or_else(|| {
            TableError::InvalidFormat(format!("no ng amount in file name '{}'", file_name))
        })?;

    let fwhm = match parse_f64(row.get(fwhm_index)) {
        Some(value) => value,
        None => {
            return Err(TableError::InvalidFormat(format!(
                "non-numeric FWHM.Scans for '{}'",
                file_name
            )))
        }
    };

    Ok(FwhmPoint { ng, fwhm })
}

/// Read m/z, retention-time apex, and charge for every detected feature
pub fn read_feature_points<P: AsRef<Path>>(path: P) -> Result<Vec<FeaturePoint>, TableError> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers()?.clone();
    let mz_index = column(&headers, "mz")?;
    let rt_index = column(&headers, "rtApex")?;
    let charge_index = column(&headers, "charge")?;

    let mut points = Vec::new();
    for row in reader.records() {
        let row = row?;
        match (
            parse_f64(row.get(mz_index)),
            parse_f64(row.get(rt_index)),
            parse_i64(row.get(charge_index)),
        ) {
            (Some(mz), Some(rt_apex), Some(charge)) => points.push(FeaturePoint {
                mz,
                rt_apex,
                charge: charge as i32,
            }),
            _ => log::debug!("skipping feature row with non-numeric fields"),
        }
    }
    Ok(points)
}

/// Read the identified-precursor rows used by the report scatter plots
pub fn read_precursor_report<P: AsRef<Path>>(path: P) -> Result<Vec<PrecursorRow>, TableError> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers()?.clone();
    let peptide_index = column(&headers, "ModifiedPeptide")?;
    let charge_index = column(&headers, "PrecursorCharge")?;
    let rt_index = column(&headers, "RT")?;
    let mz_index = column(&headers, "PrecursorMz")?;

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let modified_peptide = row.get(peptide_index).unwrap_or("").to_string();
        match (
            parse_i64(row.get(charge_index)),
            parse_f64(row.get(rt_index)),
            parse_f64(row.get(mz_index)),
        ) {
            (Some(charge), Some(rt), Some(precursor_mz)) => rows.push(PrecursorRow {
                modified_peptide,
                charge: charge as i32,
                rt,
                precursor_mz,
            }),
            _ => log::debug!("skipping precursor row with non-numeric fields"),
        }
    }
    Ok(rows)
}

/// Read the set of modified sequences present in a DiaNN report
pub fn read_modified_sequences<P: AsRef<Path>>(path: P) -> Result<HashSet<String>, TableError> {
    let mut reader = tsv_reader(path)?;
    let index = column(reader.headers()?, "Modified.Sequence")?;

    let mut sequences = HashSet::new();
    for row in reader.records() {
        let row = row?;
        if let Some(sequence) = row.get(index) {
            if !sequence.is_empty() {
                sequences.insert(sequence.to_string());
            }
        }
    }
    Ok(sequences)
}

fn tsv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<BufReader<File>>, TableError> {
    let file = File::open(path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .has_headers(true)
        .from_reader(BufReader::new(file)))
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize, TableError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| TableError::MissingColumn(name.to_string()))
}

fn parse_f64(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse().ok()
}

fn parse_i64(cell: Option<&str>) -> Option<i64> {
    cell?.trim().parse().ok()
}
