//! mzIdentML identification parsing
//!
//! Reads `SpectrumIdentificationResult` / `SpectrumIdentificationItem` pairs
//! from an mzIdentML document: each retained item carries its result's scan
//! start time together with the item's charge state and experimental m/z.
//! Items are kept only when their q-value beats the confidence threshold and
//! their result carries a retention time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Default q-value cutoff: items at or above it are discarded
pub const DEFAULT_Q_VALUE_THRESHOLD: f64 = 0.01;

/// CV accession of the q-value score (MS-GF:QValue)
pub const Q_VALUE_ACCESSION: &str = "MS:1002054";

/// Errors that can occur reading identification documents
#[derive(Debug, thiserror::Error)]
pub enum MzIdError {
    /// XML syntax error from quick-xml
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Well-formed XML that is not a usable mzIdentML document
    #[error("Invalid mzIdentML structure: {0}")]
    InvalidStructure(String),

    /// Attribute bytes that are not valid UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Identification summary text that cannot be read
    #[error("Invalid summary file: {0}")]
    InvalidSummary(String),
}

/// One confidently identified spectrum item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentifiedItem {
    /// Scan start time of the parent identification result, in minutes
    pub retention_time: f64,
    /// Charge state reported on the item
    pub charge: i32,
    /// Experimental mass-to-charge reported on the item
    pub mz: f64,
}

/// An item awaiting its parent result's retention time
struct PendingItem {
    charge: Option<i32>,
    mz: Option<f64>,
    q_value: Option<f64>,
}

/// Read confident identifications from an mzIdentML file
pub fn read_identifications<P: AsRef<Path>>(
    path: P,
    q_threshold: f64,
) -> Result<Vec<IdentifiedItem>, MzIdError> {
    let file = File::open(path)?;
    read_identifications_from(BufReader::with_capacity(64 * 1024, file), q_threshold)
}

/// Read confident identifications from a reader
pub fn read_identifications_from<R: BufRead>(
    reader: R,
    q_threshold: f64,
) -> Result<Vec<IdentifiedItem>, MzIdError> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_result = false;
    let mut in_item = false;
    let mut result_rt: Option<f64> = None;
    let mut pending: Vec<PendingItem> = Vec::new();

    let mut buf = Vec::new();
    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"SpectrumIdentificationResult" => {
                    in_result = true;
                    result_rt = None;
                    pending.clear();
                }
                b"SpectrumIdentificationItem" if in_result => {
                    in_item = true;
                    pending.push(pending_item(e)?);
                }
                b"cvParam" if in_result => {
                    apply_cv_param(e, in_item, &mut result_rt, pending.last_mut())?;
                }
                _ => {}
            },
            // An empty item has no q-value child, so it never passes the filter
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"SpectrumIdentificationItem" if in_result => {
                    pending.push(pending_item(e)?);
                }
                b"cvParam" if in_result => {
                    apply_cv_param(e, in_item, &mut result_rt, pending.last_mut())?;
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"SpectrumIdentificationItem" => in_item = false,
                b"SpectrumIdentificationResult" => {
                    if let Some(retention_time) = result_rt {
                        for item in pending.drain(..) {
                            if let (Some(q), Some(charge), Some(mz)) =
                                (item.q_value, item.charge, item.mz)
                            {
                                if q < q_threshold {
                                    items.push(IdentifiedItem {
                                        retention_time,
                                        charge,
                                        mz,
                                    });
                                }
                            }
                        }
                    }
                    in_result = false;
                    in_item = false;
                }
                _ => {}
            },
            Ok(Event::Eof) => {
                if in_result {
                    return Err(MzIdError::InvalidStructure(
                        "unexpected EOF in SpectrumIdentificationResult".to_string(),
                    ));
                }
                break;
            }
            Err(e) => return Err(MzIdError::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn pending_item(e: &BytesStart) -> Result<PendingItem, MzIdError> {
    Ok(PendingItem {
        charge: get_attribute(e, "chargeState")?.and_then(|v| v.parse().ok()),
        mz: get_attribute(e, "experimentalMassToCharge")?.and_then(|v| v.parse().ok()),
        q_value: None,
    })
}

/// Route one cvParam to the result's retention time and the current item's
/// q-value. The retention time is the first "scan start time" anywhere in
/// the result subtree, item children included.
fn apply_cv_param(
    e: &BytesStart,
    in_item: bool,
    result_rt: &mut Option<f64>,
    current_item: Option<&mut PendingItem>,
) -> Result<(), MzIdError> {
    if result_rt.is_none() && get_attribute(e, "name")?.as_deref() == Some("scan start time") {
        *result_rt = get_attribute(e, "value")?.and_then(|v| v.parse().ok());
    }

    if in_item {
        if let Some(item) = current_item {
            if item.q_value.is_none()
                && get_attribute(e, "accession")?.as_deref() == Some(Q_VALUE_ACCESSION)
            {
                item.q_value = get_attribute(e, "value")?.and_then(|v| v.parse().ok());
            }
        }
    }
    Ok(())
}

/// Read the identified-sequence count from an `.mzidsummary.txt` file.
///
/// The count is the first whitespace-separated token of the second line.
/// Files with fewer than two lines yield `None`.
pub fn read_summary_count<P: AsRef<Path>>(path: P) -> Result<Option<i64>, MzIdError> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();
    let _header = lines.next();

    let line = match lines.next() {
        Some(line) => line,
        None => return Ok(None),
    };

    let token = line.split_whitespace().next().ok_or_else(|| {
        MzIdError::InvalidSummary("second line carries no count".to_string())
    })?;
    let count = token.parse().map_err(|_| {
        MzIdError::InvalidSummary(format!("non-numeric count '{}'", token))
    })?;
    Ok(Some(count))
}

/// Helper function to get an attribute value from a BytesStart
fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzIdError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzIdError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}
