//! Streaming mzML scan-record extraction using quick-xml
//!
//! This module provides a pull-based streaming parser for mzML files,
//! designed to handle arbitrarily large files with minimal memory usage.
//! Peak arrays are skipped unread; only the per-spectrum scalars needed for
//! QC summaries are collected.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use super::cv_params::{CvParam, MS_CV_ACCESSIONS};
use super::models::{Precursor, ScanRecord, Spectrum};

/// Name of the userParam that marks a demultiplexed acquisition
pub const DEMULTIPLEXING_USER_PARAM: &str = "PRISM Demultiplexing";

/// Errors that can occur during mzML parsing
#[derive(Debug, thiserror::Error)]
pub enum MzMLError {
    /// XML syntax error from quick-xml
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Well-formed XML that is not a usable mzML document
    #[error("Invalid mzML structure: {0}")]
    InvalidStructure(String),

    /// Attribute bytes that are not valid UTF-8
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

/// Scan for the demultiplexing userParam in a raw mzML document.
///
/// This is an independent pass over the whole document, short-circuiting on
/// the first match. The flag it returns is stamped on every record the main
/// extraction pass emits.
pub fn detect_demultiplexing<R: BufRead>(reader: R) -> Result<bool, MzMLError> {
    let mut xml_reader = Reader::from_reader(reader);
    xml_reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.name().as_ref() == b"userParam"
                    && get_attribute(e, "name")?.as_deref() == Some(DEMULTIPLEXING_USER_PARAM)
                {
                    return Ok(true);
                }
            }
            Ok(Event::Eof) => return Ok(false),
            Err(e) => return Err(MzMLError::XmlError(e)),
            _ => {}
        }
        buf.clear();
    }
}

/// Streaming scan-record extractor for mzML files.
///
/// Produces a lazy, forward-only sequence of [`ScanRecord`]s: one MS2-role
/// record per spectrum carrying a precursor description, one MS1-role record
/// per spectrum with MS level 1 (a spectrum can yield both, MS2 first).
pub struct ScanRecordStreamer<R: BufRead> {
    reader: Reader<R>,
    demultiplexed: bool,
    started: bool,
    in_spectrum_list: bool,
    pending: Option<ScanRecord>,
}

impl ScanRecordStreamer<BufReader<File>> {
    /// Open an mzML file, running the demultiplexing pre-pass first
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let flag_reader = BufReader::with_capacity(64 * 1024, File::open(path.as_ref())?);
        let demultiplexed = detect_demultiplexing(flag_reader)?;

        let reader = BufReader::with_capacity(64 * 1024, File::open(path.as_ref())?);
        Self::new(reader, demultiplexed)
    }
}

impl<R: BufRead> ScanRecordStreamer<R> {
    /// Create a streamer from a BufRead source with a pre-computed flag.
    ///
    /// Use [`detect_demultiplexing`] on a second handle of the same document
    /// to obtain the flag; [`ScanRecordStreamer::open`] does both for files.
    pub fn new(reader: R, demultiplexed: bool) -> Result<Self, MzMLError> {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);

        Ok(Self {
            reader: xml_reader,
            demultiplexed,
            started: false,
            in_spectrum_list: false,
            pending: None,
        })
    }

    /// File-level demultiplexing flag stamped on every record
    pub fn demultiplexed(&self) -> bool {
        self.demultiplexed
    }

    /// Read the next scan record from the stream
    pub fn next_record(&mut self) -> Result<Option<ScanRecord>, MzMLError> {
        if let Some(record) = self.pending.take() {
            return Ok(Some(record));
        }

        loop {
            match self.next_spectrum()? {
                Some(spectrum) => {
                    let mut records =
                        scan_records(&spectrum, self.demultiplexed)?.into_iter();
                    if let Some(first) = records.next() {
                        self.pending = records.next();
                        return Ok(Some(first));
                    }
                }
                None => return Ok(None),
            }
        }
    }

    /// Iterate over all scan records
    pub fn records(self) -> ScanRecordIterator<R> {
        ScanRecordIterator { streamer: self }
    }

    /// Advance to the spectrumList element, skipping file-level metadata
    fn seek_spectrum_list(&mut self) -> Result<(), MzMLError> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if e.name().as_ref() == b"spectrumList" {
                        self.in_spectrum_list = true;
                        break;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Read the next spectrum from the stream
    fn next_spectrum(&mut self) -> Result<Option<Spectrum>, MzMLError> {
        if !self.started {
            self.started = true;
            self.seek_spectrum_list()?;
        }
        if !self.in_spectrum_list {
            return Ok(None);
        }

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if e.name().as_ref() == b"spectrum" {
                        return Ok(Some(self.parse_spectrum(&e)?));
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"spectrumList" {
                        self.in_spectrum_list = false;
                        return Ok(None);
                    }
                }
                Ok(Event::Eof) => return Ok(None),
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Parse a single spectrum element into the scalar fields we keep
    fn parse_spectrum(&mut self, start_event: &BytesStart) -> Result<Spectrum, MzMLError> {
        let mut spectrum = Spectrum {
            id: get_attribute(start_event, "id")?.unwrap_or_default(),
            ..Default::default()
        };

        let mut depth = 1;
        let mut in_precursor = false;
        // Only the first precursor element is captured; later ones parse into
        // None and are dropped.
        let mut current_precursor: Option<Precursor> = None;
        let mut buf = Vec::new();
        let mut skip_buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if e.name().as_ref() == b"binaryDataArrayList" {
                        // Peak data is never needed; skip it wholesale so the
                        // working set stays bounded on arbitrarily large files.
                        self.reader
                            .read_to_end_into(QName(b"binaryDataArrayList"), &mut skip_buf)?;
                        skip_buf.clear();
                    } else {
                        depth += 1;
                        match e.name().as_ref() {
                            b"cvParam" => {
                                let cv_param = parse_cv_param(e)?;
                                Self::apply_cv_param(
                                    &mut spectrum,
                                    current_precursor.as_mut(),
                                    in_precursor,
                                    &cv_param,
                                );
                            }
                            b"precursor" => {
                                in_precursor = true;
                                if spectrum.precursor.is_none() {
                                    current_precursor = Some(Precursor::default());
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"cvParam" {
                        let cv_param = parse_cv_param(e)?;
                        Self::apply_cv_param(
                            &mut spectrum,
                            current_precursor.as_mut(),
                            in_precursor,
                            &cv_param,
                        );
                    }
                }
                Ok(Event::End(ref e)) => {
                    depth -= 1;
                    match e.name().as_ref() {
                        b"spectrum" if depth == 0 => break,
                        b"precursor" => {
                            in_precursor = false;
                            if let Some(precursor) = current_precursor.take() {
                                if spectrum.precursor.is_none() {
                                    spectrum.precursor = Some(precursor);
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(format!(
                        "unexpected EOF in spectrum '{}'",
                        spectrum.id
                    )));
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(spectrum)
    }

    /// Route a cvParam to the spectrum or the current precursor.
    ///
    /// The first occurrence of each accession wins, matching reads of the
    /// leading scan and selected-ion entries.
    fn apply_cv_param(
        spectrum: &mut Spectrum,
        current_precursor: Option<&mut Precursor>,
        in_precursor: bool,
        cv: &CvParam,
    ) {
        if in_precursor {
            if let Some(precursor) = current_precursor {
                Self::apply_precursor_cv_param(precursor, cv);
            }
            return;
        }

        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::MS_LEVEL => {
                if spectrum.ms_level.is_none() {
                    spectrum.ms_level = cv.value_as_i64().map(|v| v as u8);
                }
            }
            MS_CV_ACCESSIONS::SCAN_START_TIME => {
                if spectrum.retention_time.is_none() {
                    spectrum.retention_time = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::ION_INJECTION_TIME => {
                if spectrum.injection_time.is_none() {
                    spectrum.injection_time = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::TOTAL_ION_CURRENT => {
                if spectrum.total_ion_current.is_none() {
                    spectrum.total_ion_current = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::BASE_PEAK_MZ => {
                if spectrum.base_peak_mz.is_none() {
                    spectrum.base_peak_mz = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::BASE_PEAK_INTENSITY => {
                if spectrum.base_peak_intensity.is_none() {
                    spectrum.base_peak_intensity = cv.value_as_f64();
                }
            }
            _ => {}
        }
    }

    /// Apply a cvParam inside a precursor element
    fn apply_precursor_cv_param(precursor: &mut Precursor, cv: &CvParam) {
        match cv.accession.as_str() {
            MS_CV_ACCESSIONS::ISOLATION_WINDOW_TARGET_MZ => {
                if precursor.isolation_window_target.is_none() {
                    precursor.isolation_window_target = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::ISOLATION_WINDOW_LOWER_OFFSET => {
                if precursor.isolation_window_lower.is_none() {
                    precursor.isolation_window_lower = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::ISOLATION_WINDOW_UPPER_OFFSET => {
                if precursor.isolation_window_upper.is_none() {
                    precursor.isolation_window_upper = cv.value_as_f64();
                }
            }
            MS_CV_ACCESSIONS::SELECTED_ION_MZ => {
                if precursor.selected_ion_mz.is_none() {
                    precursor.selected_ion_mz = cv.value_as_f64();
                }
            }
            _ => {}
        }
    }
}

/// Convert one parsed spectrum into its scan records (0, 1, or 2)
fn scan_records(spectrum: &Spectrum, demultiplexed: bool) -> Result<Vec<ScanRecord>, MzMLError> {
    let emits_ms2 = spectrum.precursor.is_some();
    let emits_ms1 = spectrum.ms_level == Some(1);
    if !emits_ms2 && !emits_ms1 {
        return Ok(Vec::new());
    }

    let retention_time = spectrum.retention_time.ok_or_else(|| {
        MzMLError::InvalidStructure(format!(
            "spectrum '{}' has no scan start time",
            spectrum.id
        ))
    })?;

    let mut records = Vec::with_capacity(2);
    if let Some(precursor) = &spectrum.precursor {
        records.push(ScanRecord::ms2(
            retention_time,
            demultiplexed,
            precursor.selected_ion_mz,
            precursor.isolation_window_target,
            precursor.isolation_window_upper,
            precursor.isolation_window_lower,
            spectrum.injection_time,
        ));
    }
    if emits_ms1 {
        records.push(ScanRecord::ms1(
            retention_time,
            demultiplexed,
            spectrum.base_peak_mz,
            spectrum.base_peak_intensity,
            spectrum.total_ion_current,
        ));
    }

    Ok(records)
}

/// Iterator over scan records in an mzML file
pub struct ScanRecordIterator<R: BufRead> {
    streamer: ScanRecordStreamer<R>,
}

impl<R: BufRead> Iterator for ScanRecordIterator<R> {
    type Item = Result<ScanRecord, MzMLError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.streamer.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Helper function to get an attribute value from a BytesStart
fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzMLError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzMLError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Parse a cvParam element
fn parse_cv_param(e: &BytesStart) -> Result<CvParam, MzMLError> {
    Ok(CvParam {
        accession: get_attribute(e, "accession")?.unwrap_or_default(),
        name: get_attribute(e, "name")?.unwrap_or_default(),
        value: get_attribute(e, "value")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QC_MZML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <dataProcessingList count="1">
    <dataProcessing id="pwiz_conversion">
      <processingMethod order="0" softwareRef="pwiz">
        <userParam name="Conversion to mzML" value=""/>
      </processingMethod>
    </dataProcessing>
  </dataProcessingList>
  <run id="qc_run">
    <spectrumList count="2" defaultDataProcessingRef="pwiz_conversion">
      <spectrum index="0" id="scan=1" defaultArrayLength="2">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000504" name="base peak m/z" value="445.12"/>
        <cvParam cvRef="MS" accession="MS:1000505" name="base peak intensity" value="12000000"/>
        <cvParam cvRef="MS" accession="MS:1000285" name="total ion current" value="340000000"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="0.5021" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
          </scan>
        </scanList>
        <binaryDataArrayList count="2">
          <binaryDataArray encodedLength="24">
            <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
            <binary>AAAAAAAAWUAAAAAAAABpQA==</binary>
          </binaryDataArray>
          <binaryDataArray encodedLength="12">
            <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
            <binary>AADIQgAASEM=</binary>
          </binaryDataArray>
        </binaryDataArrayList>
      </spectrum>
      <spectrum index="1" id="scan=2" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="0.5102" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
            <cvParam cvRef="MS" accession="MS:1000927" name="ion injection time" value="22.0" unitCvRef="UO" unitAccession="UO:0000028" unitName="millisecond"/>
          </scan>
        </scanList>
        <precursorList count="1">
          <precursor spectrumRef="scan=1">
            <isolationWindow>
              <cvParam cvRef="MS" accession="MS:1000827" name="isolation window target m/z" value="500.0"/>
              <cvParam cvRef="MS" accession="MS:1000828" name="isolation window lower offset" value="12.5"/>
              <cvParam cvRef="MS" accession="MS:1000829" name="isolation window upper offset" value="12.5"/>
            </isolationWindow>
            <selectedIonList count="1">
              <selectedIon>
                <cvParam cvRef="MS" accession="MS:1000744" name="selected ion m/z" value="500.27"/>
              </selectedIon>
            </selectedIonList>
            <activation>
              <cvParam cvRef="MS" accession="MS:1000422" name="beam-type collision-induced dissociation"/>
            </activation>
          </precursor>
        </precursorList>
      </spectrum>
    </spectrumList>
  </run>
</mzML>"#;

    const DEMUX_MZML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <dataProcessingList count="1">
    <dataProcessing id="demultiplexing">
      <processingMethod order="0" softwareRef="prism">
        <userParam name="PRISM Demultiplexing" value="true"/>
      </processingMethod>
    </dataProcessing>
  </dataProcessingList>
  <run id="demux_run">
    <spectrumList count="1">
      <spectrum index="0" id="scan=1" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="1.25"/>
          </scan>
        </scanList>
        <precursorList count="1">
          <precursor>
            <isolationWindow>
              <cvParam cvRef="MS" accession="MS:1000827" name="isolation window target m/z" value="600.0"/>
              <cvParam cvRef="MS" accession="MS:1000828" name="isolation window lower offset" value="2.0"/>
              <cvParam cvRef="MS" accession="MS:1000829" name="isolation window upper offset" value="2.0"/>
            </isolationWindow>
          </precursor>
        </precursorList>
      </spectrum>
    </spectrumList>
  </run>
</mzML>"#;

    const BOTH_ROLES_MZML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="both_roles">
    <spectrumList count="1">
      <spectrum index="0" id="scan=1" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000504" name="base peak m/z" value="400.0"/>
        <scanList count="1">
          <scan>
            <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="3.5"/>
            <cvParam cvRef="MS" accession="MS:1000927" name="ion injection time" value="50.0"/>
          </scan>
        </scanList>
        <precursorList count="1">
          <precursor>
            <selectedIonList count="1">
              <selectedIon>
                <cvParam cvRef="MS" accession="MS:1000744" name="selected ion m/z" value="420.5"/>
              </selectedIon>
            </selectedIonList>
          </precursor>
        </precursorList>
      </spectrum>
    </spectrumList>
  </run>
</mzML>"#;

    const TRUNCATED_MZML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0">
  <run id="truncated">
    <spectrumList count="5">
      <spectrum index="0" id="scan=1" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>"#;

    fn collect_records(xml: &str) -> Vec<ScanRecord> {
        let demultiplexed = detect_demultiplexing(Cursor::new(xml.as_bytes())).unwrap();
        let streamer =
            ScanRecordStreamer::new(Cursor::new(xml.as_bytes()), demultiplexed).unwrap();
        streamer.records().collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_extracts_records_in_document_order() {
        let records = collect_records(QC_MZML);
        assert_eq!(records.len(), 2);

        let ms1 = &records[0];
        assert_eq!(ms1.ms_level, 1);
        assert!((ms1.retention_time - 0.5021).abs() < 1e-9);
        assert_eq!(ms1.base_peak_mz, Some(445.12));
        assert_eq!(ms1.base_peak_intensity, Some(12_000_000.0));
        assert_eq!(ms1.total_ion_current, Some(340_000_000.0));
        assert_eq!(ms1.precursor_mz, None);
        assert_eq!(ms1.injection_time, None);
        assert!(!ms1.demultiplexed);

        let ms2 = &records[1];
        assert_eq!(ms2.ms_level, 2);
        assert!((ms2.retention_time - 0.5102).abs() < 1e-9);
        assert_eq!(ms2.precursor_mz, Some(500.27));
        assert_eq!(ms2.isolation_window_target, Some(500.0));
        assert_eq!(ms2.isolation_window_upper_offset, Some(12.5));
        assert_eq!(ms2.isolation_window_lower_offset, Some(12.5));
        assert_eq!(ms2.injection_time, Some(22.0));
        assert_eq!(ms2.base_peak_mz, None);
        assert!(!ms2.demultiplexed);
    }

    #[test]
    fn test_demultiplexing_detection() {
        assert!(detect_demultiplexing(Cursor::new(DEMUX_MZML.as_bytes())).unwrap());
        assert!(!detect_demultiplexing(Cursor::new(QC_MZML.as_bytes())).unwrap());
    }

    #[test]
    fn test_demultiplexing_flag_stamped_on_every_record() {
        let records = collect_records(DEMUX_MZML);
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.demultiplexed));
        assert_eq!(records[0].isolation_window_target, Some(600.0));
    }

    #[test]
    fn test_spectrum_with_both_roles_yields_two_records() {
        let records = collect_records(BOTH_ROLES_MZML);
        assert_eq!(records.len(), 2);

        // MS2 record first, and injection time belongs to it alone
        assert_eq!(records[0].ms_level, 2);
        assert_eq!(records[0].precursor_mz, Some(420.5));
        assert_eq!(records[0].injection_time, Some(50.0));
        assert_eq!(records[1].ms_level, 1);
        assert_eq!(records[1].base_peak_mz, Some(400.0));
        assert_eq!(records[1].injection_time, None);
        assert_eq!(records[0].retention_time, records[1].retention_time);
    }

    #[test]
    fn test_truncated_document_fails() {
        let mut streamer =
            ScanRecordStreamer::new(Cursor::new(TRUNCATED_MZML.as_bytes()), false).unwrap();
        let err = streamer.next_record().unwrap_err();
        assert!(matches!(err, MzMLError::InvalidStructure(_)));
    }

    #[test]
    fn test_spectrum_without_roles_is_skipped() {
        // MS3 spectrum without precursor description: no record
        let xml = r#"<mzML><run id="r"><spectrumList count="1">
          <spectrum index="0" id="scan=1">
            <cvParam accession="MS:1000511" name="ms level" value="3"/>
          </spectrum>
        </spectrumList></run></mzML>"#;
        let mut streamer = ScanRecordStreamer::new(Cursor::new(xml.as_bytes()), false).unwrap();
        assert!(streamer.next_record().unwrap().is_none());
    }
}
