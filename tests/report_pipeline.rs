//! Integration tests for mzReport
//!
//! These tests verify the full pipeline from mzML parsing through feature
//! tables, run summaries, and PDF report assembly.

use std::fmt::Write as _;
use std::fs;

use mzreport::chart::{bar_image, grouped_bar_image, scatter_image, ScatterStyle, REPORT_CHART_SIZE};
use mzreport::classify::{classify, AcquisitionKind};
use mzreport::features::{read_scan_records, write_scan_records, write_window_table, FeatureWriter};
use mzreport::mzml::{ScanRecord, ScanRecordStreamer};
use mzreport::report::{dia_report_lines, write_comparison_report, write_qc_report};
use mzreport::summary::summarize;
use tempfile::tempdir;

const WINDOW_TARGETS: [f64; 4] = [437.5, 462.5, 487.5, 512.5];

/// Render a small DIA-style acquisition: each cycle is one MS1 survey scan
/// followed by one MS2 scan per isolation window.
fn dia_mzml(cycles: usize, demultiplexed: bool) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <mzML xmlns=\"http://psi.hupo.org/ms/mzml\" version=\"1.1.0\">\n",
    );
    if demultiplexed {
        xml.push_str(
            "  <dataProcessingList count=\"1\">\n\
             \x20   <dataProcessing id=\"demultiplexing\">\n\
             \x20     <processingMethod order=\"0\" softwareRef=\"prism\">\n\
             \x20       <userParam name=\"PRISM Demultiplexing\" value=\"true\"/>\n\
             \x20     </processingMethod>\n\
             \x20   </dataProcessing>\n\
             \x20 </dataProcessingList>\n",
        );
    }
    xml.push_str("  <run id=\"synthetic\">\n");
    writeln!(
        xml,
        "    <spectrumList count=\"{}\">",
        cycles * (1 + WINDOW_TARGETS.len())
    )
    .unwrap();

    let mut index = 0usize;
    for cycle in 0..cycles {
        let survey_rt = cycle as f64 + 0.1;
        writeln!(
            xml,
            r#"      <spectrum index="{index}" id="scan={id}" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="1"/>
        <cvParam cvRef="MS" accession="MS:1000504" name="base peak m/z" value="445.12"/>
        <cvParam cvRef="MS" accession="MS:1000505" name="base peak intensity" value="12000000"/>
        <cvParam cvRef="MS" accession="MS:1000285" name="total ion current" value="340000000"/>
        <scanList count="1"><scan>
          <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{survey_rt}"/>
        </scan></scanList>
      </spectrum>"#,
            id = index + 1,
        )
        .unwrap();
        index += 1;

        for (w, target) in WINDOW_TARGETS.iter().enumerate() {
            let rt = survey_rt + 0.1 * (w + 1) as f64;
            writeln!(
                xml,
                r#"      <spectrum index="{index}" id="scan={id}" defaultArrayLength="0">
        <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
        <scanList count="1"><scan>
          <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="{rt}"/>
          <cvParam cvRef="MS" accession="MS:1000927" name="ion injection time" value="22.0"/>
        </scan></scanList>
        <precursorList count="1"><precursor>
          <isolationWindow>
            <cvParam cvRef="MS" accession="MS:1000827" name="isolation window target m/z" value="{target}"/>
            <cvParam cvRef="MS" accession="MS:1000828" name="isolation window lower offset" value="12.5"/>
            <cvParam cvRef="MS" accession="MS:1000829" name="isolation window upper offset" value="12.5"/>
          </isolationWindow>
          <selectedIonList count="1"><selectedIon>
            <cvParam cvRef="MS" accession="MS:1000744" name="selected ion m/z" value="{mz}"/>
          </selectedIon></selectedIonList>
        </precursor></precursorList>
      </spectrum>"#,
                id = index + 1,
                mz = target + 0.27,
            )
            .unwrap();
            index += 1;
        }
    }

    xml.push_str("    </spectrumList>\n  </run>\n</mzML>\n");
    xml
}

/// Test the complete extract-summarize-report cycle on a synthetic run
#[test]
fn test_mzml_to_feature_table_to_report() {
    let dir = tempdir().unwrap();
    let mzml_path = dir.path().join("synthetic.mzML");
    let csv_path = dir.path().join("synthetic.features.csv");
    let pdf_path = dir.path().join("synthetic.pdf");
    let table_path = dir.path().join("synthetic.windows.csv");

    fs::write(&mzml_path, dia_mzml(3, false)).unwrap();

    // Extract scan records to the feature table
    let mut streamer = ScanRecordStreamer::open(&mzml_path).unwrap();
    assert!(!streamer.demultiplexed());
    let mut writer = FeatureWriter::create(&csv_path).unwrap();
    let mut written = Vec::new();
    while let Some(record) = streamer.next_record().unwrap() {
        writer.write(&record).unwrap();
        written.push(record);
    }
    writer.finish().unwrap();
    assert_eq!(written.len(), 15);

    // The table reads back exactly what the streamer produced
    let records = read_scan_records(&csv_path).unwrap();
    assert_eq!(records, written);

    // Summarize
    let summary = summarize(&records);
    assert_eq!(summary.ms1_scans, 3);
    assert_eq!(summary.msn_scans, 12);
    assert_eq!(summary.windows.num_windows, 4);
    assert_eq!(summary.windows.size_summary(), "25.0 for 4 windows");
    let stats = summary.injection.unwrap();
    assert!((stats.mean - 22.0).abs() < 1e-9);

    // Report lines
    let lines = dia_report_lines(&summary, 4182);
    assert_eq!(lines[0], "DIA sample.");
    assert_eq!(lines[1], "Number of distinct isolation windows used: 4");
    assert_eq!(lines[2], "Detailed Window Size: 25.0 for 4 windows");
    assert_eq!(lines[4], "Average Injection Time: 22.00 ms");
    assert_eq!(lines[7], "Precursors Identified: 4182");
    assert_eq!(lines[10], "Number of MS/MS scans: 12");

    // Scatter chart from the fragmentation records
    let points: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| r.precursor_mz.map(|mz| (r.retention_time, mz)))
        .collect();
    assert_eq!(points.len(), 12);
    let chart = scatter_image(
        "RetentionTime and m/z (All Features)",
        "RetentionTime",
        "m/z",
        &points,
        ScatterStyle::Dense,
        REPORT_CHART_SIZE,
    )
    .unwrap();

    write_qc_report(&pdf_path, "DIA QC Report", &lines, &[chart]).unwrap();
    let pdf = fs::read(&pdf_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    // Window table, one row per target in ascending target order
    write_window_table(&table_path, &summary.windows).unwrap();
    let table = fs::read_to_string(&table_path).unwrap();
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0], "Target,Upper Window,Lower Window,Window Size");
    assert_eq!(rows[1], "437.5,12.5,12.5,25.0");
    assert_eq!(rows[4], "512.5,12.5,12.5,25.0");
}

/// Test that the demultiplexing marker flows from the file header into the
/// corrected window census and the report text
#[test]
fn test_demultiplexing_correction_flows_through() {
    let dir = tempdir().unwrap();
    let mzml_path = dir.path().join("demux.mzML");
    fs::write(&mzml_path, dia_mzml(3, true)).unwrap();

    let streamer = ScanRecordStreamer::open(&mzml_path).unwrap();
    assert!(streamer.demultiplexed());
    let records: Vec<ScanRecord> = streamer.records().collect::<Result<_, _>>().unwrap();
    assert!(records.iter().all(|r| r.demultiplexed));

    let summary = summarize(&records);
    // 4 raw targets shrink to (4 - 2) / 2 = 1 corrected window
    assert_eq!(summary.windows.num_windows, 1);
    assert_eq!(summary.windows.size_summary(), "25.0 for 1 windows");
    // Per-target detail stays raw
    assert_eq!(summary.windows.windows.len(), 4);

    let lines = dia_report_lines(&summary, 0);
    assert_eq!(
        lines[0],
        "DIA sample using overlapping windows and demultiplexing after."
    );
    assert_eq!(lines[1], "Number of distinct isolation windows used: 1");
}

/// Test classification straight from a written-and-reread feature table
#[test]
fn test_classification_from_feature_table() {
    let dir = tempdir().unwrap();

    // DIA: 4 targets repeating over 240 records
    let dia: Vec<ScanRecord> = (0..240)
        .map(|i| {
            let target = WINDOW_TARGETS[i % WINDOW_TARGETS.len()];
            ScanRecord::ms2(
                i as f64 * 0.01,
                false,
                Some(target),
                Some(target),
                Some(12.5),
                Some(12.5),
                None,
            )
        })
        .collect();
    let dia_path = dir.path().join("dia.features.csv");
    write_scan_records(&dia_path, &dia).unwrap();
    let read_back = read_scan_records(&dia_path).unwrap();
    assert_eq!(classify(&read_back), Some(AcquisitionKind::Dia));

    // DDA: every target distinct
    let dda: Vec<ScanRecord> = (0..100)
        .map(|i| {
            ScanRecord::ms2(
                i as f64 * 0.01,
                false,
                Some(400.0 + i as f64),
                Some(400.0 + i as f64),
                Some(0.35),
                Some(0.35),
                None,
            )
        })
        .collect();
    let dda_path = dir.path().join("dda.features.csv");
    write_scan_records(&dda_path, &dda).unwrap();
    let read_back = read_scan_records(&dda_path).unwrap();
    assert_eq!(classify(&read_back), Some(AcquisitionKind::Dda));
}

/// Test the multi-page comparison report assembly
#[test]
fn test_comparison_report_assembly() {
    let dir = tempdir().unwrap();
    let pdf_path = dir.path().join("AnalysisReport.pdf");

    let scan_chart = grouped_bar_image(
        "Average MS1 and MSMS Spectra for each sample",
        "Samples",
        "Average Count",
        &[
            ("sample_a".to_string(), 1200.0, 24000.0),
            ("sample_b".to_string(), 1100.0, 26000.0),
        ],
        REPORT_CHART_SIZE,
    )
    .unwrap();
    let precursor_chart = bar_image(
        "Identified Precursors comparison between samples",
        "Samples",
        "Identified Precursors",
        &[
            ("sample_a".to_string(), 41000.0),
            ("sample_b".to_string(), 43500.0),
        ],
        REPORT_CHART_SIZE,
    )
    .unwrap();

    write_comparison_report(&pdf_path, "Sample Comparison", &[scan_chart, precursor_chart])
        .unwrap();

    let pdf = fs::read(&pdf_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    // One page per chart
    assert!(String::from_utf8_lossy(&pdf).contains("/Count 2"));
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn target_record(target: f64, demultiplexed: bool) -> ScanRecord {
        ScanRecord::ms2(
            1.0,
            demultiplexed,
            Some(target),
            Some(target),
            Some(12.5),
            Some(12.5),
            None,
        )
    }

    proptest! {
        /// Injection statistics stay within the observed value range
        #[test]
        fn prop_injection_stats_bounded(times in prop::collection::vec(1.0f64..500.0, 1..64)) {
            let records: Vec<ScanRecord> = times
                .iter()
                .map(|&t| ScanRecord::ms2(1.0, false, Some(500.0), None, None, None, Some(t)))
                .collect();
            let stats = summarize(&records).injection.unwrap();

            let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(stats.mean >= min - 1e-9);
            prop_assert!(stats.mean <= max + 1e-9);
            prop_assert!(stats.median >= min);
            prop_assert!(stats.median <= max);
        }

        /// The uncorrected window census counts distinct targets exactly
        #[test]
        fn prop_window_census_counts_distinct_targets(
            targets in prop::collection::vec(100u32..2000, 1..256),
        ) {
            let records: Vec<ScanRecord> = targets
                .iter()
                .map(|&t| target_record(f64::from(t), false))
                .collect();
            let distinct: HashSet<u32> = targets.iter().copied().collect();

            let summary = summarize(&records);
            prop_assert_eq!(summary.windows.num_windows, distinct.len());
            prop_assert_eq!(
                summary.windows.size_counts.values().sum::<usize>(),
                distinct.len()
            );
        }

        /// The demultiplexing correction never grows the window count, and
        /// never empties a histogram bucket
        #[test]
        fn prop_demux_correction_shrinks(
            targets in prop::collection::vec(100u32..2000, 1..256),
        ) {
            let raw: Vec<ScanRecord> = targets
                .iter()
                .map(|&t| target_record(f64::from(t), false))
                .collect();
            let demuxed: Vec<ScanRecord> = targets
                .iter()
                .map(|&t| target_record(f64::from(t), true))
                .collect();

            let raw_summary = summarize(&raw);
            let demux_summary = summarize(&demuxed);
            prop_assert!(demux_summary.windows.num_windows <= raw_summary.windows.num_windows);
            for count in demux_summary.windows.size_counts.values() {
                prop_assert!(*count >= 1);
            }
        }

        /// A run whose targets never repeat always classifies as DDA
        #[test]
        fn prop_unique_targets_are_dda(n in 1usize..300) {
            let records: Vec<ScanRecord> = (0..n)
                .map(|i| target_record(400.0 + i as f64, false))
                .collect();
            prop_assert_eq!(classify(&records), Some(AcquisitionKind::Dda));
        }
    }
}
