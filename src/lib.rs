//! # mzReport - Acquisition QC for Mass-Spectrometry Runs
//!
//! `mzreport` summarizes mass-spectrometry acquisitions and assembles the QC
//! documents reviewed after every run: per-scan feature tables, DIA/DDA run
//! statistics, scatter and bar charts, and multi-page PDF reports.
//!
//! ## Key Features
//!
//! - **Streaming mzML Parser**: Pulls one scan record per spectrum (precursor,
//!   isolation window, injection time, TIC) out of arbitrarily large runs
//!   without decoding peak arrays.
//!
//! - **Run Summaries**: Scan tallies, an isolation-window census with
//!   double-count correction for overlapping DIA schemes, and injection-time
//!   statistics from a single pass over the records.
//!
//! - **DIA/DDA Classification**: Decides the acquisition mode from how often
//!   isolation-window targets repeat across the run.
//!
//! - **Identification Parsing**: q-value-filtered spectrum identifications
//!   from mzIdentML, plus precursor counts and FWHM values from DiaNN stats
//!   and report tables.
//!
//! - **Report Assembly**: Feature-cloud scatter charts, cross-sample bar
//!   charts, and letter/A4 PDF pages rendered in-process, no external
//!   plotting runtime required.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mzreport::features::FeatureWriter;
//! use mzreport::mzml::ScanRecordStreamer;
//! use mzreport::report::{dia_report_lines, write_qc_report};
//! use mzreport::summary::summarize;
//!
//! // Stream scan records out of an acquisition
//! let mut streamer = ScanRecordStreamer::open("sample.mzML")?;
//! let mut writer = FeatureWriter::create("sample.features.csv")?;
//! let mut records = Vec::new();
//! while let Some(record) = streamer.next_record()? {
//!     writer.write(&record)?;
//!     records.push(record);
//! }
//! writer.finish()?;
//!
//! // Summarize the run and assemble the QC report
//! let summary = summarize(records.iter());
//! let lines = dia_report_lines(&summary, 4182);
//! write_qc_report("sample.pdf", "DIA QC Report", &lines, &[])?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Table Format
//!
//! The extraction step writes one CSV row per spectrum; absent values are
//! `N/A`:
//!
//! | Column | Source | Description |
//! |--------|--------|-------------|
//! | Precursor Ion m/z | MS2 precursor | Selected ion m/z |
//! | Retention Time | scan | RT in minutes |
//! | Injection Time | scan | Ion injection time (ms) |
//! | Isolation Window Target | MS2 precursor | Window center m/z |
//! | Isolation window upper offset | MS2 precursor | Offset above target |
//! | Isolation window lower offset | MS2 precursor | Offset below target |
//! | MS1 Base Peak m/z | spectrum | Most intense peak m/z |
//! | Base Peak Intensity | spectrum | Most intense peak height |
//! | Total Ion Current | spectrum | Summed intensity |
//! | Demultiplexing | file header | `Yes`/`No` overlap marker |
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`mzml`]: Streaming mzML parser producing scan records
//! - [`mzid`]: mzIdentML identification parser with q-value filtering
//! - [`features`]: Feature table (CSV) reading and writing
//! - [`diann`]: DiaNN stats/report TSV readers
//! - [`summary`]: Single-pass run summarizer
//! - [`classify`]: DIA/DDA acquisition-mode decision
//! - [`sample`]: Sample-name and nanogram-load extraction from paths
//! - [`chart`]: Scatter, bar, and line chart rendering
//! - [`report`]: QC text blocks and PDF page assembly

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
// Allow some patterns common in scientific code
#![allow(clippy::too_many_arguments)]

pub mod chart;
pub mod classify;
pub mod diann;
pub mod features;
pub mod mzid;
pub mod mzml;
pub mod report;
pub mod sample;
pub mod summary;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::chart::{
        bar_image, grouped_bar_image, line_png, save_png, scatter_image, scatter_png, ChartError,
        ChartImage, ScatterStyle, REPORT_CHART_SIZE, STANDALONE_CHART_SIZE,
    };
    pub use crate::classify::{classify, classify_with_factor, AcquisitionKind, DIA_REPEAT_FACTOR};
    pub use crate::diann::{FeaturePoint, FwhmPoint, PrecursorRow};
    pub use crate::features::{
        read_scan_records, write_scan_records, write_window_table, FeatureWriter, TableError,
        FEATURE_COLUMNS,
    };
    pub use crate::mzid::{
        read_identifications, IdentifiedItem, MzIdError, DEFAULT_Q_VALUE_THRESHOLD,
    };
    pub use crate::mzml::{MzMLError, Precursor, ScanRecord, ScanRecordStreamer, Spectrum};
    pub use crate::report::{
        dda_report_lines, dia_report_lines, write_comparison_report, write_qc_report, ReportError,
        RunMetrics,
    };
    pub use crate::sample::{ng_label, sample_key};
    pub use crate::summary::{summarize, InjectionStats, RunSummary, WindowSummary};
}
