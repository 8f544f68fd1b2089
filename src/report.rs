//! PDF report assembly with printpdf
//!
//! Two page styles: the single-page QC report (US Letter portrait, metric
//! lines followed by a 2x2 chart grid) and the multi-page comparison report
//! (A4 landscape, one chart per page). Layout arithmetic is done in points
//! and converted to millimetres at the printpdf boundary.

use printpdf::image_crate::{DynamicImage, RgbImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, Mm, PdfDocument, PdfLayerReference, Pt,
};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::chart::ChartImage;
use crate::summary::RunSummary;

const LETTER_WIDTH_PT: f64 = 612.0;
const LETTER_HEIGHT_PT: f64 = 792.0;
const A4_LANDSCAPE_WIDTH_PT: f64 = 841.89;
const A4_LANDSCAPE_HEIGHT_PT: f64 = 595.28;
const MARGIN_PT: f64 = 72.0;
const LINE_HEIGHT_PT: f64 = 14.0;
const TEXT_FONT_SIZE: f64 = 12.0;
// Embedded charts carry this resolution; display scale is relative to it.
const CHART_DPI: f64 = 300.0;

/// Errors that can occur while assembling a PDF report
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// printpdf failed to build or save the document
    #[error("PDF error: {0}")]
    PdfError(String),

    /// I/O error writing the report file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A chart buffer does not match its declared dimensions
    #[error("Invalid chart image: {0}")]
    InvalidImage(String),
}

/// Per-run metric set behind the textual QC report, serializable as JSON
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics {
    /// Number of survey (MS1) scans
    pub ms1_scans: usize,
    /// Number of fragmentation (MS/MS) scans
    pub msms_scans: usize,
    /// Arithmetic mean of ion injection times, milliseconds
    pub average_injection_time_ms: Option<f64>,
    /// Median of ion injection times, milliseconds
    pub median_injection_time_ms: Option<f64>,
    /// Count of distinct isolation-window targets, demultiplexing-corrected
    pub num_isolation_windows: usize,
    /// Window-size histogram, demultiplexing-corrected
    pub window_sizes: Vec<WindowSizeBucket>,
    /// Whether the acquisition was demultiplexed
    pub demultiplexed: bool,
    /// Average isolation width over MS2 records (upper minus lower bound)
    pub average_window_size: Option<f64>,
    /// Identified precursors reported by the search engine
    pub precursors_identified: i64,
}

/// One bucket of the window-size histogram
#[derive(Debug, Clone, Serialize)]
pub struct WindowSizeBucket {
    /// Window size in m/z, rounded to one decimal
    pub size: f64,
    /// Number of distinct targets with this size
    pub windows: usize,
}

impl RunMetrics {
    /// Collect the metric set from a run summary and a precursor count
    pub fn from_summary(summary: &RunSummary, precursors_identified: i64) -> Self {
        let window_sizes = summary
            .windows
            .size_counts
            .iter()
            .map(|(size, count)| WindowSizeBucket {
                size: size.0,
                windows: *count,
            })
            .collect();
        RunMetrics {
            ms1_scans: summary.ms1_scans,
            msms_scans: summary.msn_scans,
            average_injection_time_ms: summary.injection.as_ref().map(|i| i.mean),
            median_injection_time_ms: summary.injection.as_ref().map(|i| i.median),
            num_isolation_windows: summary.windows.num_windows,
            window_sizes,
            demultiplexed: summary.windows.demultiplexed,
            average_window_size: summary
                .bounds
                .as_ref()
                .map(|b| b.average_upper - b.average_lower),
            precursors_identified,
        }
    }
}

/// Build the metric lines for a DIA QC report page
pub fn dia_report_lines(summary: &RunSummary, precursors_identified: i64) -> Vec<String> {
    let status = if summary.windows.demultiplexed {
        "DIA sample using overlapping windows and demultiplexing after"
    } else {
        "DIA sample"
    };
    let (mean, median) = injection_times(summary);
    vec![
        format!("{}.", status),
        format!(
            "Number of distinct isolation windows used: {}",
            summary.windows.num_windows
        ),
        format!("Detailed Window Size: {}", summary.windows.size_summary()),
        String::new(),
        format!("Average Injection Time: {:.2} ms", mean),
        format!("Median Injection Time: {:.2} ms", median),
        String::new(),
        format!("Precursors Identified: {}", precursors_identified),
        String::new(),
        format!("Number of MS1 scans: {}", summary.ms1_scans),
        format!("Number of MS/MS scans: {}", summary.msn_scans),
    ]
}

/// Build the metric lines for a DDA QC report page
pub fn dda_report_lines(summary: &RunSummary, precursors_identified: usize) -> Vec<String> {
    let window_size = summary
        .bounds
        .as_ref()
        .map_or(f64::NAN, |b| b.average_upper - b.average_lower);
    let (mean, median) = injection_times(summary);
    vec![
        format!(
            "Number of distinct isolation windows used: {}",
            summary.windows.num_windows
        ),
        format!("Window Size: {:.2}", window_size),
        String::new(),
        format!("Average Injection Time: {:.2} ms", mean),
        format!("Median Injection Time: {:.2} ms", median),
        String::new(),
        format!("Precursors Identified: {}", precursors_identified),
        String::new(),
        format!("Scan number MS1: {}", summary.ms1_scans),
        format!("Scan number MS/MS: {}", summary.msn_scans),
    ]
}

fn injection_times(summary: &RunSummary) -> (f64, f64) {
    summary
        .injection
        .as_ref()
        .map_or((f64::NAN, f64::NAN), |i| (i.mean, i.median))
}

/// Write a single-page QC report: metric lines, then charts in a 2x2 grid.
///
/// Text starts one margin below the top edge and steps down a fixed line
/// height; charts are half the printable width each, two per row.
pub fn write_qc_report<P: AsRef<Path>>(
    path: P,
    title: &str,
    lines: &[String],
    charts: &[ChartImage],
) -> Result<(), ReportError> {
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm::from(Pt(LETTER_WIDTH_PT as f32)),
        Mm::from(Pt(LETTER_HEIGHT_PT as f32)),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::PdfError(e.to_string()))?;
    let layer = doc.get_page(page).get_layer(layer);

    let mut current_y = LETTER_HEIGHT_PT - MARGIN_PT;
    for line in lines {
        layer.use_text(
            line.as_str(),
            TEXT_FONT_SIZE as f32,
            Mm::from(Pt(MARGIN_PT as f32)),
            Mm::from(Pt(current_y as f32)),
            &font,
        );
        current_y -= LINE_HEIGHT_PT;
    }
    current_y -= 30.0;

    for (i, chart) in charts.iter().enumerate() {
        let aspect = chart.width as f64 / chart.height as f64;
        let image_width = (LETTER_WIDTH_PT - 2.0 * MARGIN_PT) / 2.0;
        let image_height = image_width / aspect;
        let x = MARGIN_PT + (i % 2) as f64 * (LETTER_WIDTH_PT / 2.0);
        let y = current_y - (i / 2 + 1) as f64 * image_height - 10.0 * (i / 2) as f64;
        place_chart(&layer, chart, x, y, image_width, image_height)?;
        // Step down after each completed row of two
        if i % 2 == 1 {
            current_y = y + 150.0;
        }
    }

    let file = File::create(path.as_ref())?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ReportError::PdfError(e.to_string()))?;
    Ok(())
}

/// Write a comparison report: one chart per A4 landscape page, scaled to
/// the full page width and anchored at the lower-left corner.
pub fn write_comparison_report<P: AsRef<Path>>(
    path: P,
    title: &str,
    charts: &[ChartImage],
) -> Result<(), ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        Mm::from(Pt(A4_LANDSCAPE_WIDTH_PT as f32)),
        Mm::from(Pt(A4_LANDSCAPE_HEIGHT_PT as f32)),
        "Layer 1",
    );
    let mut layer = doc.get_page(first_page).get_layer(first_layer);

    for (i, chart) in charts.iter().enumerate() {
        if i > 0 {
            let (page, added_layer) = doc.add_page(
                Mm::from(Pt(A4_LANDSCAPE_WIDTH_PT as f32)),
                Mm::from(Pt(A4_LANDSCAPE_HEIGHT_PT as f32)),
                "Layer 1",
            );
            layer = doc.get_page(page).get_layer(added_layer);
        }
        let aspect = chart.width as f64 / chart.height as f64;
        place_chart(
            &layer,
            chart,
            0.0,
            0.0,
            A4_LANDSCAPE_WIDTH_PT,
            A4_LANDSCAPE_WIDTH_PT / aspect,
        )?;
    }

    let file = File::create(path.as_ref())?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ReportError::PdfError(e.to_string()))?;
    Ok(())
}

/// Embed one chart at the given lower-left position and display size, all
/// in points.
fn place_chart(
    layer: &PdfLayerReference,
    chart: &ChartImage,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<(), ReportError> {
    let buffer = RgbImage::from_raw(chart.width, chart.height, chart.pixels.clone()).ok_or_else(
        || {
            ReportError::InvalidImage(format!(
                "pixel buffer does not match {}x{}",
                chart.width, chart.height
            ))
        },
    )?;
    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(buffer));

    // Native display size printpdf derives from the pixel dimensions at
    // CHART_DPI; the scale factors stretch that to the requested box.
    let native_width = chart.width as f64 * 72.0 / CHART_DPI;
    let native_height = chart.height as f64 * 72.0 / CHART_DPI;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm::from(Pt(x as f32))),
            translate_y: Some(Mm::from(Pt(y as f32))),
            scale_x: Some((width / native_width) as f32),
            scale_y: Some((height / native_height) as f32),
            dpi: Some(CHART_DPI as f32),
            ..Default::default()
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{scatter_image, ScatterStyle, REPORT_CHART_SIZE};
    use crate::mzml::ScanRecord;
    use crate::summary::summarize;

    fn dia_records() -> Vec<ScanRecord> {
        let mut records = Vec::new();
        for i in 0..4 {
            let rt = i as f64;
            records.push(ScanRecord::ms1(rt, false, Some(500.0), Some(1e6), Some(1e7)));
            records.push(ScanRecord::ms2(
                rt + 0.5,
                false,
                Some(450.0),
                Some(450.0 + i as f64 * 25.0),
                Some(12.5),
                Some(12.5),
                Some(20.0 + i as f64),
            ));
        }
        records
    }

    #[test]
    fn test_dia_report_lines_layout() {
        let summary = summarize(&dia_records());
        let lines = dia_report_lines(&summary, 5000);

        assert_eq!(lines.len(), 11);
        assert_eq!(lines[0], "DIA sample.");
        assert_eq!(lines[1], "Number of distinct isolation windows used: 4");
        assert!(lines[2].starts_with("Detailed Window Size: "));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "Average Injection Time: 21.50 ms");
        assert_eq!(lines[5], "Median Injection Time: 21.50 ms");
        assert_eq!(lines[7], "Precursors Identified: 5000");
        assert_eq!(lines[9], "Number of MS1 scans: 4");
        assert_eq!(lines[10], "Number of MS/MS scans: 4");
    }

    #[test]
    fn test_dda_report_lines_layout() {
        let summary = summarize(&dia_records());
        let lines = dda_report_lines(&summary, 1234);

        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "Number of distinct isolation windows used: 4");
        assert_eq!(lines[1], "Window Size: 25.00");
        assert_eq!(lines[6], "Precursors Identified: 1234");
        assert_eq!(lines[8], "Scan number MS1: 4");
        assert_eq!(lines[9], "Scan number MS/MS: 4");
    }

    #[test]
    fn test_qc_report_writes_pdf() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("qc.pdf");
        let chart = scatter_image(
            "RT vs m/z",
            "rt",
            "m/z",
            &[(1.0, 400.0), (2.0, 600.0)],
            ScatterStyle::Dense,
            REPORT_CHART_SIZE,
        )
        .expect("chart");

        let summary = summarize(&dia_records());
        let lines = dia_report_lines(&summary, 42);
        write_qc_report(&path, "QC Report", &lines, &[chart.clone(), chart]).expect("write pdf");

        let bytes = std::fs::read(&path).expect("read pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_comparison_report_one_page_per_chart() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("compare.pdf");
        let chart = scatter_image(
            "bars",
            "x",
            "y",
            &[(0.0, 1.0)],
            ScatterStyle::Soft,
            REPORT_CHART_SIZE,
        )
        .expect("chart");

        write_comparison_report(&path, "Comparison", &[chart.clone(), chart])
            .expect("write pdf");

        let bytes = std::fs::read(&path).expect("read pdf");
        assert!(bytes.starts_with(b"%PDF"));
        // Two pages in the page tree
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn test_run_metrics_serializes() {
        let summary = summarize(&dia_records());
        let metrics = RunMetrics::from_summary(&summary, 42);
        let value = serde_json::to_value(&metrics).expect("serialize");

        assert_eq!(value["ms1_scans"], 4);
        assert_eq!(value["msms_scans"], 4);
        assert_eq!(value["precursors_identified"], 42);
        assert_eq!(value["num_isolation_windows"], 4);
        assert_eq!(value["demultiplexed"], false);
    }

    #[test]
    fn test_rejects_mismatched_pixel_buffer() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bad.pdf");
        let chart = ChartImage {
            width: 100,
            height: 100,
            pixels: vec![0; 10],
        };
        let result = write_qc_report(&path, "bad", &[], &[chart]);
        assert!(matches!(result, Err(ReportError::InvalidImage(_))));
    }
}
