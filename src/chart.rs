//! Chart rendering with plotters
//!
//! All charts render into raw RGB8 buffers ([`ChartImage`]) for embedding in
//! PDF reports, or straight to PNG files for standalone use. The drawing code
//! is shared between the two targets.

use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;

/// Chart size used inside PDF report pages
pub const REPORT_CHART_SIZE: (u32, u32) = (640, 480);

/// Chart size used for standalone PNG output
pub const STANDALONE_CHART_SIZE: (u32, u32) = (1000, 600);

/// Errors that can occur while rendering charts
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    /// Backend or layout failure inside plotters
    #[error("Chart rendering error: {0}")]
    Rendering(String),

    /// I/O error writing a chart file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Rendering(e.to_string())
    }
}

/// A rendered chart as a raw RGB8 pixel buffer
#[derive(Debug, Clone)]
pub struct ChartImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGB8 pixel data, 3 bytes per pixel
    pub pixels: Vec<u8>,
}

/// Marker treatment for scatter plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterStyle {
    /// Pinpoint opaque markers, no mesh: dense raw-feature clouds
    Dense,
    /// Larger translucent markers over a mesh: identified-precursor plots
    Soft,
}

/// Render a scatter chart into an RGB8 buffer
pub fn scatter_image(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
    style: ScatterStyle,
    size: (u32, u32),
) -> Result<ChartImage, ChartError> {
    let (width, height) = size;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let area = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
        draw_scatter(&area, title, x_desc, y_desc, points, style)?;
        area.present()?;
    }
    Ok(ChartImage {
        width,
        height,
        pixels,
    })
}

/// Render a scatter chart to a PNG file
pub fn scatter_png<P: AsRef<Path>>(
    path: P,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
    style: ScatterStyle,
    size: (u32, u32),
) -> Result<(), ChartError> {
    let area = BitMapBackend::new(path.as_ref(), size).into_drawing_area();
    draw_scatter(&area, title, x_desc, y_desc, points, style)?;
    area.present()?;
    Ok(())
}

/// Write an already rendered chart buffer to a PNG file
pub fn save_png<P: AsRef<Path>>(image: &ChartImage, path: P) -> Result<(), ChartError> {
    printpdf::image_crate::save_buffer(
        path.as_ref(),
        &image.pixels,
        image.width,
        image.height,
        printpdf::image_crate::ColorType::Rgb8,
    )
    .map_err(|e| ChartError::Rendering(e.to_string()))
}

/// Render paired MS1/MS2 bars per sample into an RGB8 buffer.
///
/// `samples` is `(label, ms1_count, ms2_count)` in display order. MS1 bars
/// are yellow, MS2 bars blue, matching the comparison report convention.
pub fn grouped_bar_image(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    samples: &[(String, f64, f64)],
    size: (u32, u32),
) -> Result<ChartImage, ChartError> {
    let (width, height) = size;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let area = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
        area.fill(&WHITE)?;

        let y_max = samples
            .iter()
            .flat_map(|(_, ms1, ms2)| [*ms1, *ms2])
            .fold(1.0f64, f64::max);
        let labels: Vec<&str> = samples.iter().map(|(label, _, _)| label.as_str()).collect();

        let mut chart = ChartBuilder::on(&area)
            .caption(title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(samples.len() as f64 - 0.5).max(0.5), 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_labels(samples.len().max(1))
            .x_label_formatter(&|x| tick_label(&labels, *x))
            .draw()?;

        chart
            .draw_series(samples.iter().enumerate().map(|(i, (_, ms1, _))| {
                let x = i as f64;
                Rectangle::new([(x - 0.35, 0.0), (x, *ms1)], YELLOW.filled())
            }))?
            .label("MS1")
            .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], YELLOW.filled()));

        chart
            .draw_series(samples.iter().enumerate().map(|(i, (_, _, ms2))| {
                let x = i as f64;
                Rectangle::new([(x, 0.0), (x + 0.35, *ms2)], BLUE.filled())
            }))?
            .label("MS2")
            .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], BLUE.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        area.present()?;
    }
    Ok(ChartImage {
        width,
        height,
        pixels,
    })
}

/// Render one green bar per sample into an RGB8 buffer
pub fn bar_image(
    title: &str,
    x_desc: &str,
    y_desc: &str,
    samples: &[(String, f64)],
    size: (u32, u32),
) -> Result<ChartImage, ChartError> {
    let (width, height) = size;
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    {
        let area = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
        area.fill(&WHITE)?;

        let y_max = samples.iter().map(|(_, v)| *v).fold(1.0f64, f64::max);
        let labels: Vec<&str> = samples.iter().map(|(label, _)| label.as_str()).collect();

        let mut chart = ChartBuilder::on(&area)
            .caption(title, ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(samples.len() as f64 - 0.5).max(0.5), 0.0..y_max * 1.1)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_labels(samples.len().max(1))
            .x_label_formatter(&|x| tick_label(&labels, *x))
            .draw()?;

        chart
            .draw_series(samples.iter().enumerate().map(|(i, (_, value))| {
                let x = i as f64;
                Rectangle::new([(x - 0.175, 0.0), (x + 0.175, *value)], GREEN.filled())
            }))?
            .label("precursor counts")
            .legend(|(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], GREEN.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        area.present()?;
    }
    Ok(ChartImage {
        width,
        height,
        pixels,
    })
}

/// Render a line chart with circular markers to a PNG file.
///
/// Each point is annotated with its x value, rendered as an integer.
pub fn line_png<P: AsRef<Path>>(
    path: P,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
    size: (u32, u32),
) -> Result<(), ChartError> {
    let area = BitMapBackend::new(path.as_ref(), size).into_drawing_area();
    area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&area)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            axis_range(points.iter().map(|p| p.0)),
            axis_range(points.iter().map(|p| p.1)),
        )?;

    chart.configure_mesh().x_desc(x_desc).y_desc(y_desc).draw()?;

    chart.draw_series(std::iter::once(PathElement::new(points.to_vec(), &BLUE)))?;
    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
    )?;
    chart.draw_series(points.iter().map(|&(x, y)| {
        Text::new(
            format!("{}", x.round() as i64),
            (x, y),
            ("sans-serif", 14).into_font(),
        )
    }))?;

    area.present()?;
    Ok(())
}

fn draw_scatter(
    area: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    points: &[(f64, f64)],
    style: ScatterStyle,
) -> Result<(), ChartError> {
    area.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            axis_range(points.iter().map(|p| p.0)),
            axis_range(points.iter().map(|p| p.1)),
        )?;

    let mut mesh = chart.configure_mesh();
    if style == ScatterStyle::Dense {
        mesh.disable_mesh();
    }
    mesh.x_desc(x_desc).y_desc(y_desc).draw()?;

    match style {
        ScatterStyle::Dense => {
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 1, BLUE.filled())),
            )?;
        }
        ScatterStyle::Soft => {
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, BLUE.mix(0.5).filled())),
            )?;
        }
    }
    Ok(())
}

/// Tick formatter mapping a fractional axis position back to a sample label
fn tick_label(labels: &[&str], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels
        .get(index as usize)
        .map_or_else(String::new, |label| label.to_string())
}

fn axis_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        min = min.min(value);
        max = max.max(value);
    }
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}
