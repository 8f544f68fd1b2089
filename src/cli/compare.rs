use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use mzreport::chart::{bar_image, grouped_bar_image, save_png, REPORT_CHART_SIZE};
use mzreport::classify::{classify_with_factor, AcquisitionKind};
use mzreport::diann;
use mzreport::features;
use mzreport::mzid;
use mzreport::report::write_comparison_report;
use mzreport::sample::sample_key;

use super::config::Config;

/// Cross-sample comparison: average scan counts per sample key from feature
/// CSVs, identified-precursor counts from DiaNN stats / mzid summaries, a
/// bar chart page for each, and the standalone chart PNGs.
pub fn run(inputs: Vec<PathBuf>, output: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let repeat_factor = config.dia_repeat_factor();

    let group1: Vec<&PathBuf> = inputs
        .iter()
        .filter(|p| p.to_string_lossy().contains(".features.csv"))
        .collect();
    let group2: Vec<&PathBuf> = inputs
        .iter()
        .filter(|p| {
            let name = p.to_string_lossy();
            name.contains(".stats.tsv") || name.contains(".mzidsummary.txt")
        })
        .collect();

    info!(
        "mzReport - comparison over {} feature tables and {} statistics files",
        group1.len(),
        group2.len()
    );

    // Classify every feature table first: sample keys carry the acquisition
    // kind only when the batch mixes kinds.
    let mut classified = Vec::with_capacity(group1.len());
    for file in &group1 {
        let records = features::read_scan_records(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let kind = classify_with_factor(&records, repeat_factor).unwrap_or(AcquisitionKind::Dda);
        classified.push((*file, records, kind));
    }
    let has_dia = classified.iter().any(|(_, _, k)| *k == AcquisitionKind::Dia);
    let has_dda = classified.iter().any(|(_, _, k)| *k == AcquisitionKind::Dda);
    let mixed_kinds = has_dia && has_dda;

    // Scan counts per sample key, in first-seen order
    let mut scan_counts: Vec<(String, Vec<f64>, Vec<f64>)> = Vec::new();
    for (file, records, kind) in &classified {
        let msms = records.iter().filter(|r| r.is_fragmentation()).count();
        let ms1 = records.iter().filter(|r| r.is_survey()).count();

        let path = file.to_string_lossy();
        let fallback = table_stem(file, ".features.csv");
        let key = sample_key(&path, &fallback, *kind, mixed_kinds);

        let slot = position_or_insert(&mut scan_counts, &key);
        scan_counts[slot].1.push(msms as f64);
        scan_counts[slot].2.push(ms1 as f64);
    }

    for (key, msms, ms1) in &scan_counts {
        println!("{}: {:?} {:?}", key, mean(msms), mean(ms1));
    }

    // Identified precursors per sample key
    let mut precursor_counts: Vec<(String, Vec<f64>)> = Vec::new();
    for file in &group2 {
        let path = file.to_string_lossy();
        let (count, kind, fallback) = if path.ends_with(".stats.tsv") {
            let count = diann::total_precursors_identified(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            (count, AcquisitionKind::Dia, table_stem(file, ".stats.tsv"))
        } else if path.ends_with(".mzidsummary.txt") {
            let count = mzid::read_summary_count(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            (count, AcquisitionKind::Dda, table_stem(file, ".mzidsummary.txt"))
        } else {
            anyhow::bail!("Unsupported comparison input: {}", file.display());
        };

        if let Some(count) = count {
            let key = sample_key(&path, &fallback, kind, mixed_kinds);
            let slot = match precursor_counts.iter().position(|(k, _)| k == &key) {
                Some(slot) => slot,
                None => {
                    precursor_counts.push((key, Vec::new()));
                    precursor_counts.len() - 1
                }
            };
            precursor_counts[slot].1.push(count as f64);
        }
    }

    for (key, counts) in &precursor_counts {
        println!("{}: {:?}", key, mean(counts));
    }

    // Scan-count bars, sorted by average MS/MS count
    let mut scan_series: Vec<(String, f64, f64)> = scan_counts
        .iter()
        .map(|(key, msms, ms1)| (key.clone(), mean(ms1), mean(msms)))
        .collect();
    scan_series.sort_by(|a, b| a.2.total_cmp(&b.2));
    let scan_chart = grouped_bar_image(
        "Average MS1 and MSMS Spectra for each sample",
        "Samples",
        "Average Count",
        &scan_series,
        REPORT_CHART_SIZE,
    )?;

    // Precursor bars, sorted by each sample's first observed count
    let mut precursor_series: Vec<(String, f64, f64)> = precursor_counts
        .iter()
        .map(|(key, counts)| {
            let first = counts.first().copied().unwrap_or(0.0);
            (key.clone(), first, mean(counts))
        })
        .collect();
    precursor_series.sort_by(|a, b| a.1.total_cmp(&b.1));
    let precursor_bars: Vec<(String, f64)> = precursor_series
        .into_iter()
        .map(|(key, _, avg)| (key, avg))
        .collect();
    let precursor_chart = bar_image(
        "Identified Precursors comparison between samples",
        "Samples",
        "Identified Precursors",
        &precursor_bars,
        REPORT_CHART_SIZE,
    )?;

    let plot_dir = plot_directory(&output);
    save_png(&scan_chart, plot_dir.join("plot1.png"))?;
    save_png(&precursor_chart, plot_dir.join("plot2.png"))?;

    write_comparison_report(&output, "Sample Comparison", &[scan_chart, precursor_chart])
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Comparison report written: {}", output.display());
    Ok(())
}

/// File name with a known table suffix removed, for keyname fallback
fn table_stem(path: &Path, suffix: &str) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().replace(suffix, ""))
        .unwrap_or_default()
}

/// Directory the side-output PNGs land in, next to the report
fn plot_directory(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn position_or_insert(samples: &mut Vec<(String, Vec<f64>, Vec<f64>)>, key: &str) -> usize {
    match samples.iter().position(|(k, _, _)| k == key) {
        Some(slot) => slot,
        None => {
            samples.push((key.to_string(), Vec::new(), Vec::new()));
            samples.len() - 1
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
