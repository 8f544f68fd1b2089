use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;

use mzreport::chart::{line_png, STANDALONE_CHART_SIZE};
use mzreport::diann;

/// Plot FWHM against nanogram load across every DiaNN stats file in a
/// directory. Later files overwrite earlier ones sharing a load.
pub fn run(directory: PathBuf, output: PathBuf) -> Result<()> {
    let mut stats_files: Vec<PathBuf> = std::fs::read_dir(&directory)
        .with_context(|| format!("Failed to read directory {}", directory.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.to_string_lossy().ends_with(".stats.tsv"))
        .collect();
    stats_files.sort();

    if stats_files.is_empty() {
        anyhow::bail!("No .stats.tsv files in {}", directory.display());
    }

    let mut fwhm_by_ng: BTreeMap<u32, f64> = BTreeMap::new();
    for file in &stats_files {
        let point = diann::fwhm_point(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        fwhm_by_ng.insert(point.ng, point.fwhm);
    }

    let points: Vec<(f64, f64)> = fwhm_by_ng
        .iter()
        .map(|(ng, fwhm)| (f64::from(*ng), *fwhm))
        .collect();

    line_png(
        &output,
        "FWHM for each ng",
        "ng",
        "FWHM",
        &points,
        STANDALONE_CHART_SIZE,
    )?;

    info!(
        "FWHM chart over {} loads written: {}",
        points.len(),
        output.display()
    );
    Ok(())
}
