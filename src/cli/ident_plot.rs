use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use mzreport::chart::{scatter_png, ScatterStyle, STANDALONE_CHART_SIZE};
use mzreport::mzid;

use super::config::Config;

/// Render the two identification scatter PNGs straight from a mzIdentML
/// document: all retained items, and items at or above the charge cutoff.
pub fn run(input: PathBuf, output_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let config = Config::load(config.as_deref())?;
    let charge_cutoff = config.charge_cutoff();
    let q_threshold = config.q_value_threshold();

    let out_dir = output_dir.unwrap_or_else(|| match input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    });
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();

    let items = mzid::read_identifications(&input, q_threshold)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    info!(
        "{} identifications below q-value {}",
        items.len(),
        q_threshold
    );

    let all: Vec<(f64, f64)> = items.iter().map(|i| (i.retention_time, i.mz)).collect();
    let high_charge: Vec<(f64, f64)> = items
        .iter()
        .filter(|i| i.charge >= charge_cutoff)
        .map(|i| (i.retention_time, i.mz))
        .collect();

    let all_path = out_dir.join(format!("{}_all_items.png", stem));
    let high_path = out_dir.join(format!("{}_charge_ge{}.png", stem, charge_cutoff));

    scatter_png(
        &all_path,
        "Retention Time vs. M/Z Values for All Items",
        "Retention Time (min)",
        "M/Z",
        &all,
        ScatterStyle::Soft,
        STANDALONE_CHART_SIZE,
    )?;
    scatter_png(
        &high_path,
        &format!(
            "Retention Time vs. M/Z Values for Items with Charge >= {}",
            charge_cutoff
        ),
        "Retention Time (min)",
        "M/Z",
        &high_charge,
        ScatterStyle::Soft,
        STANDALONE_CHART_SIZE,
    )?;

    info!("Charts written: {}", display_pair(&all_path, &high_path));
    Ok(())
}

fn display_pair(first: &Path, second: &Path) -> String {
    format!("{}, {}", first.display(), second.display())
}
