use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzreport::chart::{scatter_image, ScatterStyle, REPORT_CHART_SIZE};
use mzreport::diann;
use mzreport::features;
use mzreport::report::{dia_report_lines, write_qc_report, RunMetrics};
use mzreport::summary::summarize;

use super::config::Config;

/// Assemble the DIA QC report: metric text, four scatter charts, and the
/// per-target isolation-window table.
#[allow(clippy::too_many_arguments)]
pub fn run(
    features_csv: PathBuf,
    stats_tsv: PathBuf,
    features_tsv: PathBuf,
    report_tsv: PathBuf,
    sequences_tsv: PathBuf,
    output: PathBuf,
    window_table: PathBuf,
    json: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let charge_cutoff = config.charge_cutoff();

    info!("mzReport - DIA QC report");
    info!("Features:     {}", features_csv.display());
    info!("DiaNN stats:  {}", stats_tsv.display());
    info!("Report:       {}", output.display());

    let records = features::read_scan_records(&features_csv)
        .with_context(|| format!("Failed to read {}", features_csv.display()))?;
    let summary = summarize(&records);

    let precursors_identified = diann::precursors_identified(&stats_tsv)
        .with_context(|| format!("Failed to read {}", stats_tsv.display()))?
        .unwrap_or(0);

    let feature_points = diann::read_feature_points(&features_tsv)
        .with_context(|| format!("Failed to read {}", features_tsv.display()))?;
    let all_features: Vec<(f64, f64)> = feature_points.iter().map(|f| (f.rt_apex, f.mz)).collect();
    let high_charge_features: Vec<(f64, f64)> = feature_points
        .iter()
        .filter(|f| f.charge >= charge_cutoff)
        .map(|f| (f.rt_apex, f.mz))
        .collect();

    let hits = diann::read_precursor_report(&report_tsv)
        .with_context(|| format!("Failed to read {}", report_tsv.display()))?;
    let sequences = diann::read_modified_sequences(&sequences_tsv)
        .with_context(|| format!("Failed to read {}", sequences_tsv.display()))?;
    let identified: Vec<(f64, f64)> = hits
        .iter()
        .filter(|h| sequences.contains(&h.modified_peptide))
        .map(|h| (h.rt, h.precursor_mz))
        .collect();
    let identified_high_charge: Vec<(f64, f64)> = hits
        .iter()
        .filter(|h| sequences.contains(&h.modified_peptide) && h.charge >= charge_cutoff)
        .map(|h| (h.rt, h.precursor_mz))
        .collect();

    let charts = vec![
        scatter_image(
            "RetentionTime and m/z (All Features)",
            "RetentionTime",
            "m/z",
            &all_features,
            ScatterStyle::Dense,
            REPORT_CHART_SIZE,
        )?,
        scatter_image(
            &format!("Retention Time and m/z (Charge >= {})", charge_cutoff),
            "Retention Time",
            "m/z",
            &high_charge_features,
            ScatterStyle::Dense,
            REPORT_CHART_SIZE,
        )?,
        scatter_image(
            "All Charges (Identified features, Dia-NN)",
            "Retention Time (RT)",
            "Precursor m/z",
            &identified,
            ScatterStyle::Soft,
            REPORT_CHART_SIZE,
        )?,
        scatter_image(
            &format!("Charge ≥ {} (Identified features, Dia-NN) ", charge_cutoff),
            "Retention Time (RT)",
            "Precursor m/z",
            &identified_high_charge,
            ScatterStyle::Soft,
            REPORT_CHART_SIZE,
        )?,
    ];

    let lines = dia_report_lines(&summary, precursors_identified);
    write_qc_report(&output, "DIA QC Report", &lines, &charts)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    features::write_window_table(&window_table, &summary.windows)
        .with_context(|| format!("Failed to write {}", window_table.display()))?;

    if let Some(json_path) = json {
        let metrics = RunMetrics::from_summary(&summary, precursors_identified);
        let rendered = serde_json::to_string_pretty(&metrics)?;
        std::fs::write(&json_path, rendered)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("Metrics JSON: {}", json_path.display());
    }

    info!(
        "Report written: {} ({} MS1 / {} MS2 scans)",
        output.display(),
        summary.ms1_scans,
        summary.msn_scans
    );
    Ok(())
}
