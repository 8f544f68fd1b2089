use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzreport::chart::{scatter_image, ScatterStyle, REPORT_CHART_SIZE};
use mzreport::diann;
use mzreport::features;
use mzreport::mzid;
use mzreport::report::{dda_report_lines, write_qc_report, RunMetrics};
use mzreport::summary::summarize;

use super::config::Config;

/// Assemble the DDA QC report: metric text and four scatter charts, with
/// identifications taken from a mzIdentML document.
pub fn run(
    features_csv: PathBuf,
    features_tsv: PathBuf,
    mzid_path: PathBuf,
    output: PathBuf,
    json: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let charge_cutoff = config.charge_cutoff();
    let q_threshold = config.q_value_threshold();

    info!("mzReport - DDA QC report");
    info!("Features: {}", features_csv.display());
    info!("mzid:     {}", mzid_path.display());
    info!("Report:   {}", output.display());

    let records = features::read_scan_records(&features_csv)
        .with_context(|| format!("Failed to read {}", features_csv.display()))?;
    let summary = summarize(&records);

    let feature_points = diann::read_feature_points(&features_tsv)
        .with_context(|| format!("Failed to read {}", features_tsv.display()))?;
    let all_features: Vec<(f64, f64)> = feature_points.iter().map(|f| (f.rt_apex, f.mz)).collect();
    let high_charge_features: Vec<(f64, f64)> = feature_points
        .iter()
        .filter(|f| f.charge >= charge_cutoff)
        .map(|f| (f.rt_apex, f.mz))
        .collect();

    let identifications = mzid::read_identifications(&mzid_path, q_threshold)
        .with_context(|| format!("Failed to read {}", mzid_path.display()))?;
    let precursors_identified = identifications.len();
    let identified: Vec<(f64, f64)> = identifications
        .iter()
        .map(|i| (i.retention_time, i.mz))
        .collect();
    let identified_high_charge: Vec<(f64, f64)> = identifications
        .iter()
        .filter(|i| i.charge >= charge_cutoff)
        .map(|i| (i.retention_time, i.mz))
        .collect();

    let charts = vec![
        scatter_image(
            "RetentionTime and M/Z (All Features)",
            "RetentionTime",
            "M/Z",
            &all_features,
            ScatterStyle::Dense,
            REPORT_CHART_SIZE,
        )?,
        scatter_image(
            &format!("Retention Time and M/Z (Charge >= {})", charge_cutoff),
            "Retention Time",
            "M/Z",
            &high_charge_features,
            ScatterStyle::Dense,
            REPORT_CHART_SIZE,
        )?,
        scatter_image(
            "All Charges (DiaNN)",
            "Retention Time (RT)",
            "Precursor M/Z",
            &identified,
            ScatterStyle::Soft,
            REPORT_CHART_SIZE,
        )?,
        scatter_image(
            &format!("Charge ≥ {} (DiaNN) ", charge_cutoff),
            "Retention Time (RT)",
            "Precursor M/Z",
            &identified_high_charge,
            ScatterStyle::Soft,
            REPORT_CHART_SIZE,
        )?,
    ];

    let lines = dda_report_lines(&summary, precursors_identified);
    write_qc_report(&output, "DDA QC Report", &lines, &charts)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if let Some(json_path) = json {
        let metrics = RunMetrics::from_summary(&summary, precursors_identified as i64);
        let rendered = serde_json::to_string_pretty(&metrics)?;
        std::fs::write(&json_path, rendered)
            .with_context(|| format!("Failed to write {}", json_path.display()))?;
        info!("Metrics JSON: {}", json_path.display());
    }

    info!(
        "Report written: {} ({} identifications)",
        output.display(),
        precursors_identified
    );
    Ok(())
}
