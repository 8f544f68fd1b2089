use anyhow::{Context, Result};
use log::info;
use std::path::PathBuf;

use mzreport::features::FeatureWriter;
use mzreport::mzml::ScanRecordStreamer;

/// Extract scan records from an mzML acquisition into a features CSV
pub fn run(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    // Default output: <stem>.features.csv next to the input
    let output = output.unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let stem = stem.trim_end_matches(".mzML").trim_end_matches(".mzml");
        input.with_file_name(format!("{}.features.csv", stem))
    });

    info!("mzReport - scan record extraction");
    info!("Input:  {}", input.display());
    info!("Output: {}", output.display());

    let mut streamer = ScanRecordStreamer::open(&input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    if streamer.demultiplexed() {
        info!("Demultiplexing marker found; records will be flagged");
    }

    let mut writer = FeatureWriter::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut count = 0usize;
    while let Some(record) = streamer
        .next_record()
        .context("Failed to parse acquisition document")?
    {
        writer.write(&record)?;
        count += 1;
    }
    writer.finish()?;

    info!("Extracted {} scan records", count);
    println!("Parsing completed: {}", output.display());
    Ok(())
}
