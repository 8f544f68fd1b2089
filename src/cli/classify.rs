use anyhow::{Context, Result};
use std::path::PathBuf;

#[cfg(feature = "colorized_output")]
use console::style;

use mzreport::classify::{classify_with_factor, AcquisitionKind};
use mzreport::features;

use super::config::Config;

/// Print a DIA/DDA verdict per feature table; exit nonzero unless every
/// file classified as DIA.
pub fn run(files: Vec<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let repeat_factor = config.dia_repeat_factor();

    let mut dia_count = 0usize;
    for file in &files {
        let records = features::read_scan_records(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        match classify_with_factor(&records, repeat_factor) {
            Some(AcquisitionKind::Dia) => {
                println!("{}", dia_verdict());
                dia_count += 1;
            }
            Some(AcquisitionKind::Dda) => println!("{}", dda_verdict()),
            None => println!("The column contains only 'N/A' values or is empty."),
        }
    }

    if dia_count == files.len() {
        println!("{}", dia_verdict());
        Ok(())
    } else {
        println!("{}", dda_verdict());
        std::process::exit(1);
    }
}

#[cfg(feature = "colorized_output")]
fn dia_verdict() -> String {
    style("DIA file.").green().to_string()
}

#[cfg(not(feature = "colorized_output"))]
fn dia_verdict() -> String {
    "DIA file.".to_string()
}

#[cfg(feature = "colorized_output")]
fn dda_verdict() -> String {
    style("DDA file.").yellow().to_string()
}

#[cfg(not(feature = "colorized_output"))]
fn dda_verdict() -> String {
    "DDA file.".to_string()
}
