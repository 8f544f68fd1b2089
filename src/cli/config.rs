//! TOML configuration file support for analysis settings.
//!
//! Instead of passing flags on every invocation, thresholds can live in a
//! settings file:
//!
//! ```toml
//! # mzreport.toml
//! [identification]
//! q_value_threshold = 0.01
//!
//! [classify]
//! dia_repeat_factor = 50.0
//!
//! [report]
//! charge_cutoff = 2
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use mzreport::classify::DIA_REPEAT_FACTOR;
use mzreport::mzid::DEFAULT_Q_VALUE_THRESHOLD;

/// Default charge cutoff for the "high charge" scatter plots.
const DEFAULT_CHARGE_CUTOFF: i32 = 2;

/// Root configuration structure for mzreport.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Identification filtering settings.
    #[serde(default)]
    pub identification: IdentificationConfig,

    /// DIA/DDA classification settings.
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Report and plot settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Settings for the mzIdentML identification filter.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentificationConfig {
    /// Q-value below which an identification is retained.
    pub q_value_threshold: Option<f64>,
}

/// Settings for the acquisition-mode decision rule.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Minimum average repeats per isolation-window target for DIA.
    pub dia_repeat_factor: Option<f64>,
}

/// Settings for report rendering.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Charge state at or above which a feature counts as "high charge".
    pub charge_cutoff: Option<i32>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load from an optional path; defaults apply when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Effective q-value threshold.
    pub fn q_value_threshold(&self) -> f64 {
        self.identification
            .q_value_threshold
            .unwrap_or(DEFAULT_Q_VALUE_THRESHOLD)
    }

    /// Effective DIA repeat factor.
    pub fn dia_repeat_factor(&self) -> f64 {
        self.classify.dia_repeat_factor.unwrap_or(DIA_REPEAT_FACTOR)
    }

    /// Effective charge cutoff for high-charge plots.
    pub fn charge_cutoff(&self) -> i32 {
        self.report.charge_cutoff.unwrap_or(DEFAULT_CHARGE_CUTOFF)
    }
}
