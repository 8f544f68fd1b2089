//! Controlled Vocabulary (CV) parameter handling for mzML
//!
//! mzML uses CV terms from the PSI-MS ontology to describe data semantically.
//! This module provides the accessions and the typed parameter the scan-record
//! extractor dispatches on.

/// A controlled vocabulary parameter from mzML
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CvParam {
    /// Accession number (e.g., "MS:1000511")
    pub accession: String,

    /// Human-readable name
    pub name: String,

    /// Optional value
    pub value: Option<String>,
}

impl CvParam {
    /// Get the value as f64 if possible
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.as_ref()?.parse().ok()
    }

    /// Get the value as i64 if possible
    pub fn value_as_i64(&self) -> Option<i64> {
        self.value.as_ref()?.parse().ok()
    }
}

/// Common MS CV accessions used in mzML
#[allow(non_snake_case)]
pub mod MS_CV_ACCESSIONS {
    // =========================================================================
    // Scan/spectrum properties
    // =========================================================================

    /// MS level
    pub const MS_LEVEL: &str = "MS:1000511";

    /// Scan start time (retention time)
    pub const SCAN_START_TIME: &str = "MS:1000016";

    /// Total ion current
    pub const TOTAL_ION_CURRENT: &str = "MS:1000285";

    /// Base peak m/z
    pub const BASE_PEAK_MZ: &str = "MS:1000504";

    /// Base peak intensity
    pub const BASE_PEAK_INTENSITY: &str = "MS:1000505";

    /// Ion injection time
    pub const ION_INJECTION_TIME: &str = "MS:1000927";

    // =========================================================================
    // Precursor/isolation
    // =========================================================================

    /// Selected ion m/z
    pub const SELECTED_ION_MZ: &str = "MS:1000744";

    /// Isolation window target m/z
    pub const ISOLATION_WINDOW_TARGET_MZ: &str = "MS:1000827";

    /// Isolation window lower offset
    pub const ISOLATION_WINDOW_LOWER_OFFSET: &str = "MS:1000828";

    /// Isolation window upper offset
    pub const ISOLATION_WINDOW_UPPER_OFFSET: &str = "MS:1000829";
}
