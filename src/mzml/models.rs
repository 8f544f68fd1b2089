//! Data models for mzML scan extraction
//!
//! These models carry the per-spectrum fields the QC summaries need; peak
//! arrays are never materialized. Missing values stay `None` here, and the
//! "N/A" sentinel exists only at the CSV boundary.

/// One row of the feature table, derived from a single spectrum.
///
/// A spectrum yields an MS2-role record when it carries a precursor
/// description, and an MS1-role record when its MS level is 1; a spectrum can
/// satisfy both. The role split is strict: survey records never carry
/// precursor/isolation fields and fragmentation records never carry
/// base-peak fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRecord {
    /// MS level: 1 (survey) or 2 (fragmentation)
    pub ms_level: u8,

    /// Retention time as written in the source, present on every record
    pub retention_time: f64,

    /// File-level demultiplexing flag, identical on every record of a run
    pub demultiplexed: bool,

    /// Selected precursor ion m/z (MS2 only)
    pub precursor_mz: Option<f64>,

    /// Isolation window target m/z (MS2 only)
    pub isolation_window_target: Option<f64>,

    /// Isolation window upper offset, m/z half-width (MS2 only)
    pub isolation_window_upper_offset: Option<f64>,

    /// Isolation window lower offset, m/z half-width (MS2 only)
    pub isolation_window_lower_offset: Option<f64>,

    /// Ion injection time in milliseconds (MS2 only)
    pub injection_time: Option<f64>,

    /// Base peak m/z (MS1 only)
    pub base_peak_mz: Option<f64>,

    /// Base peak intensity (MS1 only)
    pub base_peak_intensity: Option<f64>,

    /// Total ion current (MS1 only)
    pub total_ion_current: Option<f64>,
}

impl ScanRecord {
    /// Build a survey-scan record (MS level 1)
    pub fn ms1(
        retention_time: f64,
        demultiplexed: bool,
        base_peak_mz: Option<f64>,
        base_peak_intensity: Option<f64>,
        total_ion_current: Option<f64>,
    ) -> Self {
        Self {
            ms_level: 1,
            retention_time,
            demultiplexed,
            base_peak_mz,
            base_peak_intensity,
            total_ion_current,
            ..Default::default()
        }
    }

    /// Build a fragmentation-scan record (MS level 2)
    pub fn ms2(
        retention_time: f64,
        demultiplexed: bool,
        precursor_mz: Option<f64>,
        isolation_window_target: Option<f64>,
        isolation_window_upper_offset: Option<f64>,
        isolation_window_lower_offset: Option<f64>,
        injection_time: Option<f64>,
    ) -> Self {
        Self {
            ms_level: 2,
            retention_time,
            demultiplexed,
            precursor_mz,
            isolation_window_target,
            isolation_window_upper_offset,
            isolation_window_lower_offset,
            injection_time,
            ..Default::default()
        }
    }

    /// True when this record plays the fragmentation role
    pub fn is_fragmentation(&self) -> bool {
        self.precursor_mz.is_some()
    }

    /// True when this record plays the survey role
    pub fn is_survey(&self) -> bool {
        self.base_peak_mz.is_some()
    }

    /// Target and both offsets, when all three are present
    pub fn isolation_window(&self) -> Option<(f64, f64, f64)> {
        Some((
            self.isolation_window_target?,
            self.isolation_window_upper_offset?,
            self.isolation_window_lower_offset?,
        ))
    }
}

/// Precursor description of one spectrum (first `<precursor>` element only)
#[derive(Debug, Clone, Default)]
pub struct Precursor {
    /// Isolation window target m/z
    pub isolation_window_target: Option<f64>,

    /// Isolation window lower offset
    pub isolation_window_lower: Option<f64>,

    /// Isolation window upper offset
    pub isolation_window_upper: Option<f64>,

    /// Selected ion m/z (first `<selectedIon>` element only)
    pub selected_ion_mz: Option<f64>,
}

/// Per-spectrum fields gathered while streaming, before record conversion
#[derive(Debug, Clone, Default)]
pub struct Spectrum {
    /// Native spectrum ID from the file
    pub id: String,

    /// MS level (absent when the spectrum does not declare one)
    pub ms_level: Option<u8>,

    /// Retention time as written in the source
    pub retention_time: Option<f64>,

    /// Ion injection time in milliseconds
    pub injection_time: Option<f64>,

    /// Total ion current
    pub total_ion_current: Option<f64>,

    /// Base peak m/z
    pub base_peak_mz: Option<f64>,

    /// Base peak intensity
    pub base_peak_intensity: Option<f64>,

    /// Precursor information, first precursor element only
    pub precursor: Option<Precursor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_split() {
        let ms1 = ScanRecord::ms1(12.5, false, Some(445.12), Some(1.2e7), Some(3.4e8));
        assert!(ms1.is_survey());
        assert!(!ms1.is_fragmentation());
        assert_eq!(ms1.precursor_mz, None);
        assert_eq!(ms1.isolation_window(), None);

        let ms2 = ScanRecord::ms2(
            12.6,
            false,
            Some(500.25),
            Some(500.0),
            Some(12.5),
            Some(12.5),
            Some(22.0),
        );
        assert!(ms2.is_fragmentation());
        assert!(!ms2.is_survey());
        assert_eq!(ms2.base_peak_mz, None);
        assert_eq!(ms2.isolation_window(), Some((500.0, 12.5, 12.5)));
    }

    #[test]
    fn test_partial_isolation_window_is_none() {
        let record = ScanRecord::ms2(1.0, false, Some(500.0), Some(500.0), Some(12.5), None, None);
        assert_eq!(record.isolation_window(), None);
    }
}
