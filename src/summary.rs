//! Scan-count, injection-time, and isolation-window summaries
//!
//! The summarizer is a pure fold over a scan-record sequence: feed records
//! into a [`ScanTally`] one at a time, then call [`ScanTally::finish`] to
//! obtain a [`RunSummary`]. Running it twice over the same sequence yields
//! identical output.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::mzml::ScanRecord;

/// m/z value usable as an ordered map key.
///
/// Wraps f64 with a total order (`f64::total_cmp`) so window targets and
/// window sizes can key a `BTreeMap`.
#[derive(Debug, Clone, Copy)]
pub struct MzKey(pub f64);

impl PartialEq for MzKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for MzKey {}

impl PartialOrd for MzKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MzKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for MzKey {
    fn from(value: f64) -> Self {
        MzKey(value)
    }
}

/// One isolation window, keyed by its target m/z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationWindow {
    /// Target m/z the instrument centered the window on
    pub target: f64,
    /// Half-width above the target, in m/z
    pub upper_offset: f64,
    /// Half-width below the target, in m/z
    pub lower_offset: f64,
    /// `upper_offset + lower_offset`, rounded to one decimal
    pub window_size: f64,
}

/// Isolation-window tally for one acquisition.
///
/// `windows` holds the raw per-target detail (last record per target wins).
/// `num_windows` and `size_counts` carry the demultiplexing correction when
/// the file-level flag was set; the per-target detail is never corrected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowSummary {
    /// Count of distinct isolation-window targets (corrected under demultiplexing)
    pub num_windows: usize,
    /// Histogram: window size to number of targets exhibiting it
    pub size_counts: BTreeMap<MzKey, usize>,
    /// Per-target window detail, uncorrected
    pub windows: BTreeMap<MzKey, IsolationWindow>,
    /// Whether the demultiplexing marker was seen on any record
    pub demultiplexed: bool,
}

impl WindowSummary {
    /// Render the size histogram as `"{size} for {count} windows; ..."`
    pub fn size_summary(&self) -> String {
        self.size_counts
            .iter()
            .map(|(size, count)| format!("{:?} for {} windows", size.0, count))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Mean and median ion injection time, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjectionStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Median (midpoint average for even-length samples)
    pub median: f64,
}

/// Row-weighted isolation bounds across all complete MS2 window records
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowBounds {
    /// Mean of `target - lower_offset` over qualifying records
    pub average_lower: f64,
    /// Mean of `target + upper_offset` over qualifying records
    pub average_upper: f64,
}

/// Summary statistics for one acquisition file
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Records carrying base-peak data (survey role)
    pub ms1_scans: usize,
    /// Records carrying a precursor m/z (fragmentation role)
    pub msn_scans: usize,
    /// Injection-time statistics; `None` when no record carried one
    pub injection: Option<InjectionStats>,
    /// Isolation bounds; `None` when no record carried a complete window
    pub bounds: Option<WindowBounds>,
    /// Isolation-window tally
    pub windows: WindowSummary,
}

/// Accumulator for a single pass over a scan-record sequence
#[derive(Debug, Default)]
pub struct ScanTally {
    ms1_scans: usize,
    msn_scans: usize,
    injection_times: Vec<f64>,
    windows: BTreeMap<MzKey, IsolationWindow>,
    sum_lower_bound: f64,
    sum_upper_bound: f64,
    window_records: usize,
    demultiplexed: bool,
}

impl ScanTally {
    /// Create an empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record into the tally
    pub fn observe(&mut self, record: &ScanRecord) {
        if record.is_fragmentation() {
            self.msn_scans += 1;
        }
        if record.is_survey() {
            self.ms1_scans += 1;
        }
        if let Some(time) = record.injection_time {
            self.injection_times.push(time);
        }
        if record.demultiplexed {
            self.demultiplexed = true;
        }
        // Records missing any window field stay out of the window map.
        if let Some((target, upper, lower)) = record.isolation_window() {
            self.sum_lower_bound += target - lower;
            self.sum_upper_bound += target + upper;
            self.window_records += 1;
            self.windows.insert(
                MzKey(target),
                IsolationWindow {
                    target,
                    upper_offset: upper,
                    lower_offset: lower,
                    window_size: round1(upper + lower),
                },
            );
        }
    }

    /// Consume the tally and produce the run summary
    pub fn finish(self) -> RunSummary {
        let mut size_counts: BTreeMap<MzKey, usize> = BTreeMap::new();
        for window in self.windows.values() {
            *size_counts.entry(MzKey(window.window_size)).or_insert(0) += 1;
        }

        let mut num_windows = self.windows.len();
        // Demultiplexed acquisitions report roughly twice the real window
        // count because overlapping windows split into two logical records.
        // Zero windows means there is nothing to correct, and the division
        // below would be undefined.
        if self.demultiplexed && num_windows > 0 {
            let adjustment_factor = num_windows.saturating_sub(2) / 2;
            for count in size_counts.values_mut() {
                *count = std::cmp::max(1, *count * adjustment_factor / num_windows);
            }
            num_windows = adjustment_factor;
        }

        let injection = if self.injection_times.is_empty() {
            None
        } else {
            let mut times = self.injection_times;
            times.sort_by(|a, b| a.total_cmp(b));
            let mean = times.iter().sum::<f64>() / times.len() as f64;
            let mid = times.len() / 2;
            let median = if times.len() % 2 == 0 {
                (times[mid - 1] + times[mid]) / 2.0
            } else {
                times[mid]
            };
            Some(InjectionStats { mean, median })
        };

        let bounds = if self.window_records > 0 {
            Some(WindowBounds {
                average_lower: self.sum_lower_bound / self.window_records as f64,
                average_upper: self.sum_upper_bound / self.window_records as f64,
            })
        } else {
            None
        };

        RunSummary {
            ms1_scans: self.ms1_scans,
            msn_scans: self.msn_scans,
            injection,
            bounds,
            windows: WindowSummary {
                num_windows,
                size_counts,
                windows: self.windows,
                demultiplexed: self.demultiplexed,
            },
        }
    }
}

/// Summarize a record sequence in one call
pub fn summarize<'a, I>(records: I) -> RunSummary
where
    I: IntoIterator<Item = &'a ScanRecord>,
{
    let mut tally = ScanTally::new();
    for record in records {
        tally.observe(record);
    }
    tally.finish()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_record(target: f64, upper: f64, lower: f64, demultiplexed: bool) -> ScanRecord {
        ScanRecord::ms2(
            1.0,
            demultiplexed,
            Some(target),
            Some(target),
            Some(upper),
            Some(lower),
            None,
        )
    }

    fn four_window_run(demultiplexed: bool) -> Vec<ScanRecord> {
        [400.0, 500.0, 600.0, 700.0]
            .iter()
            .map(|&t| window_record(t, 12.5, 12.5, demultiplexed))
            .collect()
    }

    #[test]
    fn test_four_targets_uncorrected() {
        let summary = summarize(&four_window_run(false));

        assert_eq!(summary.windows.num_windows, 4);
        assert_eq!(summary.windows.size_counts.len(), 1);
        assert_eq!(summary.windows.size_counts[&MzKey(25.0)], 4);
        assert!(!summary.windows.demultiplexed);
        assert_eq!(summary.msn_scans, 4);
        assert_eq!(summary.ms1_scans, 0);
    }

    #[test]
    fn test_four_targets_demultiplexed() {
        let summary = summarize(&four_window_run(true));

        // adjustment_factor = (4 - 2) / 2 = 1; bucket 25.0 = max(1, 4*1/4) = 1
        assert_eq!(summary.windows.num_windows, 1);
        assert_eq!(summary.windows.size_counts[&MzKey(25.0)], 1);
        assert!(summary.windows.demultiplexed);
        // Per-target detail stays raw
        assert_eq!(summary.windows.windows.len(), 4);
    }

    #[test]
    fn test_last_write_wins_per_target() {
        let records = vec![
            window_record(500.0, 10.0, 10.0, false),
            window_record(500.0, 2.0, 2.0, false),
        ];
        let summary = summarize(&records);

        assert_eq!(summary.windows.num_windows, 1);
        let window = &summary.windows.windows[&MzKey(500.0)];
        assert_eq!(window.upper_offset, 2.0);
        assert_eq!(window.lower_offset, 2.0);
        assert_eq!(window.window_size, 4.0);
        assert_eq!(summary.windows.size_counts[&MzKey(4.0)], 1);
    }

    #[test]
    fn test_partial_window_excluded() {
        // Target and upper offset present, lower offset missing
        let record = ScanRecord::ms2(
            1.0,
            false,
            Some(500.27),
            Some(500.0),
            Some(12.5),
            None,
            Some(30.0),
        );
        let summary = summarize(std::iter::once(&record));

        assert_eq!(summary.windows.num_windows, 0);
        assert!(summary.windows.size_counts.is_empty());
        // The record still counts as a fragmentation scan with injection time
        assert_eq!(summary.msn_scans, 1);
        assert_eq!(summary.injection.unwrap().mean, 30.0);
    }

    #[test]
    fn test_window_size_rounding() {
        let summary = summarize(std::iter::once(&window_record(500.0, 0.33, 0.33, false)));
        assert_eq!(summary.windows.windows[&MzKey(500.0)].window_size, 0.7);
    }

    #[test]
    fn test_empty_sequence() {
        let summary = summarize(std::iter::empty());

        assert_eq!(summary.windows.num_windows, 0);
        assert!(summary.windows.size_counts.is_empty());
        assert_eq!(summary.ms1_scans, 0);
        assert_eq!(summary.msn_scans, 0);
        assert!(summary.injection.is_none());
        assert!(summary.bounds.is_none());
    }

    #[test]
    fn test_demultiplexed_without_windows_skips_correction() {
        // Demultiplexed file with only survey scans: nothing to correct
        let record = ScanRecord::ms1(1.0, true, Some(445.1), Some(1.0e7), Some(2.0e8));
        let summary = summarize(std::iter::once(&record));

        assert!(summary.windows.demultiplexed);
        assert_eq!(summary.windows.num_windows, 0);
        assert!(summary.windows.size_counts.is_empty());
    }

    #[test]
    fn test_scan_counts_by_role() {
        let mut records = four_window_run(false);
        records.push(ScanRecord::ms1(2.0, false, Some(445.1), Some(1.0e7), None));
        records.push(ScanRecord::ms1(3.0, false, Some(446.2), None, None));

        let summary = summarize(&records);
        assert_eq!(summary.msn_scans, 4);
        assert_eq!(summary.ms1_scans, 2);
    }

    #[test]
    fn test_injection_stats() {
        let mut records: Vec<ScanRecord> = [10.0, 40.0, 20.0, 30.0]
            .iter()
            .map(|&t| ScanRecord::ms2(1.0, false, Some(500.0), None, None, None, Some(t)))
            .collect();

        let summary = summarize(&records);
        let stats = summary.injection.unwrap();
        assert_eq!(stats.mean, 25.0);
        assert_eq!(stats.median, 25.0);

        records.pop();
        let stats = summarize(&records).injection.unwrap();
        assert_eq!(stats.median, 20.0);
    }

    #[test]
    fn test_window_bounds_are_row_weighted() {
        // Same target twice plus one more: three rows, two distinct targets
        let records = vec![
            window_record(500.0, 12.5, 12.5, false),
            window_record(500.0, 12.5, 12.5, false),
            window_record(600.0, 12.5, 12.5, false),
        ];
        let summary = summarize(&records);

        let bounds = summary.bounds.unwrap();
        assert!((bounds.average_lower - (487.5 * 2.0 + 587.5) / 3.0).abs() < 1e-9);
        assert!((bounds.average_upper - (512.5 * 2.0 + 612.5) / 3.0).abs() < 1e-9);
        assert_eq!(summary.windows.num_windows, 2);
    }

    #[test]
    fn test_summarize_is_pure() {
        let records = four_window_run(true);
        assert_eq!(summarize(&records), summarize(&records));
    }

    #[test]
    fn test_size_summary_format() {
        let records = vec![
            window_record(400.0, 12.5, 12.5, false),
            window_record(500.0, 12.5, 12.5, false),
            window_record(600.0, 2.0, 2.0, false),
        ];
        let summary = summarize(&records);
        assert_eq!(
            summary.windows.size_summary(),
            "4.0 for 1 windows; 25.0 for 2 windows"
        );
    }
}
