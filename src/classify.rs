//! DDA/DIA acquisition-type inference
//!
//! DIA acquisitions cycle through a fixed set of isolation-window targets,
//! so the same target values repeat thousands of times; DDA picks targets
//! data-dependently and rarely repeats one. Classification compares the
//! number of distinct targets against the number of target-carrying records.

use std::collections::BTreeSet;
use std::fmt;

use crate::mzml::ScanRecord;
use crate::summary::MzKey;

/// Minimum average repeats per distinct target for a file to count as DIA
pub const DIA_REPEAT_FACTOR: f64 = 50.0;

/// Acquisition mode of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionKind {
    /// Data-dependent acquisition
    Dda,
    /// Data-independent acquisition
    Dia,
}

impl fmt::Display for AcquisitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionKind::Dda => write!(f, "DDA"),
            AcquisitionKind::Dia => write!(f, "DIA"),
        }
    }
}

/// Classify a record sequence with the default repeat factor.
///
/// Returns `None` when no record carries an isolation-window target.
pub fn classify<'a, I>(records: I) -> Option<AcquisitionKind>
where
    I: IntoIterator<Item = &'a ScanRecord>,
{
    classify_with_factor(records, DIA_REPEAT_FACTOR)
}

/// Classify with an explicit repeat factor.
///
/// The file is DIA when the distinct-target count is strictly below
/// `target_records / repeat_factor`.
pub fn classify_with_factor<'a, I>(records: I, repeat_factor: f64) -> Option<AcquisitionKind>
where
    I: IntoIterator<Item = &'a ScanRecord>,
{
    let mut distinct: BTreeSet<MzKey> = BTreeSet::new();
    let mut with_target = 0usize;

    for record in records {
        if let Some(target) = record.isolation_window_target {
            distinct.insert(MzKey(target));
            with_target += 1;
        }
    }

    if with_target == 0 {
        return None;
    }

    if (distinct.len() as f64) < with_target as f64 / repeat_factor {
        Some(AcquisitionKind::Dia)
    } else {
        Some(AcquisitionKind::Dda)
    }
}
