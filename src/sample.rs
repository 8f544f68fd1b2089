//! Sample-name derivation from acquisition file paths
//!
//! Comparison reports group files by sample, where the sample name is read
//! out of the file path: the nanogram load (`50ng`, `2_5ng`, `05ng`) plus the
//! surrounding text, with European decimal commas restored and acquisition
//! tokens stripped.

use std::sync::OnceLock;

use regex::Regex;

use crate::classify::AcquisitionKind;

static NG_PATTERN: OnceLock<Regex> = OnceLock::new();
static ACQUISITION_TOKEN: OnceLock<Regex> = OnceLock::new();

fn ng_pattern() -> &'static Regex {
    NG_PATTERN.get_or_init(|| {
        Regex::new(r"/([^/]*?)(\d+_)?(\d+ng)(.*?)(_\d)?\.").expect("hardwired pattern is valid")
    })
}

fn acquisition_token() -> &'static Regex {
    ACQUISITION_TOKEN
        .get_or_init(|| Regex::new(r"(?i)(dia|dda)").expect("hardwired pattern is valid"))
}

/// Extract the ng-formatted sample label from a file path.
///
/// Returns `None` when the path carries no recognizable `<amount>ng` segment.
/// A leading digit group separated by an underscore is folded back into a
/// decimal comma (`2_5ng` reads as `2,5ng`), and a leading zero on the amount
/// itself is split the same way (`05ng` reads as `0,5ng`).
pub fn ng_label(path: &str) -> Option<String> {
    let captures = ng_pattern().captures(path)?;

    let prefix = captures.get(1).map_or("", |m| m.as_str());
    let whole_part = captures.get(2).map(|m| m.as_str());
    let ng_part = captures.get(3).map_or("", |m| m.as_str());
    let suffix = captures.get(4).map_or("", |m| m.as_str());

    let formatted = match whole_part {
        Some(whole) if whole.len() > 1 && whole.len() <= 4 => {
            format!("{}{}", whole.replace('_', ","), ng_part)
        }
        _ if ng_part.starts_with('0') => format!("0,{}", &ng_part[1..]),
        Some(whole) => format!("{}_{}", whole, ng_part),
        None => ng_part.to_string(),
    };

    Some(format!("{}{}{}", prefix, formatted, suffix))
}

/// Derive the grouping key for one input file.
///
/// Falls back to `fallback` (typically the file stem minus its table suffix)
/// when no ng label is found. `dia`/`dda` tokens are removed either way, and
/// the acquisition kind is appended only when the batch mixes kinds.
pub fn sample_key(
    path: &str,
    fallback: &str,
    kind: AcquisitionKind,
    mixed_kinds: bool,
) -> String {
    let base = match ng_label(path) {
        Some(label) => label,
        None => {
            log::debug!("no ng label in {}, using {}", path, fallback);
            fallback.to_string()
        }
    };

    let mut key = acquisition_token().replace_all(&base, "").into_owned();
    if mixed_kinds {
        key.push(' ');
        key.push_str(&kind.to_string());
    }
    key
}
