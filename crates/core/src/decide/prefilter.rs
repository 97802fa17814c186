//! Pre-snatch candidate filters.
//!
//! Cheap name- and size-based rejections that run before any I/O. Every
//! predicate passes when either side lacks the marker in question, so a
//! bare title never gets filtered on information it does not carry.

use crate::model::{Candidate, Searchee};
use crate::release;

use super::types::Decision;

/// Substring block list check. Case-insensitive.
pub fn is_blocked(name: &str, block_list: &[String]) -> bool {
    let lower = name.to_lowercase();
    block_list
        .iter()
        .any(|entry| !entry.is_empty() && lower.contains(&entry.to_lowercase()))
}

/// Run the pre-filters in their fixed order:
/// release-group, resolution, source, proper/repack, fuzzy size, link.
///
/// Returns the rejection decision, or `None` when the candidate survives.
pub fn run(candidate: &Candidate, searchee: &Searchee, fuzzy_size_factor: f64) -> Option<Decision> {
    if let (Some(a), Some(b)) = (
        release::release_group(&candidate.name),
        release::release_group(&searchee.title),
    ) {
        if !a.eq_ignore_ascii_case(&b) {
            return Some(Decision::ReleaseGroupMismatch);
        }
    }

    if let (Some(a), Some(b)) = (
        release::resolution(&candidate.name),
        release::resolution(&searchee.title),
    ) {
        if a != b {
            return Some(Decision::ResolutionMismatch);
        }
    }

    if let (Some(a), Some(b)) = (
        release::source(&candidate.name),
        release::source(&searchee.title),
    ) {
        if a != b {
            return Some(Decision::SourceMismatch);
        }
    }

    if release::is_proper_or_repack(&candidate.name)
        != release::is_proper_or_repack(&searchee.title)
    {
        return Some(Decision::ProperRepackMismatch);
    }

    if let Some(size) = candidate.size {
        if searchee.length > 0 {
            let deviation = size.abs_diff(searchee.length) as f64 / searchee.length as f64;
            if deviation > fuzzy_size_factor {
                return Some(Decision::FuzzySizeMismatch);
            }
        }
    }

    if candidate.link.is_none() {
        return Some(Decision::NoDownloadLink);
    }

    None
}
