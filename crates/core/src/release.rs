//! Release-name parsing: group, resolution, source and season markers.
//!
//! All extractors are lenient - a name that carries no marker yields `None`,
//! and the decision pre-filters treat missing information as a pass.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(2160p|1080p|720p|576p|480p)\b").unwrap());

static GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)$").unwrap());

// Anime convention: the group leads the title in brackets.
static ANIME_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([^\]]+)\]").unwrap());

static PROPER_REPACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(proper|repack|rerip)\b").unwrap());

static SEASON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bS\d{1,3}\b").unwrap());

static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS\d{1,3}[.\- ]?E\d{1,4}\b|\b\d{1,3}x\d{2,4}\b").unwrap());

/// Video resolutions recognized by the strict resolution regex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    R2160p,
    R1080p,
    R720p,
    R576p,
    R480p,
}

/// Release sources in rough quality order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    BluRay,
    WebDl,
    WebRip,
    Hdtv,
    Dvd,
}

/// Extract the trailing `-GRP` release group, falling back to the leading
/// `[Group]` anime convention when no dash token exists.
pub fn release_group(name: &str) -> Option<String> {
    let stem = strip_extension(name);
    if let Some(caps) = GROUP_RE.captures(stem) {
        return Some(caps[1].to_string());
    }
    ANIME_GROUP_RE
        .captures(name)
        .map(|caps| caps[1].to_string())
}

/// Extract the resolution marker, if any.
pub fn resolution(name: &str) -> Option<Resolution> {
    let caps = RESOLUTION_RE.captures(name)?;
    match caps[1].to_lowercase().as_str() {
        "2160p" => Some(Resolution::R2160p),
        "1080p" => Some(Resolution::R1080p),
        "720p" => Some(Resolution::R720p),
        "576p" => Some(Resolution::R576p),
        "480p" => Some(Resolution::R480p),
        _ => None,
    }
}

/// Extract the source marker, if any. WEB-DL is checked before the bare WEB
/// tokens so it does not get classified as a rip.
pub fn source(name: &str) -> Option<Source> {
    let lower = name.to_lowercase();
    if lower.contains("web-dl") || lower.contains("webdl") || lower.contains("web.dl") {
        Some(Source::WebDl)
    } else if lower.contains("webrip") || lower.contains("web-rip") || lower.contains("web.rip") {
        Some(Source::WebRip)
    } else if lower.contains("bluray") || lower.contains("blu-ray") || lower.contains("bdrip") {
        Some(Source::BluRay)
    } else if lower.contains("hdtv") {
        Some(Source::Hdtv)
    } else if lower.contains("dvdrip") || lower.contains("dvd-rip") {
        Some(Source::Dvd)
    } else {
        None
    }
}

/// Whether the name carries a PROPER/REPACK/RERIP marker.
pub fn is_proper_or_repack(name: &str) -> bool {
    PROPER_REPACK_RE.is_match(name)
}

/// Whether the title looks like a season pack: a season marker with no
/// episode marker.
pub fn is_season_pack(title: &str) -> bool {
    SEASON_RE.is_match(title) && !EPISODE_RE.is_match(title)
}

/// Whether the name identifies a single episode.
pub fn is_single_episode(name: &str) -> bool {
    EPISODE_RE.is_match(name)
}

fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if ext.len() <= 4 && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_group_trailing_dash() {
        assert_eq!(
            release_group("Show.S01.1080p.WEB-DL.DDP5.1.H.264-NTb"),
            Some("NTb".to_string())
        );
    }

    #[test]
    fn test_release_group_strips_extension() {
        assert_eq!(
            release_group("Movie.2021.720p.BluRay.x264-SPARKS.mkv"),
            Some("SPARKS".to_string())
        );
    }

    #[test]
    fn test_release_group_anime_fallback() {
        assert_eq!(
            release_group("[SubsPlease] Some Show - 05 (1080p)"),
            Some("SubsPlease".to_string())
        );
    }

    #[test]
    fn test_release_group_none() {
        assert_eq!(release_group("Plain Title 1080p"), None);
    }

    #[test]
    fn test_resolution() {
        assert_eq!(resolution("X.2160p.WEB"), Some(Resolution::R2160p));
        assert_eq!(resolution("X.1080p.WEB"), Some(Resolution::R1080p));
        assert_eq!(resolution("X.720p.HDTV"), Some(Resolution::R720p));
        assert_eq!(resolution("no marker here"), None);
        // 10800p must not match via a partial hit
        assert_eq!(resolution("X.10800p.y"), None);
    }

    #[test]
    fn test_source() {
        assert_eq!(source("Show.1080p.WEB-DL.x264"), Some(Source::WebDl));
        assert_eq!(source("Show.1080p.WEBRip.x264"), Some(Source::WebRip));
        assert_eq!(source("Movie.BluRay.x264"), Some(Source::BluRay));
        assert_eq!(source("Show.HDTV.x264"), Some(Source::Hdtv));
        assert_eq!(source("Movie.DVDRip.XviD"), Some(Source::Dvd));
        assert_eq!(source("Album.FLAC"), None);
    }

    #[test]
    fn test_proper_repack() {
        assert!(is_proper_or_repack("Show.S01E01.PROPER.720p"));
        assert!(is_proper_or_repack("Show.S01E01.REPACK.720p"));
        assert!(!is_proper_or_repack("Show.S01E01.720p"));
        // No substring hits inside words
        assert!(!is_proper_or_repack("improperly.named"));
    }

    #[test]
    fn test_season_pack_detection() {
        assert!(is_season_pack("Show.S01.1080p.WEB-DL-NTb"));
        assert!(!is_season_pack("Show.S01E03.1080p.WEB-DL-NTb"));
        assert!(!is_season_pack("Movie.2020.1080p.BluRay-GRP"));
    }

    #[test]
    fn test_single_episode_detection() {
        assert!(is_single_episode("Show.S01E03.720p"));
        assert!(is_single_episode("Show.S01.E03.720p"));
        assert!(is_single_episode("Show.3x07.720p"));
        assert!(!is_single_episode("Show.S01.720p"));
    }
}
