//! Tracker normalization.
//!
//! Trackers are stored as operator-visible hostname strings. Comparisons use
//! the trimmed, lowercased form; set operations return sorted, deduplicated
//! vectors so JSON columns serialize deterministically.

/// Normalize a single tracker string: trim whitespace, lowercase.
pub fn normalize_tracker(tracker: &str) -> String {
    tracker.trim().to_lowercase()
}

/// Normalize a collection of trackers into a sorted, unique vector.
///
/// Idempotent: `normalize_tracker_set(normalize_tracker_set(x)) == normalize_tracker_set(x)`.
pub fn normalize_tracker_set<I, S>(trackers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = trackers
        .into_iter()
        .map(|t| normalize_tracker(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Compare two tracker collections as normalized sets.
pub fn tracker_sets_equal<'a, A, B>(a: A, b: B) -> bool
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    normalize_tracker_set(a) == normalize_tracker_set(b)
}

/// Extract the hostname from an announce URL.
///
/// Returns `None` for strings that are not parseable URLs or have no host.
pub fn tracker_host(announce_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(announce_url.trim()).ok()?;
    url.host_str().map(|h| h.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tracker() {
        assert_eq!(normalize_tracker("  Tracker.Example  "), "tracker.example");
        assert_eq!(normalize_tracker("already.lower"), "already.lower");
    }

    #[test]
    fn test_normalize_set_sorted_unique() {
        let set = normalize_tracker_set(["b.example", "A.example", "b.example", " "]);
        assert_eq!(set, vec!["a.example".to_string(), "b.example".to_string()]);
    }

    #[test]
    fn test_normalize_set_idempotent() {
        let once = normalize_tracker_set(["Z.example", "a.example", "z.EXAMPLE"]);
        let twice = normalize_tracker_set(once.iter().map(|s| s.as_str()));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sets_equal_ignores_order_and_case() {
        assert!(tracker_sets_equal(
            ["a.example", "B.example"],
            ["b.example", "A.example"]
        ));
        assert!(!tracker_sets_equal(["a.example"], ["b.example"]));
    }

    #[test]
    fn test_tracker_host() {
        assert_eq!(
            tracker_host("https://Tracker.Example:2053/announce?passkey=x"),
            Some("tracker.example".to_string())
        );
        assert_eq!(
            tracker_host("udp://open.demonii.com:1337/announce"),
            Some("open.demonii.com".to_string())
        );
        assert_eq!(tracker_host("not a url"), None);
    }
}
