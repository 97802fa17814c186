//! HTTP metrics and the server's Prometheus registry.

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, Opts, Registry};

/// HTTP requests by method, path and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reseed_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// Build the registry holding server and core metrics.
pub fn build_registry() -> Registry {
    let registry = Registry::new();
    // Duplicate registration only happens in tests building several states;
    // the collectors are process-global either way.
    let _ = registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = reseed_core::metrics::register_core_metrics(&registry);
    registry
}

/// Collapse path segments that contain identifiers so metric cardinality
/// stays bounded.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.chars().any(|c| c.is_ascii_digit()) && segment.len() > 8 {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(
            normalize_path("/api/v1/searchees/abcdef1234567890"),
            "/api/v1/searchees/{id}"
        );
    }

    #[test]
    fn test_build_registry_is_reentrant() {
        let _a = build_registry();
        let _b = build_registry();
    }
}
