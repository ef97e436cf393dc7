//! Type-safe cache key builder with versioning

use crate::core::constants::CACHE_KEY_VERSION;

/// Type-safe cache key builder
///
/// All keys are prefixed with a version (e.g., "v1:") to allow
/// invalidating all cached data on schema changes.
pub struct CacheKey;

impl CacheKey {
    // --- Reports ---

    /// Cache key for a resolved report
    ///
    /// The digest covers the canonical filter JSON and the report id, so two
    /// reports resolved with identical filters never share an entry.
    pub fn report(report_id: &str, filter_json: &str) -> String {
        let digest = format!("{:x}", md5::compute(format!("{filter_json}{report_id}")));
        format!("{}:report:{}:{}", CACHE_KEY_VERSION, report_id, digest)
    }

    /// Pattern matching every cached variant of one report
    pub fn report_scope(report_id: &str) -> String {
        format!("{}:report:{}:*", CACHE_KEY_VERSION, report_id)
    }

    /// Cache key for the report catalog listing
    pub fn catalog() -> String {
        format!("{}:report:catalog", CACHE_KEY_VERSION)
    }

    /// Pattern matching every cached report entry, catalog included
    pub fn all_reports() -> String {
        format!("{}:report:*", CACHE_KEY_VERSION)
    }
}
