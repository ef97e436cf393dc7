//! Cache TTL tiering by report id

use crate::core::constants::{
    CACHE_TTL_REPORT_LONG, CACHE_TTL_REPORT_MEDIUM, CACHE_TTL_REPORT_SHORT,
};

const SHORT_MARKERS: [&str; 3] = ["current", "progress", "wip"];
const MEDIUM_MARKERS: [&str; 4] = ["burndown", "trend", "predictability", "active"];
const LONG_MARKERS: [&str; 3] = ["closed", "historical", "summary"];

/// Pick the cache TTL (seconds) for a report id.
///
/// Substring tiers, checked in order so the first matching tier wins:
/// short for live views (current/progress/wip), medium for trend-style
/// charts (burndown/trend/predictability/active), long for historical
/// rollups (closed/historical/summary), medium for everything else.
pub fn ttl_for_report(report_id: &str) -> u64 {
    if SHORT_MARKERS.iter().any(|m| report_id.contains(m)) {
        CACHE_TTL_REPORT_SHORT
    } else if MEDIUM_MARKERS.iter().any(|m| report_id.contains(m)) {
        CACHE_TTL_REPORT_MEDIUM
    } else if LONG_MARKERS.iter().any(|m| report_id.contains(m)) {
        CACHE_TTL_REPORT_LONG
    } else {
        CACHE_TTL_REPORT_MEDIUM
    }
}
