//! Report filter values and normalization
//!
//! Filters arrive as raw query-string pairs, are normalized into typed
//! values, and merge over a definition's defaults. The merged set doubles as
//! the cache-key input, so normalization must map every equivalent request
//! encoding (repeated keys vs. comma-separated, stray whitespace, duplicate
//! list entries) onto one canonical form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Query parameters consumed by the endpoint itself, never part of a
/// report's filter set.
pub const RESERVED_PARAMS: [&str; 2] = ["bypass_cache", "cache_ttl"];

/// A single filter value.
///
/// Untagged so the JSON form round-trips exactly: `null`, `true`, `3`,
/// `"story"`, `["planned", "active"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(Number),
    Str(String),
    List(Vec<String>),
}

impl FilterValue {
    /// "Empty" per the required-filter rule: null, blank string, empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Str(s) => s.trim().is_empty(),
            FilterValue::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// Merged filter mapping.
///
/// A `BTreeMap` keeps keys sorted, so plain serialization already yields the
/// canonical JSON used for cache-key digests.
pub type FilterSet = BTreeMap<String, FilterValue>;

/// Parse a definition's stored `default_filters` JSON object into a typed
/// filter set. Values outside the supported variants are rejected.
pub fn filter_set_from_json(value: &serde_json::Value) -> Result<FilterSet, serde_json::Error> {
    serde_json::from_value(value.clone())
}

/// Normalize raw query pairs into typed filter overrides.
///
/// Repeated keys and comma-separated values are equivalent: both flatten
/// into a `List` with each piece trimmed, empties dropped, and duplicates
/// removed preserving first-seen order. A single plain value is trimmed; an
/// empty result becomes `Null`, so an explicit blank override suppresses the
/// default. No numeric or boolean coercion happens here; typed defaults keep
/// their types and request overrides stay strings.
pub fn normalize_overrides(pairs: &[(String, String)]) -> FilterSet {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in pairs {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }
        grouped.entry(key).or_default().push(value);
    }

    let mut filters = FilterSet::new();
    for (key, raw_values) in grouped {
        let is_list = raw_values.len() > 1 || raw_values.iter().any(|v| v.contains(','));
        let value = if is_list {
            let mut items: Vec<String> = Vec::new();
            for piece in raw_values.iter().flat_map(|v| v.split(',')) {
                let piece = piece.trim();
                if piece.is_empty() || items.iter().any(|seen| seen == piece) {
                    continue;
                }
                items.push(piece.to_string());
            }
            FilterValue::List(items)
        } else {
            let trimmed = raw_values[0].trim();
            if trimmed.is_empty() {
                FilterValue::Null
            } else {
                FilterValue::Str(trimmed.to_string())
            }
        };
        filters.insert(key.to_string(), value);
    }
    filters
}

/// Merge normalized overrides over a definition's defaults.
///
/// Every override wins, including explicit nulls.
pub fn merge_filters(defaults: &FilterSet, overrides: FilterSet) -> FilterSet {
    let mut merged = defaults.clone();
    for (key, value) in overrides {
        merged.insert(key, value);
    }
    merged
}

/// Names from `required_filters` whose merged value is still empty.
pub fn missing_required(filters: &FilterSet, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|name| filters.get(*name).is_none_or(FilterValue::is_empty))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_single_value_trims_to_str() {
        let filters = normalize_overrides(&pairs(&[("team_name", "  Phoenix ")]));
        assert_eq!(
            filters.get("team_name"),
            Some(&FilterValue::Str("Phoenix".to_string()))
        );
    }

    #[test]
    fn test_empty_value_becomes_null() {
        let filters = normalize_overrides(&pairs(&[("team_name", ""), ("sprint_name", "   ")]));
        assert_eq!(filters.get("team_name"), Some(&FilterValue::Null));
        assert_eq!(filters.get("sprint_name"), Some(&FilterValue::Null));
    }

    #[test]
    fn test_comma_separated_value_becomes_list() {
        let filters = normalize_overrides(&pairs(&[("quarters", "2025-Q1, 2025-Q2 ,,")]));
        assert_eq!(
            filters.get("quarters"),
            Some(&FilterValue::List(vec![
                "2025-Q1".to_string(),
                "2025-Q2".to_string()
            ]))
        );
    }

    #[test]
    fn test_repeated_keys_become_list() {
        let filters = normalize_overrides(&pairs(&[
            ("pi_names", "PI-7"),
            ("pi_names", "PI-8"),
        ]));
        assert_eq!(
            filters.get("pi_names"),
            Some(&FilterValue::List(vec![
                "PI-7".to_string(),
                "PI-8".to_string()
            ]))
        );
    }

    #[test]
    fn test_repeated_and_comma_forms_are_equivalent() {
        let repeated = normalize_overrides(&pairs(&[
            ("quarters", "2025-Q1"),
            ("quarters", "2025-Q2"),
        ]));
        let comma = normalize_overrides(&pairs(&[("quarters", "2025-Q1,2025-Q2")]));
        assert_eq!(repeated, comma);
        assert_eq!(
            serde_json::to_string(&repeated).unwrap(),
            serde_json::to_string(&comma).unwrap()
        );
    }

    #[test]
    fn test_list_dedup_preserves_first_seen_order() {
        let filters = normalize_overrides(&pairs(&[("categories", "flow,quality,flow,quality")]));
        assert_eq!(
            filters.get("categories"),
            Some(&FilterValue::List(vec![
                "flow".to_string(),
                "quality".to_string()
            ]))
        );
    }

    #[test]
    fn test_reserved_params_excluded() {
        let filters = normalize_overrides(&pairs(&[
            ("bypass_cache", "true"),
            ("cache_ttl", "900"),
            ("team_name", "Phoenix"),
        ]));
        assert_eq!(filters.len(), 1);
        assert!(filters.contains_key("team_name"));
    }

    #[test]
    fn test_merge_override_wins() {
        let defaults = filter_set_from_json(&json!({
            "team_name": null,
            "issue_type": "all",
            "sprint_name": null
        }))
        .unwrap();
        let overrides = normalize_overrides(&pairs(&[("team_name", "Phoenix")]));

        let merged = merge_filters(&defaults, overrides);
        assert_eq!(
            merged.get("team_name"),
            Some(&FilterValue::Str("Phoenix".to_string()))
        );
        assert_eq!(
            merged.get("issue_type"),
            Some(&FilterValue::Str("all".to_string()))
        );
        assert_eq!(merged.get("sprint_name"), Some(&FilterValue::Null));
    }

    #[test]
    fn test_merge_explicit_null_suppresses_default() {
        let defaults = filter_set_from_json(&json!({"issue_type": "all"})).unwrap();
        let overrides = normalize_overrides(&pairs(&[("issue_type", "")]));

        let merged = merge_filters(&defaults, overrides);
        assert_eq!(merged.get("issue_type"), Some(&FilterValue::Null));
    }

    #[test]
    fn test_typed_defaults_pass_through_unchanged() {
        let defaults = filter_set_from_json(&json!({"months": 6, "include_bugs": true})).unwrap();
        let merged = merge_filters(&defaults, FilterSet::new());
        assert_eq!(
            merged.get("months"),
            Some(&FilterValue::Number(Number::from(6)))
        );
        assert_eq!(merged.get("include_bugs"), Some(&FilterValue::Bool(true)));
    }

    #[test]
    fn test_is_empty() {
        assert!(FilterValue::Null.is_empty());
        assert!(FilterValue::Str("  ".to_string()).is_empty());
        assert!(FilterValue::List(vec![]).is_empty());
        assert!(!FilterValue::Str("x".to_string()).is_empty());
        assert!(!FilterValue::Bool(false).is_empty());
        assert!(!FilterValue::Number(Number::from(0)).is_empty());
        assert!(!FilterValue::List(vec!["x".to_string()]).is_empty());
    }

    #[test]
    fn test_missing_required() {
        let filters = filter_set_from_json(&json!({
            "team_name": "Phoenix",
            "sprint_name": null
        }))
        .unwrap();
        let required = vec!["team_name".to_string(), "sprint_name".to_string(), "pi".to_string()];
        assert_eq!(
            missing_required(&filters, &required),
            vec!["sprint_name".to_string(), "pi".to_string()]
        );
    }

    #[test]
    fn test_canonical_json_is_order_independent() {
        let a = normalize_overrides(&pairs(&[("b", "2"), ("a", "1")]));
        let b = normalize_overrides(&pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"a":"1","b":"2"}"#);
    }

    #[test]
    fn test_filter_value_serde_round_trip() {
        let set = filter_set_from_json(&json!({
            "a": null,
            "b": true,
            "c": 3,
            "d": "story",
            "e": ["planned", "active"]
        }))
        .unwrap();
        assert_eq!(set.get("a"), Some(&FilterValue::Null));
        assert_eq!(set.get("b"), Some(&FilterValue::Bool(true)));
        assert_eq!(set.get("c"), Some(&FilterValue::Number(Number::from(3))));
        assert_eq!(set.get("d"), Some(&FilterValue::Str("story".to_string())));
        assert_eq!(
            set.get("e"),
            Some(&FilterValue::List(vec![
                "planned".to_string(),
                "active".to_string()
            ]))
        );

        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            json!({"a": null, "b": true, "c": 3, "d": "story", "e": ["planned", "active"]})
        );
    }

    #[test]
    fn test_filter_set_from_json_rejects_non_object() {
        assert!(filter_set_from_json(&json!(["not", "a", "map"])).is_err());
        assert!(filter_set_from_json(&json!({"nested": {"x": 1}})).is_err());
    }
}
