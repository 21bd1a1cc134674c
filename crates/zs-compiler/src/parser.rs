use serde::Deserialize;
use serde_json::{Map, Value};
use zs_core::types::{MatchMode, SiteRule, DEFAULT_HIGHLIGHT_COLOR};

/// Error type for storage payload parsing.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage payload is not an object")]
    NotAnObject,
    #[error("Storage field `{field}` must be {expected}")]
    FieldType { field: &'static str, expected: &'static str },
}

/// Which persisted layout a payload used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLayout {
    /// `sites: [{url, blocked, color, top}]`
    Sites,
    /// `favorites`/`blocked` regex lists plus `pinnedSites`,
    /// `highlightColors` and `highlightColor`
    Legacy,
    /// Nothing stored yet
    Empty,
}

/// Rules read from storage, in stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRules {
    pub layout: StorageLayout,
    pub mode: MatchMode,
    pub rules: Vec<SiteRule>,
    /// Entries dropped because they were not rule objects
    pub skipped: usize,
}

impl StoredRules {
    pub fn empty() -> Self {
        Self {
            layout: StorageLayout::Empty,
            mode: MatchMode::Wildcard,
            rules: Vec::new(),
            skipped: 0,
        }
    }
}

pub fn parse_storage(text: &str) -> Result<StoredRules, StorageError> {
    if text.trim().is_empty() {
        return Ok(StoredRules::empty());
    }
    let value: Value = serde_json::from_str(text)?;
    parse_storage_value(&value)
}

/// Parse an already-decoded storage object. A `sites` key takes precedence
/// over the legacy keys.
pub fn parse_storage_value(value: &Value) -> Result<StoredRules, StorageError> {
    let object = match value {
        Value::Object(object) => object,
        Value::Null => return Ok(StoredRules::empty()),
        _ => return Err(StorageError::NotAnObject),
    };

    if let Some(sites) = object.get("sites") {
        return parse_sites(sites);
    }

    if object.contains_key("favorites") || object.contains_key("blocked") {
        return parse_legacy(object);
    }

    Ok(StoredRules::empty())
}

fn parse_sites(sites: &Value) -> Result<StoredRules, StorageError> {
    let entries: &[Value] = match sites {
        Value::Array(entries) => entries,
        Value::Null => &[],
        _ => {
            return Err(StorageError::FieldType {
                field: "sites",
                expected: "an array",
            })
        }
    };

    let mut rules = Vec::with_capacity(entries.len());
    let mut skipped = 0usize;

    for (index, entry) in entries.iter().enumerate() {
        match site_entry(entry) {
            Some(rule) => rules.push(rule),
            None => {
                log::warn!("skipping malformed site entry {}", index);
                skipped += 1;
            }
        }
    }

    Ok(StoredRules {
        layout: StorageLayout::Sites,
        mode: MatchMode::Wildcard,
        rules,
        skipped,
    })
}

fn site_entry(entry: &Value) -> Option<SiteRule> {
    SiteRule::deserialize(entry)
        .ok()
        .filter(|rule| !rule.pattern.trim().is_empty())
}

fn parse_legacy(object: &Map<String, Value>) -> Result<StoredRules, StorageError> {
    let (blocked, skipped_blocked) = string_list(object, "blocked")?;
    let (favorites, skipped_favorites) = string_list(object, "favorites")?;
    let (pinned, _) = string_list(object, "pinnedSites")?;

    let colors = match object.get("highlightColors") {
        Some(Value::Object(colors)) => Some(colors),
        None | Some(Value::Null) => None,
        Some(_) => {
            return Err(StorageError::FieldType {
                field: "highlightColors",
                expected: "an object",
            })
        }
    };
    let global_color = object
        .get("highlightColor")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_HIGHLIGHT_COLOR);

    let color_for = |pattern: &str| {
        colors
            .and_then(|colors| colors.get(pattern))
            .and_then(Value::as_str)
            .unwrap_or(global_color)
            .to_string()
    };

    // Blocked entries come first so a site listed in both stays hidden.
    let rules = blocked
        .into_iter()
        .map(|pattern| (pattern, true))
        .chain(favorites.into_iter().map(|pattern| (pattern, false)))
        .map(|(pattern, is_blocked)| SiteRule {
            color: color_for(&pattern),
            pinned: pinned.contains(&pattern),
            blocked: is_blocked,
            pattern,
        })
        .collect();

    Ok(StoredRules {
        layout: StorageLayout::Legacy,
        mode: MatchMode::LegacyRegex,
        rules,
        skipped: skipped_blocked + skipped_favorites,
    })
}

/// Non-empty strings of an array field; other items are counted as skipped.
fn string_list(object: &Map<String, Value>, field: &'static str) -> Result<(Vec<String>, usize), StorageError> {
    let items = match object.get(field) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Ok((Vec::new(), 0)),
        Some(_) => {
            return Err(StorageError::FieldType {
                field,
                expected: "an array",
            })
        }
    };

    let mut strings = Vec::with_capacity(items.len());
    let mut skipped = 0usize;
    for item in items {
        match item.as_str().map(str::trim) {
            Some(s) if !s.is_empty() => strings.push(s.to_string()),
            _ => skipped += 1,
        }
    }
    Ok((strings, skipped))
}

/// Serialize rules in the `sites` layout, ready to be written back.
pub fn to_storage_value(rules: &[SiteRule]) -> Value {
    let mut object = Map::new();
    object.insert(
        "sites".to_string(),
        serde_json::to_value(rules).unwrap_or(Value::Array(Vec::new())),
    );
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_sites_layout() {
        let stored = parse_storage(
            r##"{"sites": [
                {"url": "*://*.a.com/*", "blocked": true, "color": "#fff", "top": false},
                {"url": "*://*.b.com/*", "blocked": false, "color": "#ffe", "top": true},
                {"blocked": true},
                {"url": "   "},
                "not an object"
            ]}"##,
        )
        .unwrap();

        assert_eq!(stored.layout, StorageLayout::Sites);
        assert_eq!(stored.mode, MatchMode::Wildcard);
        assert_eq!(stored.skipped, 3);
        assert_eq!(stored.rules.len(), 2);
        assert!(stored.rules[0].blocked);
        assert!(stored.rules[1].pinned);
        assert_eq!(stored.rules[1].color, "#ffe");
    }

    #[test]
    fn test_sites_defaults() {
        let stored = parse_storage(r#"{"sites": [{"url": "*://*.a.com/*"}]}"#).unwrap();
        assert_eq!(stored.rules, vec![SiteRule::favorite("*://*.a.com/*", DEFAULT_HIGHLIGHT_COLOR)]);
    }

    #[test]
    fn test_sites_take_precedence_over_legacy() {
        let stored = parse_storage_value(&json!({
            "sites": [],
            "blocked": ["pinterest"],
        }))
        .unwrap();
        assert_eq!(stored.layout, StorageLayout::Sites);
        assert!(stored.rules.is_empty());
    }

    #[test]
    fn test_parse_legacy_layout() {
        let stored = parse_storage_value(&json!({
            "favorites": ["rust-lang\\.org", "docs\\.rs", 7],
            "blocked": ["pinterest"],
            "pinnedSites": ["docs\\.rs"],
            "highlightColors": {"rust-lang\\.org": "#abcdef"},
            "highlightColor": "#123456",
        }))
        .unwrap();

        assert_eq!(stored.layout, StorageLayout::Legacy);
        assert_eq!(stored.mode, MatchMode::LegacyRegex);
        assert_eq!(stored.skipped, 1);

        let patterns: Vec<_> = stored.rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, ["pinterest", "rust-lang\\.org", "docs\\.rs"]);
        assert!(stored.rules[0].blocked);
        assert_eq!(stored.rules[1].color, "#abcdef");
        assert_eq!(stored.rules[2].color, "#123456");
        assert!(stored.rules[2].pinned);
        assert!(!stored.rules[1].pinned);
    }

    #[test]
    fn test_empty_payloads() {
        assert_eq!(parse_storage("").unwrap(), StoredRules::empty());
        assert_eq!(parse_storage("{}").unwrap(), StoredRules::empty());
        assert_eq!(parse_storage("null").unwrap(), StoredRules::empty());
        assert_eq!(parse_storage(r#"{"language": "en"}"#).unwrap().layout, StorageLayout::Empty);
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(parse_storage("[1, 2]"), Err(StorageError::NotAnObject)));
        assert!(matches!(parse_storage("{"), Err(StorageError::Json(_))));
        assert!(matches!(
            parse_storage(r#"{"sites": {"url": "x"}}"#),
            Err(StorageError::FieldType { field: "sites", .. })
        ));
        assert!(matches!(
            parse_storage(r#"{"blocked": "pinterest"}"#),
            Err(StorageError::FieldType { field: "blocked", .. })
        ));
    }

    #[test]
    fn test_storage_value_uses_persisted_names() {
        let value = to_storage_value(&[SiteRule::blocking("*://*.a.com/*")]);
        assert_eq!(
            value,
            json!({"sites": [{"url": "*://*.a.com/*", "blocked": true, "color": "#e6ffe6", "top": false}]})
        );
        let stored = parse_storage_value(&value).unwrap();
        assert_eq!(stored.rules[0], SiteRule::blocking("*://*.a.com/*"));
    }
}
