//! Core type definitions for ZenSearch
//!
//! Site rules as the storage collaborator hands them over, the visual effect a
//! rule resolves to, and the counters a pass reports.

use serde::{Deserialize, Serialize};

/// Highlight color given to rules created without an explicit color.
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#e6ffe6";

// =============================================================================
// Site Rules
// =============================================================================

/// One user-defined site rule.
///
/// The serialized field names follow the persisted `sites` layout
/// (`url`, `top`), with the descriptive names accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRule {
    /// Wildcard URL pattern (`*://*.example.com/*`), or a hostname regex for
    /// rules carried over from the legacy layout
    #[serde(rename = "url", alias = "pattern")]
    pub pattern: String,
    /// Hide matching results instead of highlighting them
    #[serde(default)]
    pub blocked: bool,
    /// CSS background color used when the rule highlights
    #[serde(default = "default_color")]
    pub color: String,
    /// Pinned to the top of the popup list; display only
    #[serde(rename = "top", alias = "pinned", default)]
    pub pinned: bool,
}

fn default_color() -> String {
    DEFAULT_HIGHLIGHT_COLOR.to_string()
}

impl SiteRule {
    /// Rule that hides every result matching `pattern`.
    pub fn blocking(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            blocked: true,
            color: default_color(),
            pinned: false,
        }
    }

    /// Rule that highlights every result matching `pattern` with `color`.
    pub fn favorite(pattern: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            blocked: false,
            color: color.into(),
            pinned: false,
        }
    }

    /// The effect this rule applies to a result it matches.
    pub fn effect(&self) -> Effect<'_> {
        if self.blocked {
            Effect::Hidden
        } else {
            Effect::Highlighted(&self.color)
        }
    }
}

// =============================================================================
// Match Mode
// =============================================================================

/// How the patterns of a rule set are interpreted.
///
/// A rule set uses exactly one mode; modes are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// `scheme://host/path*` wildcard patterns
    #[default]
    Wildcard,
    /// Raw regular expressions tested against the hostname
    LegacyRegex,
}

// =============================================================================
// Effects
// =============================================================================

/// Visual effect applied to one result element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect<'a> {
    /// Natural, unmodified state
    #[default]
    None,
    /// `display: none`
    Hidden,
    /// `background-color: <color>`
    Highlighted(&'a str),
}

/// Result of evaluating one URL against a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict<'a> {
    /// Effect of the winning rule
    pub effect: Effect<'a>,
    /// Position of the winning rule in stored order
    pub rule_index: Option<usize>,
}

// =============================================================================
// Pass Counters
// =============================================================================

/// Counters for one extraction, matching and painting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PassStats {
    /// Result elements the engine selector returned
    pub candidates: usize,
    /// Elements a URL could be extracted from
    pub extracted: usize,
    /// Elements hidden by a blocking rule
    pub hidden: usize,
    /// Elements highlighted by a favorite rule
    pub highlighted: usize,
    /// Elements with a URL but no matching rule
    pub unmatched: usize,
}

impl PassStats {
    /// Record the effect applied to one element.
    pub fn record(&mut self, effect: &Effect<'_>) {
        match effect {
            Effect::None => self.unmatched += 1,
            Effect::Hidden => self.hidden += 1,
            Effect::Highlighted(_) => self.highlighted += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_effect() {
        assert_eq!(SiteRule::blocking("*://*.a.com/*").effect(), Effect::Hidden);
        assert_eq!(
            SiteRule::favorite("*://*.a.com/*", "#fff").effect(),
            Effect::Highlighted("#fff")
        );
    }

    #[test]
    fn test_rule_storage_layout() {
        let rule: SiteRule = serde_json::from_str(
            r##"{"url":"*://*.example.com/*","blocked":false,"color":"#e6ffe6","top":true}"##,
        )
        .unwrap();
        assert_eq!(rule.pattern, "*://*.example.com/*");
        assert!(rule.pinned);

        let rule: SiteRule = serde_json::from_str(r#"{"pattern":"*://a.com/*","blocked":true}"#).unwrap();
        assert_eq!(rule.color, DEFAULT_HIGHLIGHT_COLOR);
        assert!(!rule.pinned);
    }

    #[test]
    fn test_pass_stats_record() {
        let mut stats = PassStats::default();
        stats.record(&Effect::Hidden);
        stats.record(&Effect::Highlighted("#fff"));
        stats.record(&Effect::None);
        assert_eq!((stats.hidden, stats.highlighted, stats.unmatched), (1, 1, 1));
    }
}
