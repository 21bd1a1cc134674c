use std::cmp::Ordering;

use zs_core::matcher::RuleSet;
use zs_core::psl::registrable_domain;
use zs_core::types::{SiteRule, DEFAULT_HIGHLIGHT_COLOR};

use crate::optimizer::{optimize_rules, OptimizeStats};
use crate::parser::{parse_storage, StorageError, StoredRules};

// =============================================================================
// Rule Set Construction
// =============================================================================

/// Optimize stored rules and compile them into an evaluation snapshot.
pub fn build_rule_set(stored: StoredRules) -> (RuleSet, OptimizeStats) {
    let StoredRules { mode, mut rules, .. } = stored;
    let stats = optimize_rules(&mut rules, mode);
    (RuleSet::compile(rules, mode), stats)
}

/// Parse a storage payload and build its rule set in one step.
pub fn compile_storage(text: &str) -> Result<(RuleSet, OptimizeStats), StorageError> {
    parse_storage(text).map(build_rule_set)
}

// =============================================================================
// Rule Creation
// =============================================================================

/// `*://*.<host>/*` for the host a result was hidden from.
pub fn wildcard_for_host(host: &str) -> Option<String> {
    let host = normalize_host(host)?;
    Some(format!("*://*.{host}/*"))
}

/// `*://*.<registrable domain>/*`, covering every sibling subdomain.
pub fn wildcard_for_domain(host: &str) -> Option<String> {
    let host = normalize_host(host)?;
    let domain = registrable_domain(&host);
    Some(format!("*://*.{domain}/*"))
}

fn normalize_host(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || host.contains(['/', ':', ' ']) {
        None
    } else {
        Some(host)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A new rule was appended at this index
    Inserted(usize),
    /// The existing rule at this index was changed
    Updated(usize),
}

impl Upsert {
    pub fn index(self) -> usize {
        match self {
            Upsert::Inserted(idx) | Upsert::Updated(idx) => idx,
        }
    }
}

/// Make `pattern` a blocking rule. An existing rule with the same pattern is
/// switched to blocking in place; otherwise a new rule is appended.
pub fn upsert_blocking_rule(rules: &mut Vec<SiteRule>, pattern: &str) -> Upsert {
    match rules.iter().position(|rule| rule.pattern == pattern) {
        Some(idx) => {
            rules[idx].blocked = true;
            Upsert::Updated(idx)
        }
        None => {
            rules.push(SiteRule::blocking(pattern));
            Upsert::Inserted(rules.len() - 1)
        }
    }
}

/// Make `pattern` a favorite highlighted with `color` (the default color when
/// `None`).
pub fn upsert_favorite(rules: &mut Vec<SiteRule>, pattern: &str, color: Option<&str>) -> Upsert {
    let color = color.unwrap_or(DEFAULT_HIGHLIGHT_COLOR);
    match rules.iter().position(|rule| rule.pattern == pattern) {
        Some(idx) => {
            rules[idx].blocked = false;
            rules[idx].color = color.to_string();
            Upsert::Updated(idx)
        }
        None => {
            rules.push(SiteRule::favorite(pattern, color));
            Upsert::Inserted(rules.len() - 1)
        }
    }
}

// =============================================================================
// Display Ordering
// =============================================================================

/// Indices of `rules` in list order: pinned rules first, then by pattern.
/// Evaluation order is unaffected.
pub fn display_order(rules: &[SiteRule]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rules.len()).collect();
    order.sort_by(|&a, &b| compare_for_display(&rules[a], &rules[b]));
    order
}

fn compare_for_display(a: &SiteRule, b: &SiteRule) -> Ordering {
    b.pinned
        .cmp(&a.pinned)
        .then_with(|| a.pattern.to_lowercase().cmp(&b.pattern.to_lowercase()))
        .then_with(|| a.pattern.cmp(&b.pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zs_core::types::{Effect, MatchMode};

    #[test]
    fn builds_rule_set_from_storage() {
        let (rules, stats) = compile_storage(
            r##"{"sites": [
                {"url": "*://*.a.com/*", "blocked": true},
                {"url": "*://*.a.com/*", "blocked": false, "color": "#fff"},
                {"url": "a.com"},
                {"url": "*://*.b.com/*", "color": "#ffe"}
            ]}"##,
        )
        .unwrap();

        assert_eq!(rules.mode(), MatchMode::Wildcard);
        assert_eq!(rules.len(), 2);
        assert_eq!(stats.deduped, 1);
        assert_eq!(stats.invalid.len(), 1);
        assert_eq!(rules.evaluate("https://x.a.com/").effect, Effect::Hidden);
        assert_eq!(rules.evaluate("https://b.com/").effect, Effect::Highlighted("#ffe"));
    }

    #[test]
    fn builds_legacy_rule_set() {
        let (rules, _) = compile_storage(r#"{"blocked": ["pinterest\\."], "favorites": ["rust-lang"]}"#).unwrap();
        assert_eq!(rules.mode(), MatchMode::LegacyRegex);
        assert_eq!(rules.evaluate("https://www.pinterest.com/").effect, Effect::Hidden);
        assert_eq!(rules.evaluate("https://www.rust-lang.org/").effect, Effect::Highlighted("#e6ffe6"));
    }

    #[test]
    fn creates_wildcards_for_hosts() {
        assert_eq!(wildcard_for_host("News.Example.com").as_deref(), Some("*://*.news.example.com/*"));
        assert_eq!(wildcard_for_host("www.example.com.").as_deref(), Some("*://*.www.example.com/*"));
        assert_eq!(wildcard_for_host("  "), None);
        assert_eq!(wildcard_for_host("a.com/x"), None);

        assert_eq!(wildcard_for_domain("news.example.com").as_deref(), Some("*://*.example.com/*"));
        assert_eq!(wildcard_for_domain("www.bbc.co.uk").as_deref(), Some("*://*.bbc.co.uk/*"));
    }

    #[test]
    fn upserts_blocking_rules() {
        let mut rules = vec![SiteRule::favorite("*://*.a.com/*", "#fff")];

        assert_eq!(upsert_blocking_rule(&mut rules, "*://*.a.com/*"), Upsert::Updated(0));
        assert!(rules[0].blocked);
        assert_eq!(rules[0].color, "#fff");

        assert_eq!(upsert_blocking_rule(&mut rules, "*://*.b.com/*"), Upsert::Inserted(1));
        assert_eq!(rules[1], SiteRule::blocking("*://*.b.com/*"));
        assert_eq!(rules[1].color, DEFAULT_HIGHLIGHT_COLOR);
        assert!(!rules[1].pinned);
    }

    #[test]
    fn upserts_favorites() {
        let mut rules = vec![SiteRule::blocking("*://*.a.com/*")];
        assert_eq!(upsert_favorite(&mut rules, "*://*.a.com/*", Some("#abc")), Upsert::Updated(0));
        assert!(!rules[0].blocked);
        assert_eq!(rules[0].color, "#abc");

        let inserted = upsert_favorite(&mut rules, "*://*.b.com/*", None);
        assert_eq!(inserted.index(), 1);
        assert_eq!(rules[1].color, DEFAULT_HIGHLIGHT_COLOR);
    }

    #[test]
    fn orders_for_display() {
        let mut pinned = SiteRule::blocking("*://*.zeta.com/*");
        pinned.pinned = true;
        let rules = vec![
            SiteRule::blocking("*://*.beta.com/*"),
            pinned,
            SiteRule::blocking("*://*.Alpha.com/*"),
        ];
        assert_eq!(display_order(&rules), vec![1, 2, 0]);
    }
}
