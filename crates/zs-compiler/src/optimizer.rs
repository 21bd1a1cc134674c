use std::collections::HashSet;

use zs_core::matcher::{Pattern, PatternError, WildcardPattern};
use zs_core::types::{MatchMode, SiteRule};

/// A rule dropped because its pattern does not compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRule {
    /// Position in the list handed to [`optimize_rules`]
    pub index: usize,
    pub error: PatternError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub invalid: Vec<InvalidRule>,
}

/// Drop rules that can never decide a result: patterns that do not compile
/// in `mode`, and later copies of a pattern already seen (the first one always
/// wins). Relative order of the survivors is kept.
pub fn optimize_rules(rules: &mut Vec<SiteRule>, mode: MatchMode) -> OptimizeStats {
    let before = rules.len();
    let mut invalid = Vec::new();
    let mut seen: HashSet<RuleKey> = HashSet::new();
    let mut deduped = 0usize;
    let mut index = 0usize;

    rules.retain(|rule| {
        let current = index;
        index += 1;

        let key = match Pattern::compile(&rule.pattern, mode) {
            Ok(Pattern::Wildcard(wildcard)) => RuleKey::Wildcard(wildcard),
            Ok(Pattern::HostRegex(regex)) => RuleKey::Regex(regex.as_str().to_string()),
            Err(error) => {
                invalid.push(InvalidRule { index: current, error });
                return false;
            }
        };
        if seen.contains(&key) {
            deduped += 1;
            false
        } else {
            seen.insert(key);
            true
        }
    });

    let after = rules.len();
    if deduped > 0 || !invalid.is_empty() {
        log::debug!(
            "optimized rules: {} -> {} ({} duplicate, {} invalid)",
            before,
            after,
            deduped,
            invalid.len()
        );
    }

    OptimizeStats {
        before,
        after,
        deduped,
        invalid,
    }
}

/// Wildcard rules compare by their parsed form, so `*://*.A.com/*` and
/// `*://*.a.com/*` collide. Regex rules compare verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RuleKey {
    Wildcard(WildcardPattern),
    Regex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_later_duplicates() {
        let mut rules = vec![
            SiteRule::blocking("*://*.a.com/*"),
            SiteRule::favorite("*://*.b.com/*", "#fff"),
            SiteRule::favorite("*://*.A.com/*", "#fff"),
        ];
        let stats = optimize_rules(&mut rules, MatchMode::Wildcard);

        assert_eq!(stats.before, 3);
        assert_eq!(stats.after, 2);
        assert_eq!(stats.deduped, 1);
        assert!(rules[0].blocked);
        assert_eq!(rules[1].pattern, "*://*.b.com/*");
    }

    #[test]
    fn test_reports_invalid_patterns() {
        let mut rules = vec![
            SiteRule::blocking("example.com"),
            SiteRule::blocking("*://*.ok.com/*"),
            SiteRule::blocking("*:///nohost"),
        ];
        let stats = optimize_rules(&mut rules, MatchMode::Wildcard);

        assert_eq!(rules.len(), 1);
        assert_eq!(stats.invalid.len(), 2);
        assert_eq!(stats.invalid[0].index, 0);
        assert!(matches!(stats.invalid[0].error, PatternError::MissingSchemeSeparator(_)));
        assert_eq!(stats.invalid[1].index, 2);
    }

    #[test]
    fn test_legacy_mode_keys() {
        let mut rules = vec![
            SiteRule::blocking("Pinterest"),
            SiteRule::blocking("pinterest"),
            SiteRule::blocking("(unclosed"),
        ];
        let stats = optimize_rules(&mut rules, MatchMode::LegacyRegex);
        assert_eq!(stats.after, 2);
        assert_eq!(stats.deduped, 0);
        assert_eq!(stats.invalid.len(), 1);
    }
}
