//! Rule Matching Engine
//!
//! Every extracted result URL goes through here once per pass. Patterns are
//! compiled once per rule snapshot, the candidate URL is parsed once per
//! evaluation, and rules are walked in stored order until the first match.

use regex::Regex;
use ::url::Url;

use crate::psl::is_same_or_subdomain;
use crate::types::{MatchMode, SiteRule, Verdict};
use crate::url::{get_scheme_end, parse_canonical};

/// Error type for pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Pattern has no \"://\" separator: {0}")]
    MissingSchemeSeparator(String),
    #[error("Pattern has an empty host: {0}")]
    EmptyHost(String),
    #[error("Invalid regular expression {pattern}: {reason}")]
    InvalidRegex { pattern: String, reason: String },
}

// =============================================================================
// Wildcard Patterns
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemePattern {
    /// `*`
    Any,
    Exact(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostPattern {
    Exact(String),
    /// `*.example.com`: the domain itself and every subdomain
    Domain(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPattern {
    /// `/*`
    Any,
    Prefix(String),
}

/// Parsed `scheme://host/path` pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardPattern {
    pub scheme: SchemePattern,
    pub host: HostPattern,
    pub path: PathPattern,
}

impl WildcardPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let pattern = pattern.trim();
        let scheme_end = get_scheme_end(pattern)
            .ok_or_else(|| PatternError::MissingSchemeSeparator(pattern.to_string()))?;

        let scheme = &pattern[..scheme_end - 3];
        let rest = &pattern[scheme_end..];

        let scheme = match scheme {
            "*" => SchemePattern::Any,
            other => SchemePattern::Exact(other.to_ascii_lowercase()),
        };

        let (host, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, "/"),
        };

        let host = host.to_ascii_lowercase();
        let host = match host.strip_prefix("*.") {
            Some(domain) if !domain.is_empty() => HostPattern::Domain(domain.to_string()),
            Some(_) => return Err(PatternError::EmptyHost(pattern.to_string())),
            None if host.is_empty() => return Err(PatternError::EmptyHost(pattern.to_string())),
            None => HostPattern::Exact(host),
        };

        let path = if path == "/*" {
            PathPattern::Any
        } else {
            PathPattern::Prefix(path.strip_suffix("/*").unwrap_or(path).to_string())
        };

        Ok(Self { scheme, host, path })
    }

    pub fn matches_url(&self, url: &Url) -> bool {
        if let SchemePattern::Exact(scheme) = &self.scheme {
            if url.scheme() != scheme {
                return false;
            }
        }

        let Some(hostname) = url.host_str() else {
            return false;
        };
        let host_ok = match &self.host {
            HostPattern::Exact(host) => hostname == host,
            HostPattern::Domain(domain) => is_same_or_subdomain(hostname, domain),
        };
        if !host_ok {
            return false;
        }

        match &self.path {
            PathPattern::Any => true,
            PathPattern::Prefix(prefix) => url.path().starts_with(prefix.as_str()),
        }
    }
}

// =============================================================================
// Compiled Patterns
// =============================================================================

/// A rule pattern compiled for one match mode.
#[derive(Debug, Clone)]
pub enum Pattern {
    Wildcard(WildcardPattern),
    /// Legacy rules: regular expression tested against the hostname
    HostRegex(Regex),
}

impl Pattern {
    pub fn compile(pattern: &str, mode: MatchMode) -> Result<Self, PatternError> {
        match mode {
            MatchMode::Wildcard => WildcardPattern::parse(pattern).map(Pattern::Wildcard),
            MatchMode::LegacyRegex => Regex::new(pattern)
                .map(Pattern::HostRegex)
                .map_err(|e| PatternError::InvalidRegex {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn matches_url(&self, url: &Url) -> bool {
        match self {
            Pattern::Wildcard(wildcard) => wildcard.matches_url(url),
            Pattern::HostRegex(regex) => url.host_str().is_some_and(|host| regex.is_match(host)),
        }
    }
}

/// Whether `url` matches the wildcard `pattern`.
///
/// Scheme-less URLs are treated as `https://`. Malformed patterns and
/// unparseable URLs never match.
pub fn matches(url: &str, pattern: &str) -> bool {
    let Ok(pattern) = WildcardPattern::parse(pattern) else {
        return false;
    };
    parse_canonical(url).is_some_and(|url| pattern.matches_url(&url))
}

// =============================================================================
// Rule Sets
// =============================================================================

/// A site rule with its compiled pattern. Rules whose pattern failed to
/// compile stay in place so indices line up with the stored list, but never
/// match.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub rule: SiteRule,
    pattern: Option<Pattern>,
}

impl CompiledRule {
    pub fn new(rule: SiteRule, mode: MatchMode) -> Self {
        let pattern = match Pattern::compile(&rule.pattern, mode) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                log::warn!("rule never matches: {}", e);
                None
            }
        };
        Self { rule, pattern }
    }

    pub fn is_valid(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn matches_url(&self, url: &Url) -> bool {
        self.pattern.as_ref().is_some_and(|pattern| pattern.matches_url(url))
    }
}

/// Immutable snapshot of the ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    mode: MatchMode,
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn compile(rules: Vec<SiteRule>, mode: MatchMode) -> Self {
        let rules = rules.into_iter().map(|rule| CompiledRule::new(rule, mode)).collect();
        Self { mode, rules }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule, in stored order, matching `url`.
    pub fn first_match(&self, url: &str) -> Option<(usize, &SiteRule)> {
        let parsed = parse_canonical(url)?;
        self.rules
            .iter()
            .position(|rule| rule.matches_url(&parsed))
            .map(|idx| (idx, &self.rules[idx].rule))
    }

    /// Effect for `url`: the first matching rule decides, no match leaves the
    /// result untouched.
    pub fn evaluate(&self, url: &str) -> Verdict<'_> {
        match self.first_match(url) {
            Some((idx, rule)) => Verdict {
                effect: rule.effect(),
                rule_index: Some(idx),
            },
            None => Verdict::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Effect;

    #[test]
    fn test_wildcard_subdomains() {
        let pattern = "*://*.example.com/*";
        assert!(matches("https://news.example.com/path", pattern));
        assert!(matches("https://example.com/path", pattern));
        assert!(matches("http://a.b.example.com", pattern));
        assert!(!matches("https://notexample.com/path", pattern));
        assert!(!matches("https://example.com.evil.org/", pattern));
    }

    #[test]
    fn test_path_prefix() {
        let pattern = "*://*.example.com/blog/*";
        assert!(matches("https://x.example.com/blog/post1", pattern));
        assert!(!matches("https://x.example.com/other", pattern));
    }

    #[test]
    fn test_exact_host_and_scheme() {
        assert!(matches("https://docs.rs/tokio", "https://docs.rs/*"));
        assert!(!matches("http://docs.rs/tokio", "https://docs.rs/*"));
        assert!(!matches("https://www.docs.rs/tokio", "https://docs.rs/*"));
        assert!(matches("https://Docs.RS/x", "*://docs.rs/*"));
    }

    #[test]
    fn test_pattern_without_path() {
        assert!(matches("https://example.com/anything", "*://example.com"));
    }

    #[test]
    fn test_scheme_less_url() {
        assert!(matches("example.com/page", "https://*.example.com/*"));
        assert!(matches("www.example.com", "*://*.example.com/*"));
    }

    #[test]
    fn test_non_web_schemes_keep_their_scheme() {
        let ftp = "ftp://files.example.com/pub";
        assert!(matches(ftp, "*://*.example.com/*"));
        assert!(matches(ftp, "ftp://files.example.com/*"));
        assert!(!matches(ftp, "https://files.example.com/*"));
    }

    #[test]
    fn test_malformed_never_matches() {
        assert!(!matches("https://example.com/", "example.com"));
        assert!(!matches("https://example.com/", "*://"));
        assert!(!matches("https://example.com/", "*://*./*"));
        assert!(!matches("", "*://*.example.com/*"));
        assert!(!matches("https://exa mple.com", "*://*.example.com/*"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            WildcardPattern::parse("example.com"),
            Err(PatternError::MissingSchemeSeparator(_))
        ));
        assert!(matches!(WildcardPattern::parse("*:///path"), Err(PatternError::EmptyHost(_))));
        assert_eq!(
            WildcardPattern::parse("*://*.a.com/x/*").unwrap(),
            WildcardPattern {
                scheme: SchemePattern::Any,
                host: HostPattern::Domain("a.com".to_string()),
                path: PathPattern::Prefix("/x".to_string()),
            }
        );
    }

    #[test]
    fn test_first_match_wins() {
        let rules = RuleSet::compile(
            vec![
                SiteRule::blocking("*://*.a.com/*"),
                SiteRule::favorite("*://*.a.com/*", "#e6ffe6"),
            ],
            MatchMode::Wildcard,
        );
        let verdict = rules.evaluate("https://sub.a.com/x");
        assert_eq!(verdict.effect, Effect::Hidden);
        assert_eq!(verdict.rule_index, Some(0));
    }

    #[test]
    fn test_invalid_rule_does_not_stop_evaluation() {
        let rules = RuleSet::compile(
            vec![
                SiteRule::blocking("not a pattern"),
                SiteRule::favorite("*://*.a.com/*", "#fff"),
            ],
            MatchMode::Wildcard,
        );
        assert!(!rules.rules()[0].is_valid());
        let verdict = rules.evaluate("https://a.com/");
        assert_eq!(verdict.effect, Effect::Highlighted("#fff"));
        assert_eq!(verdict.rule_index, Some(1));
    }

    #[test]
    fn test_no_match_is_untouched() {
        let rules = RuleSet::compile(vec![SiteRule::blocking("*://*.a.com/*")], MatchMode::Wildcard);
        assert_eq!(rules.evaluate("https://b.com/"), Verdict::default());
        assert_eq!(RuleSet::default().evaluate("https://a.com/"), Verdict::default());
    }

    #[test]
    fn test_legacy_regex_mode() {
        let rules = RuleSet::compile(
            vec![SiteRule::blocking(r"(^|\.)pinterest\."), SiteRule::blocking("(")],
            MatchMode::LegacyRegex,
        );
        assert_eq!(rules.mode(), MatchMode::LegacyRegex);
        assert!(!rules.rules()[1].is_valid());
        assert_eq!(rules.evaluate("https://www.pinterest.com/pin/1").effect, Effect::Hidden);
        assert_eq!(rules.evaluate("https://example.com/pinterest.").effect, Effect::None);
    }

    #[test]
    fn test_wildcard_text_is_not_regex_in_wildcard_mode() {
        let rules = RuleSet::compile(vec![SiteRule::blocking(r"(^|\.)pinterest\.")], MatchMode::Wildcard);
        assert_eq!(rules.evaluate("https://www.pinterest.com/").effect, Effect::None);
    }
}
