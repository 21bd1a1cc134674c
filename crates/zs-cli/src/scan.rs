//! Offline passes over saved result pages

use serde::Serialize;
use url::Url;
use zs_core::engine::EngineDescriptor;
use zs_core::matcher::RuleSet;
use zs_core::painter::{BACKGROUND_COLOR, DISPLAY};
use zs_core::pipeline::{evaluate, run_pass};
use zs_core::types::PassStats;

use crate::page::Page;

/// What a pass did to one result element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedResult {
    pub index: usize,
    /// Destination after redirect unwrapping
    pub url: Option<String>,
    /// `hidden`, `highlighted` or `none`
    pub effect: &'static str,
    pub color: Option<String>,
    /// Stored position of the rule that decided the effect
    pub rule: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub engine: String,
    pub stats: PassStats,
    pub results: Vec<ScannedResult>,
}

/// Run one pass over `html` as if it had been loaded from `page_url`.
pub fn scan_page(html: &str, page_url: &Url, engine: &EngineDescriptor, rules: &RuleSet) -> ScanReport {
    let page = Page::parse(html, Some(page_url.clone()));
    let elements = page.results(&engine.result_selector);
    let stats = run_pass(&elements, engine, rules);

    let results = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let evaluation = evaluate(element, engine, rules);
            let color = element.style(BACKGROUND_COLOR);
            let effect = if element.style(DISPLAY).as_deref() == Some("none") {
                "hidden"
            } else if color.is_some() {
                "highlighted"
            } else {
                "none"
            };
            ScannedResult {
                index,
                url: evaluation.url,
                effect,
                color,
                rule: evaluation.verdict.rule_index,
            }
        })
        .collect();

    ScanReport {
        engine: engine.name.clone(),
        stats,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zs_core::engine::EngineRegistry;
    use zs_core::types::{MatchMode, SiteRule};

    const GOOGLE_PAGE: &str = r#"<html><body><div id="rso">
        <div class="g"><a href="/url?url=https%3A%2F%2Fnews.blocked-site.com%2Fa&amp;sa=U">Wrapped</a></div>
        <div class="g"><a class="fl" href="/search?q=more">More</a><cite>docs.rs › tokio</cite></div>
        <div class="g"><a href="https://other.org/">Other</a></div>
        <div class="g g-blk"><a href="https://blocked-site.com/ad">Ad block</a></div>
        <div class="g"><span>no link</span></div>
    </div></body></html>"#;

    fn google() -> EngineDescriptor {
        EngineRegistry::default().resolve("www.google.com").cloned().unwrap()
    }

    fn page_url() -> Url {
        Url::parse("https://www.google.com/search?q=rust").unwrap()
    }

    fn rules() -> RuleSet {
        RuleSet::compile(
            vec![
                SiteRule::blocking("*://*.blocked-site.com/*"),
                SiteRule::favorite("*://*.docs.rs/*", "#ccffcc"),
            ],
            MatchMode::Wildcard,
        )
    }

    #[test]
    fn hides_and_highlights_matching_results() {
        let report = scan_page(GOOGLE_PAGE, &page_url(), &google(), &rules());

        assert_eq!(report.engine, "google");
        assert_eq!(report.stats.candidates, 4);
        assert_eq!(report.stats.extracted, 3);
        assert_eq!(report.stats.hidden, 1);
        assert_eq!(report.stats.highlighted, 1);
        assert_eq!(report.stats.unmatched, 1);

        let wrapped = &report.results[0];
        assert_eq!(wrapped.url.as_deref(), Some("https://news.blocked-site.com/a"));
        assert_eq!(wrapped.effect, "hidden");
        assert_eq!(wrapped.rule, Some(0));

        let favorite = &report.results[1];
        assert_eq!(favorite.url.as_deref(), Some("docs.rs"));
        assert_eq!(favorite.effect, "highlighted");
        assert_eq!(favorite.color.as_deref(), Some("#ccffcc"));

        assert_eq!(report.results[2].effect, "none");
        assert_eq!(report.results[3].url, None);
    }

    #[test]
    fn repeated_scans_agree() {
        let first = scan_page(GOOGLE_PAGE, &page_url(), &google(), &rules());
        let second = scan_page(GOOGLE_PAGE, &page_url(), &google(), &rules());
        assert_eq!(first, second);
    }

    #[test]
    fn no_rules_leaves_everything_untouched() {
        let report = scan_page(GOOGLE_PAGE, &page_url(), &google(), &RuleSet::default());
        assert_eq!(report.stats.hidden, 0);
        assert_eq!(report.stats.highlighted, 0);
        assert!(report.results.iter().all(|result| result.effect == "none"));
    }

    #[test]
    fn first_stored_rule_wins() {
        let rules = RuleSet::compile(
            vec![
                SiteRule::favorite("*://*.other.org/*", "yellow"),
                SiteRule::blocking("*://other.org/*"),
            ],
            MatchMode::Wildcard,
        );
        let report = scan_page(GOOGLE_PAGE, &page_url(), &google(), &rules);
        assert_eq!(report.results[2].effect, "highlighted");
        assert_eq!(report.results[2].rule, Some(0));
    }
}
