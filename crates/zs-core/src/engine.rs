//! Search engine registry
//!
//! Each supported engine is plain data: a hostname substring that activates it
//! and the CSS selectors locating results on its pages. Engines whose markup
//! comes in several layouts list alternative selectors, which are joined with
//! the selector union operator (`,`) when a descriptor is built.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ResolveStrategy};

// =============================================================================
// Descriptors
// =============================================================================

/// Selectors for one search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDescriptor {
    /// Short identifier (`google`, `bing`, ...)
    pub name: String,
    /// Substring of the page hostname that activates this engine
    pub host_match: String,
    /// Result items
    pub result_selector: String,
    /// Element wrapping the result list, watched for streamed-in results
    pub container_selector: String,
    /// Title link carrying the destination URL
    pub link_selector: String,
    /// Element showing the displayed URL text
    pub url_text_selector: String,
}

/// Static form of an engine table entry.
struct BuiltinEngine {
    name: &'static str,
    host_match: &'static str,
    results: &'static [&'static str],
    container: &'static [&'static str],
    link: &'static [&'static str],
    url_text: &'static [&'static str],
}

impl BuiltinEngine {
    fn to_descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            name: self.name.to_string(),
            host_match: self.host_match.to_string(),
            result_selector: selector_union(self.results),
            container_selector: selector_union(self.container),
            link_selector: selector_union(self.link),
            url_text_selector: selector_union(self.url_text),
        }
    }
}

/// Join alternative selectors with the CSS union operator.
pub fn selector_union(parts: &[&str]) -> String {
    parts.join(",")
}

const BUILTIN_ENGINES: &[BuiltinEngine] = &[
    BuiltinEngine {
        name: "google",
        host_match: "google",
        results: &[".g:not(.g-blk)"],
        container: &["#rso"],
        link: &["a[href]:not(.fl)"],
        url_text: &["cite"],
    },
    BuiltinEngine {
        name: "bing",
        host_match: "www.bing.com",
        results: &[
            "#b_results > li.b_algo",
            ".slide.wptSld[role=\"listitem\"]",
            ".b_wpt_bl",
            "#b_results > .b_ans > .b_rich",
        ],
        container: &["#b_content"],
        link: &[
            "h2 a",
            ".tilk[href]",
            ".b_title a",
            ".b_algo a[h]",
            "a[data-h]",
            ".b_tpcn a",
        ],
        url_text: &[
            "cite",
            ".b_attribution cite",
            ".b_citation",
            ".tpmeta .b_attribution",
            ".b_tpcn .b_attribution",
        ],
    },
    BuiltinEngine {
        name: "duckduckgo",
        host_match: "duckduckgo.com",
        results: &["article[data-testid=\"result\"]"],
        container: &[".react-results--main"],
        link: &["h2 a[data-testid=\"result-title-a\"]"],
        url_text: &["a[data-testid=\"result-extras-url-link\"]"],
    },
    BuiltinEngine {
        name: "yahoo",
        host_match: "search.yahoo.com",
        results: &[".algo"],
        container: &["#web"],
        link: &["h3.title a"],
        url_text: &[".compTitle cite"],
    },
    BuiltinEngine {
        name: "yahoo_jp",
        host_match: "search.yahoo.co.jp",
        results: &[".sw-CardBase .Algo"],
        container: &[".Contents__innerGroupBody"],
        link: &[".sw-Card__titleInner"],
        url_text: &[".sw-Breadcrumbs__item"],
    },
    BuiltinEngine {
        name: "yandex",
        host_match: "yandex.com",
        results: &[
            ".serp-item.organic",
            ".serp-item.Organic",
            ".serp-item.OrganicGroup",
            ".serp-item.Organic.organic",
            ".serp-item.Organic.OrganicGroup",
            ".Organic.organic",
            ".Organic.OrganicGroup",
        ],
        container: &[".content__left", ".main__content"],
        link: &[".OrganicTitle-Link", ".organic__url", ".Link.Link_theme_normal"],
        url_text: &[
            ".Path.Organic-Path",
            ".OrganicTitle-Path",
            ".organic__subtitle .Path-Item",
        ],
    },
    BuiltinEngine {
        name: "yandex_ru",
        host_match: "yandex.ru",
        results: &[".Organic.organic"],
        container: &[".content__left"],
        link: &[".OrganicTitle-LinkText"],
        url_text: &[".Path-Item"],
    },
    BuiltinEngine {
        name: "startpage",
        host_match: "www.startpage.com",
        results: &["div[class^=\"result css-\"]"],
        container: &["div[class*=\"results css-\"]"],
        link: &["a[data-testid=\"gl-title-link\"]"],
        url_text: &["a[class*=\"wgl-display-url\"]"],
    },
    BuiltinEngine {
        name: "ecosia",
        host_match: "www.ecosia.org",
        results: &["article[data-test-id=\"organic-result\"]"],
        container: &["[data-test-id=\"mainline\"]"],
        link: &["[data-test-id=\"result-link\"]"],
        url_text: &[".result__source--domain"],
    },
    BuiltinEngine {
        name: "ask",
        host_match: "ask.com",
        results: &["div.result[data-testid=\"result\"]"],
        container: &[".results"],
        link: &["a.result-title-link"],
        url_text: &[".result-url"],
    },
    BuiltinEngine {
        name: "aol",
        host_match: "search.aol.com",
        results: &[".dd.algo.algo-sr"],
        container: &["#web ul"],
        link: &[".title a.ac-algo"],
        url_text: &[".compTitle .fz-ms"],
    },
    BuiltinEngine {
        name: "naver",
        host_match: "search.naver.com",
        results: &[".lst_total > .bx"],
        container: &[".api_subject_bx"],
        link: &[".total_tit .link_tit"],
        url_text: &[".source_box .txt"],
    },
    BuiltinEngine {
        name: "brave",
        host_match: "search.brave.com",
        results: &[".snippet"],
        container: &["[data-type=\"web\"]"],
        link: &[".heading-serpresult"],
        url_text: &[".netloc"],
    },
    BuiltinEngine {
        name: "onesearch",
        host_match: "www.onesearch.com",
        results: &[".result-item"],
        container: &["#web-results"],
        link: &[".result-title a"],
        url_text: &[".result-url"],
    },
    BuiltinEngine {
        name: "searx",
        host_match: "searx",
        results: &[".result.result-default"],
        container: &["#main_results"],
        link: &["h3 a"],
        url_text: &[".url_i1"],
    },
    BuiltinEngine {
        name: "qwant",
        host_match: "www.qwant.com",
        results: &["[data-testid=\"webResult\"]"],
        container: &["[data-testid=\"SERVariant-A\"]"],
        link: &["[data-testid=\"webResult\"] a[href]"],
        url_text: &["[domain]"],
    },
];

/// Descriptors for every built-in engine, in table order.
pub fn builtin_engines() -> Vec<EngineDescriptor> {
    BUILTIN_ENGINES.iter().map(BuiltinEngine::to_descriptor).collect()
}

// =============================================================================
// Registry
// =============================================================================

/// Lookup table from page hostname to engine descriptor.
#[derive(Debug, Clone)]
pub struct EngineRegistry {
    engines: Vec<EngineDescriptor>,
    strategy: ResolveStrategy,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new(builtin_engines(), ResolveStrategy::default())
    }
}

impl EngineRegistry {
    pub fn new(engines: Vec<EngineDescriptor>, strategy: ResolveStrategy) -> Self {
        Self { engines, strategy }
    }

    /// Built-in table plus any extra engines from the config, appended after
    /// the built-in entries.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut engines = builtin_engines();
        engines.extend(config.extra_engines.iter().cloned());
        Self::new(engines, config.resolve)
    }

    pub fn engines(&self) -> &[EngineDescriptor] {
        &self.engines
    }

    /// Add an engine at the end of the table.
    pub fn register(&mut self, engine: EngineDescriptor) {
        self.engines.push(engine);
    }

    /// Find the engine for a page hostname.
    ///
    /// `None` means the page is not a known result page and the extension
    /// stays inactive.
    pub fn resolve(&self, hostname: &str) -> Option<&EngineDescriptor> {
        let hostname = hostname.to_ascii_lowercase();
        let mut candidates = self
            .engines
            .iter()
            .filter(|engine| !engine.host_match.is_empty() && hostname.contains(&engine.host_match));

        match self.strategy {
            ResolveStrategy::FirstMatch => candidates.next(),
            // Ties keep table order.
            ResolveStrategy::LongestMatch => candidates.fold(None, |best: Option<&EngineDescriptor>, engine| {
                match best {
                    Some(b) if b.host_match.len() >= engine.host_match.len() => Some(b),
                    _ => Some(engine),
                }
            }),
        }
    }
}
