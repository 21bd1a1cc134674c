//! Result URL extraction
//!
//! Result markup varies by locale, A/B bucket and result type even within one
//! engine, so extraction degrades through four sources and takes the first
//! one that yields a URL:
//!
//! 1. the engine's title link (`linkSelector`)
//! 2. the engine's displayed URL text (`urlTextSelector`), breadcrumb-split
//! 3. any heading link
//! 4. any anchor that actually navigates

use crate::dom::DomQuery;
use crate::engine::EngineDescriptor;
use crate::url::{is_navigable_href, split_display_url};

/// Links inside a result heading.
pub const HEADING_LINK_SELECTOR: &str = "h1 a[href], h2 a[href], h3 a[href]";

/// Anchors that are neither pure fragments nor script pseudo-links.
pub const NAVIGABLE_LINK_SELECTOR: &str = "a[href]:not([href^=\"#\"]):not([href^=\"javascript\"])";

/// Which source produced an extracted URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    TitleLink,
    DisplayedUrl,
    HeadingLink,
    AnyLink,
}

/// Extracted URL together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedUrl {
    pub url: String,
    pub source: UrlSource,
}

/// Extract the best-effort destination URL of one result element.
pub fn extract<E: DomQuery + ?Sized>(result: &E, engine: &EngineDescriptor) -> Option<String> {
    extract_with_source(result, engine).map(|extracted| extracted.url)
}

/// Like [`extract`], also reporting which source succeeded.
pub fn extract_with_source<E: DomQuery + ?Sized>(
    result: &E,
    engine: &EngineDescriptor,
) -> Option<ExtractedUrl> {
    if !engine.link_selector.is_empty() {
        if let Some(url) = result.first_href(&engine.link_selector) {
            return Some(ExtractedUrl { url, source: UrlSource::TitleLink });
        }
    }

    if !engine.url_text_selector.is_empty() {
        let displayed = result
            .first_text(&engine.url_text_selector)
            .and_then(|text| split_display_url(&text).map(str::to_string));
        if let Some(url) = displayed {
            return Some(ExtractedUrl { url, source: UrlSource::DisplayedUrl });
        }
    }

    if let Some(url) = result.first_href(HEADING_LINK_SELECTOR) {
        return Some(ExtractedUrl { url, source: UrlSource::HeadingLink });
    }

    // Attribute selectors are case-sensitive; `JavaScript:` needs the
    // second check.
    result
        .hrefs(NAVIGABLE_LINK_SELECTOR)
        .into_iter()
        .find(|href| is_navigable_href(href))
        .map(|url| ExtractedUrl { url, source: UrlSource::AnyLink })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::testing::FakeElement;

    fn engine() -> EngineDescriptor {
        EngineDescriptor {
            name: "test".to_string(),
            host_match: "search.test".to_string(),
            result_selector: ".result".to_string(),
            container_selector: "#results".to_string(),
            link_selector: "a.title".to_string(),
            url_text_selector: "cite".to_string(),
        }
    }

    #[test]
    fn test_title_link_first() {
        let el = FakeElement::new()
            .with_href("a.title", "https://a.com/page")
            .with_text("cite", "b.com › x")
            .with_href(HEADING_LINK_SELECTOR, "https://c.com");
        let extracted = extract_with_source(&el, &engine()).unwrap();
        assert_eq!(extracted.url, "https://a.com/page");
        assert_eq!(extracted.source, UrlSource::TitleLink);
    }

    #[test]
    fn test_displayed_url_breadcrumbs() {
        let el = FakeElement::new().with_text("cite", "  example.com › page › section ");
        let extracted = extract_with_source(&el, &engine()).unwrap();
        assert_eq!(extracted.url, "example.com");
        assert_eq!(extracted.source, UrlSource::DisplayedUrl);
    }

    #[test]
    fn test_empty_href_falls_through() {
        let el = FakeElement::new()
            .with_href("a.title", "")
            .with_text("cite", " » ")
            .with_href(HEADING_LINK_SELECTOR, "https://heading.com/");
        let extracted = extract_with_source(&el, &engine()).unwrap();
        assert_eq!(extracted.url, "https://heading.com/");
        assert_eq!(extracted.source, UrlSource::HeadingLink);
    }

    #[test]
    fn test_any_link_fallback() {
        let el = FakeElement::new().with_href(NAVIGABLE_LINK_SELECTOR, "https://any.com/");
        assert_eq!(extract(&el, &engine()), Some("https://any.com/".to_string()));

        let scripted = FakeElement::new().with_href(NAVIGABLE_LINK_SELECTOR, "JavaScript:void(0)");
        assert_eq!(extract(&scripted, &engine()), None);
    }

    #[test]
    fn test_any_link_skips_script_links() {
        let el = FakeElement::new()
            .with_href(NAVIGABLE_LINK_SELECTOR, "JavaScript:void(0)")
            .with_href(NAVIGABLE_LINK_SELECTOR, "")
            .with_href(NAVIGABLE_LINK_SELECTOR, "https://later.com/page");
        let extracted = extract_with_source(&el, &engine()).unwrap();
        assert_eq!(extracted.url, "https://later.com/page");
        assert_eq!(extracted.source, UrlSource::AnyLink);
    }

    #[test]
    fn test_nothing_to_extract() {
        assert_eq!(extract(&FakeElement::new(), &engine()), None);
    }
}
