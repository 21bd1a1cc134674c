//! Static result pages
//!
//! Parses a saved result page with `scraper` and exposes its result elements
//! through the same seams the browser build uses. Styles are recorded in a
//! per-element map instead of being written anywhere.

use std::cell::RefCell;
use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use url::Url;
use zs_core::dom::{DomQuery, StyleTarget};

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::debug!("unsupported selector {}: {:?}", selector, e);
            None
        }
    }
}

/// A parsed page and the URL it was saved from.
pub struct Page {
    document: Html,
    base: Option<Url>,
}

impl Page {
    pub fn parse(html: &str, base: Option<Url>) -> Self {
        Self {
            document: Html::parse_document(html),
            base,
        }
    }

    /// Every element matching `selector`, in document order.
    pub fn results(&self, selector: &str) -> Vec<PageElement<'_>> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(|element| PageElement::new(element, self.base.as_ref()))
            .collect()
    }
}

/// One element of a [`Page`] with its recorded inline styles.
pub struct PageElement<'a> {
    element: ElementRef<'a>,
    base: Option<&'a Url>,
    styles: RefCell<BTreeMap<String, String>>,
}

impl<'a> PageElement<'a> {
    fn new(element: ElementRef<'a>, base: Option<&'a Url>) -> Self {
        Self {
            element,
            base,
            styles: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.styles.borrow().get(property).cloned()
    }

    fn first(&self, selector: &str) -> Option<ElementRef<'a>> {
        let selector = parse_selector(selector)?;
        self.element.select(&selector).next()
    }

    fn href_of(&self, link: ElementRef<'a>) -> Option<String> {
        let href = link.value().attr("href").map(str::trim).filter(|href| !href.is_empty())?;
        Some(self.absolute(href))
    }

    /// Resolve an `href` the way an anchor's `href` property would.
    fn absolute(&self, href: &str) -> String {
        self.base
            .and_then(|base| base.join(href).ok())
            .map(String::from)
            .unwrap_or_else(|| href.to_string())
    }
}

impl DomQuery for PageElement<'_> {
    fn matches(&self, selector: &str) -> bool {
        parse_selector(selector).is_some_and(|selector| selector.matches(&self.element))
    }

    fn has_descendant(&self, selector: &str) -> bool {
        self.first(selector).is_some()
    }

    fn first_href(&self, selector: &str) -> Option<String> {
        let link = self.first(selector)?;
        self.href_of(link)
    }

    fn hrefs(&self, selector: &str) -> Vec<String> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.element.select(&selector).filter_map(|link| self.href_of(link)).collect()
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        Some(self.first(selector)?.text().collect::<String>())
    }
}

impl StyleTarget for PageElement<'_> {
    fn set_important(&self, property: &str, value: &str) {
        self.styles.borrow_mut().insert(property.to_string(), value.to_string());
    }

    fn clear(&self, property: &str) {
        self.styles.borrow_mut().remove(property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><div id="results">
        <div class="result"><h3><a class="title" href="/local/page">Local</a></h3></div>
        <div class="result"><cite>docs.rs › tokio</cite><a href="">empty</a></div>
    </div></body></html>"#;

    fn page() -> Page {
        Page::parse(PAGE, Url::parse("https://search.test/search?q=x").ok())
    }

    #[test]
    fn selects_results_in_document_order() {
        let page = page();
        let results = page.results(".result");
        assert_eq!(results.len(), 2);
        assert!(results[0].matches(".result"));
        assert!(!results[0].matches("#results"));
    }

    #[test]
    fn resolves_hrefs_against_the_page_url() {
        let page = page();
        let results = page.results(".result");
        assert_eq!(
            results[0].first_href("a.title"),
            Some("https://search.test/local/page".to_string())
        );
        assert_eq!(results[1].first_href("a"), None);
    }

    #[test]
    fn collects_every_non_empty_href() {
        let page = Page::parse(
            r##"<div class="result"><a href="JavaScript:void(0)">x</a><a href="">y</a><a href="#top">z</a><a href="/next">n</a></div>"##,
            Url::parse("https://search.test/").ok(),
        );
        let results = page.results(".result");
        let hrefs = results[0].hrefs("a[href]");
        assert_eq!(hrefs.len(), 3);
        assert_eq!(hrefs.last().map(String::as_str), Some("https://search.test/next"));
    }

    #[test]
    fn reads_text_and_descendants() {
        let page = page();
        let results = page.results(".result");
        assert_eq!(results[1].first_text("cite"), Some("docs.rs › tokio".to_string()));
        assert!(results[0].has_descendant("h3 a"));
        assert!(!results[1].has_descendant("h3"));
    }

    #[test]
    fn unsupported_selectors_match_nothing() {
        let page = page();
        assert!(page.results("[[").is_empty());
        let results = page.results(".result");
        assert!(!results[0].matches("[["));
        assert_eq!(results[0].first_href("[["), None);
    }

    #[test]
    fn records_styles() {
        let page = page();
        let results = page.results(".result");
        results[0].set_important("display", "none");
        assert_eq!(results[0].style("display"), Some("none".to_string()));
        results[0].clear("display");
        assert_eq!(results[0].style("display"), None);
    }
}
