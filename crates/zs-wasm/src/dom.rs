//! `web_sys` implementation of the core DOM seams

use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlAnchorElement, HtmlElement};
use zs_core::dom::{DomQuery, StyleTarget};

/// A live result element.
#[derive(Debug, Clone)]
pub struct WebElement {
    element: Element,
}

impl WebElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    fn first(&self, selector: &str) -> Option<Element> {
        self.element.query_selector(selector).ok().flatten()
    }
}

impl DomQuery for WebElement {
    fn matches(&self, selector: &str) -> bool {
        self.element.matches(selector).unwrap_or(false)
    }

    fn has_descendant(&self, selector: &str) -> bool {
        self.first(selector).is_some()
    }

    fn first_href(&self, selector: &str) -> Option<String> {
        link_href(&self.first(selector)?)
    }

    fn hrefs(&self, selector: &str) -> Vec<String> {
        let Ok(list) = self.element.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .filter_map(|link| link_href(&link))
            .collect()
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        self.first(selector)?.text_content()
    }
}

/// The raw attribute decides emptiness; the property gives the absolute URL.
fn link_href(link: &Element) -> Option<String> {
    let raw = link.get_attribute("href").filter(|href| !href.trim().is_empty())?;
    match link.dyn_ref::<HtmlAnchorElement>() {
        Some(anchor) => Some(anchor.href()),
        None => Some(raw),
    }
}

impl StyleTarget for WebElement {
    fn set_important(&self, property: &str, value: &str) {
        if let Some(html) = self.element.dyn_ref::<HtmlElement>() {
            if let Err(e) = html.style().set_property_with_priority(property, value, "important") {
                log::debug!("could not set {}: {:?}", property, e);
            }
        }
    }

    fn clear(&self, property: &str) {
        if let Some(html) = self.element.dyn_ref::<HtmlElement>() {
            let _ = html.style().remove_property(property);
        }
    }
}

/// Every element matching `selector` in `document`, in document order.
pub fn query_all(document: &web_sys::Document, selector: &str) -> Vec<WebElement> {
    let Ok(list) = document.query_selector_all(selector) else {
        log::debug!("invalid result selector: {}", selector);
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(WebElement::new)
        .collect()
}

/// Added nodes of a mutation batch that are elements.
pub fn added_elements(records: &js_sys::Array) -> Vec<WebElement> {
    let mut added = Vec::new();
    for record in records.iter() {
        let Ok(record) = record.dyn_into::<web_sys::MutationRecord>() else {
            continue;
        };
        let nodes = record.added_nodes();
        for i in 0..nodes.length() {
            if let Some(element) = nodes.item(i).and_then(|node| node.dyn_into::<Element>().ok()) {
                added.push(WebElement::new(element));
            }
        }
    }
    added
}

/// Whether a mutation batch added any node at all.
pub fn has_added_nodes(records: &js_sys::Array) -> bool {
    records.iter().any(|record| {
        record
            .dyn_into::<web_sys::MutationRecord>()
            .map(|record| record.added_nodes().length() > 0)
            .unwrap_or(false)
    })
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;
    use zs_core::engine::EngineDescriptor;
    use zs_core::matcher::RuleSet;
    use zs_core::pipeline::run_pass;
    use zs_core::types::{MatchMode, SiteRule};

    wasm_bindgen_test_configure!(run_in_browser);

    fn engine() -> EngineDescriptor {
        EngineDescriptor {
            name: "test".to_string(),
            host_match: "localhost".to_string(),
            result_selector: ".result".to_string(),
            container_selector: "#results".to_string(),
            link_selector: "a.title".to_string(),
            url_text_selector: "cite".to_string(),
        }
    }

    fn mount(html: &str) -> web_sys::Document {
        let document = web_sys::window().unwrap().document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_id("results");
        root.set_inner_html(html);
        document.body().unwrap().append_child(&root).unwrap();
        document
    }

    fn style_of(element: &WebElement, property: &str) -> String {
        let html = element.element.dyn_ref::<HtmlElement>().unwrap();
        html.style().get_property_value(property).unwrap()
    }

    #[wasm_bindgen_test]
    fn paints_live_elements() {
        let document = mount(
            r#"<div class="result"><a class="title" href="https://blocked-site.com/page">A</a></div>
               <div class="result"><cite>docs.rs › tokio</cite></div>
               <div class="result"><a class="title" href="">empty</a></div>"#,
        );
        let rules = RuleSet::compile(
            vec![
                SiteRule::blocking("*://*.blocked-site.com/*"),
                SiteRule::favorite("*://*.docs.rs/*", "rgb(230, 255, 230)"),
            ],
            MatchMode::Wildcard,
        );
        let results = query_all(&document, ".result");
        let stats = run_pass(&results, &engine(), &rules);

        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.highlighted, 1);
        assert_eq!(style_of(&results[0], "display"), "none");
        assert_eq!(style_of(&results[1], "background-color"), "rgb(230, 255, 230)");

        run_pass(&results, &engine(), &RuleSet::default());
        assert_eq!(style_of(&results[0], "display"), "");
        assert_eq!(style_of(&results[1], "background-color"), "");
    }

    #[wasm_bindgen_test]
    fn resolves_relative_links() {
        let document = mount(r#"<div class="rel"><a class="title" href="/local">x</a></div>"#);
        let results = query_all(&document, ".rel");
        let href = results[0].first_href("a.title").unwrap();
        assert!(href.starts_with("http"));
        assert!(href.ends_with("/local"));
    }
}
