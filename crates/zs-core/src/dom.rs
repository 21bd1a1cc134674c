//! Host DOM seams
//!
//! The pipeline never touches a concrete DOM. The content script implements
//! these traits over live `web_sys` elements, the CLI over parsed HTML.

/// Read access to one element and its subtree.
pub trait DomQuery {
    /// Whether the element itself matches `selector`.
    fn matches(&self, selector: &str) -> bool;

    /// Whether any descendant matches `selector`.
    fn has_descendant(&self, selector: &str) -> bool;

    /// Destination of the first descendant matching `selector`, if that
    /// descendant has a non-empty `href`. Relative links come back resolved
    /// against the page URL.
    fn first_href(&self, selector: &str) -> Option<String>;

    /// Non-empty `href`s of every descendant matching `selector`, in document
    /// order, resolved like [`DomQuery::first_href`].
    fn hrefs(&self, selector: &str) -> Vec<String>;

    /// Text content of the first descendant matching `selector`.
    fn first_text(&self, selector: &str) -> Option<String>;
}

/// Inline style overrides on one element.
pub trait StyleTarget {
    /// Set `property: value !important`.
    fn set_important(&self, property: &str, value: &str);

    /// Remove an inline `property`.
    fn clear(&self, property: &str);
}
