//! URL helpers shared by extraction and matching
//!
//! Cheap checks work directly on string slices; anything that needs a real
//! parse goes through [`Url`].

use std::borrow::Cow;

use ::url::Url;

/// Separator glyphs used by breadcrumb-style displayed URLs
/// (`example.com › page › section`).
const BREADCRUMB_SEPARATORS: &[char] = &['›', '»'];

// =============================================================================
// Scheme Handling
// =============================================================================

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let colon_pos = url.find(':')?;
    url[colon_pos..].starts_with("://").then_some(colon_pos + 3)
}

/// Whether the URL starts with `<scheme>://`, the scheme being a letter
/// followed by letters, digits, `+`, `-` or `.`.
pub fn has_scheme(url: &str) -> bool {
    let Some(end) = get_scheme_end(url) else {
        return false;
    };
    let mut chars = url[..end - 3].chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Give scheme-less URLs (`example.com/page`) an `https://` prefix. URLs
/// with any scheme are kept as they are.
pub fn canonicalize(url: &str) -> Cow<'_, str> {
    let trimmed = url.trim();
    if has_scheme(trimmed) {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("https://{trimmed}"))
    }
}

/// Canonicalize and parse. Returns `None` for anything that does not parse.
pub fn parse_canonical(url: &str) -> Option<Url> {
    if url.trim().is_empty() {
        return None;
    }
    Url::parse(&canonicalize(url)).ok()
}

/// Lowercased hostname of a (possibly scheme-less) URL.
pub fn host_of(url: &str) -> Option<String> {
    parse_canonical(url)?
        .host_str()
        .filter(|host| !host.is_empty())
        .map(|host| host.to_ascii_lowercase())
}

// =============================================================================
// Displayed URL Text
// =============================================================================

/// First non-empty segment of a breadcrumb-style URL display.
pub fn split_display_url(text: &str) -> Option<&str> {
    text.trim()
        .split(BREADCRUMB_SEPARATORS)
        .map(str::trim)
        .find(|segment| !segment.is_empty())
}

/// Whether an `href` leads somewhere: not a pure fragment and not a script
/// pseudo-link.
pub fn is_navigable_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return false;
    }
    !href
        .get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("javascript:"))
}
