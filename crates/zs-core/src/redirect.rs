//! Click-tracking redirect unwrapping
//!
//! Search engines often link results through their own redirect endpoints.
//! The true destination is embedded in a query parameter or path segment;
//! [`resolve`] digs it out so rules see the site the user will land on.
//! Resolution never fails: anything that cannot be decoded comes back as the
//! original URL.

use std::borrow::Cow;
use std::sync::OnceLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use percent_encoding::percent_decode_str;
use regex::Regex;
use ::url::Url;

/// Known redirect wrappers, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `google.<tld>/url?...&url=<target>`
    Google,
    /// `bing.com/ck/a?...&u=<prefix><base64>`
    Bing,
    /// `r.search.yahoo.com/.../RU=<target>/RK=...`
    Yahoo,
    /// `search.aol.com/click/.../RU=<target>/RK=...`
    Aol,
}

/// Length of the marker Bing puts in front of the base64 payload (`a1`).
const BING_PREFIX_LEN: usize = 2;

const PADDING_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const BASE64_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_INDIFFERENT);
const BASE64_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_INDIFFERENT);

struct Detectors {
    google: Regex,
    bing: Regex,
    yahoo: Regex,
    aol: Regex,
    ru_segment: Regex,
}

fn detectors() -> &'static Detectors {
    static DETECTORS: OnceLock<Detectors> = OnceLock::new();
    DETECTORS.get_or_init(|| Detectors {
        google: Regex::new(r"(?i)^https?://(?:[\w-]+\.)*google\.[a-z.]+/url\?").expect("valid google regex"),
        bing: Regex::new(r"(?i)^https?://(?:[\w-]+\.)*bing\.[a-z.]+/ck/a\?").expect("valid bing regex"),
        yahoo: Regex::new(r"(?i)^https?://r\.search\.yahoo\.com/.+/RU=").expect("valid yahoo regex"),
        aol: Regex::new(r"(?i)^https?://(?:[\w-]+\.)*search\.aol\.com/click/.+/RU=").expect("valid aol regex"),
        ru_segment: Regex::new(r"/RU=([^/]+)/RK=").expect("valid RU segment regex"),
    })
}

/// Identify the redirect wrapper a URL uses, if any.
pub fn detect(url: &str) -> Option<RedirectKind> {
    let d = detectors();
    if d.google.is_match(url) {
        Some(RedirectKind::Google)
    } else if d.bing.is_match(url) {
        Some(RedirectKind::Bing)
    } else if d.yahoo.is_match(url) {
        Some(RedirectKind::Yahoo)
    } else if d.aol.is_match(url) {
        Some(RedirectKind::Aol)
    } else {
        None
    }
}

/// Unwrap a redirect wrapper to its destination.
///
/// Unrecognized URLs and wrappers whose payload fails to decode are returned
/// unchanged.
pub fn resolve(url: &str) -> Cow<'_, str> {
    let Some(kind) = detect(url) else {
        return Cow::Borrowed(url);
    };

    let target = match kind {
        RedirectKind::Google => query_param(url, "url"),
        RedirectKind::Bing => query_param(url, "u").and_then(|encoded| decode_bing(&encoded)),
        RedirectKind::Yahoo | RedirectKind::Aol => decode_ru_segment(url),
    };

    match target {
        Some(target) if !target.is_empty() => Cow::Owned(target),
        _ => {
            log::debug!("could not unwrap {:?} redirect: {}", kind, url);
            Cow::Borrowed(url)
        }
    }
}

/// Decoded value of the first query parameter named `name`.
fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned());
    value
}

fn decode_bing(encoded: &str) -> Option<String> {
    let payload = encoded
        .char_indices()
        .nth(BING_PREFIX_LEN)
        .map(|(idx, _)| &encoded[idx..])?;
    // Form decoding turned any '+' of the payload into a space.
    let payload = payload.trim().replace(' ', "+");

    let bytes = BASE64_STANDARD
        .decode(&payload)
        .or_else(|_| BASE64_URL_SAFE.decode(&payload))
        .ok()?;
    String::from_utf8(bytes).ok()
}

fn decode_ru_segment(url: &str) -> Option<String> {
    let captures = detectors().ru_segment.captures(url)?;
    let segment = captures.get(1)?.as_str();
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
