//! Inbound extension messages
//!
//! The background worker and the popup talk to the content script with small
//! JSON objects. Older senders key them by `type`, the hot-key path by
//! `action`. Anything unrecognized is ignored.

use serde_json::Value;

/// A decoded message for the content script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundSignal {
    /// `{type: "updateResults"}`: stored rules changed, run a pass
    RulesChanged,
    /// `{type: "showToast", message}`
    ShowNotice(String),
    /// `{action: "hideCurrentResult"}`
    HideHovered,
    /// `{type: "setLanguage", language}`
    SetLanguage(String),
}

impl InboundSignal {
    pub fn from_value(message: &Value) -> Option<Self> {
        if message.get("action").and_then(Value::as_str) == Some("hideCurrentResult") {
            return Some(InboundSignal::HideHovered);
        }

        let string_field = |name: &str| {
            message
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match message.get("type").and_then(Value::as_str)? {
            "updateResults" => Some(InboundSignal::RulesChanged),
            "showToast" => Some(InboundSignal::ShowNotice(string_field("message"))),
            "setLanguage" => Some(InboundSignal::SetLanguage(string_field("language"))),
            other => {
                log::trace!("ignoring message type {}", other);
                None
            }
        }
    }

    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|value| Self::from_value(&value))
    }
}
