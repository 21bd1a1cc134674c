//! WebAssembly bindings for ZenSearch
//!
//! The extension's content script loads this module, calls [`start`] with an
//! optional configuration and a function that resolves to the stored rules,
//! and forwards runtime messages to [`handle_message`]. Everything that
//! writes storage or shows UI stays on the JavaScript side.

mod controller;
mod dom;
mod events;
mod navigation;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use log::LevelFilter;

use wasm_bindgen::prelude::*;
use zs_compiler::{
    parse_storage, to_storage_value, upsert_blocking_rule, wildcard_for_domain, wildcard_for_host, StorageLayout,
};
use zs_core::config::PipelineConfig;
use zs_core::engine::EngineRegistry;
use zs_core::signal::InboundSignal;
use zs_core::types::PassStats;
use zs_core::watcher::Trigger;

use crate::controller::{Controller, Shared};

thread_local! {
    static CONTROLLER: RefCell<Option<Shared>> = const { RefCell::new(None) };
}

fn current() -> Option<Shared> {
    CONTROLLER.with(|slot| slot.borrow().clone())
}

/// `JSON.stringify` of a value; empty for `undefined` and `null`.
pub(crate) fn json_text(value: &JsValue) -> Result<String, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(String::new());
    }
    Ok(js_sys::JSON::stringify(value)?.as_string().unwrap_or_default())
}

fn set_field(target: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(target, &JsValue::from_str(key), value);
}

static LOGGER: Once = Once::new();

fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Warn)
}

/// Route `log` records to the browser console. The logger is installed
/// once; later calls only change the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    console_error_panic_hook::set_once();
    let filter = parse_level(level);
    LOGGER.call_once(|| {
        let level = filter.to_level().unwrap_or(log::Level::Trace);
        wasm_logger::init(wasm_logger::Config::new(level).module_prefix("zs_"));
    });
    log::set_max_level(filter);
}

/// Resolve the engine for this page and start watching it.
///
/// `config` is a `PipelineConfig` object (or `undefined` for defaults) and
/// `load_rules` a function returning the storage object, or a promise of it.
/// Resolves to `{active: false}` on pages no engine claims.
#[wasm_bindgen]
pub fn start(config: JsValue, load_rules: js_sys::Function) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    if is_running() {
        return Err(JsValue::from_str("Already started. Call stop() first."));
    }
    // A controller stopped by `pagehide` is replaced.
    stop();

    let config = PipelineConfig::from_json(&json_text(&config)?)
        .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let hostname = window.location().hostname()?;

    let result = js_sys::Object::new();
    let registry = EngineRegistry::from_config(&config.engines);
    let Some(engine) = registry.resolve(&hostname).cloned() else {
        log::debug!("no search engine for {}", hostname);
        set_field(&result, "active", &JsValue::from(false));
        return Ok(result.into());
    };

    let engine_name = engine.name.clone();
    let shared: Shared = Rc::new(RefCell::new(Controller::new(window, engine, config.watcher, load_rules)?));
    controller::start(&shared)?;
    CONTROLLER.with(|slot| *slot.borrow_mut() = Some(shared));

    set_field(&result, "active", &JsValue::from(true));
    set_field(&result, "engine", &JsValue::from_str(&engine_name));
    Ok(result.into())
}

#[wasm_bindgen]
pub fn stop() {
    if let Some(shared) = CONTROLLER.with(|slot| slot.borrow_mut().take()) {
        controller::stop(&shared);
    }
}

#[wasm_bindgen]
pub fn is_running() -> bool {
    current().is_some_and(|shared| {
        let running = shared.borrow().is_running();
        running
    })
}

/// Schedule a pass as if the stored rules had changed.
#[wasm_bindgen]
pub fn refresh() {
    if let Some(shared) = current() {
        controller::trigger(&shared, Trigger::Requested);
    }
}

/// Counters of the most recent pass.
#[wasm_bindgen]
pub fn last_stats() -> JsValue {
    let result = js_sys::Object::new();
    let (stats, rules) = current()
        .map(|shared| {
            let this = shared.borrow();
            (this.last_stats(), this.rule_count())
        })
        .unwrap_or((PassStats::default(), 0));

    set_field(&result, "candidates", &JsValue::from(stats.candidates as u32));
    set_field(&result, "extracted", &JsValue::from(stats.extracted as u32));
    set_field(&result, "hidden", &JsValue::from(stats.hidden as u32));
    set_field(&result, "highlighted", &JsValue::from(stats.highlighted as u32));
    set_field(&result, "unmatched", &JsValue::from(stats.unmatched as u32));
    set_field(&result, "rules", &JsValue::from(rules as u32));
    result.into()
}

/// React to a runtime message. The returned object tells the caller what is
/// left for it to do: `{kind: "notice", message}` asks it to show a notice,
/// `{kind: "hidden", url, host, pattern}` to persist a blocking rule.
#[wasm_bindgen]
pub fn handle_message(message: JsValue) -> Result<JsValue, JsValue> {
    let text = json_text(&message)?;
    let result = js_sys::Object::new();

    let Some(signal) = InboundSignal::from_json(&text) else {
        set_field(&result, "kind", &JsValue::from_str("ignored"));
        return Ok(result.into());
    };

    match signal {
        InboundSignal::RulesChanged => {
            refresh();
            set_field(&result, "kind", &JsValue::from_str("refresh"));
        }
        InboundSignal::ShowNotice(notice) => {
            set_field(&result, "kind", &JsValue::from_str("notice"));
            set_field(&result, "message", &JsValue::from_str(&notice));
        }
        InboundSignal::SetLanguage(language) => {
            set_field(&result, "kind", &JsValue::from_str("language"));
            set_field(&result, "language", &JsValue::from_str(&language));
        }
        InboundSignal::HideHovered => {
            let hidden = current().and_then(|shared| {
                let hidden = shared.borrow().hide_hovered();
                hidden
            });
            match hidden {
                Some(hidden) => {
                    set_field(&result, "kind", &JsValue::from_str("hidden"));
                    set_field(&result, "url", &JsValue::from_str(&hidden.url));
                    set_field(&result, "host", &JsValue::from_str(&hidden.host));
                    if let Some(pattern) = wildcard_for_host(&hidden.host) {
                        set_field(&result, "pattern", &JsValue::from_str(&pattern));
                    }
                }
                None => set_field(&result, "kind", &JsValue::from_str("none")),
            }
        }
    }
    Ok(result.into())
}

// =============================================================================
// Stateless helpers for the background and popup scripts
// =============================================================================

#[wasm_bindgen]
pub fn matches_pattern(url: &str, pattern: &str) -> bool {
    zs_core::matcher::matches(url, pattern)
}

#[wasm_bindgen]
pub fn resolve_redirect(url: &str) -> String {
    zs_core::redirect::resolve(url).into_owned()
}

#[wasm_bindgen]
pub fn engine_for_host(hostname: &str) -> Option<String> {
    EngineRegistry::default().resolve(hostname).map(|engine| engine.name.clone())
}

/// Blocking pattern for a link's registrable domain (context menu).
#[wasm_bindgen]
pub fn block_pattern_for_domain(host: &str) -> Option<String> {
    wildcard_for_domain(host)
}

#[wasm_bindgen]
pub fn block_pattern_for_host(host: &str) -> Option<String> {
    wildcard_for_host(host)
}

/// Add or update a blocking rule in a storage object and return the
/// `{sites}` object to write back.
#[wasm_bindgen]
pub fn upsert_blocking_rule_js(storage: JsValue, pattern: &str) -> Result<JsValue, JsValue> {
    let mut stored = parse_storage(&json_text(&storage)?).map_err(|e| JsValue::from_str(&e.to_string()))?;
    if stored.layout == StorageLayout::Legacy {
        return Err(JsValue::from_str("Legacy storage holds regex rules; migrate it before adding wildcard rules"));
    }
    upsert_blocking_rule(&mut stored.rules, pattern);

    let json = to_storage_value(&stored.rules).to_string();
    js_sys::JSON::parse(&json)
}
