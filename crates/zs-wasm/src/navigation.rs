//! Soft-navigation signals
//!
//! Single-page search engines swap results without a page load. Where the
//! Navigation API exists its `navigatesuccess` event covers every kind of
//! same-document navigation; elsewhere `history.pushState`/`replaceState` are
//! wrapped and `popstate`/`hashchange` are observed. Both are hidden behind
//! [`NavigationSource`] so the watcher never knows which one is active.

use std::rc::Rc;

use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, Window};

use crate::events::Listener;

const PATCHED_METHODS: [&str; 2] = ["pushState", "replaceState"];

type PatchClosure = Closure<dyn FnMut(JsValue, JsValue, JsValue) -> Result<JsValue, JsValue>>;

pub struct PatchedMethod {
    name: &'static str,
    original: Function,
    _wrapper: PatchClosure,
}

pub enum NavigationSource {
    /// `window.navigation`
    Native { _listener: Listener },
    /// Wrapped history methods plus `popstate`/`hashchange`
    History {
        history: JsValue,
        patched: Vec<PatchedMethod>,
        _listeners: Vec<Listener>,
    },
}

impl NavigationSource {
    /// Start reporting navigations to `on_navigate`.
    pub fn install(window: &Window, on_navigate: Rc<dyn Fn()>) -> Result<Self, JsValue> {
        if let Some(navigation) = native_navigation(window) {
            let notify = on_navigate.clone();
            let listener = Listener::add(&navigation, "navigatesuccess", move |_| notify())?;
            log::debug!("observing navigation through the Navigation API");
            return Ok(NavigationSource::Native { _listener: listener });
        }
        Self::history(window, on_navigate)
    }

    /// Wrap the history methods regardless of Navigation API support.
    pub fn history(window: &Window, on_navigate: Rc<dyn Fn()>) -> Result<Self, JsValue> {
        let history: JsValue = window.history()?.into();
        let mut patched = Vec::with_capacity(PATCHED_METHODS.len());
        for name in PATCHED_METHODS {
            patched.push(patch_method(&history, name, on_navigate.clone())?);
        }

        let target: &EventTarget = window.as_ref();
        let mut listeners = Vec::with_capacity(2);
        for event in ["popstate", "hashchange"] {
            let notify = on_navigate.clone();
            listeners.push(Listener::add(target, event, move |_| notify())?);
        }

        log::debug!("observing navigation through patched history methods");
        Ok(NavigationSource::History {
            history,
            patched,
            _listeners: listeners,
        })
    }
}

impl Drop for NavigationSource {
    fn drop(&mut self) {
        if let NavigationSource::History { history, patched, .. } = self {
            for method in patched.iter() {
                let _ = Reflect::set(history, &JsValue::from_str(method.name), &method.original);
            }
        }
    }
}

fn native_navigation(window: &Window) -> Option<EventTarget> {
    let navigation = Reflect::get(window, &JsValue::from_str("navigation")).ok()?;
    if navigation.is_undefined() || navigation.is_null() {
        return None;
    }
    navigation.dyn_into::<EventTarget>().ok()
}

fn patch_method(history: &JsValue, name: &'static str, on_navigate: Rc<dyn Fn()>) -> Result<PatchedMethod, JsValue> {
    let original: Function = Reflect::get(history, &JsValue::from_str(name))?.dyn_into()?;

    let target = history.clone();
    let call = original.clone();
    let wrapper: PatchClosure = Closure::new(move |state: JsValue, unused: JsValue, url: JsValue| {
        let result = call.call3(&target, &state, &unused, &url);
        on_navigate();
        result
    });

    Reflect::set(history, &JsValue::from_str(name), wrapper.as_ref())?;
    Ok(PatchedMethod {
        name,
        original,
        _wrapper: wrapper,
    })
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use std::cell::Cell;

    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn push_state(history: &JsValue) -> Function {
        Reflect::get(history, &JsValue::from_str("pushState"))
            .unwrap()
            .dyn_into()
            .unwrap()
    }

    #[wasm_bindgen_test]
    fn patched_history_reports_and_restores() {
        let window = web_sys::window().unwrap();
        let history: JsValue = window.history().unwrap().into();
        let original = push_state(&history);

        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        let source = NavigationSource::history(&window, Rc::new(move || counter.set(counter.get() + 1))).unwrap();

        let patched = push_state(&history);
        assert!(!js_sys::Object::is(&patched, &original));
        patched
            .call3(&history, &JsValue::NULL, &JsValue::from_str(""), &JsValue::from_str("#zs-nav"))
            .unwrap();
        assert_eq!(seen.get(), 1);

        drop(source);
        assert!(js_sys::Object::is(&push_state(&history), &original));
    }
}
