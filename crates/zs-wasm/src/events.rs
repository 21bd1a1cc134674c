//! Owned handles for browser callbacks
//!
//! Each handle keeps its closure alive and knows how to detach it again, so
//! teardown is a matter of dropping (or explicitly cancelling) the handle.

use js_sys::{Array, Function};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, MutationObserver, MutationObserverInit, Node, Window};

/// An event listener registered on a target.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn add(
        target: &EventTarget,
        event: &'static str,
        callback: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(callback);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// A `MutationObserver` watching `childList` changes of one subtree.
pub struct Observer {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl Observer {
    pub fn observe(target: &Node, callback: impl FnMut(Array) + 'static) -> Result<Self, JsValue> {
        let mut callback = callback;
        let callback = Closure::<dyn FnMut(Array, MutationObserver)>::new(move |records: Array, _: MutationObserver| {
            callback(records)
        });
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;

        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(target, &options)?;

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// A repeating `setInterval` timer.
pub struct Interval {
    window: Window,
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    pub fn every(window: &Window, period_ms: u32, callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut()>::new(callback);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            clamp_ms(period_ms),
        )?;
        Ok(Self {
            window: window.clone(),
            handle,
            _callback: callback,
        })
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.window.clear_interval_with_handle(self.handle);
    }
}

/// A re-armable single-shot timer around one long-lived callback.
pub struct Timeout {
    window: Window,
    handle: Option<i32>,
    callback: Closure<dyn FnMut()>,
}

impl Timeout {
    pub fn new(window: &Window, callback: impl FnMut() + 'static) -> Self {
        Self {
            window: window.clone(),
            handle: None,
            callback: Closure::<dyn FnMut()>::new(callback),
        }
    }

    /// Cancel any pending run and schedule a new one `delay_ms` from now.
    pub fn arm(&mut self, delay_ms: u32) -> Result<(), JsValue> {
        self.cancel();
        let function: &Function = self.callback.as_ref().unchecked_ref();
        let handle = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(function, clamp_ms(delay_ms))?;
        self.handle = Some(handle);
        Ok(())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn clamp_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}
