//! Content-script controller
//!
//! Owns the page watcher and every browser hook that feeds it. Hooks hold
//! only weak references back to the controller, so dropping the controller
//! tears everything down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, Event, EventTarget, PageTransitionEvent, Window};
use zs_compiler::compile_storage;
use zs_core::config::WatcherConfig;
use zs_core::engine::EngineDescriptor;
use zs_core::matcher::RuleSet;
use zs_core::pipeline::{hide_result, run_pass, HiddenResult};
use zs_core::types::PassStats;
use zs_core::watcher::{adds_results, PageWatcher, TimerCommand, Trigger};

use crate::dom::{added_elements, has_added_nodes, query_all, WebElement};
use crate::events::{Interval, Listener, Observer, Timeout};
use crate::json_text;
use crate::navigation::NavigationSource;

pub type Shared = Rc<RefCell<Controller>>;

pub struct Controller {
    window: Window,
    document: Document,
    engine: EngineDescriptor,
    watcher: PageWatcher,
    rules: RuleSet,
    loader: Function,
    last_stats: PassStats,
    timer: Option<Timeout>,
    observers: Vec<Observer>,
    /// `pagehide`/`pageshow`; these outlive [`stop`]
    lifecycle: Vec<Listener>,
    poll: Option<Interval>,
    navigation: Option<NavigationSource>,
}

impl Controller {
    pub fn new(window: Window, engine: EngineDescriptor, config: WatcherConfig, loader: Function) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Page has no document"))?;
        Ok(Self {
            window,
            document,
            engine,
            watcher: PageWatcher::new(config),
            rules: RuleSet::default(),
            loader,
            last_stats: PassStats::default(),
            timer: None,
            observers: Vec::new(),
            lifecycle: Vec::new(),
            poll: None,
            navigation: None,
        })
    }

    pub fn engine(&self) -> &EngineDescriptor {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.watcher.is_running()
    }

    pub fn last_stats(&self) -> PassStats {
        self.last_stats
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn current_url(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn paint_all(&mut self) -> PassStats {
        let results = query_all(&self.document, &self.engine.result_selector);
        let stats = run_pass(&results, &self.engine, &self.rules);
        self.last_stats = stats;
        stats
    }

    /// Hide the result under the pointer. The deepest `:hover` element is the
    /// last one in document order.
    pub fn hide_hovered(&self) -> Option<HiddenResult> {
        let hovered = self.document.query_selector_all(":hover").ok()?;
        let last = hovered.length().checked_sub(1)?;
        let deepest = hovered.item(last)?.dyn_into::<Element>().ok()?;
        let result = deepest.closest(&self.engine.result_selector).ok().flatten()?;
        hide_result(&WebElement::new(result), &self.engine)
    }
}

fn restored_from_cache(event: &Event) -> bool {
    event
        .dyn_ref::<PageTransitionEvent>()
        .is_some_and(PageTransitionEvent::persisted)
}

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn upgrade_and(weak: &Weak<RefCell<Controller>>, f: impl FnOnce(&Shared)) {
    if let Some(shared) = weak.upgrade() {
        f(&shared);
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Install every enabled hook and schedule the initial pass.
pub fn start(shared: &Shared) -> Result<(), JsValue> {
    let weak = Rc::downgrade(shared);
    let command = {
        let mut guard = shared.borrow_mut();
        let this = &mut *guard;
        if this.watcher.is_running() {
            return Ok(());
        }
        let config = this.watcher.config().clone();

        if this.timer.is_none() {
            let w = weak.clone();
            this.timer = Some(Timeout::new(&this.window, move || upgrade_and(&w, on_timer)));
        }

        if config.observe_container {
            match this.document.query_selector(&this.engine.container_selector).ok().flatten() {
                Some(container) => {
                    let w = weak.clone();
                    this.observers.push(Observer::observe(&container, move |records| {
                        upgrade_and(&w, |shared| {
                            let relevant = adds_results(&added_elements(&records), shared.borrow().engine());
                            if relevant {
                                trigger(shared, Trigger::ResultsAdded);
                            }
                        })
                    })?);
                }
                None => log::debug!("no {} result container on this page yet", this.engine.name),
            }
        }

        if config.observe_body {
            if let Some(body) = this.document.body() {
                let w = weak.clone();
                this.observers.push(Observer::observe(&body, move |records| {
                    if has_added_nodes(&records) {
                        upgrade_and(&w, |shared| trigger(shared, Trigger::BodyMutation));
                    }
                })?);
            }
        }

        if config.observe_navigation {
            let w = weak.clone();
            let on_navigate: Rc<dyn Fn()> = Rc::new(move || upgrade_and(&w, navigated));
            this.navigation = Some(NavigationSource::install(&this.window, on_navigate)?);
        }

        if config.poll_url {
            let w = weak.clone();
            this.poll = Some(Interval::every(&this.window, config.poll_interval_ms, move || {
                upgrade_and(&w, poll_url)
            })?);
        }

        // A page restored from the back/forward cache does not rerun the
        // content script, so the controller restarts itself.
        if this.lifecycle.is_empty() {
            let target: &EventTarget = this.window.as_ref();
            let w = weak.clone();
            this.lifecycle.push(Listener::add(target, "pagehide", move |_| upgrade_and(&w, stop))?);
            let w = weak.clone();
            this.lifecycle.push(Listener::add(target, "pageshow", move |event| {
                if restored_from_cache(&event) {
                    upgrade_and(&w, |shared| {
                        if let Err(e) = start(shared) {
                            log::warn!("could not resume after back/forward navigation: {:?}", e);
                        }
                    })
                }
            })?);
        }

        let url = this.current_url();
        log::info!("watching {} results on {}", this.engine.name, url);
        this.watcher.start(&url, now_ms())
    };

    apply(shared, command);
    Ok(())
}

/// Cancel every observer and timer. The page lifecycle listeners stay so a
/// back/forward restore can resume.
pub fn stop(shared: &Shared) {
    let mut this = shared.borrow_mut();
    if !this.watcher.is_running() {
        return;
    }
    this.watcher.stop();
    if let Some(timer) = this.timer.as_mut() {
        timer.cancel();
    }
    this.observers.clear();
    this.poll = None;
    this.navigation = None;
    log::debug!("stopped after {} passes", this.watcher.passes());
}

// =============================================================================
// Triggers
// =============================================================================

pub fn trigger(shared: &Shared, trigger: Trigger) {
    let command = shared.borrow_mut().watcher.trigger(trigger, now_ms());
    apply(shared, command);
}

fn navigated(shared: &Shared) {
    let url = shared.borrow().current_url();
    let command = shared.borrow_mut().watcher.navigated(&url, now_ms());
    apply(shared, command);
}

fn poll_url(shared: &Shared) {
    let url = shared.borrow().current_url();
    let command = shared.borrow_mut().watcher.poll_url(&url, now_ms());
    apply(shared, command);
}

fn apply(shared: &Shared, command: TimerCommand) {
    if let TimerCommand::Arm { delay_ms } = command {
        let mut this = shared.borrow_mut();
        if let Some(timer) = this.timer.as_mut() {
            if let Err(e) = timer.arm(delay_ms) {
                log::warn!("could not schedule refresh: {:?}", e);
            }
        }
    }
}

fn on_timer(shared: &Shared) {
    let fire = shared.borrow_mut().watcher.timer_fired();
    if fire {
        spawn_local(refresh(shared.clone()));
    }
}

// =============================================================================
// Refresh
// =============================================================================

async fn refresh(shared: Shared) {
    let loader = shared.borrow().loader.clone();
    match load_rules(&loader).await {
        Ok(rules) => shared.borrow_mut().rules = rules,
        Err(e) => log::warn!("rule read failed, keeping previous rules: {:?}", e),
    }

    let command = {
        let mut this = shared.borrow_mut();
        if this.watcher.is_running() {
            this.paint_all();
        }
        this.watcher.finish_refresh(now_ms())
    };
    apply(&shared, command);
}

/// Call the host's rule reader and compile what it resolves to.
async fn load_rules(loader: &Function) -> Result<RuleSet, JsValue> {
    let pending = loader.call0(&JsValue::NULL)?;
    let payload = JsFuture::from(Promise::resolve(&pending)).await?;
    let (rules, stats) = compile_storage(&json_text(&payload)?).map_err(|e| JsValue::from_str(&e.to_string()))?;
    for invalid in &stats.invalid {
        log::warn!("stored rule {} never matches: {}", invalid.index, invalid.error);
    }
    Ok(rules)
}
