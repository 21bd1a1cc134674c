//! Page watcher state machine
//!
//! The watcher decides *when* a pass runs; the host owns the actual
//! observers and timers. Every trigger (re)arms a single debounce timer, so a
//! burst of mutations from an infinite-scroll batch collapses into one pass.
//! Triggers that arrive while a pass is waiting on the rule read are folded
//! into exactly one follow-up pass.
//!
//! ```text
//!             trigger                 timer fired
//!   Idle ───────────────▶ Scheduled ───────────────▶ Refreshing
//!    ▲                    │    ▲                         │
//!    │                    └────┘ trigger: re-arm          │
//!    └────────────────────────────────────────────────────┘
//!          finished (or back to Scheduled if triggered meanwhile)
//! ```

use crate::config::{TriggerSources, WatcherConfig};
use crate::dom::DomQuery;
use crate::engine::EngineDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    /// A pass is debounced and due at `due_at_ms`
    ScheduledRefresh { due_at_ms: u64 },
    /// A pass is running (possibly suspended on the rule read)
    Refreshing,
}

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Result elements appeared under the result container
    ResultsAdded,
    /// Some subtree appeared under `<body>`
    BodyMutation,
    /// `pushState`, `replaceState`, `popstate`, `hashchange` or a native
    /// navigation event
    Navigation,
    /// The URL poll saw a different `location.href`
    UrlChanged,
    /// Rules changed; re-run now
    Requested,
}

impl Trigger {
    pub fn source(self) -> TriggerSources {
        match self {
            Trigger::ResultsAdded => TriggerSources::CONTAINER,
            Trigger::BodyMutation => TriggerSources::BODY,
            Trigger::Navigation => TriggerSources::NAVIGATION,
            Trigger::UrlChanged => TriggerSources::URL_POLL,
            Trigger::Requested => TriggerSources::REQUESTED,
        }
    }
}

/// What the host must do with its debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Cancel any pending timer and start a new one
    Arm { delay_ms: u32 },
    /// Leave the timer alone
    Keep,
}

/// Debounced refresh scheduler for one page.
#[derive(Debug, Clone)]
pub struct PageWatcher {
    config: WatcherConfig,
    sources: TriggerSources,
    state: WatchState,
    running: bool,
    rerun_pending: bool,
    last_url: Option<String>,
    passes: u64,
}

impl PageWatcher {
    pub fn new(config: WatcherConfig) -> Self {
        let sources = config.triggers();
        Self {
            config,
            sources,
            state: WatchState::Idle,
            running: false,
            rerun_pending: false,
            last_url: None,
            passes: 0,
        }
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Completed passes since creation.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Begin watching. The initial pass is scheduled right away.
    pub fn start(&mut self, url: &str, now_ms: u64) -> TimerCommand {
        self.running = true;
        self.last_url = Some(url.to_string());
        self.schedule(now_ms)
    }

    /// Stop watching. The host must cancel its observers and timers.
    pub fn stop(&mut self) {
        self.running = false;
        self.rerun_pending = false;
        self.state = WatchState::Idle;
    }

    pub fn trigger(&mut self, trigger: Trigger, now_ms: u64) -> TimerCommand {
        if !self.running || !self.sources.contains(trigger.source()) {
            return TimerCommand::Keep;
        }

        match self.state {
            WatchState::Refreshing => {
                self.rerun_pending = true;
                TimerCommand::Keep
            }
            WatchState::Idle | WatchState::ScheduledRefresh { .. } => self.schedule(now_ms),
        }
    }

    /// A navigation signal fired; `url` is the new location.
    pub fn navigated(&mut self, url: &str, now_ms: u64) -> TimerCommand {
        if self.running {
            self.last_url = Some(url.to_string());
        }
        self.trigger(Trigger::Navigation, now_ms)
    }

    /// Polling fallback: compare `url` with the last observed location.
    pub fn poll_url(&mut self, url: &str, now_ms: u64) -> TimerCommand {
        if !self.running || self.last_url.as_deref() == Some(url) {
            return TimerCommand::Keep;
        }
        self.last_url = Some(url.to_string());
        self.trigger(Trigger::UrlChanged, now_ms)
    }

    /// The debounce timer expired. Returns `true` when the host should run a
    /// pass now and call [`PageWatcher::finish_refresh`] afterwards.
    pub fn timer_fired(&mut self) -> bool {
        match self.state {
            WatchState::ScheduledRefresh { .. } if self.running => {
                self.state = WatchState::Refreshing;
                true
            }
            _ => false,
        }
    }

    /// The pass started by [`PageWatcher::timer_fired`] completed.
    pub fn finish_refresh(&mut self, now_ms: u64) -> TimerCommand {
        if self.state != WatchState::Refreshing {
            return TimerCommand::Keep;
        }
        self.passes += 1;
        self.state = WatchState::Idle;

        if self.running && std::mem::take(&mut self.rerun_pending) {
            return self.schedule(now_ms);
        }
        TimerCommand::Keep
    }

    fn schedule(&mut self, now_ms: u64) -> TimerCommand {
        let delay_ms = self.config.debounce_ms;
        self.state = WatchState::ScheduledRefresh {
            due_at_ms: now_ms + u64::from(delay_ms),
        };
        TimerCommand::Arm { delay_ms }
    }
}

/// Whether a batch of added nodes brings in result elements: a node is a
/// result itself or contains one.
pub fn adds_results<N: DomQuery>(added: &[N], engine: &EngineDescriptor) -> bool {
    let selector = engine.result_selector.as_str();
    !selector.is_empty()
        && added
            .iter()
            .any(|node| node.matches(selector) || node.has_descendant(selector))
}
