//! ZenSearch Core Library
//!
//! This crate provides the engine behind the ZenSearch content script: it
//! recognises the search engine a page belongs to, pulls the destination URL
//! out of each result element, unwraps click-tracking redirects, matches the
//! URL against the user's site rules and paints the outcome.
//!
//! # Architecture
//!
//! The crate never touches a live DOM. Hosts implement [`dom::DomQuery`] and
//! [`dom::StyleTarget`] over their element type (`web_sys` in the extension,
//! parsed HTML in the CLI) and drive [`watcher::PageWatcher`] from their own
//! observers and timers.
//!
//! # Modules
//!
//! - `config`: Watcher and engine configuration
//! - `dom`: Host DOM seams
//! - `engine`: Search engine descriptors and host resolution
//! - `extract`: Result URL extraction
//! - `matcher`: Wildcard and legacy pattern matching, rule sets
//! - `painter`: Hide/highlight effects
//! - `pipeline`: One refresh pass over the current results
//! - `psl`: Registrable domain heuristics
//! - `redirect`: Click-tracking redirect unwrapping
//! - `signal`: Inbound extension messages
//! - `types`: Shared type definitions
//! - `url`: URL helpers
//! - `watcher`: Debounced refresh scheduling

pub mod config;
pub mod dom;
pub mod engine;
pub mod extract;
pub mod matcher;
pub mod painter;
pub mod pipeline;
pub mod psl;
pub mod redirect;
pub mod signal;
pub mod types;
pub mod url;
pub mod watcher;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, PipelineConfig, ResolveStrategy, WatcherConfig};
pub use dom::{DomQuery, StyleTarget};
pub use engine::{EngineDescriptor, EngineRegistry};
pub use matcher::{matches, PatternError, RuleSet};
pub use pipeline::{hide_result, run_pass};
pub use signal::InboundSignal;
pub use types::{Effect, MatchMode, PassStats, SiteRule, Verdict};
pub use watcher::{PageWatcher, TimerCommand, Trigger};
