//! Runtime configuration
//!
//! Everything is optional on the wire; a missing field takes the value the
//! extension has always used.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::engine::EngineDescriptor;

/// Error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Debounce delay must be non-zero")]
    ZeroDebounce,
    #[error("URL poll interval must be non-zero when polling is enabled")]
    ZeroPollInterval,
}

// =============================================================================
// Trigger Sources
// =============================================================================

bitflags! {
    /// Page changes that schedule a refresh.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TriggerSources: u8 {
        /// Result elements added under the engine's result container
        const CONTAINER = 1 << 0;
        /// Any subtree added under `<body>`
        const BODY = 1 << 1;
        /// History pushes/replaces, `popstate`, `hashchange`
        const NAVIGATION = 1 << 2;
        /// Periodic comparison of `location.href`
        const URL_POLL = 1 << 3;
        /// Explicit "rules changed" signal
        const REQUESTED = 1 << 4;
    }
}

// =============================================================================
// Watcher
// =============================================================================

/// Timing and trigger configuration for the page watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatcherConfig {
    /// Quiet period before a scheduled refresh runs
    pub debounce_ms: u32,
    /// Interval of the URL polling fallback
    pub poll_interval_ms: u32,
    pub observe_container: bool,
    pub observe_body: bool,
    pub observe_navigation: bool,
    pub poll_url: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            poll_interval_ms: 1000,
            observe_container: true,
            observe_body: true,
            observe_navigation: true,
            poll_url: true,
        }
    }
}

impl WatcherConfig {
    /// Enabled trigger sources. Explicit requests are always honoured.
    pub fn triggers(&self) -> TriggerSources {
        let mut sources = TriggerSources::REQUESTED;
        sources.set(TriggerSources::CONTAINER, self.observe_container);
        sources.set(TriggerSources::BODY, self.observe_body);
        sources.set(TriggerSources::NAVIGATION, self.observe_navigation);
        sources.set(TriggerSources::URL_POLL, self.poll_url);
        sources
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.poll_url && self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

// =============================================================================
// Engines
// =============================================================================

/// How a hostname matching several engines is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Longest `hostMatch` wins; ties keep table order
    #[default]
    LongestMatch,
    /// First table entry wins
    FirstMatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub resolve: ResolveStrategy,
    /// Engines appended after the built-in table
    pub extra_engines: Vec<EngineDescriptor>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Complete content-script configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub watcher: WatcherConfig,
    pub engines: EngineConfig,
}

impl PipelineConfig {
    /// Parse and validate a JSON config. An empty string yields the defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(text)?;
        config.watcher.validate()?;
        Ok(config)
    }
}
