//! ZenSearch Rule Compiler
//!
//! This crate turns persisted storage payloads into an ordered, validated
//! `RuleSet`, and provides the list-editing helpers used when a rule is
//! created from a search results page.

pub mod parser;
pub mod optimizer;
pub mod builder;

pub use builder::{
    build_rule_set, compile_storage, display_order, upsert_blocking_rule, upsert_favorite, wildcard_for_domain, wildcard_for_host,
    Upsert,
};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{parse_storage, parse_storage_value, to_storage_value, StorageError, StorageLayout, StoredRules};
