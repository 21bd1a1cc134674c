//! ZenSearch CLI
//!
//! CLI tool for checking stored rules and replaying passes over saved
//! result pages.

mod page;
mod scan;

use std::fs;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use zs_compiler::{compile_storage, display_order, optimize_rules, parse_storage, StorageLayout};
use zs_core::config::PipelineConfig;
use zs_core::engine::EngineRegistry;
use zs_core::matcher::RuleSet;
use zs_core::redirect;
use zs_core::types::Effect;

use crate::scan::scan_page;

#[derive(Parser)]
#[command(name = "zs-cli")]
#[command(about = "ZenSearch rule and result page tools")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one URL against stored rules
    Match {
        /// Result URL, possibly a redirect wrapper
        #[arg(short, long)]
        url: String,

        /// Stored rules (JSON storage object)
        #[arg(short, long)]
        rules: String,
    },

    /// Unwrap a search engine redirect URL
    Resolve {
        /// URL to unwrap
        url: String,
    },

    /// Run one pass over a saved result page
    Scan {
        /// Saved HTML page
        #[arg(long)]
        html: String,

        /// URL the page was saved from
        #[arg(short, long)]
        url: String,

        /// Stored rules (JSON storage object)
        #[arg(short, long)]
        rules: String,

        /// Pipeline config with extra engines
        #[arg(short, long)]
        config: Option<String>,

        /// Use this engine instead of resolving it from the page URL
        #[arg(short, long)]
        engine: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate stored rules
    Check {
        /// Stored rules (JSON storage object)
        #[arg(short, long)]
        rules: String,

        /// Fail when any rule is invalid
        #[arg(long)]
        strict: bool,

        /// Print the rules in list order
        #[arg(short, long)]
        list: bool,
    },

    /// List the engine table as JSON
    Engines {
        /// Pipeline config with extra engines
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Match { url, rules } => cmd_match(&url, &rules),
        Commands::Resolve { url } => cmd_resolve(&url),
        Commands::Scan {
            html,
            url,
            rules,
            config,
            engine,
            json,
        } => cmd_scan(&html, &url, &rules, config.as_deref(), engine.as_deref(), json),
        Commands::Check { rules, strict, list } => cmd_check(&rules, strict, list),
        Commands::Engines { config } => cmd_engines(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Loading
// =============================================================================

fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))
}

fn load_rules(path: &str) -> Result<RuleSet, String> {
    let (rules, stats) =
        compile_storage(&read_file(path)?).map_err(|e| format!("Invalid rules in '{}': {}", path, e))?;
    for invalid in &stats.invalid {
        log::warn!("rule {} never matches: {}", invalid.index, invalid.error);
    }
    Ok(rules)
}

fn load_registry(config: Option<&str>) -> Result<EngineRegistry, String> {
    let config = match config {
        Some(path) => {
            PipelineConfig::from_json(&read_file(path)?).map_err(|e| format!("Invalid config '{}': {}", path, e))?
        }
        None => PipelineConfig::default(),
    };
    Ok(EngineRegistry::from_config(&config.engines))
}

// =============================================================================
// Commands
// =============================================================================

fn cmd_match(url: &str, rules_path: &str) -> Result<(), String> {
    let rules = load_rules(rules_path)?;
    let resolved = redirect::resolve(url);
    let verdict = rules.evaluate(&resolved);

    println!("URL:      {}", url);
    if resolved != url {
        println!("  Target:   {}", resolved);
    }
    match verdict.effect {
        Effect::None => println!("  Effect:   none"),
        Effect::Hidden => println!("  Effect:   hidden"),
        Effect::Highlighted(color) => println!("  Effect:   highlighted ({})", color),
    }
    if let Some(index) = verdict.rule_index {
        println!("  Rule:     #{} {}", index, rules.rules()[index].rule.pattern);
    }

    Ok(())
}

fn cmd_resolve(url: &str) -> Result<(), String> {
    match redirect::detect(url) {
        Some(kind) => {
            println!("Redirect: {:?}", kind);
            println!("  Target:   {}", redirect::resolve(url));
        }
        None => println!("Not a redirect: {}", url),
    }
    Ok(())
}

fn cmd_scan(
    html_path: &str,
    page_url: &str,
    rules_path: &str,
    config: Option<&str>,
    engine_name: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let page_url = Url::parse(page_url).map_err(|e| format!("Invalid page URL '{}': {}", page_url, e))?;
    let registry = load_registry(config)?;

    let engine = match engine_name {
        Some(name) => registry
            .engines()
            .iter()
            .find(|engine| engine.name == name)
            .ok_or_else(|| format!("Unknown engine '{}'", name))?,
        None => {
            let host = page_url.host_str().unwrap_or_default();
            registry
                .resolve(host)
                .ok_or_else(|| format!("No search engine for host '{}'", host))?
        }
    };

    let html = read_file(html_path)?;
    let rules = load_rules(rules_path)?;
    let report = scan_page(&html, &page_url, engine, &rules);

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| format!("Failed to encode report: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Scanned '{}' as {}", html_path, report.engine);
    for result in &report.results {
        let url = result.url.as_deref().unwrap_or("-");
        match (&result.color, result.rule) {
            (Some(color), Some(rule)) => println!("  [{}] {:<11} {} (rule #{}, {})", result.index, result.effect, url, rule, color),
            (_, Some(rule)) => println!("  [{}] {:<11} {} (rule #{})", result.index, result.effect, url, rule),
            _ => println!("  [{}] {:<11} {}", result.index, result.effect, url),
        }
    }
    println!();
    println!("  Candidates:  {}", report.stats.candidates);
    println!("  Extracted:   {}", report.stats.extracted);
    println!("  Hidden:      {}", report.stats.hidden);
    println!("  Highlighted: {}", report.stats.highlighted);
    println!("  Unmatched:   {}", report.stats.unmatched);

    Ok(())
}

fn cmd_check(rules_path: &str, strict: bool, list: bool) -> Result<(), String> {
    let mut stored =
        parse_storage(&read_file(rules_path)?).map_err(|e| format!("Invalid rules in '{}': {}", rules_path, e))?;
    let layout = match stored.layout {
        StorageLayout::Sites => "sites",
        StorageLayout::Legacy => "legacy (favorites/blocked)",
        StorageLayout::Empty => "empty",
    };
    let skipped = stored.skipped;
    let stats = optimize_rules(&mut stored.rules, stored.mode);

    println!("Rules '{}'", rules_path);
    println!("  Layout:   {}", layout);
    println!("  Mode:     {:?}", stored.mode);
    println!("  Skipped:  {} malformed entries", skipped);
    println!(
        "  Rules:    {} -> {} (dedupe removed {}, invalid {})",
        stats.before,
        stats.after,
        stats.deduped,
        stats.invalid.len()
    );
    for invalid in &stats.invalid {
        println!("  Invalid:  #{} {}", invalid.index, invalid.error);
    }

    if list {
        println!();
        for index in display_order(&stored.rules) {
            let rule = &stored.rules[index];
            let pin = if rule.pinned { "*" } else { " " };
            match rule.effect() {
                Effect::Hidden => println!("  {} #{:<3} block      {}", pin, index, rule.pattern),
                _ => println!("  {} #{:<3} highlight  {} ({})", pin, index, rule.pattern, rule.color),
            }
        }
    }

    if strict && (!stats.invalid.is_empty() || skipped > 0) {
        return Err(format!(
            "{} invalid rules, {} malformed entries",
            stats.invalid.len(),
            skipped
        ));
    }
    Ok(())
}

fn cmd_engines(config: Option<&str>) -> Result<(), String> {
    let registry = load_registry(config)?;
    let text =
        serde_json::to_string_pretty(registry.engines()).map_err(|e| format!("Failed to encode engines: {}", e))?;
    println!("{}", text);
    Ok(())
}
