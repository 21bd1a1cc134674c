//! One extraction, matching and painting pass
//!
//! A pass walks the result elements the host gathered with the engine's
//! result selector, resets each one, and repaints it from the current rule
//! snapshot. Elements without a derivable URL are reset and skipped.

use crate::dom::{DomQuery, StyleTarget};
use crate::engine::EngineDescriptor;
use crate::extract::extract;
use crate::matcher::RuleSet;
use crate::painter;
use crate::redirect;
use crate::types::{Effect, PassStats, Verdict};
use crate::url::host_of;

/// Outcome for a single result element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<'r> {
    /// Destination URL after redirect unwrapping
    pub url: Option<String>,
    pub verdict: Verdict<'r>,
}

/// Extract, unwrap and match one result without painting it.
pub fn evaluate<'r, E: DomQuery + ?Sized>(
    result: &E,
    engine: &EngineDescriptor,
    rules: &'r RuleSet,
) -> Evaluation<'r> {
    let Some(raw) = extract(result, engine) else {
        log::trace!("no URL in {} result", engine.name);
        return Evaluation { url: None, verdict: Verdict::default() };
    };

    let url = redirect::resolve(&raw).into_owned();
    let verdict = rules.evaluate(&url);
    Evaluation { url: Some(url), verdict }
}

/// Run a full pass over `results`.
pub fn run_pass<E>(results: &[E], engine: &EngineDescriptor, rules: &RuleSet) -> PassStats
where
    E: DomQuery + StyleTarget,
{
    let mut stats = PassStats {
        candidates: results.len(),
        ..PassStats::default()
    };

    for result in results {
        painter::reset(result);

        let evaluation = evaluate(result, engine, rules);
        if evaluation.url.is_none() {
            continue;
        }
        stats.extracted += 1;
        stats.record(&evaluation.verdict.effect);
        painter::paint(result, &evaluation.verdict.effect);
    }

    log::debug!(
        "{} pass: {} candidates, {} extracted, {} hidden, {} highlighted",
        engine.name,
        stats.candidates,
        stats.extracted,
        stats.hidden,
        stats.highlighted,
    );
    stats
}

/// A result hidden on the user's request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenResult {
    /// Destination URL after redirect unwrapping
    pub url: String,
    /// Lowercased hostname the new blocking rule should cover
    pub host: String,
}

/// Hide one result immediately and report the host a blocking rule should be
/// created for. Creating and persisting that rule is left to the caller.
///
/// Returns `None`, leaving the element untouched, when no URL with a host
/// can be extracted.
pub fn hide_result<E>(result: &E, engine: &EngineDescriptor) -> Option<HiddenResult>
where
    E: DomQuery + StyleTarget + ?Sized,
{
    let raw = extract(result, engine)?;
    let url = redirect::resolve(&raw).into_owned();
    let host = host_of(&url)?;

    painter::repaint(result, &Effect::Hidden);
    Some(HiddenResult { url, host })
}
