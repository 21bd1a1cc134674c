//! Visual effects on result elements
//!
//! Effects are inline `!important` overrides so page stylesheets cannot undo
//! them. Every pass clears both properties before painting, which keeps
//! repeated passes idempotent and drops the effect of a removed rule.

use crate::dom::StyleTarget;
use crate::types::Effect;

pub const DISPLAY: &str = "display";
pub const BACKGROUND_COLOR: &str = "background-color";

/// Remove any effect a previous pass applied.
pub fn reset<E: StyleTarget + ?Sized>(element: &E) {
    element.clear(DISPLAY);
    element.clear(BACKGROUND_COLOR);
}

/// Apply `effect` on top of the element's current inline style.
pub fn paint<E: StyleTarget + ?Sized>(element: &E, effect: &Effect<'_>) {
    match effect {
        Effect::None => {}
        Effect::Hidden => element.set_important(DISPLAY, "none"),
        Effect::Highlighted(color) => element.set_important(BACKGROUND_COLOR, color),
    }
}

/// Reset, then apply `effect`.
pub fn repaint<E: StyleTarget + ?Sized>(element: &E, effect: &Effect<'_>) {
    reset(element);
    paint(element, effect);
}
