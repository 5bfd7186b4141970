mod chrome;
mod replay;

pub use chrome::{BrowserOptions, ChromeSession};
pub use replay::ReplaySession;

use std::fmt;

/// Addresses one element: the `nth` match of a CSS selector.
///
/// Index-based selection breaks whenever a site reorders its controls, so
/// call sites never build these by hand. They ask a named control for its
/// locator instead (see [`crate::mars::Control`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub css: &'static str,
    pub nth: usize,
}

impl Locator {
    pub const fn new(css: &'static str, nth: usize) -> Self {
        Locator { css, nth }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.css, self.nth)
    }
}
