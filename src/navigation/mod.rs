//! Navigation
//!
//! [`Navigator`] is the only writer of the history stack and the render
//! state. Callers request navigation by route name (or by literal path for
//! links coming from outside) and observe the result through
//! [`Navigator::subscribe`].

mod history;
mod navigator;

pub use history::{History, HistoryEntry};
pub use navigator::{NavTarget, NavigationOutcome, Navigator, RenderState};
