//! Presenting run results.
//!
//! - [`value`] - `UiValue` and its minimal JSON form
//! - [`surface`] - live and static destinations
//! - [`summary`] - the aggregate every format renders from
//! - [`html`] - static results page
//! - [`terminal`] - colored terminal summary

pub mod html;
pub mod summary;
pub mod surface;
pub mod terminal;
pub mod value;

pub use html::ResultsPage;
pub use summary::{counts_text, CoverageSummary, FileSummary, Rates, RunSummary, SkippedUnit};
pub use surface::{HtmlFileSurface, JsonLinesSurface, MemorySurface, ResultsSurface, SurfaceCall};
pub use terminal::render_terminal;
pub use value::{to_minimal_json, UiValue};

use crate::errors::Result;

/// JSON document for `--format json`.
pub fn render_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)? + "\n")
}
