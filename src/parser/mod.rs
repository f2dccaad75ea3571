//! Runner transcript parsing.
//!
//! Transcripts are line oriented. Each line is classified on its own, with a
//! single line of lookahead after an assertion location so the message that
//! follows it can be highlighted. Lines that look like status lines but end
//! in an unknown marker are dropped without complaint.
//!
//! - [`lines`] - pure per-line classification
//! - [`tally`] - running pass/fail/warn and size totals
//!
//! ```ignore
//! use testup::parser::ResultParser;
//!
//! let mut parser = ResultParser::new("rb");
//! let report = parser.parse_output("Loaded suite TC_Face\ntest_area(TC_Face): .\n");
//! assert_eq!(report.element_id.as_deref(), Some("TC_Face.rb"));
//! assert_eq!(parser.tally().pass, 1);
//! ```

pub mod lines;
pub mod tally;

pub use lines::{classify_line, element_id, parse_status_line, LineKind, ParsedLine};
pub use tally::Tally;

use crate::core::{results_file_name, TestRunResult};
use crate::errors::{IoResultExt, Result};
use serde::Serialize;
use std::path::Path;

/// Parsed transcript of one test unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedReport {
    pub element_id: Option<String>,
    pub lines: Vec<ParsedLine>,
}

impl ParsedReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &TestRunResult> {
        self.lines.iter().filter_map(ParsedLine::outcome)
    }

    pub fn passed(&self) -> impl Iterator<Item = &TestRunResult> {
        self.outcomes().filter(|r| r.passed())
    }

    pub fn tally(&self) -> Tally {
        self.outcomes().collect()
    }
}

/// Stateful parser; totals accumulate across every transcript fed to it.
#[derive(Debug)]
pub struct ResultParser {
    extension: String,
    tally: Tally,
}

impl ResultParser {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            tally: Tally::default(),
        }
    }

    pub fn parse_output(&mut self, text: &str) -> ParsedReport {
        let mut report = ParsedReport::default();
        let mut lookahead = false;
        let mut current_class: Option<String> = None;

        for line in text.lines() {
            let parsed = classify_line(line, &mut lookahead, &self.extension, current_class.as_deref());
            match &parsed.kind {
                LineKind::SuiteHeader(id) => {
                    current_class = line
                        .strip_prefix(lines::SUITE_PREFIX)
                        .map(|rest| id_stem(rest.trim()).to_string());
                    report.element_id = Some(id.clone());
                }
                LineKind::Status(result) => self.tally.record(result),
                _ => {}
            }
            report.lines.push(parsed);
        }

        report
    }

    /// Parse a transcript file. A missing file is reported as `Ok(None)`
    /// so the unit is simply absent from aggregates.
    pub fn parse_file(&mut self, path: &Path) -> Result<Option<ParsedReport>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(self.parse_output(&text))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No results at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e).with_path("Failed to read results", path),
        }
    }

    /// Parse the transcript of `unit_name` inside a results run directory.
    pub fn parse_unit(&mut self, run_dir: &Path, unit_name: &str) -> Result<Option<ParsedReport>> {
        self.parse_file(&run_dir.join(results_file_name(unit_name)))
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }
}

fn id_stem(suite: &str) -> &str {
    suite.rsplit(['/', '\\']).next().unwrap_or(suite)
}

/// Serializable view of one parsed outcome, used by JSON summaries.
#[derive(Debug, Serialize)]
pub struct OutcomeView<'a> {
    pub test: String,
    pub status: &'a str,
    pub size: crate::core::TestSize,
}

impl<'a> From<&'a TestRunResult> for OutcomeView<'a> {
    fn from(result: &'a TestRunResult) -> Self {
        Self {
            test: result.id.to_string(),
            status: result.status.as_str(),
            size: result.size,
        }
    }
}
