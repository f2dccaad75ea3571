//! Verbose transcript lines written while a unit runs.

use super::case::CaseFailure;
use crate::core::{TestId, TestStatus};

pub fn suite_header(class_name: &str) -> String {
    format!("Loaded suite {}", class_name)
}

pub const STARTED: &str = "Started";

pub fn status_line(id: &TestId, status: TestStatus) -> String {
    format!("{}: {}", id, status.marker())
}

/// Failure detail block. The first line ends in `]:` so the parser
/// highlights the message line that follows.
pub fn failure_detail(index: usize, id: &TestId, failure: &CaseFailure, source: &str) -> Vec<String> {
    let location = failure.location.as_deref().unwrap_or(source);
    let mut lines = vec![format!(
        "  {}) {}: {} [{}]:",
        index,
        failure.kind.label(),
        id,
        location
    )];
    let mut message_lines = failure.message.lines().peekable();
    if message_lines.peek().is_none() {
        lines.push("(no message)".to_string());
    }
    lines.extend(message_lines.map(str::to_string));
    lines
}

pub fn summary_line(tests: usize, failures: usize, errors: usize) -> String {
    format!("{} tests, {} failures, {} errors", tests, failures, errors)
}
