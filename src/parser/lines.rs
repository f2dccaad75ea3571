//! Pure line classification for runner transcripts.

use crate::core::{TestId, TestRunResult, TestStatus};

pub const SUITE_PREFIX: &str = "Loaded suite";
pub const TEST_PREFIX: &str = "test_";
pub const NOTE_PREFIX: &str = "Note";
const LOCATION_SUFFIX: &str = "]:";
const HORIZONTAL_RULE: &str = "<hr";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// `Loaded suite <name>`; carries the derived element id
    SuiteHeader(String),
    Status(TestRunResult),
    /// Assertion location, e.g. `  1) Failure: test_x(TC_X) [tc_x.rb:12]:`
    Location,
    /// Highlighted message following a location line, or a `Note` line
    FailureMessage,
    Text,
    /// Unrecognized status terminator; the line is blanked
    Discarded,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLine {
    pub kind: LineKind,
    pub text: String,
}

impl ParsedLine {
    fn new(kind: LineKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }

    fn discarded() -> Self {
        Self {
            kind: LineKind::Discarded,
            text: String::new(),
        }
    }

    pub fn outcome(&self) -> Option<&TestRunResult> {
        match &self.kind {
            LineKind::Status(result) => Some(result),
            _ => None,
        }
    }
}

/// Classify one line. `lookahead` is the flag set by a preceding location
/// line; it is updated in place.
pub fn classify_line(
    line: &str,
    lookahead: &mut bool,
    extension: &str,
    current_class: Option<&str>,
) -> ParsedLine {
    let follows_location = std::mem::replace(lookahead, false);

    if let Some(rest) = line.strip_prefix(SUITE_PREFIX) {
        return ParsedLine::new(LineKind::SuiteHeader(element_id(rest, extension)), line);
    }

    if line.starts_with(TEST_PREFIX) {
        return match parse_status_line(line, current_class) {
            Some(result) => ParsedLine::new(LineKind::Status(result), line),
            None => ParsedLine::discarded(),
        };
    }

    if line.trim_end().ends_with(LOCATION_SUFFIX) {
        *lookahead = true;
        return ParsedLine::new(LineKind::Location, line);
    }

    if line.starts_with(NOTE_PREFIX) {
        return ParsedLine::new(LineKind::FailureMessage, line);
    }

    if follows_location && !line.starts_with('<') && !line.contains(HORIZONTAL_RULE) {
        return ParsedLine::new(LineKind::FailureMessage, line);
    }

    ParsedLine::new(LineKind::Text, line)
}

/// Element id for a loaded suite: its base name plus the source extension.
pub fn element_id(suite: &str, extension: &str) -> String {
    let name = suite.trim();
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let base = base
        .strip_suffix(&format!(".{}", extension))
        .unwrap_or(base);
    format!("{}.{}", base, extension)
}

/// Parse `test_name(Class): <marker>`.
///
/// Returns `None` when the line does not end in a known marker.
pub fn parse_status_line(line: &str, current_class: Option<&str>) -> Option<TestRunResult> {
    let trimmed = line.trim_end();
    let status = match trimmed.chars().last()? {
        '.' => TestStatus::Pass,
        'F' => TestStatus::Fail,
        'E' => TestStatus::Warn,
        _ => return None,
    };

    let qualified = trimmed
        .split_once('(')
        .and_then(|(method, rest)| rest.split_once(')').map(|(class, _)| (method, class)));
    let id = match qualified {
        Some((method, class)) => TestId::new(class.trim(), method.trim()),
        None => {
            let head = trimmed.split(':').next().unwrap_or(trimmed);
            TestId::new(
                current_class.unwrap_or_default(),
                head.split_whitespace().next().unwrap_or(head),
            )
        }
    };

    Some(TestRunResult::new(id, status, line))
}
