//! Aggregated outcome of a run, shared by every output format.

use crate::core::Percentage;
use crate::parser::{ParsedReport, Tally};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rates {
    pub pass: Percentage,
    pub fail: Percentage,
    pub warn: Percentage,
}

impl From<&Tally> for Rates {
    fn from(tally: &Tally) -> Self {
        Self {
            pass: tally.pass_rate(),
            fail: tally.fail_rate(),
            warn: tally.warn_rate(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileSummary {
    pub category: String,
    pub unit_name: String,
    /// Element id the live surface uses for this file
    pub element_id: String,
    pub tally: Tally,
    /// `method(Class)` of every non-passing test
    pub failures: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedUnit {
    pub unit_name: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub total: Percentage,
    pub covered_methods: usize,
    pub total_methods: usize,
    pub report_path: PathBuf,
}

/// Only units whose results were parsed are counted. A unit without a
/// results file shows up in `skipped`, never as zeros in `files`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub run_dir: Option<PathBuf>,
    pub tally: Tally,
    pub rates: Rates,
    pub files: Vec<FileSummary>,
    pub skipped: Vec<SkippedUnit>,
    pub coverage: Option<CoverageSummary>,
}

impl Default for Rates {
    fn default() -> Self {
        Rates::from(&Tally::default())
    }
}

impl RunSummary {
    pub fn new(run_dir: Option<PathBuf>) -> Self {
        Self {
            run_dir,
            ..Self::default()
        }
    }

    /// Record a parsed unit and return its summary.
    pub fn add_file(
        &mut self,
        category: &str,
        unit_name: &str,
        fallback_id: String,
        report: &ParsedReport,
    ) -> &FileSummary {
        let tally = report.tally();
        self.tally += tally;
        self.rates = Rates::from(&self.tally);
        self.files.push(FileSummary {
            category: category.to_string(),
            unit_name: unit_name.to_string(),
            element_id: report.element_id.clone().unwrap_or(fallback_id),
            tally,
            failures: report
                .outcomes()
                .filter(|r| !r.passed())
                .map(|r| r.id.to_string())
                .collect(),
        });
        &self.files[self.files.len() - 1]
    }

    pub fn skip(&mut self, unit_name: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedUnit {
            unit_name: unit_name.to_string(),
            reason: reason.into(),
        });
    }

    pub fn all_passed(&self) -> bool {
        self.tally.fail == 0 && self.tally.warn == 0
    }
}

/// Short human-readable count line used for per-file live updates.
pub fn counts_text(tally: &Tally) -> String {
    format!(
        "{} passed, {} failed, {} errors",
        tally.pass, tally.fail, tally.warn
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ResultParser;
    use indoc::indoc;

    #[test]
    fn test_add_file_accumulates() {
        let mut parser = ResultParser::new("rb");
        let report = parser.parse_output(indoc! {"
            Loaded suite TC_Face
            Started
            test_area(TC_Face): .
            test_explode_large(TC_Face): F
        "});

        let mut summary = RunSummary::new(None);
        let file = summary.add_file("Face", "TC_Face", "TC_Face.rb".into(), &report);
        assert_eq!(file.element_id, "TC_Face.rb");
        assert_eq!(file.failures, vec!["test_explode_large(TC_Face)"]);

        assert_eq!(summary.tally.total(), 2);
        assert_eq!(summary.tally.large, 1);
        assert_eq!(summary.rates.pass, Percentage::Defined(50.0));
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_empty_summary_has_undefined_rates() {
        let summary = RunSummary::new(None);
        assert_eq!(summary.rates.pass, Percentage::Undefined);
        assert!(summary.files.is_empty());
        assert!(summary.all_passed());
    }

    #[test]
    fn test_counts_text() {
        let tally = Tally {
            pass: 3,
            fail: 1,
            ..Tally::default()
        };
        assert_eq!(counts_text(&tally), "3 passed, 1 failed, 0 errors");
    }
}
