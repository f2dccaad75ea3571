//! API coverage analysis.
//!
//! A reference list names every API method that should be exercised. Each
//! passed test is reduced to its API class and a normalized short name;
//! a method counts as covered when a test of the same class has a short
//! name containing the method name. The match is deliberately loose, so one
//! test can cover several methods sharing a substring.
//!
//! - [`normalize`] - short-name derivation
//! - [`registry`] - the master method registry and per-class partition
//! - [`report`] - static HTML output

pub mod normalize;
pub mod registry;
pub mod report;

pub use normalize::{covered_class, normalize_test_name, PassedTest, SUFFIX_MARKERS};
pub use registry::{ClassCoverage, CoverageRecord, CoverageRegistry, CoveredMethod};
pub use report::{render_coverage_html, CoverageTier};

use crate::core::{Percentage, TestRunResult};
use crate::errors::{Error, IoResultExt, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const REPORT_TITLE: &str = "API Coverage Report";

/// Result of one coverage analysis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CoverageReport {
    pub title: String,
    pub total: Percentage,
    pub covered_methods: usize,
    pub total_methods: usize,
    pub classes: BTreeMap<String, ClassCoverage>,
}

/// Run a full analysis with a fresh registry.
pub fn analyze(reference_list: &str, passed: &[PassedTest]) -> CoverageReport {
    let mut registry = CoverageRegistry::from_reference_list(reference_list);
    registry.apply(passed);
    log::debug!(
        "Coverage: {} of {} methods matched by {} passed tests",
        registry.covered_count(),
        registry.len(),
        passed.len()
    );

    CoverageReport {
        title: REPORT_TITLE.to_string(),
        total: registry.total_percentage(),
        covered_methods: registry.covered_count(),
        total_methods: registry.len(),
        classes: registry.per_class(),
    }
}

/// Reduce parsed outcomes to the passed tests coverage cares about.
pub fn passed_tests<'a>(
    results: impl IntoIterator<Item = &'a TestRunResult>,
    class_prefix: &str,
) -> Vec<PassedTest> {
    results
        .into_iter()
        .filter_map(|r| PassedTest::from_result(r, class_prefix))
        .collect()
}

/// Read the reference list; a missing file is a configuration error.
pub fn read_reference_list(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::config_with_path(
            format!("coverage reference list not found: {}", path.display()),
            path,
        ));
    }
    std::fs::read_to_string(path).with_path("Failed to read reference list", path)
}

/// Where the HTML report for a reference list goes: beside it.
pub fn report_path_for(reference_list: &Path) -> PathBuf {
    let stem = reference_list
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "coverage".to_string());
    reference_list.with_file_name(format!("{}_coverage.html", stem))
}

/// Analyze against a reference list file and write the HTML report beside it.
pub fn analyze_file(reference_list: &Path, passed: &[PassedTest]) -> Result<(CoverageReport, PathBuf)> {
    let text = read_reference_list(reference_list)?;
    let report = analyze(&text, passed);
    let out = report_path_for(reference_list);
    std::fs::write(&out, render_coverage_html(&report)).with_path("Failed to write coverage report", &out)?;
    log::info!("Coverage report written to {}", out.display());
    Ok((report, out))
}
