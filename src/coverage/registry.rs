use super::normalize::PassedTest;
use crate::core::Percentage;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoverageRecord {
    pub class: String,
    pub method: String,
    pub covered: bool,
    pub test_count: usize,
}

impl CoverageRecord {
    fn new(class: &str, method: &str) -> Self {
        Self {
            class: class.to_string(),
            method: method.to_string(),
            covered: false,
            test_count: 0,
        }
    }

    /// Fully qualified `Class.method`
    pub fn id(&self) -> String {
        format!("{}.{}", self.class, self.method)
    }

    /// Class must match exactly; the method must appear, ignoring case,
    /// somewhere in the normalized test name.
    pub fn matches(&self, test: &PassedTest) -> bool {
        test.class == self.class
            && test
                .normalized_name
                .to_lowercase()
                .contains(&self.method.to_lowercase())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoveredMethod {
    pub id: String,
    pub test_count: usize,
}

/// Partition of one class's methods.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassCoverage {
    pub covered: Vec<CoveredMethod>,
    pub not_covered: Vec<String>,
}

impl ClassCoverage {
    pub fn total(&self) -> usize {
        self.covered.len() + self.not_covered.len()
    }

    pub fn percentage(&self) -> Percentage {
        Percentage::of(self.covered.len(), self.total())
    }
}

/// Master list of expected API methods and their coverage state.
///
/// Build one per analysis; it is never shared between analyses.
#[derive(Clone, Debug, Default)]
pub struct CoverageRegistry {
    records: Vec<CoverageRecord>,
    classes: Vec<String>,
}

impl CoverageRegistry {
    /// Build from a reference list with one `Class.method` per line.
    ///
    /// Only the first comma-separated field is read. Blank lines, duplicate
    /// entries and lines without a `.` are skipped.
    pub fn from_reference_list(text: &str) -> Self {
        let mut registry = Self::default();
        let mut seen = HashSet::new();
        let mut seen_classes = HashSet::new();

        for (index, line) in text.lines().enumerate() {
            let field = line.split(',').next().unwrap_or("").trim();
            if field.is_empty() {
                continue;
            }
            let Some((class, method)) = field.rsplit_once('.') else {
                log::debug!("Skipping reference line {}: {:?}", index + 1, line);
                continue;
            };
            if class.is_empty() || method.is_empty() || !seen.insert(field.to_string()) {
                continue;
            }
            if seen_classes.insert(class.to_string()) {
                registry.classes.push(class.to_string());
            }
            registry.records.push(CoverageRecord::new(class, method));
        }

        registry
    }

    /// Cross-reference every entry against every passed test.
    pub fn apply(&mut self, passed: &[PassedTest]) {
        for record in &mut self.records {
            for test in passed {
                if record.matches(test) {
                    record.covered = true;
                    record.test_count += 1;
                }
            }
        }
    }

    pub fn records(&self) -> &[CoverageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn covered_count(&self) -> usize {
        self.records.iter().filter(|r| r.covered).count()
    }

    pub fn total_percentage(&self) -> Percentage {
        Percentage::of(self.covered_count(), self.len())
    }

    /// Per-class partition, keyed (and therefore sorted) by class name.
    pub fn per_class(&self) -> BTreeMap<String, ClassCoverage> {
        let mut buckets: BTreeMap<String, ClassCoverage> = self
            .classes
            .iter()
            .map(|class| (class.clone(), ClassCoverage::default()))
            .collect();

        for record in &self.records {
            let bucket = buckets.entry(record.class.clone()).or_default();
            if record.covered {
                bucket.covered.push(CoveredMethod {
                    id: record.id(),
                    test_count: record.test_count,
                });
            } else {
                bucket.not_covered.push(record.id());
            }
        }

        buckets
    }
}
