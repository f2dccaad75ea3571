use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A category directory and the test units found directly inside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCategory {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<TestFile>,
    /// Contents of the category's intro sidecar, when present
    pub intro: Option<String>,
}

/// One loadable test-source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestFile {
    pub path: PathBuf,
    /// File basename without extension
    pub unit_name: String,
}

impl TestFile {
    pub fn new(path: PathBuf) -> Self {
        let unit_name = unit_name_for(&path);
        Self { path, unit_name }
    }

    /// Name of this unit's transcript inside a results run
    pub fn results_file_name(&self) -> String {
        results_file_name(&self.unit_name)
    }
}

pub fn unit_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn results_file_name(unit_name: &str) -> String {
    format!("{}_results.txt", unit_name)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    /// Raised error rather than a failed assertion
    Warn,
}

impl TestStatus {
    /// Trailing marker used on transcript status lines
    pub fn marker(self) -> char {
        match self {
            TestStatus::Pass => '.',
            TestStatus::Fail => 'F',
            TestStatus::Warn => 'E',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Pass => "pass",
            TestStatus::Fail => "fail",
            TestStatus::Warn => "warn",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size label taken from the test method's naming convention, never measured.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl TestSize {
    pub fn from_method_name(name: &str) -> Self {
        if name.ends_with("_large") {
            TestSize::Large
        } else if name.ends_with("_medium") {
            TestSize::Medium
        } else {
            TestSize::Small
        }
    }
}

/// Test method qualified by its enclosing class, rendered `method(Class)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestId {
    pub class: String,
    pub method: String,
}

impl TestId {
    pub fn new(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.method, self.class)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunResult {
    pub id: TestId,
    pub status: TestStatus,
    pub size: TestSize,
    /// Raw transcript text belonging to this test
    pub output: String,
}

impl TestRunResult {
    pub fn new(id: TestId, status: TestStatus, output: impl Into<String>) -> Self {
        let size = TestSize::from_method_name(&id.method);
        Self {
            id,
            status,
            size,
            output: output.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }
}

/// A ratio expressed in percent, or `Undefined` when the denominator is zero.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Percentage {
    Defined(f64),
    Undefined,
}

impl Percentage {
    pub fn of(part: usize, whole: usize) -> Self {
        if whole == 0 {
            Percentage::Undefined
        } else {
            Percentage::Defined(part as f64 / whole as f64 * 100.0)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Percentage::Defined(v) => Some(v),
            Percentage::Undefined => None,
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Percentage::Defined(v) => write!(f, "{:.1}%", v),
            Percentage::Undefined => f.write_str("n/a"),
        }
    }
}
