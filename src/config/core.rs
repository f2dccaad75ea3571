use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for testup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestupConfig {
    /// Directory holding one subdirectory per test category
    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,

    /// Root under which each run creates its own timestamped directory
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Extension of test-source files, without the dot
    #[serde(default = "default_test_extension")]
    pub test_extension: String,

    /// Optional per-category description file
    #[serde(default = "default_intro_file")]
    pub intro_file: String,

    /// Prefix stripped from a suite class to get the API class it covers
    #[serde(default = "default_class_prefix")]
    pub class_prefix: String,

    /// Reference list of `Class.method` entries for coverage
    #[serde(default)]
    pub coverage_list: Option<PathBuf>,

    /// Where tests execute
    #[serde(default)]
    pub host: HostTarget,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub handoff: HandoffConfig,
}

impl Default for TestupConfig {
    fn default() -> Self {
        Self {
            tests_dir: default_tests_dir(),
            results_dir: default_results_dir(),
            test_extension: default_test_extension(),
            intro_file: default_intro_file(),
            class_prefix: default_class_prefix(),
            coverage_list: None,
            host: HostTarget::default(),
            runner: RunnerConfig::default(),
            handoff: HandoffConfig::default(),
        }
    }
}

/// Execution strategy, chosen once at startup from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostTarget {
    /// Tests run in this process
    #[default]
    Local,
    /// Tests run in a separate host process fed through a manifest file
    Handoff,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Command template, with `{file}`, `{test}` and `{class}` placeholders
    #[serde(default = "default_runner_command")]
    pub command: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandoffConfig {
    /// Directory shared by controller and host for manifest and sentinel
    #[serde(default = "default_handoff_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Zero disables the deadline
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            dir: default_handoff_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HandoffConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

pub fn default_tests_dir() -> PathBuf {
    PathBuf::from("tests")
}

pub fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

pub fn default_test_extension() -> String {
    "rb".to_string()
}

pub fn default_intro_file() -> String {
    "intro.html".to_string()
}

pub fn default_class_prefix() -> String {
    "TC_".to_string()
}

pub fn default_runner_command() -> String {
    "ruby {file} --name {test}".to_string()
}

pub fn default_handoff_dir() -> PathBuf {
    PathBuf::from(".testup-handoff")
}

pub fn default_poll_interval_secs() -> u64 {
    3
}

pub fn default_timeout_secs() -> u64 {
    600
}
