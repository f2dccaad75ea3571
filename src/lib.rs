// Export modules for library usage
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod coverage;
pub mod discovery;
pub mod errors;
pub mod handoff;
pub mod parser;
pub mod progress;
pub mod report;
pub mod runner;
pub mod session;

// Re-export commonly used types
pub use crate::core::{
    Percentage, TestCategory, TestFile, TestId, TestRunResult, TestSize, TestStatus,
};

pub use crate::errors::{Error, Result};

pub use crate::config::{HostTarget, TestupConfig};

pub use crate::discovery::{discover, TestWalker};

pub use crate::parser::{ParsedReport, ResultParser, Tally};

pub use crate::coverage::{analyze, analyze_file, CoverageReport, CoverageRegistry, PassedTest};

pub use crate::runner::{
    CaseFailure, CommandLoader, DirectoryStore, FnCase, MemoryStore, Orchestrator, RegistryLoader,
    ResultsRun, ResultsStore, SuiteLoader, TestCase, TestUnit,
};

pub use crate::report::{
    to_minimal_json, HtmlFileSurface, JsonLinesSurface, MemorySurface, ResultsSurface, RunSummary,
    UiValue,
};

pub use crate::handoff::Handoff;

pub use crate::session::{OutputMode, Session, SessionPlan};
